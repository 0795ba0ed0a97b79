use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::bytecode::compile_error::CompileError;
use crate::bytecode::ir::{ClassUnit, CodeBuffer, MethodBody};
use crate::bytecode::op::{ArrayKind, Constant, Insn};
use crate::bytecode::rules::{self, ARRAY_OPEN};
use crate::bytecode::stack_check;
use crate::lang::{CodeUnit, Keyword, Literal, Statement};
use crate::types::{TransformRule, Type, TypeStack};

/// Descriptor of the generated entry method.
pub const ENTRY_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

/// Compiler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Name of the generated class.
    pub class_name: String,
    /// Func compiled into the entry method.
    pub entry_point: String,
    /// Identifier that prints the top of the stack.
    pub print_word: String,
    /// Record every rule application in [`Compilation::trace`].
    pub trace: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            class_name: "Main".to_string(),
            entry_point: "main".to_string(),
            print_word: "p".to_string(),
            trace: false,
        }
    }
}

/// Result of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    pub class: ClassUnit,
    /// One line per rule application and `??` marker, in emission order.
    /// Empty unless [`CompilerConfig::trace`] is set.
    pub trace: Vec<String>,
}

/// Type-directed code generator.
///
/// Walks the program once, checking every statement against a live
/// [`TypeStack`] and emitting its instructions as the check succeeds.
pub struct Emitter<'cfg> {
    config: &'cfg CompilerConfig,

    /// Inline bodies registered so far, by name
    inlines: HashMap<String, Vec<Statement>>,

    /// Inlines currently being expanded, outermost first
    expanding: Vec<String>,

    code: CodeBuffer,
    trace: Vec<String>,
}

impl<'cfg> Emitter<'cfg> {
    pub fn new(config: &'cfg CompilerConfig) -> Self {
        Self {
            config,
            inlines: HashMap::new(),
            expanding: Vec::new(),
            code: CodeBuffer::new(),
            trace: Vec::new(),
        }
    }

    /// Compiles a parsed program into its entry class.
    pub fn emit_program(mut self, program: &CodeUnit) -> Result<Compilation, CompileError> {
        let units = match program {
            CodeUnit::Module { nested, .. } => nested.as_slice(),
            other => std::slice::from_ref(other),
        };

        let mut entry_found = false;
        for unit in units {
            match unit {
                CodeUnit::Inline { name, .. } if *name == self.config.print_word => {
                    return Err(CompileError::unsupported(format!(
                        "inline `{}` shadows the print word",
                        name
                    )));
                }
                CodeUnit::Inline { name, body } => {
                    self.inlines.insert(name.clone(), body.clone());
                }
                CodeUnit::Func { name, body } if *name == self.config.entry_point => {
                    if entry_found {
                        return Err(CompileError::unsupported(format!(
                            "second definition of entry point `{}`",
                            name
                        )));
                    }
                    entry_found = true;
                    self.emit_entry(body)?;
                }
                CodeUnit::Func { .. } => {
                    warn!(func = unit.name(), "skipping function other than the entry point");
                    self.record(|| format!("skip fn {}", unit.name()));
                }
                CodeUnit::Module { .. } => {
                    return Err(CompileError::unsupported(format!(
                        "nested module `{}`",
                        unit.name()
                    )));
                }
            }
        }

        if !entry_found {
            return Err(CompileError::MissingEntryPoint {
                name: self.config.entry_point.clone(),
            });
        }

        let code = self.code.into_code();
        let max_stack = stack_check::max_stack(&code)?;
        Ok(Compilation {
            class: ClassUnit {
                name: self.config.class_name.clone(),
                entry: MethodBody {
                    name: "main".to_string(),
                    descriptor: ENTRY_DESCRIPTOR.to_string(),
                    max_stack,
                    code,
                },
            },
            trace: self.trace,
        })
    }

    fn emit_entry(&mut self, body: &[Statement]) -> Result<(), CompileError> {
        let mut stack = TypeStack::new();
        self.emit_statements(body, &mut stack)?;
        // left-over values are discarded on return
        self.code.emit(Insn::Return);
        Ok(())
    }

    pub fn emit_statements(
        &mut self,
        body: &[Statement],
        stack: &mut TypeStack,
    ) -> Result<(), CompileError> {
        for statement in body {
            self.emit_statement(statement, stack)?;
        }
        Ok(())
    }

    fn emit_statement(
        &mut self,
        statement: &Statement,
        stack: &mut TypeStack,
    ) -> Result<(), CompileError> {
        match statement {
            Statement::Literal(literal) => {
                let constant = narrow_literal(literal)?;
                let rule = rules::literal_rule(literal, constant);
                self.apply_rule(&statement.describe(), &rule, stack)
            }

            Statement::Keyword(Keyword::ArrEnd) => self.collect_array(stack),
            Statement::Keyword(Keyword::Hole) => {
                info!(%stack, "??");
                self.record(|| format!("?? {}", stack));
                Ok(())
            }
            Statement::Keyword(keyword) => match rules::keyword_rule(*keyword) {
                Some(rule) => self.apply_rule(keyword.token(), &rule, stack),
                None => Err(CompileError::unsupported(format!("operator `{}`", keyword))),
            },

            Statement::Ident(name) if *name == self.config.print_word => {
                self.apply_rule(name, &rules::print_rule(), stack)
            }
            Statement::Ident(name) => self.expand_inline(name, stack),

            Statement::While { cond, body } => self.emit_while(cond, body, stack),
            Statement::If {
                true_body,
                false_body,
            } => self.emit_if(true_body, false_body.as_deref(), stack),
        }
    }

    fn apply_rule(
        &mut self,
        name: &str,
        rule: &impl TransformRule,
        stack: &mut TypeStack,
    ) -> Result<(), CompileError> {
        let before = stack.clone();
        let matched = rule
            .apply(stack, &mut self.code)
            .map_err(|source| CompileError::RuleDefinition {
                name: name.to_string(),
                source,
            })?;

        if matched {
            self.log_rule(name, &before, Some(&*stack));
            Ok(())
        } else {
            self.log_rule(name, &before, None);
            Err(CompileError::type_mismatch(name, rule, stack))
        }
    }

    /// Logs a rule application; `after` is `None` when it failed.
    fn log_rule(&mut self, name: &str, before: &TypeStack, after: Option<&TypeStack>) {
        match after {
            Some(after) => debug!(rule = name, %before, %after, "rule applied"),
            None => debug!(rule = name, %before, "rule failed"),
        }
        self.record(|| match after {
            Some(after) => format!("{}: {} -> {}", name, before, after),
            None => format!("{}: {} -> ERROR", name, before),
        });
    }

    /// Appends to the trace. `line` is only built when tracing is on.
    fn record(&mut self, line: impl FnOnce() -> String) {
        if self.config.trace {
            self.trace.push(line());
        }
    }

    fn expand_inline(&mut self, name: &str, stack: &mut TypeStack) -> Result<(), CompileError> {
        let Some(body) = self.inlines.get(name).cloned() else {
            return Err(CompileError::unresolved(name));
        };

        if self.expanding.iter().any(|n| n == name) {
            let mut chain = self.expanding.clone();
            chain.push(name.to_string());
            return Err(CompileError::RecursiveInline {
                name: name.to_string(),
                chain,
            });
        }

        self.expanding.push(name.to_string());
        let result = self.emit_statements(&body, stack);
        self.expanding.pop();
        result
    }

    /// `]`: pops down to the `[` marker and builds an array of the popped
    /// values, all of which must share one type.
    fn collect_array(&mut self, stack: &mut TypeStack) -> Result<(), CompileError> {
        let name = Keyword::ArrEnd.token();
        let before = stack.clone();
        let mut next = stack.clone();
        let mut element: Option<Type> = None;
        let mut count: usize = 0;

        loop {
            match next.pop() {
                Some(Type::Symbol(marker)) if marker == ARRAY_OPEN => break,
                Some(ty) => {
                    match &element {
                        None => element = Some(ty),
                        Some(first) if *first == ty => {}
                        Some(first) => {
                            self.log_rule(name, &before, None);
                            return Err(CompileError::Homogeneity {
                                expected: first.to_string(),
                                found: ty.to_string(),
                            });
                        }
                    }
                    count += 1;
                }
                None => {
                    self.log_rule(name, &before, None);
                    return Err(CompileError::type_mismatch(
                        name,
                        format!("{{ :{} $a.. -> [$a }}", ARRAY_OPEN),
                        stack,
                    ));
                }
            }
        }

        let Some(element) = element else {
            return Err(CompileError::unsupported("empty array literal `[ ]`"));
        };
        let kind = match &element {
            Type::Int => ArrayKind::Int,
            Type::Bool => ArrayKind::Bool,
            Type::Reference(class) => ArrayKind::Reference(class.clone()),
            other => {
                return Err(CompileError::unsupported(format!("array of {}", other)));
            }
        };
        let len = i32::try_from(count)
            .map_err(|_| CompileError::unsupported(format!("array literal of {} elements", count)))?;

        self.code.emit(Insn::Const(Constant::Int(len)));
        self.code.emit(Insn::NewArray(kind.clone()));
        // elements ( .. x arr ) are stored last to first
        for index in (0..len).rev() {
            self.code.emit(Insn::DupX1);
            self.code.emit(Insn::Swap);
            self.code.emit(Insn::Const(Constant::Int(index)));
            self.code.emit(Insn::Swap);
            self.code.emit(Insn::ArrayStore(kind.clone()));
        }

        next.push(Type::array(element));
        self.log_rule(name, &before, Some(&next));
        *stack = next;
        Ok(())
    }

    fn emit_while(
        &mut self,
        cond: &[Statement],
        body: &[Statement],
        stack: &mut TypeStack,
    ) -> Result<(), CompileError> {
        let head = self.code.new_label();
        let exit = self.code.new_label();

        let mut looped = stack.clone();
        self.code.place(head);
        self.emit_statements(cond, &mut looped)?;
        self.apply_rule("while", &rules::jump_if_false(exit), &mut looped)?;
        let at_exit = looped.clone();

        self.emit_statements(body, &mut looped)?;
        if looped != *stack {
            return Err(CompileError::join("while loop", stack, &looped));
        }
        self.code.emit(Insn::Goto(head));
        self.code.place(exit);

        *stack = at_exit;
        Ok(())
    }

    fn emit_if(
        &mut self,
        true_body: &[Statement],
        false_body: Option<&[Statement]>,
        stack: &mut TypeStack,
    ) -> Result<(), CompileError> {
        let otherwise = self.code.new_label();
        let end = self.code.new_label();

        self.apply_rule("if", &rules::jump_if_false(otherwise), stack)?;

        let mut taken = stack.clone();
        self.emit_statements(true_body, &mut taken)?;
        self.code.emit(Insn::Goto(end));

        self.code.place(otherwise);
        if let Some(false_body) = false_body {
            self.emit_statements(false_body, stack)?;
        }
        self.code.place(end);

        if taken != *stack {
            return Err(CompileError::join("if", &taken, stack));
        }
        Ok(())
    }
}

/// Narrows a literal to a 32-bit target constant.
///
/// Ints in `i32` range load as-is; the rest of the `u32` range keeps its
/// bit pattern, so `0xFFFFFFFF` loads `-1`.
fn narrow_literal(literal: &Literal) -> Result<Constant, CompileError> {
    match literal {
        Literal::Int(n) => {
            if let Ok(v) = i32::try_from(*n) {
                Ok(Constant::Int(v))
            } else if let Ok(v) = u32::try_from(*n) {
                Ok(Constant::Int(v as i32))
            } else {
                Err(CompileError::unsupported(format!(
                    "integer literal {} does not fit in 32 bits",
                    n
                )))
            }
        }
        Literal::Bool(b) => Ok(Constant::Bool(*b)),
        Literal::Str(s) => Ok(Constant::Str(s.clone())),
    }
}
