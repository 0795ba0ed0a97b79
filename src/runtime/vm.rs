use std::collections::HashMap;
use std::io::Write;

use tracing::trace;

use crate::bytecode::op::{ArrayKind, Constant, Insn, Label, PrintKind};
use crate::bytecode::stack_check::max_stack;
use crate::bytecode::ClassUnit;
use crate::runtime::runtime_error::RuntimeError;
use crate::runtime::value::{Value, format_bool};

#[derive(Debug, Clone)]
pub struct VmConfig {
    pub max_steps: Option<usize>,
    pub max_stack_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_steps: None,
            max_stack_size: 10_000,
        }
    }
}

/// Reference interpreter for compiled classes.
pub struct Vm {
    stack: Vec<Value>,
    config: VmConfig,
    steps: usize,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            stack: Vec::new(),
            config,
            steps: 0,
        }
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Runs the entry method of `class`, printing to `out`.
    pub fn run(&mut self, class: &ClassUnit, out: &mut dyn Write) -> Result<(), RuntimeError> {
        self.stack.clear();
        self.steps = 0;

        let code = &class.entry.code;
        max_stack(code).map_err(|e| RuntimeError::Verify(e.message))?;
        let labels: HashMap<Label, usize> = code
            .iter()
            .enumerate()
            .filter_map(|(ip, insn)| match insn {
                Insn::Label(label) => Some((*label, ip)),
                _ => None,
            })
            .collect();

        self.exec(code, &labels, out)
    }

    fn check_limits(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;

        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(RuntimeError::Limit(format!(
                    "execution step limit exceeded ({})",
                    max
                )));
            }
        }

        if self.stack.len() > self.config.max_stack_size {
            return Err(RuntimeError::Limit(format!(
                "stack size limit exceeded ({})",
                self.config.max_stack_size
            )));
        }

        Ok(())
    }

    fn exec(
        &mut self,
        code: &[Insn],
        labels: &HashMap<Label, usize>,
        out: &mut dyn Write,
    ) -> Result<(), RuntimeError> {
        let mut ip: usize = 0;

        while ip < code.len() {
            self.check_limits()?;
            let insn = &code[ip];
            trace!(ip, ?insn, depth = self.stack.len(), "exec");

            let mut jump: Option<Label> = None;
            match insn {
                Insn::Const(Constant::Int(n)) => self.push(Value::Int(*n)),
                Insn::Const(Constant::Bool(b)) => self.push(Value::Int(i32::from(*b))),
                Insn::Const(Constant::Str(s)) => self.push(Value::Str(s.as_str().into())),

                Insn::IAdd => self.binary(ip, |a, b| Ok(a.wrapping_add(b)))?,
                Insn::ISub => self.binary(ip, |a, b| Ok(a.wrapping_sub(b)))?,
                Insn::IMul => self.binary(ip, |a, b| Ok(a.wrapping_mul(b)))?,
                Insn::IDiv => self.binary(ip, |a, b| {
                    if b == 0 {
                        Err(RuntimeError::division_by_zero(ip))
                    } else {
                        Ok(a.wrapping_div(b))
                    }
                })?,
                Insn::IRem => self.binary(ip, |a, b| {
                    if b == 0 {
                        Err(RuntimeError::division_by_zero(ip))
                    } else {
                        Ok(a.wrapping_rem(b))
                    }
                })?,
                Insn::IShl => self.binary(ip, |a, b| Ok(a.wrapping_shl(b as u32)))?,
                Insn::IShr => self.binary(ip, |a, b| Ok(a.wrapping_shr(b as u32)))?,
                Insn::IUShr => {
                    self.binary(ip, |a, b| Ok((a as u32).wrapping_shr(b as u32) as i32))?
                }
                Insn::IAnd => self.binary(ip, |a, b| Ok(a & b))?,
                Insn::IOr => self.binary(ip, |a, b| Ok(a | b))?,
                Insn::IXor => self.binary(ip, |a, b| Ok(a ^ b))?,

                Insn::Dup => {
                    let a = self.pop(ip)?;
                    self.push(a.clone());
                    self.push(a);
                }
                Insn::DupX1 => {
                    let b = self.pop(ip)?;
                    let a = self.pop(ip)?;
                    self.push(b.clone());
                    self.push(a);
                    self.push(b);
                }
                Insn::Swap => {
                    let b = self.pop(ip)?;
                    let a = self.pop(ip)?;
                    self.push(b);
                    self.push(a);
                }
                Insn::Pop => {
                    self.pop(ip)?;
                }

                Insn::IfEq(target) => {
                    if self.pop_int(ip)? == 0 {
                        jump = Some(*target);
                    }
                }
                Insn::IfNull(target) => {
                    if matches!(self.pop(ip)?, Value::Null) {
                        jump = Some(*target);
                    }
                }
                Insn::IfICmpEq(target) => jump = self.compare(ip, *target, |a, b| a == b)?,
                Insn::IfICmpNe(target) => jump = self.compare(ip, *target, |a, b| a != b)?,
                Insn::IfICmpLt(target) => jump = self.compare(ip, *target, |a, b| a < b)?,
                Insn::IfICmpLe(target) => jump = self.compare(ip, *target, |a, b| a <= b)?,
                Insn::IfICmpGt(target) => jump = self.compare(ip, *target, |a, b| a > b)?,
                Insn::IfICmpGe(target) => jump = self.compare(ip, *target, |a, b| a >= b)?,
                Insn::Goto(target) => jump = Some(*target),
                Insn::Label(_) => {}

                Insn::NewArray(kind) => {
                    let len = self.pop_int(ip)?;
                    let len = usize::try_from(len)
                        .map_err(|_| RuntimeError::fault(ip, format!("negative array size {}", len)))?;
                    self.push(Value::new_array(kind.clone(), len));
                }
                Insn::ArrayStore(kind) => {
                    let value = self.pop(ip)?;
                    let index = self.pop_int(ip)?;
                    self.array_store(ip, kind, index, value)?;
                }

                Insn::GetPrintStream => self.push(Value::PrintStream),
                Insn::Println(kind) => {
                    let value = self.pop(ip)?;
                    match self.pop(ip)? {
                        Value::PrintStream => {}
                        other => {
                            return Err(RuntimeError::type_error(
                                ip,
                                "print stream",
                                other.type_name(),
                            ));
                        }
                    }
                    match (kind, &value) {
                        (PrintKind::Int, Value::Int(n)) => writeln!(out, "{}", n)?,
                        (PrintKind::Bool, Value::Int(n)) => writeln!(out, "{}", format_bool(*n))?,
                        (PrintKind::Object, _) => writeln!(out, "{}", value)?,
                        (_, other) => {
                            return Err(RuntimeError::type_error(ip, "int", other.type_name()));
                        }
                    }
                }

                Insn::Return => break,
            }

            ip = match jump {
                Some(label) => labels[&label],
                None => ip + 1,
            };
        }

        Ok(())
    }

    fn array_store(
        &mut self,
        ip: usize,
        kind: &ArrayKind,
        index: i32,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let Value::Array(array) = self.pop(ip)? else {
            return Err(RuntimeError::type_error(ip, "array", "non-array"));
        };
        let mut array = array.borrow_mut();
        if array.kind != *kind {
            return Err(RuntimeError::fault(ip, "array store of the wrong element kind"));
        }
        let len = array.items.len();
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| array.items.get_mut(i))
            .ok_or_else(|| {
                RuntimeError::fault(ip, format!("index {} out of bounds for length {}", index, len))
            })?;
        *slot = value;
        Ok(())
    }

    fn binary(
        &mut self,
        ip: usize,
        f: impl FnOnce(i32, i32) -> Result<i32, RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let b = self.pop_int(ip)?;
        let a = self.pop_int(ip)?;
        self.push(Value::Int(f(a, b)?));
        Ok(())
    }

    fn compare(
        &mut self,
        ip: usize,
        target: Label,
        f: impl FnOnce(i32, i32) -> bool,
    ) -> Result<Option<Label>, RuntimeError> {
        let b = self.pop_int(ip)?;
        let a = self.pop_int(ip)?;
        Ok(f(a, b).then_some(target))
    }

    // Stack operations

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self, ip: usize) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or_else(|| RuntimeError::stack_underflow(ip))
    }

    fn pop_int(&mut self, ip: usize) -> Result<i32, RuntimeError> {
        match self.pop(ip)? {
            Value::Int(n) => Ok(n),
            other => Err(RuntimeError::type_error(ip, "int", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::MethodBody;
    use crate::bytecode::emit::ENTRY_DESCRIPTOR;

    // ============================================================
    // Test Helpers
    // ============================================================

    fn class_from(mut code: Vec<Insn>) -> ClassUnit {
        code.push(Insn::Return);
        ClassUnit {
            name: "Main".to_string(),
            entry: MethodBody {
                name: "main".to_string(),
                descriptor: ENTRY_DESCRIPTOR.to_string(),
                max_stack: 0,
                code,
            },
        }
    }

    /// Runs code and returns the output and the final stack.
    fn run_code(code: Vec<Insn>) -> Result<(String, Vec<Value>), RuntimeError> {
        let mut vm = Vm::new();
        let mut out = Vec::new();
        vm.run(&class_from(code), &mut out)?;
        Ok((String::from_utf8_lossy(&out).into_owned(), vm.stack().to_vec()))
    }

    fn int(n: i32) -> Insn {
        Insn::Const(Constant::Int(n))
    }

    fn print(kind: PrintKind) -> [Insn; 3] {
        [Insn::GetPrintStream, Insn::Swap, Insn::Println(kind)]
    }

    fn eval_binary(a: i32, b: i32, op: Insn) -> Result<i32, RuntimeError> {
        let (_, stack) = run_code(vec![int(a), int(b), op])?;
        match stack.as_slice() {
            [Value::Int(n)] => Ok(*n),
            other => panic!("unexpected stack {:?}", other),
        }
    }

    #[test]
    fn test_arithmetic_wraps() {
        assert_eq!(eval_binary(i32::MAX, 1, Insn::IAdd).unwrap(), i32::MIN);
        assert_eq!(eval_binary(7, 2, Insn::IDiv).unwrap(), 3);
        assert_eq!(eval_binary(-7, 2, Insn::IRem).unwrap(), -1);
        assert_eq!(eval_binary(i32::MIN, -1, Insn::IDiv).unwrap(), i32::MIN);
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            eval_binary(1, 0, Insn::IDiv),
            Err(RuntimeError::Fault { .. })
        ));
        assert!(eval_binary(1, 0, Insn::IRem).is_err());
    }

    #[test]
    fn test_shifts_mask_count() {
        assert_eq!(eval_binary(1, 33, Insn::IShl).unwrap(), 2);
        assert_eq!(eval_binary(-8, 1, Insn::IShr).unwrap(), -4);
        assert_eq!(eval_binary(-1, 28, Insn::IUShr).unwrap(), 15);
    }

    #[test]
    fn test_print_overloads() {
        let mut code = vec![int(3)];
        code.extend(print(PrintKind::Int));
        code.push(int(1));
        code.extend(print(PrintKind::Bool));
        code.push(Insn::Const(Constant::Str("hi".to_string())));
        code.extend(print(PrintKind::Object));
        let (out, stack) = run_code(code).unwrap();
        assert_eq!(out, "3\ntrue\nhi\n");
        assert!(stack.is_empty());
    }

    #[test]
    fn test_array_build_and_print() {
        let kind = ArrayKind::Bool;
        let mut code = vec![
            Insn::Const(Constant::Bool(true)),
            Insn::Const(Constant::Bool(false)),
            int(2),
            Insn::NewArray(kind.clone()),
        ];
        for index in [1, 0] {
            code.extend([
                Insn::DupX1,
                Insn::Swap,
                int(index),
                Insn::Swap,
                Insn::ArrayStore(kind.clone()),
            ]);
        }
        code.extend(print(PrintKind::Object));
        let (out, _) = run_code(code).unwrap();
        assert_eq!(out, "[true, false]\n");
    }

    #[test]
    fn test_branches() {
        let (skip, end) = (Label(0), Label(1));
        let code = vec![
            int(1),
            int(2),
            Insn::IfICmpGe(skip),
            int(10),
            Insn::Goto(end),
            Insn::Label(skip),
            int(20),
            Insn::Label(end),
        ];
        let (_, stack) = run_code(code).unwrap();
        assert_eq!(stack, vec![Value::Int(10)]);
    }

    #[test]
    fn test_ifnull_on_string() {
        let skip = Label(0);
        let code = vec![
            Insn::Const(Constant::Str("x".to_string())),
            Insn::IfNull(skip),
            int(1),
            Insn::Pop,
            Insn::Label(skip),
        ];
        assert!(run_code(code).is_ok());
    }

    #[test]
    fn test_step_limit() {
        let head = Label(0);
        let class = class_from(vec![Insn::Label(head), Insn::Goto(head)]);
        let mut vm = Vm::with_config(VmConfig {
            max_steps: Some(100),
            ..VmConfig::default()
        });
        let err = vm.run(&class, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, RuntimeError::Limit(_)));
    }

    #[test]
    fn test_rejects_unbalanced_code() {
        let err = run_code(vec![Insn::IAdd]).unwrap_err();
        assert!(matches!(err, RuntimeError::Verify(_)));
    }
}
