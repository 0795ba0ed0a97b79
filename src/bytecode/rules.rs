//! Stack-effect rules of the built-in operations.
//!
//! Each rule pairs a type pattern with the instructions it emits. Rules
//! with several alternatives are tried in the order they are chained.

use crate::bytecode::op::{Constant, Insn, Label, PrintKind};
use crate::lang::{Keyword, Literal};
use crate::types::{Rule, TransformRule, Type};

pub type BoxedRule = Box<dyn TransformRule>;

/// Marker pushed by `[` and collected by `]`.
pub const ARRAY_OPEN: &str = "[";

fn binary_int(insn: Insn) -> Rule<'static> {
    Rule::new(vec![Type::Int, Type::Int], vec![Type::Int], move |code| {
        code.emit(insn.clone())
    })
}

fn unary_int(operand: i32, insn: Insn) -> Rule<'static> {
    Rule::new(vec![Type::Int], vec![Type::Int], move |code| {
        code.emit(Insn::Const(Constant::Int(operand)));
        code.emit(insn.clone());
    })
}

/// `( x x -- B )`, pushing 1 unless `branch_if_false` jumps.
fn comparison(operand: Type, branch_if_false: fn(Label) -> Insn) -> Rule<'static> {
    Rule::new(vec![operand.clone(), operand], vec![Type::Bool], move |code| {
        let when_false = code.new_label();
        let next = code.new_label();
        code.emit(branch_if_false(when_false));
        code.emit(Insn::Const(Constant::Int(1)));
        code.emit(Insn::Goto(next));
        code.place(when_false);
        code.emit(Insn::Const(Constant::Int(0)));
        code.place(next);
    })
}

/// Rule for an operator token.
///
/// `None` for the tokens the emitter handles itself: `]` collects a
/// variable number of elements, `??` only dumps the stack and `**` has no
/// code generation.
pub fn keyword_rule(keyword: Keyword) -> Option<BoxedRule> {
    let a = || Type::generic("a");
    let b = || Type::generic("b");

    let rule: BoxedRule = match keyword {
        Keyword::Add => Box::new(binary_int(Insn::IAdd)),
        Keyword::Sub => Box::new(binary_int(Insn::ISub)),
        Keyword::Mul => Box::new(binary_int(Insn::IMul)),
        Keyword::Div => Box::new(binary_int(Insn::IDiv)),
        Keyword::Mod => Box::new(binary_int(Insn::IRem)),
        Keyword::Shl => Box::new(binary_int(Insn::IShl)),
        Keyword::Sshr => Box::new(binary_int(Insn::IShr)),
        Keyword::Shr => Box::new(binary_int(Insn::IUShr)),
        Keyword::BitAnd => Box::new(binary_int(Insn::IAnd)),
        Keyword::BitOr => Box::new(binary_int(Insn::IOr)),
        Keyword::BitXor => Box::new(binary_int(Insn::IXor)),

        Keyword::Inc => Box::new(unary_int(1, Insn::IAdd)),
        Keyword::Dec => Box::new(unary_int(1, Insn::ISub)),
        Keyword::BitNot => Box::new(unary_int(-1, Insn::IXor)),
        Keyword::Not => Box::new(Rule::new(vec![Type::Bool], vec![Type::Bool], |code| {
            code.emit(Insn::Const(Constant::Int(1)));
            code.emit(Insn::IXor);
        })),

        Keyword::Lt => Box::new(comparison(Type::Int, Insn::IfICmpGe)),
        Keyword::Lte => Box::new(comparison(Type::Int, Insn::IfICmpGt)),
        Keyword::Gt => Box::new(comparison(Type::Int, Insn::IfICmpLe)),
        Keyword::Gte => Box::new(comparison(Type::Int, Insn::IfICmpLt)),
        Keyword::Eq => Box::new(
            comparison(Type::Int, Insn::IfICmpNe).or(comparison(Type::Bool, Insn::IfICmpNe)),
        ),
        Keyword::Neq => Box::new(
            comparison(Type::Int, Insn::IfICmpEq).or(comparison(Type::Bool, Insn::IfICmpEq)),
        ),

        Keyword::Dup => Box::new(Rule::new(vec![a()], vec![a(), a()], |code| {
            code.emit(Insn::Dup)
        })),
        Keyword::Over => Box::new(Rule::new(vec![a(), b()], vec![a(), b(), a()], |code| {
            code.emit(Insn::Swap);
            code.emit(Insn::DupX1);
        })),
        Keyword::Swap => Box::new(Rule::new(vec![a(), b()], vec![b(), a()], |code| {
            code.emit(Insn::Swap)
        })),
        Keyword::Drop => Box::new(Rule::new(vec![a()], vec![], |code| code.emit(Insn::Pop))),

        Keyword::ArrStart => Box::new(Rule::pure(vec![], vec![Type::symbol(ARRAY_OPEN)])),

        Keyword::ArrEnd | Keyword::Hole | Keyword::Pow => return None,
    };
    Some(rule)
}

/// `( -- x )` for a literal already narrowed to a 32-bit constant.
pub fn literal_rule(literal: &Literal, constant: Constant) -> Rule<'static> {
    let ty = match literal {
        Literal::Int(_) => Type::Int,
        Literal::Bool(_) => Type::Bool,
        Literal::Str(_) => Type::string(),
    };
    Rule::new(vec![], vec![ty], move |code| {
        code.emit(Insn::Const(constant.clone()))
    })
}

fn print_as(ty: Type, kind: PrintKind) -> Rule<'static> {
    Rule::new(vec![ty], vec![], move |code| {
        code.emit(Insn::GetPrintStream);
        code.emit(Insn::Swap);
        code.emit(Insn::Println(kind));
    })
}

/// `( x -- )`, printing `x` on its own line.
pub fn print_rule() -> impl TransformRule {
    print_as(Type::Int, PrintKind::Int)
        .or(print_as(Type::Bool, PrintKind::Bool))
        .or(print_as(Type::generic("a"), PrintKind::Object))
}

/// `( cond -- )`, jumping to `target` when `cond` is zero, false or null.
pub fn jump_if_false(target: Label) -> impl TransformRule {
    Rule::new(vec![Type::Int], vec![], move |code| code.emit(Insn::IfEq(target)))
        .or(Rule::new(vec![Type::generic_ref("a")], vec![], move |code| {
            code.emit(Insn::IfNull(target))
        }))
        .or(Rule::new(vec![Type::Bool], vec![], move |code| {
            code.emit(Insn::IfEq(target))
        }))
}
