use std::fmt::Write;

use crate::bytecode::ClassUnit;
use crate::bytecode::op::{ArrayKind, Constant, Insn, PrintKind};

/// Render a human-readable listing of a compiled unit.
pub fn disassemble(unit: &ClassUnit) -> String {
    let method = &unit.entry;
    let mut out = String::new();

    let _ = writeln!(out, "════════════════════════════════════════");
    let _ = writeln!(out, " {}.{}{}", unit.name, method.name, method.descriptor);
    let _ = writeln!(
        out,
        " {} instructions, max stack {}",
        method.code.iter().filter(|i| !matches!(i, Insn::Label(_))).count(),
        method.max_stack
    );
    let _ = writeln!(out, "════════════════════════════════════════");
    out.push_str(&disassemble_code(&method.code));
    out
}

/// Disassemble a slice of instructions, one per line.
///
/// Label markers get a line of their own and do not take an address.
pub fn disassemble_code(code: &[Insn]) -> String {
    let mut out = String::new();
    let mut ip = 0;

    for insn in code {
        match insn {
            Insn::Label(label) => {
                let _ = writeln!(out, "      ┌─ {}", label);
            }
            _ => {
                let _ = writeln!(out, "{:04}  {}", ip, format_insn(insn));
                ip += 1;
            }
        }
    }

    out
}

pub fn format_insn(insn: &Insn) -> String {
    match insn {
        Insn::Const(c) => format!("{:<14}{}", op_name(insn), format_constant(c)),
        Insn::NewArray(kind) | Insn::ArrayStore(kind) => {
            format!("{:<14}{}", op_name(insn), format_array_kind(kind))
        }
        Insn::Println(kind) => format!("{:<14}{}", op_name(insn), format_print_kind(*kind)),
        other => match other.branch_target() {
            Some(label) => format!("{:<14}{}", op_name(other), label),
            None => op_name(other).to_string(),
        },
    }
}

fn format_constant(c: &Constant) -> String {
    match c {
        Constant::Int(n) => n.to_string(),
        Constant::Bool(b) => b.to_string(),
        Constant::Str(s) => format!("{:?}", s),
    }
}

fn format_array_kind(kind: &ArrayKind) -> String {
    match kind {
        ArrayKind::Int => "int".to_string(),
        ArrayKind::Bool => "boolean".to_string(),
        ArrayKind::Reference(class) => class.clone(),
    }
}

fn format_print_kind(kind: PrintKind) -> &'static str {
    match kind {
        PrintKind::Int => "(I)V",
        PrintKind::Bool => "(Z)V",
        PrintKind::Object => "(Ljava/lang/Object;)V",
    }
}

fn op_name(insn: &Insn) -> &'static str {
    match insn {
        Insn::Const(_) => "LDC",
        Insn::IAdd => "IADD",
        Insn::ISub => "ISUB",
        Insn::IMul => "IMUL",
        Insn::IDiv => "IDIV",
        Insn::IRem => "IREM",
        Insn::IShl => "ISHL",
        Insn::IShr => "ISHR",
        Insn::IUShr => "IUSHR",
        Insn::IAnd => "IAND",
        Insn::IOr => "IOR",
        Insn::IXor => "IXOR",
        Insn::Dup => "DUP",
        Insn::DupX1 => "DUP_X1",
        Insn::Swap => "SWAP",
        Insn::Pop => "POP",
        Insn::IfEq(_) => "IFEQ",
        Insn::IfNull(_) => "IFNULL",
        Insn::IfICmpEq(_) => "IF_ICMPEQ",
        Insn::IfICmpNe(_) => "IF_ICMPNE",
        Insn::IfICmpLt(_) => "IF_ICMPLT",
        Insn::IfICmpLe(_) => "IF_ICMPLE",
        Insn::IfICmpGt(_) => "IF_ICMPGT",
        Insn::IfICmpGe(_) => "IF_ICMPGE",
        Insn::Goto(_) => "GOTO",
        Insn::Label(_) => "LABEL",
        Insn::NewArray(ArrayKind::Reference(_)) => "ANEWARRAY",
        Insn::NewArray(_) => "NEWARRAY",
        Insn::ArrayStore(ArrayKind::Int) => "IASTORE",
        Insn::ArrayStore(ArrayKind::Bool) => "BASTORE",
        Insn::ArrayStore(ArrayKind::Reference(_)) => "AASTORE",
        Insn::GetPrintStream => "GETSTATIC",
        Insn::Println(_) => "INVOKEVIRTUAL",
        Insn::Return => "RETURN",
    }
}
