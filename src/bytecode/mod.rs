pub mod compile_error;
pub mod disasm;
pub mod emit;
pub mod ir;
pub mod op;
pub mod rules;
pub mod stack_check;

pub use compile_error::CompileError;
pub use emit::{Compilation, CompilerConfig, Emitter};
pub use ir::{ClassUnit, CodeBuffer, MethodBody};
pub use op::Insn;
