//! Compiler for a small concatenative language targeting a JVM-style stack
//! machine.
//!
//! Source is parsed into a [`lang::CodeUnit`] tree, then a single pass
//! type-checks the entry function against an abstract operand stack and
//! emits instructions as it goes. The result is a [`ClassUnit`] that can be
//! serialized with postcard or run on the reference [`runtime::Vm`].

pub mod bytecode;
pub mod frontend;
pub mod lang;
pub mod runtime;
pub mod types;

pub use bytecode::{ClassUnit, Compilation, CompileError, CompilerConfig};

/// Compiles `source` with the default configuration.
pub fn compile(source: &str) -> Result<Compilation, CompileError> {
    compile_with_config(source, &CompilerConfig::default())
}

pub fn compile_with_config(
    source: &str,
    config: &CompilerConfig,
) -> Result<Compilation, CompileError> {
    let program = frontend::parse_program(source)?;
    bytecode::Emitter::new(config).emit_program(&program)
}
