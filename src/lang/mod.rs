//! # Abstract Syntax Tree
//!
//! Produced by the parser and consumed by the emitter.
//!
//! ## Documentation conventions
//!
//! - Stack effects are written as `( before -- after )`.
//! - A whole program is a single `CodeUnit::Module` named `default`.

pub mod code_unit;
pub mod keyword;
pub mod literal;
pub mod statement;

pub use code_unit::CodeUnit;
pub use keyword::Keyword;
pub use literal::Literal;
pub use statement::Statement;
