//! Compile-time model of the operand stack.
//!
//! [`TypeStack`] tracks what is on the target stack at each program point
//! and [`Rule`]s describe how each operation rewrites it.

pub mod rule;
pub mod ty;
pub mod type_stack;

pub use rule::{Chained, Rule, TransformRule};
pub use ty::Type;
pub use type_stack::{TypeStack, UnboundGeneric};
