use std::fmt;

use super::ty::Type;
use super::type_stack::{TypeStack, UnboundGeneric};
use crate::bytecode::CodeBuffer;

/// Instructions emitted when a rule matches.
pub type Effect<'a> = Box<dyn Fn(&mut CodeBuffer) + 'a>;

/// Something that can be applied to the live type stack, emitting code on
/// success.
pub trait TransformRule: fmt::Display {
    /// Tries to apply the rule.
    ///
    /// Returns `Ok(true)` after rewriting `stack` and emitting into `code`,
    /// `Ok(false)` with both left untouched when the stack does not match.
    fn apply(&self, stack: &mut TypeStack, code: &mut CodeBuffer) -> Result<bool, UnboundGeneric>;

    /// Falls back to `other` when `self` does not match.
    fn or<R: TransformRule>(self, other: R) -> Chained<Self, R>
    where
        Self: Sized,
    {
        Chained {
            first: self,
            second: other,
        }
    }
}

/// A single stack effect `( input -- output )` with its instructions.
pub struct Rule<'a> {
    input: Vec<Type>,
    output: Vec<Type>,
    effect: Effect<'a>,
}

impl<'a> Rule<'a> {
    pub fn new(input: Vec<Type>, output: Vec<Type>, effect: impl Fn(&mut CodeBuffer) + 'a) -> Self {
        Self {
            input,
            output,
            effect: Box::new(effect),
        }
    }

    /// A rule that only changes types and emits nothing.
    pub fn pure(input: Vec<Type>, output: Vec<Type>) -> Self {
        Self::new(input, output, |_| {})
    }
}

impl TransformRule for Rule<'_> {
    fn apply(&self, stack: &mut TypeStack, code: &mut CodeBuffer) -> Result<bool, UnboundGeneric> {
        match stack.transformed(&self.input, &self.output)? {
            Some(next) => {
                (self.effect)(code);
                *stack = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl fmt::Display for Rule<'_> {
    /// `{ I I -> I }`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for t in &self.input {
            write!(f, " {}", t)?;
        }
        write!(f, " ->")?;
        for t in &self.output {
            write!(f, " {}", t)?;
        }
        write!(f, " }}")
    }
}

/// Ordered alternatives, built with [`TransformRule::or`].
pub struct Chained<A, B> {
    first: A,
    second: B,
}

impl<A: TransformRule, B: TransformRule> TransformRule for Chained<A, B> {
    fn apply(&self, stack: &mut TypeStack, code: &mut CodeBuffer) -> Result<bool, UnboundGeneric> {
        if self.first.apply(stack, code)? {
            return Ok(true);
        }
        self.second.apply(stack, code)
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for Chained<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ {} OR {} }}", self.first, self.second)
    }
}

impl<T: TransformRule + ?Sized> TransformRule for Box<T> {
    fn apply(&self, stack: &mut TypeStack, code: &mut CodeBuffer) -> Result<bool, UnboundGeneric> {
        (**self).apply(stack, code)
    }
}
