use std::collections::HashMap;
use std::rc::Rc;

use super::ty::Type;

/// A rule whose output names a generic its input never binds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("output generic `{generic}` does not appear in the input pattern")]
pub struct UnboundGeneric {
    pub generic: String,
}

struct Node {
    ty: Type,
    next: Option<Rc<Node>>,
}

/// Persistent stack of types, used to model the target operand stack at
/// compile time.
///
/// Nodes are shared between clones, so cloning before checking a branch
/// only copies the head pointer. Pushing or popping on one clone never
/// affects another.
#[derive(Clone, Default)]
pub struct TypeStack {
    top: Option<Rc<Node>>,
    len: usize,
}

impl TypeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    pub fn push(&mut self, ty: Type) {
        let next = self.top.take();
        self.top = Some(Rc::new(Node { ty, next }));
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<Type> {
        let node = self.top.take()?;
        self.top = node.next.clone();
        self.len -= 1;
        Some(node.ty.clone())
    }

    pub fn peek(&self) -> Option<&Type> {
        self.top.as_deref().map(|n| &n.ty)
    }

    /// Iterates from the top of the stack down.
    pub fn iter(&self) -> impl Iterator<Item = &Type> {
        std::iter::successors(self.top.as_deref(), |n| n.next.as_deref()).map(|n| &n.ty)
    }

    /// Applies a stack effect to a copy of this stack.
    ///
    /// `input` is matched against the top of the stack, its last element
    /// against the topmost slot. Generics bind on first sight and must
    /// match the same type on every later occurrence; bindings live only
    /// for this call. On a match, `output` is pushed in order with generics
    /// resolved and the new stack is returned. On a mismatch `Ok(None)` is
    /// returned and `self` is untouched either way.
    pub fn transformed(
        &self,
        input: &[Type],
        output: &[Type],
    ) -> Result<Option<TypeStack>, UnboundGeneric> {
        check_output_generics(input, output)?;

        let mut next = self.clone();
        let mut binds: HashMap<&str, Type> = HashMap::new();

        for pattern in input.iter().rev() {
            let Some(actual) = next.pop() else {
                return Ok(None);
            };
            if !reconcile(pattern, actual, &mut binds) {
                return Ok(None);
            }
        }

        for t in output {
            let resolved = match t {
                Type::Generic { ident, .. } => match binds.get(ident.as_str()) {
                    Some(bound) => bound.clone(),
                    None => {
                        return Err(UnboundGeneric {
                            generic: ident.clone(),
                        });
                    }
                },
                other => other.clone(),
            };
            next.push(resolved);
        }

        Ok(Some(next))
    }
}

fn check_output_generics(input: &[Type], output: &[Type]) -> Result<(), UnboundGeneric> {
    for t in output {
        if let Type::Generic { ident, .. } = t {
            let bound = input
                .iter()
                .any(|i| matches!(i, Type::Generic { ident: other, .. } if other == ident));
            if !bound {
                return Err(UnboundGeneric {
                    generic: ident.clone(),
                });
            }
        }
    }
    Ok(())
}

fn reconcile<'p>(pattern: &'p Type, actual: Type, binds: &mut HashMap<&'p str, Type>) -> bool {
    match pattern {
        Type::Generic { ident, reference } => {
            if matches!(actual, Type::Symbol(_)) {
                return false;
            }
            if *reference && !matches!(actual, Type::Reference(_)) {
                return false;
            }
            match binds.get(ident.as_str()) {
                Some(bound) => *bound == actual,
                None => {
                    binds.insert(ident.as_str(), actual);
                    true
                }
            }
        }
        concrete => *concrete == actual,
    }
}

impl PartialEq for TypeStack {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        match (&self.top, &other.top) {
            (Some(a), Some(b)) if Rc::ptr_eq(a, b) => true,
            _ => self.iter().eq(other.iter()),
        }
    }
}

impl Eq for TypeStack {}

impl std::fmt::Display for TypeStack {
    /// Bottom to top: `[ I B ]`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&Type> = self.iter().collect();
        types.reverse();
        write!(f, "[")?;
        for t in types {
            write!(f, " {}", t)?;
        }
        write!(f, " ]")
    }
}

impl std::fmt::Debug for TypeStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeStack{}", self)
    }
}

impl FromIterator<Type> for TypeStack {
    /// Builds a stack from bottom to top.
    fn from_iter<I: IntoIterator<Item = Type>>(iter: I) -> Self {
        let mut stack = TypeStack::new();
        for t in iter {
            stack.push(t);
        }
        stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(types: &[Type]) -> TypeStack {
        types.iter().cloned().collect()
    }

    #[test]
    fn test_push_pop_peek() {
        let mut s = TypeStack::new();
        assert!(s.is_empty());
        s.push(Type::Int);
        s.push(Type::Bool);
        assert_eq!(s.len(), 2);
        assert_eq!(s.peek(), Some(&Type::Bool));
        assert_eq!(s.pop(), Some(Type::Bool));
        assert_eq!(s.pop(), Some(Type::Int));
        assert_eq!(s.pop(), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let base = stack(&[Type::Int]);
        let mut branch = base.clone();
        branch.push(Type::Bool);
        assert_eq!(base.len(), 1);
        assert_eq!(branch.len(), 2);
        assert_ne!(base, branch);
        branch.pop();
        assert_eq!(base, branch);
    }

    #[test]
    fn test_display_bottom_to_top() {
        assert_eq!(stack(&[Type::Int, Type::Bool]).to_string(), "[ I B ]");
        assert_eq!(TypeStack::new().to_string(), "[ ]");
    }

    #[test]
    fn test_concrete_match() {
        let s = stack(&[Type::Bool, Type::Int, Type::Int]);
        let out = s
            .transformed(&[Type::Int, Type::Int], &[Type::Int])
            .unwrap()
            .unwrap();
        assert_eq!(out, stack(&[Type::Bool, Type::Int]));
        // the source stack is untouched
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_mismatch_leaves_stack_unchanged() {
        let s = stack(&[Type::Int, Type::Bool]);
        let before = s.clone();
        assert!(s.transformed(&[Type::Int, Type::Int], &[]).unwrap().is_none());
        assert_eq!(s, before);
    }

    #[test]
    fn test_underflow_fails() {
        let s = stack(&[Type::Int]);
        assert!(s.transformed(&[Type::Int, Type::Int], &[]).unwrap().is_none());
    }

    #[test]
    fn test_pattern_order_top_is_last() {
        let s = stack(&[Type::Int, Type::Bool]);
        assert!(s.transformed(&[Type::Int, Type::Bool], &[]).unwrap().is_some());
        assert!(s.transformed(&[Type::Bool, Type::Int], &[]).unwrap().is_none());
    }

    #[test]
    fn test_generic_swap() {
        let s = stack(&[Type::Int, Type::string()]);
        let out = s
            .transformed(
                &[Type::generic("a"), Type::generic("b")],
                &[Type::generic("b"), Type::generic("a")],
            )
            .unwrap()
            .unwrap();
        assert_eq!(out, stack(&[Type::string(), Type::Int]));
    }

    #[test]
    fn test_repeated_generic_must_agree() {
        let pattern = [Type::generic("a"), Type::generic("a")];
        let same = stack(&[Type::Int, Type::Int]);
        let mixed = stack(&[Type::Int, Type::Bool]);
        assert!(same.transformed(&pattern, &[]).unwrap().is_some());
        assert!(mixed.transformed(&pattern, &[]).unwrap().is_none());
    }

    #[test]
    fn test_reference_generic() {
        let pattern = [Type::generic_ref("a")];
        assert!(
            stack(&[Type::string()])
                .transformed(&pattern, &[])
                .unwrap()
                .is_some()
        );
        assert!(
            stack(&[Type::Int])
                .transformed(&pattern, &[])
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_generic_never_binds_symbol() {
        let s = stack(&[Type::symbol("[")]);
        assert!(
            s.transformed(&[Type::generic("a")], &[Type::generic("a")])
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_unbound_output_generic_is_error() {
        let s = stack(&[Type::Int]);
        let err = s
            .transformed(&[Type::Int], &[Type::generic("z")])
            .unwrap_err();
        assert_eq!(err.generic, "z");
        // reported even when the input would not match
        assert!(
            TypeStack::new()
                .transformed(&[Type::Int], &[Type::generic("z")])
                .is_err()
        );
    }

    #[test]
    fn test_structural_equality_across_histories() {
        let mut a = TypeStack::new();
        a.push(Type::Int);
        let mut b = TypeStack::new();
        b.push(Type::Bool);
        b.pop();
        b.push(Type::Int);
        assert_eq!(a, b);
    }
}
