use crate::bytecode::stack_check::StackCheckError;
use crate::frontend::ParseError;
use crate::types::{TypeStack, UnboundGeneric};

/// Why a compilation failed. Every variant is fatal for the whole unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("syntax error: {0}")]
    Grammar(#[from] ParseError),

    /// No alternative of a rule matched the live stack.
    #[error("type error: `{name}` expects {rule}, stack is {stack}")]
    TypeMismatch {
        name: String,
        rule: String,
        stack: String,
    },

    /// An array literal mixes element types.
    #[error("type error: array literal mixes {expected} and {found}")]
    Homogeneity { expected: String, found: String },

    /// Stack shapes disagree where control flow merges.
    #[error("type error: {construct} leaves {actual} where {expected} is required")]
    ControlFlowJoin {
        construct: &'static str,
        expected: String,
        actual: String,
    },

    #[error("unresolved identifier `{name}`\n  hint: inlines must be declared before their first use")]
    UnresolvedIdentifier { name: String },

    /// Valid syntax without code generation behavior.
    #[error("unsupported: {feature}")]
    UnsupportedFeature { feature: String },

    #[error("inline `{name}` expands itself (via {})", .chain.join(" -> "))]
    RecursiveInline { name: String, chain: Vec<String> },

    /// A built-in rule is malformed. Never caused by user programs.
    #[error("internal error: rule `{name}`: {source}")]
    RuleDefinition {
        name: String,
        source: UnboundGeneric,
    },

    #[error("no `{name}` function to use as entry point")]
    MissingEntryPoint { name: String },

    #[error("internal error: {0}")]
    StackDepth(#[from] StackCheckError),
}

impl CompileError {
    pub fn type_mismatch(name: impl Into<String>, rule: impl ToString, stack: &TypeStack) -> Self {
        CompileError::TypeMismatch {
            name: name.into(),
            rule: rule.to_string(),
            stack: stack.to_string(),
        }
    }

    pub fn join(construct: &'static str, expected: &TypeStack, actual: &TypeStack) -> Self {
        CompileError::ControlFlowJoin {
            construct,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn unsupported(feature: impl Into<String>) -> Self {
        CompileError::UnsupportedFeature {
            feature: feature.into(),
        }
    }

    pub fn unresolved(name: &str) -> Self {
        CompileError::UnresolvedIdentifier {
            name: name.to_string(),
        }
    }

    /// Whether the program is ill-typed, as opposed to using something the
    /// compiler cannot generate code for or failing internally.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            CompileError::TypeMismatch { .. }
                | CompileError::Homogeneity { .. }
                | CompileError::ControlFlowJoin { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn test_type_mismatch_reports_rule_and_stack() {
        let stack: TypeStack = [Type::Bool].into_iter().collect();
        let err = CompileError::type_mismatch("+", "{ I I -> I }", &stack);
        assert_eq!(
            err.to_string(),
            "type error: `+` expects { I I -> I }, stack is [ B ]"
        );
        assert!(err.is_type_error());
    }

    #[test]
    fn test_join_error() {
        let before = TypeStack::new();
        let after: TypeStack = [Type::Int].into_iter().collect();
        let err = CompileError::join("while loop", &before, &after);
        assert_eq!(
            err.to_string(),
            "type error: while loop leaves [ I ] where [ ] is required"
        );
        assert!(err.is_type_error());
    }

    #[test]
    fn test_unsupported_is_not_type_error() {
        let err = CompileError::unsupported("operator `**`");
        assert_eq!(err.to_string(), "unsupported: operator `**`");
        assert!(!err.is_type_error());
        assert!(!CompileError::unresolved("foo").is_type_error());
    }

    #[test]
    fn test_unresolved_has_hint() {
        let msg = CompileError::unresolved("foo").to_string();
        assert!(msg.starts_with("unresolved identifier `foo`"));
        assert!(msg.contains("hint:"));
    }

    #[test]
    fn test_recursive_inline_shows_chain() {
        let err = CompileError::RecursiveInline {
            name: "a".to_string(),
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "inline `a` expands itself (via a -> b -> a)");
    }

    #[test]
    fn test_from_parse_error() {
        let parse = ParseError {
            line: 1,
            col: 4,
            expected: vec!["`end`".to_string()],
            found: "end of input".to_string(),
        };
        let err: CompileError = parse.into();
        assert!(matches!(err, CompileError::Grammar(_)));
        assert_eq!(
            err.to_string(),
            "syntax error: 1:4: expected `end`, found end of input"
        );
    }
}
