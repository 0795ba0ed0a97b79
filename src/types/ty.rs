/// Static type of one abstract stack slot.
///
/// Equality is structural. `Generic` only appears inside rule patterns and
/// is always resolved before anything is pushed onto a [`TypeStack`].
///
/// [`TypeStack`]: super::TypeStack
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,

    /// Pattern variable, bound per rule application. With `reference` set
    /// it only binds to a `Reference`.
    Generic { ident: String, reference: bool },

    /// Object reference, named by its class (`java/lang/String`).
    Reference(String),

    Array(Box<Type>),

    /// Compile-time marker with no runtime slot, e.g. the `[` that opens an
    /// array literal.
    Symbol(String),

    Func { inputs: Vec<Type>, outputs: Vec<Type> },
}

impl Type {
    pub fn generic(ident: &str) -> Self {
        Type::Generic {
            ident: ident.to_string(),
            reference: false,
        }
    }

    /// A generic that only matches reference types.
    pub fn generic_ref(ident: &str) -> Self {
        Type::Generic {
            ident: ident.to_string(),
            reference: true,
        }
    }

    pub fn string() -> Self {
        Type::Reference("java/lang/String".to_string())
    }

    pub fn array(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    pub fn symbol(marker: &str) -> Self {
        Type::Symbol(marker.to_string())
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "I"),
            Type::Bool => write!(f, "B"),
            Type::Generic { ident, reference } => {
                write!(f, "${}{}", if *reference { "*" } else { "" }, ident)
            }
            Type::Reference(class) => write!(f, "*{}", class),
            Type::Array(element) => write!(f, "[{}", element),
            Type::Symbol(marker) => write!(f, ":{}", marker),
            Type::Func { inputs, outputs } => {
                write!(f, "(")?;
                for t in inputs {
                    write!(f, "{} ", t)?;
                }
                write!(f, "--")?;
                for t in outputs {
                    write!(f, " {}", t)?;
                }
                write!(f, ")")
            }
        }
    }
}
