use super::keyword::Keyword;
use super::literal::Literal;

/// One statement of a code body.
///
/// Statements nest through `While` and `If`; every nested sequence is owned
/// by its parent statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// An operator token such as `+`, `dup` or `]`.
    Keyword(Keyword),

    /// Push a literal.
    ///
    /// Stack effect: `( -- x )`
    Literal(Literal),

    /// Either the print word or the name of an inline unit.
    Ident(String),

    /// `while <cond> do <body> end`
    While {
        cond: Vec<Statement>,
        body: Vec<Statement>,
    },

    /// `if <true_body> [else <false_body>] end`
    ///
    /// The branch condition is taken from the stack, not from a block.
    If {
        true_body: Vec<Statement>,
        false_body: Option<Vec<Statement>>,
    },
}

impl Statement {
    /// Short human-readable name, used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Statement::Keyword(k) => k.token().to_string(),
            Statement::Literal(l) => l.to_string(),
            Statement::Ident(name) => name.clone(),
            Statement::While { .. } => "while".to_string(),
            Statement::If { .. } => "if".to_string(),
        }
    }
}
