use super::statement::Statement;

/// A top-level unit of a program.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeUnit {
    /// `inline <name> <body> end`: substituted wherever `name` is used.
    Inline { name: String, body: Vec<Statement> },

    /// `fn <name> -> do <body> end`
    Func { name: String, body: Vec<Statement> },

    /// `module <name> <units> end`
    Module { name: String, nested: Vec<CodeUnit> },
}

impl CodeUnit {
    pub fn name(&self) -> &str {
        match self {
            CodeUnit::Inline { name, .. }
            | CodeUnit::Func { name, .. }
            | CodeUnit::Module { name, .. } => name,
        }
    }
}
