use serde::{Deserialize, Serialize};

/// Operator token of the language.
///
/// The set is closed: each variant has exactly one canonical spelling and
/// one stack-effect rule in the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    // ───────────────────────────── Arithmetic ───────────────────────────
    /// `( a b -- a+b )`
    Add,
    /// `( a b -- a-b )`
    Sub,
    /// `( a -- a+1 )`
    Inc,
    /// `( a -- a-1 )`
    Dec,
    /// `( a b -- a*b )`
    Mul,
    /// `( a b -- a/b )`
    Div,
    /// `( a b -- a%b )`
    Mod,
    /// Exponentiation. Parsed, but has no code generation.
    Pow,

    // ─────────────────────────── Bitwise / shifts ───────────────────────
    /// Logical (unsigned) shift right.
    Shr,
    /// Arithmetic (signed) shift right.
    Sshr,
    Shl,
    BitAnd,
    BitOr,
    BitXor,
    /// `( a -- ~a )`
    BitNot,

    // ───────────────────────────── Comparison ───────────────────────────
    /// `( b -- !b )`
    Not,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,

    // ─────────────────────────── Stack shuffles ─────────────────────────
    /// `( x -- x x )`
    Dup,
    /// `( a b -- a b a )`
    Over,
    /// `( a b -- b a )`
    Swap,
    /// `( x -- )`
    Drop,

    // ─────────────────────────── Array literals ─────────────────────────
    ArrStart,
    ArrEnd,

    /// Debug marker: dumps the abstract stack at compile time.
    Hole,
}

impl Keyword {
    /// Every keyword, ordered longest token first so that a prefix match
    /// never shadows a longer operator (`>>>` before `>>` before `>`).
    pub const BY_TOKEN_LENGTH: [Keyword; 29] = [
        Keyword::Over,
        Keyword::Swap,
        Keyword::Drop,
        Keyword::Shr,
        Keyword::Dup,
        Keyword::Inc,
        Keyword::Dec,
        Keyword::Pow,
        Keyword::Sshr,
        Keyword::Shl,
        Keyword::Eq,
        Keyword::Neq,
        Keyword::Gte,
        Keyword::Lte,
        Keyword::Hole,
        Keyword::Add,
        Keyword::Sub,
        Keyword::Mul,
        Keyword::Div,
        Keyword::Mod,
        Keyword::BitAnd,
        Keyword::BitOr,
        Keyword::BitXor,
        Keyword::BitNot,
        Keyword::Not,
        Keyword::Gt,
        Keyword::Lt,
        Keyword::ArrStart,
        Keyword::ArrEnd,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Keyword::Add => "+",
            Keyword::Sub => "-",
            Keyword::Inc => "++",
            Keyword::Dec => "--",
            Keyword::Mul => "*",
            Keyword::Div => "/",
            Keyword::Mod => "%",
            Keyword::Pow => "**",
            Keyword::Shr => ">>>",
            Keyword::Sshr => ">>",
            Keyword::Shl => "<<",
            Keyword::BitAnd => "&",
            Keyword::BitOr => "|",
            Keyword::BitXor => "^",
            Keyword::BitNot => "~",
            Keyword::Not => "!",
            Keyword::Eq => "==",
            Keyword::Neq => "!=",
            Keyword::Gt => ">",
            Keyword::Gte => ">=",
            Keyword::Lt => "<",
            Keyword::Lte => "<=",
            Keyword::Dup => "dup",
            Keyword::Over => "over",
            Keyword::Swap => "swap",
            Keyword::Drop => "drop",
            Keyword::ArrStart => "[",
            Keyword::ArrEnd => "]",
            Keyword::Hole => "??",
        }
    }

    /// Whether the token is spelled with identifier characters, so it
    /// competes with identifiers (`dup` vs `dupe`).
    pub fn is_word(self) -> bool {
        self.token()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_ordered_longest_first() {
        let lengths: Vec<usize> = Keyword::BY_TOKEN_LENGTH
            .iter()
            .map(|k| k.token().len())
            .collect();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_every_keyword_is_listed() {
        let all = [
            Keyword::Add,
            Keyword::Sub,
            Keyword::Inc,
            Keyword::Dec,
            Keyword::Mul,
            Keyword::Div,
            Keyword::Mod,
            Keyword::Pow,
            Keyword::Shr,
            Keyword::Sshr,
            Keyword::Shl,
            Keyword::BitAnd,
            Keyword::BitOr,
            Keyword::BitXor,
            Keyword::BitNot,
            Keyword::Not,
            Keyword::Eq,
            Keyword::Neq,
            Keyword::Gt,
            Keyword::Gte,
            Keyword::Lt,
            Keyword::Lte,
            Keyword::Dup,
            Keyword::Over,
            Keyword::Swap,
            Keyword::Drop,
            Keyword::ArrStart,
            Keyword::ArrEnd,
            Keyword::Hole,
        ];
        for k in all {
            assert!(Keyword::BY_TOKEN_LENGTH.contains(&k), "{:?} missing", k);
        }
    }

    #[test]
    fn test_word_tokens() {
        assert!(Keyword::Dup.is_word());
        assert!(Keyword::Drop.is_word());
        assert!(!Keyword::Shr.is_word());
        assert!(!Keyword::Hole.is_word());
    }
}
