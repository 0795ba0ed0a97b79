//! Token-level grammar primitives.
//!
//! Every primitive takes a [`Cursor`] and returns `Some(value)` after
//! consuming input, or `None` after restoring the cursor to where it
//! started. Failures are recorded on the cursor so the caller can report
//! the furthest point the grammar reached.

use std::collections::BTreeSet;

use super::parser_error::ParseError;
use crate::lang::Keyword;

/// Words that can never be identifiers.
pub const RESERVED: [&str; 7] = ["while", "do", "end", "if", "else", "true", "false"];

pub struct Cursor<'src> {
    src: &'src str,
    pos: usize,
    furthest: usize,
    expected: BTreeSet<&'static str>,
}

impl<'src> Cursor<'src> {
    pub fn new(src: &'src str) -> Self {
        Cursor {
            src,
            pos: 0,
            furthest: 0,
            expected: BTreeSet::new(),
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn rest(&self) -> &'src str {
        &self.src[self.pos..]
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Records that `what` would have been accepted at byte offset `at`.
    pub fn expect_at(&mut self, at: usize, what: &'static str) {
        if at > self.furthest {
            self.furthest = at;
            self.expected.clear();
        }
        if at == self.furthest {
            self.expected.insert(what);
        }
    }

    /// Records an expectation at the current position and fails.
    pub fn fail<T>(&mut self, what: &'static str) -> Option<T> {
        self.expect_at(self.pos, what);
        None
    }

    /// Runs `f`, restoring the cursor if it fails.
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let start = self.pos;
        let result = f(self);
        if result.is_none() {
            self.pos = start;
        }
        result
    }

    /// Consumes `token` verbatim.
    pub fn eat(&mut self, token: &'static str) -> Option<()> {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            Some(())
        } else {
            self.fail(token)
        }
    }

    /// Consumes `word` only when it is not immediately followed by an
    /// identifier character.
    pub fn eat_word(&mut self, word: &'static str) -> Option<()> {
        let start = self.pos;
        if self.rest().starts_with(word) && !self.rest()[word.len()..].starts_with(is_ident_char)
        {
            self.pos += word.len();
            Some(())
        } else {
            self.expect_at(start, word);
            None
        }
    }

    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos;
        while let Some(ch) = self.current() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.src[start..self.pos]
    }

    /// Optional whitespace.
    pub fn whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }

    /// At least one whitespace character.
    pub fn whitespace1(&mut self) -> Option<()> {
        if self.eat_while(char::is_whitespace).is_empty() {
            self.fail("whitespace")
        } else {
            Some(())
        }
    }

    /// True at end of input or before whitespace.
    pub fn at_delimiter(&self) -> bool {
        self.current().is_none_or(char::is_whitespace)
    }

    pub fn line_col(&self, at: usize) -> (usize, usize) {
        let before = &self.src[..at.min(self.src.len())];
        let line = before.matches('\n').count() + 1;
        let col = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, col)
    }

    /// Builds the error for the furthest failure recorded so far.
    pub fn error(&self) -> ParseError {
        let (line, col) = self.line_col(self.furthest);
        let found = match self.src[self.furthest..].chars().next() {
            Some(ch) => format!("`{}`", ch.escape_debug()),
            None => "end of input".to_string(),
        };
        ParseError {
            line,
            col,
            expected: self.expected.iter().map(|e| describe(e)).collect(),
            found,
        }
    }
}

/// Expectation labels that name a construct rather than a literal token.
const CONSTRUCTS: [&str; 9] = [
    "code unit",
    "digits",
    "end of input",
    "escape sequence",
    "identifier",
    "integer literal",
    "integer literal in 64-bit range",
    "operator",
    "whitespace",
];

fn describe(expected: &str) -> String {
    if CONSTRUCTS.contains(&expected) {
        expected.to_string()
    } else {
        format!("`{}`", expected)
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Parses the digits of one radix form, with `_` separators stripped.
fn radix_digits(c: &mut Cursor, prefix: &'static str, radix: u32) -> Option<u64> {
    c.attempt(|c| {
        c.eat(prefix)?;
        let start = c.pos();
        let digits: String = c
            .eat_while(|ch| ch == '_' || ch.is_digit(radix))
            .chars()
            .filter(|&ch| ch != '_')
            .collect();
        if digits.is_empty() {
            return c.fail("digits");
        }
        match u64::from_str_radix(&digits, radix) {
            Ok(n) => Some(n),
            Err(_) => {
                c.expect_at(start, "integer literal in 64-bit range");
                None
            }
        }
    })
}

fn decimal(c: &mut Cursor) -> Option<u64> {
    c.attempt(|c| {
        let start = c.pos();
        if c.current() == Some('0') {
            c.eat("0")?;
            return Some(0);
        }
        if !c.current().is_some_and(|ch| ch.is_ascii_digit()) {
            return c.fail("integer literal");
        }
        let digits: String = c
            .eat_while(|ch| ch == '_' || ch.is_ascii_digit())
            .chars()
            .filter(|&ch| ch != '_')
            .collect();
        match digits.parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                c.expect_at(start, "integer literal in 64-bit range");
                None
            }
        }
    })
}

/// Unsigned magnitude in hex, octal, binary or decimal form.
pub fn uint(c: &mut Cursor) -> Option<u64> {
    radix_digits(c, "0x", 16)
        .or_else(|| radix_digits(c, "0o", 8))
        .or_else(|| radix_digits(c, "0b", 2))
        .or_else(|| decimal(c))
}

/// Integer literal with an optional leading `-`.
pub fn int_literal(c: &mut Cursor) -> Option<i64> {
    c.attempt(|c| {
        let start = c.pos();
        let negative = c.current() == Some('-');
        if negative {
            c.eat("-")?;
        }
        let magnitude = uint(c)?;
        let value = if negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        };
        match value {
            Some(v) => Some(v),
            None => {
                c.expect_at(start, "integer literal in 64-bit range");
                None
            }
        }
    })
}

/// Double-quoted string literal.
pub fn string_literal(c: &mut Cursor) -> Option<String> {
    c.attempt(|c| {
        c.eat("\"")?;
        let mut out = String::new();
        loop {
            let at = c.pos();
            match c.advance() {
                Some('"') => return Some(out),
                Some('\\') => {
                    let escaped = match c.advance() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('0') => '\0',
                        Some('/') => '/',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('u') => {
                            let hex = c.rest().get(..4).unwrap_or("");
                            let code = u32::from_str_radix(hex, 16)
                                .ok()
                                .filter(|_| hex.len() == 4)
                                .and_then(char::from_u32);
                            match code {
                                Some(ch) => {
                                    c.reset(c.pos() + 4);
                                    ch
                                }
                                None => {
                                    c.expect_at(at, "escape sequence");
                                    return None;
                                }
                            }
                        }
                        _ => {
                            c.expect_at(at, "escape sequence");
                            return None;
                        }
                    };
                    out.push(escaped);
                }
                Some('\n') | None => {
                    c.expect_at(at, "\"");
                    return None;
                }
                Some(ch) => out.push(ch),
            }
        }
    })
}

/// `true` or `false`.
pub fn bool_literal(c: &mut Cursor) -> Option<bool> {
    if c.eat_word("true").is_some() {
        Some(true)
    } else if c.eat_word("false").is_some() {
        Some(false)
    } else {
        None
    }
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`, excluding reserved words.
pub fn identifier(c: &mut Cursor) -> Option<String> {
    c.attempt(|c| {
        let start = c.pos();
        if !c.current().is_some_and(is_ident_start) {
            return c.fail("identifier");
        }
        let ident = c.eat_while(is_ident_char);
        if RESERVED.contains(&ident) {
            c.expect_at(start, "identifier");
            return None;
        }
        Some(ident.to_string())
    })
}

/// Operator token, longest spelling first.
///
/// Word operators such as `dup` must end at a word boundary, so `dupe` is
/// left for the identifier parser.
pub fn keyword(c: &mut Cursor) -> Option<Keyword> {
    let start = c.pos();
    let rest = c.rest();
    let found = Keyword::BY_TOKEN_LENGTH.into_iter().find(|k| {
        let token = k.token();
        rest.starts_with(token)
            && !(k.is_word() && rest[token.len()..].starts_with(is_ident_char))
    });
    match found {
        Some(k) => {
            c.reset(start + k.token().len());
            Some(k)
        }
        None => c.fail("operator"),
    }
}
