use super::grammar::{self, Cursor};
use super::parser_error::ParseError;
use crate::lang::{CodeUnit, Literal, Statement};

/// Name of the implicit module wrapping a whole program.
pub const PROGRAM_MODULE: &str = "default";

/// Recursive-descent parser built from the grammar primitives.
///
/// Alternatives are tried in a fixed order and fully backtracked on failure;
/// the error reported is the furthest point any alternative reached.
///
/// Grammar:
///
/// ```text
/// program   := ws? (unit (ws unit)*)? ws?
/// unit      := func | inline | module
/// func      := "fn" ws ident ws "->" ws "do" ws body "end"
/// inline    := "inline" ws ident ws body "end"
/// module    := "module" ws ident ws (unit (ws unit)* ws)? "end"
/// body      := (stmt (ws stmt)* ws)?
/// stmt      := while | if | operator | int | string | bool | ident
/// while     := "while" ws body "do" ws body "end"
/// if        := "if" ws body ("else" ws body)? "end"
/// ```
///
/// Every statement must be followed by whitespace or end of input.
pub struct Parser<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Parser {
            cursor: Cursor::new(source),
        }
    }

    /// Parses a complete program into the implicit `default` module.
    ///
    /// The whole input must be consumed.
    pub fn parse(mut self) -> Result<CodeUnit, ParseError> {
        let c = &mut self.cursor;
        c.whitespace();
        let units = sequence(c, code_unit);
        c.whitespace();
        if !c.at_end() {
            let at = c.pos();
            c.expect_at(at, "end of input");
            return Err(c.error());
        }
        Ok(CodeUnit::Module {
            name: PROGRAM_MODULE.to_string(),
            nested: units,
        })
    }
}

/// Parses `source` as a complete program.
pub fn parse_program(source: &str) -> Result<CodeUnit, ParseError> {
    Parser::new(source).parse()
}

/// Zero or more `item`s separated by mandatory whitespace.
///
/// Separator whitespace is only consumed when another item follows it.
fn sequence<'src, T>(
    c: &mut Cursor<'src>,
    item: impl Fn(&mut Cursor<'src>) -> Option<T>,
) -> Vec<T> {
    let mut items = Vec::new();
    let Some(first) = item(c) else {
        return items;
    };
    items.push(first);
    while let Some(next) = c.attempt(|c| {
        c.whitespace1()?;
        item(c)
    }) {
        items.push(next);
    }
    items
}

/// A sequence of statements followed by the word that closes it.
///
/// A non-empty sequence must be separated from the terminator by whitespace.
fn body_until(c: &mut Cursor, terminator: &'static str) -> Option<Vec<Statement>> {
    c.attempt(|c| {
        let body = sequence(c, statement);
        if !body.is_empty() {
            c.whitespace1()?;
        }
        c.eat_word(terminator)?;
        Some(body)
    })
}

fn statement(c: &mut Cursor) -> Option<Statement> {
    delimited(c, while_statement)
        .or_else(|| delimited(c, if_statement))
        .or_else(|| delimited(c, |c| grammar::keyword(c).map(Statement::Keyword)))
        .or_else(|| delimited(c, |c| literal(c, grammar::int_literal, Literal::Int)))
        .or_else(|| delimited(c, |c| literal(c, grammar::string_literal, Literal::Str)))
        .or_else(|| delimited(c, |c| literal(c, grammar::bool_literal, Literal::Bool)))
        .or_else(|| delimited(c, |c| grammar::identifier(c).map(Statement::Ident)))
}

fn literal<'src, T>(
    c: &mut Cursor<'src>,
    primitive: impl FnOnce(&mut Cursor<'src>) -> Option<T>,
    wrap: impl FnOnce(T) -> Literal,
) -> Option<Statement> {
    primitive(c).map(|v| Statement::Literal(wrap(v)))
}

/// Runs a statement alternative and rejects it unless it ends at a
/// delimiter, so `-5` is not read as `-` followed by `5`.
fn delimited<'src>(
    c: &mut Cursor<'src>,
    alternative: impl FnOnce(&mut Cursor<'src>) -> Option<Statement>,
) -> Option<Statement> {
    c.attempt(|c| {
        let stmt = alternative(c)?;
        if c.at_delimiter() {
            Some(stmt)
        } else {
            c.fail("whitespace")
        }
    })
}

fn while_statement(c: &mut Cursor) -> Option<Statement> {
    c.attempt(|c| {
        c.eat_word("while")?;
        c.whitespace1()?;
        let cond = body_until(c, "do")?;
        c.whitespace1()?;
        let body = body_until(c, "end")?;
        Some(Statement::While { cond, body })
    })
}

fn if_statement(c: &mut Cursor) -> Option<Statement> {
    c.attempt(|c| {
        c.eat_word("if")?;
        c.whitespace1()?;
        let true_body = sequence(c, statement);
        if !true_body.is_empty() {
            c.whitespace1()?;
        }
        let false_body = c.attempt(|c| {
            c.eat_word("else")?;
            c.whitespace1()?;
            let body = sequence(c, statement);
            if !body.is_empty() {
                c.whitespace1()?;
            }
            Some(body)
        });
        c.eat_word("end")?;
        Some(Statement::If {
            true_body,
            false_body,
        })
    })
}

fn code_unit(c: &mut Cursor) -> Option<CodeUnit> {
    func(c).or_else(|| inline(c)).or_else(|| module(c))
}

fn func(c: &mut Cursor) -> Option<CodeUnit> {
    c.attempt(|c| {
        c.eat_word("fn")?;
        c.whitespace1()?;
        let name = grammar::identifier(c)?;
        c.whitespace1()?;
        c.eat("->")?;
        c.whitespace1()?;
        c.eat_word("do")?;
        c.whitespace1()?;
        let body = body_until(c, "end")?;
        Some(CodeUnit::Func { name, body })
    })
}

fn inline(c: &mut Cursor) -> Option<CodeUnit> {
    c.attempt(|c| {
        c.eat_word("inline")?;
        c.whitespace1()?;
        let name = grammar::identifier(c)?;
        c.whitespace1()?;
        let body = body_until(c, "end")?;
        Some(CodeUnit::Inline { name, body })
    })
}

fn module(c: &mut Cursor) -> Option<CodeUnit> {
    c.attempt(|c| {
        c.eat_word("module")?;
        c.whitespace1()?;
        let name = grammar::identifier(c)?;
        c.whitespace1()?;
        let nested = sequence(c, code_unit);
        if !nested.is_empty() {
            c.whitespace1()?;
        }
        c.eat_word("end")?;
        Some(CodeUnit::Module { name, nested })
    })
}
