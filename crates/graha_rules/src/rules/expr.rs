//! Status expressions: `strong_if` / `active_if`.
//!
//! A closed boolean grammar over signal ids:
//!
//! ```text
//! expr := or
//! or   := and ("or" and)*
//! and  := not ("and" not)*
//! not  := "not" not | atom
//! atom := "(" expr ")" | True | False | true | false | <signal id>
//! ```
//!
//! Anything outside it is rejected when the rule loads. Evaluation walks the
//! AST over the signals' boolean outcomes.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::error::EvalError;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("expression is empty")]
    Empty,
    #[error("Illegal token '{0}' in status expression")]
    IllegalToken(String),
    #[error("Unknown identifier '{0}' in status expression")]
    UnknownIdentifier(String),
    #[error("unexpected '{0}' in status expression")]
    UnexpectedToken(String),
    #[error("status expression ends unexpectedly")]
    UnexpectedEnd,
    #[error("status expression nests deeper than {0} levels")]
    TooDeep(usize),
    #[error("status expression has more than {0} tokens")]
    TooLong(usize),
}

/// Nesting limit for `not` and parentheses.
pub const MAX_DEPTH: usize = 64;
/// Token limit; also bounds the depth of left-leaning `and`/`or` chains.
pub const MAX_TOKENS: usize = 512;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Bool(bool),
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::Not => f.write_str("not"),
            Token::Bool(true) => f.write_str("True"),
            Token::Bool(false) => f.write_str("False"),
            Token::Ident(name) => f.write_str(name),
        }
    }
}

/// Parsed status expression.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusExpr {
    Literal(bool),
    Signal(String),
    Not(Box<StatusExpr>),
    And(Box<StatusExpr>, Box<StatusExpr>),
    Or(Box<StatusExpr>, Box<StatusExpr>),
}

impl StatusExpr {
    /// Parse and check every identifier against the declared signal ids.
    pub fn parse(src: &str, declared: &HashSet<String>) -> Result<Self, ExprError> {
        let expr = Self::parse_unchecked(src)?;
        if let Some(unknown) = expr.identifiers().into_iter().find(|id| !declared.contains(*id)) {
            return Err(ExprError::UnknownIdentifier(unknown.to_string()));
        }
        Ok(expr)
    }

    /// Parse without identifier checks.
    pub fn parse_unchecked(src: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(src)?;
        if tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        if tokens.len() > MAX_TOKENS {
            return Err(ExprError::TooLong(MAX_TOKENS));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_or()?;
        match parser.next_token() {
            None => Ok(expr),
            Some(token) => Err(ExprError::UnexpectedToken(token.to_string())),
        }
    }

    /// Signal ids referenced, sorted.
    pub fn identifiers(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            StatusExpr::Literal(_) => {}
            StatusExpr::Signal(id) => {
                out.insert(id);
            }
            StatusExpr::Not(inner) => inner.collect_identifiers(out),
            StatusExpr::And(l, r) | StatusExpr::Or(l, r) => {
                l.collect_identifiers(out);
                r.collect_identifiers(out);
            }
        }
    }

    /// Evaluate against signal outcomes. An id with no outcome is an error.
    pub fn eval(&self, ctx: &HashMap<String, bool>) -> Result<bool, EvalError> {
        Ok(match self {
            StatusExpr::Literal(value) => *value,
            StatusExpr::Signal(id) => *ctx
                .get(id)
                .ok_or_else(|| EvalError::UnknownIdentifier(id.clone()))?,
            StatusExpr::Not(inner) => !inner.eval(ctx)?,
            StatusExpr::And(l, r) => l.eval(ctx)? && r.eval(ctx)?,
            StatusExpr::Or(l, r) => l.eval(ctx)? || r.eval(ctx)?,
        })
    }
}

/// Split on whitespace and parentheses, then classify each word.
fn tokenize(src: &str) -> Result<Vec<Token>, ExprError> {
    let spaced = src.replace('(', " ( ").replace(')', " ) ");
    spaced
        .split_whitespace()
        .map(|word| match word {
            "(" => Ok(Token::LParen),
            ")" => Ok(Token::RParen),
            "and" => Ok(Token::And),
            "or" => Ok(Token::Or),
            "not" => Ok(Token::Not),
            "True" | "true" => Ok(Token::Bool(true)),
            "False" | "false" => Ok(Token::Bool(false)),
            ident if IDENTIFIER.is_match(ident) => Ok(Token::Ident(ident.to_string())),
            other => Err(ExprError::IllegalToken(other.to_string())),
        })
        .collect()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn consume(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<StatusExpr, ExprError> {
        let mut lhs = self.parse_and()?;
        while self.consume(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = StatusExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<StatusExpr, ExprError> {
        let mut lhs = self.parse_not()?;
        while self.consume(&Token::And) {
            let rhs = self.parse_not()?;
            lhs = StatusExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<StatusExpr, ExprError> {
        if self.consume(&Token::Not) {
            self.descend()?;
            let inner = self.parse_not()?;
            self.depth -= 1;
            return Ok(StatusExpr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<StatusExpr, ExprError> {
        match self.next_token().ok_or(ExprError::UnexpectedEnd)? {
            Token::LParen => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.next_token() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(ExprError::UnexpectedToken(other.to_string())),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Token::Bool(value) => Ok(StatusExpr::Literal(value)),
            Token::Ident(name) => Ok(StatusExpr::Signal(name)),
            other => Err(ExprError::UnexpectedToken(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn ctx(pairs: &[(&str, bool)]) -> HashMap<String, bool> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_precedence() {
        // or binds loosest: a or (b and c)
        let expr = StatusExpr::parse("a or b and c", &declared(&["a", "b", "c"])).unwrap();
        assert!(expr.eval(&ctx(&[("a", true), ("b", false), ("c", false)])).unwrap());
        let expr = StatusExpr::parse("not a and b", &declared(&["a", "b"])).unwrap();
        assert!(!expr.eval(&ctx(&[("a", true), ("b", true)])).unwrap());
    }

    #[test]
    fn test_parens_and_literals() {
        let expr = StatusExpr::parse("(a or false) and (True)", &declared(&["a"])).unwrap();
        assert!(expr.eval(&ctx(&[("a", true)])).unwrap());
        assert!(StatusExpr::parse("not (not true)", &declared(&[])).is_ok());
    }

    #[test]
    fn test_rejects_foreign_syntax() {
        let ids = declared(&["a"]);
        assert_eq!(
            StatusExpr::parse("os.system", &ids),
            Err(ExprError::IllegalToken("os.system".to_string()))
        );
        assert!(matches!(StatusExpr::parse("a == a", &ids), Err(ExprError::IllegalToken(_))));
        assert!(matches!(
            StatusExpr::parse("__import__('os')", &ids),
            Err(ExprError::IllegalToken(_))
        ));
    }

    #[test]
    fn test_rejects_undeclared_identifier() {
        assert_eq!(
            StatusExpr::parse("a and c", &declared(&["a", "b"])),
            Err(ExprError::UnknownIdentifier("c".to_string()))
        );
    }

    #[test]
    fn test_rejects_malformed() {
        let ids = declared(&["a", "b"]);
        assert_eq!(StatusExpr::parse("   ", &ids), Err(ExprError::Empty));
        assert_eq!(StatusExpr::parse("a and", &ids), Err(ExprError::UnexpectedEnd));
        assert_eq!(StatusExpr::parse("(a or b", &ids), Err(ExprError::UnexpectedEnd));
        assert!(matches!(StatusExpr::parse("a b", &ids), Err(ExprError::UnexpectedToken(_))));
        assert!(matches!(StatusExpr::parse("a )", &ids), Err(ExprError::UnexpectedToken(_))));
    }

    #[test]
    fn test_rejects_runaway_nesting() {
        let ids = declared(&["a"]);
        let parens = format!("{}a{}", "(".repeat(3000), ")".repeat(3000));
        assert_eq!(StatusExpr::parse(&parens, &ids), Err(ExprError::TooLong(MAX_TOKENS)));
        let nots = format!("{}a", "not ".repeat(100_000));
        assert_eq!(StatusExpr::parse(&nots, &ids), Err(ExprError::TooLong(MAX_TOKENS)));
        let chain = vec!["a"; 100_000].join(" and ");
        assert_eq!(StatusExpr::parse(&chain, &ids), Err(ExprError::TooLong(MAX_TOKENS)));

        // short enough to tokenize, still too deep
        let deep = format!("{}a{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(StatusExpr::parse(&deep, &ids), Err(ExprError::TooDeep(MAX_DEPTH)));
        let nots = format!("{}a", "not ".repeat(MAX_DEPTH + 1));
        assert_eq!(StatusExpr::parse(&nots, &ids), Err(ExprError::TooDeep(MAX_DEPTH)));

        let fits = format!("{}a{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        let expr = StatusExpr::parse(&fits, &ids).unwrap();
        assert!(expr.eval(&ctx(&[("a", true)])).unwrap());
    }

    #[test]
    fn test_eval_missing_outcome() {
        let expr = StatusExpr::parse_unchecked("ghost").unwrap();
        assert_eq!(
            expr.eval(&HashMap::new()),
            Err(EvalError::UnknownIdentifier("ghost".to_string()))
        );
    }
}
