//! Token types for the condition lexer.

use std::fmt;

/// A single token produced by the condition lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 0-based character offset of the token's first character.
    pub pos: usize,
}

impl Token {
    pub fn new(kind: TokenKind, pos: usize) -> Self {
        Self { kind, pos }
    }
}

/// Every token kind in the condition language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// `42`, `3.5`, `1e-3`
    Number(f64),
    /// `"text"` with escapes already resolved.
    String(String),
    /// `true` (any case)
    True,
    /// `false` (any case)
    False,
    /// `null` (any case)
    Null,

    /// Variable name: `hasKey`, `gold_count`
    Identifier(String),

    // ── Operators ────────────────────────────────────────────

    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `!`
    Bang,

    // ── Punctuation ──────────────────────────────────────────

    /// `(`
    LParen,
    /// `)`
    RParen,

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Map a case-insensitive keyword to its token kind.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        if s.eq_ignore_ascii_case("true") {
            Some(TokenKind::True)
        } else if s.eq_ignore_ascii_case("false") {
            Some(TokenKind::False)
        } else if s.eq_ignore_ascii_case("null") {
            Some(TokenKind::Null)
        } else {
            None
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::String(s) => write!(f, "string \"{s}\""),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::Null => write!(f, "'null'"),
            TokenKind::Identifier(name) => write!(f, "identifier '{name}'"),
            TokenKind::AndAnd => write!(f, "'&&'"),
            TokenKind::OrOr => write!(f, "'||'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::BangEq => write!(f, "'!='"),
            TokenKind::Less => write!(f, "'<'"),
            TokenKind::LessEq => write!(f, "'<='"),
            TokenKind::Greater => write!(f, "'>'"),
            TokenKind::GreaterEq => write!(f, "'>='"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}
