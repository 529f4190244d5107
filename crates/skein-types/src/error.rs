use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Node delimiters and block structure.
    Structure,
    /// Choice entries and their tags.
    Choice,
    /// `<<…>>` command syntax.
    Command,
}

/// Numeric script error code (E100–E399).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Structure errors (E100–E199) ──
    pub const NODE_DELIMITER: Self = Self(100);
    pub const UNTERMINATED_IF: Self = Self(101);

    // ── Choice errors (E200–E299) ──
    pub const MALFORMED_CONDITION_TAG: Self = Self(200);
    pub const MALFORMED_TIME_TAG: Self = Self(201);
    pub const INVALID_CHOICE_COMMAND: Self = Self(202);

    // ── Command errors (E300–E399) ──
    pub const UNKNOWN_COMMAND: Self = Self(300);
    pub const MALFORMED_SET: Self = Self(301);
    pub const MALFORMED_JUMP: Self = Self(302);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            200..=299 => ErrorCategory::Choice,
            300..=399 => ErrorCategory::Command,
            _ => ErrorCategory::Structure,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure => write!(f, "structure"),
            Self::Choice => write!(f, "choice"),
            Self::Command => write!(f, "command"),
        }
    }
}

/// A structured script parse error.
///
/// Script parsing stops at the first error; this carries enough context for
/// a host to point at the offending line without re-reading the script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptError {
    /// Script name the error belongs to.
    pub file: String,
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending script line, verbatim.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ScriptError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for ScriptError {}

/// Errors raised while lexing, parsing or evaluating a condition expression.
///
/// Positions are 0-based character offsets into the condition text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedCharacter { ch: char, pos: usize },

    #[error("unterminated string literal starting at position {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid number literal '{text}' at position {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("unknown operator '{op}' at position {pos}")]
    UnknownOperator { op: String, pos: usize },

    #[error("unexpected token {found} at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected trailing token {found} at position {pos}")]
    TrailingToken { found: String, pos: usize },

    #[error("expression nested deeper than {limit} levels at position {pos}")]
    TooDeep { limit: usize, pos: usize },

    #[error("operator '{op}' requires numeric operands, got {left} and {right}")]
    NotComparable {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
}
