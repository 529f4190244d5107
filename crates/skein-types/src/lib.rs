//! Shared types for Skein.
//!
//! This crate defines the dialogue value type, the script and condition
//! AST, source spans, and the error types used across every stage.

mod error;
mod span;
mod value;
pub mod ast;

pub use error::{ErrorCategory, ErrorCode, ExprError, ScriptError};
pub use span::{SourceFile, Span};
pub use value::{parse_number, Value};

/// Result type used by the script parser.
pub type Result<T> = std::result::Result<T, ScriptError>;
