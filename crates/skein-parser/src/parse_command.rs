//! `<<command>>` parsing: `jump`, `set`, and `set` value literals.

use skein_types::ast::Command;
use skein_types::{parse_number, ErrorCode, Value};

/// A command that failed to parse. The script parser attaches the line.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSyntaxError {
    pub code: ErrorCode,
    pub message: String,
    pub suggestion: Option<String>,
}

impl CommandSyntaxError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            suggestion: None,
        }
    }

    fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Return the trimmed text between `<<` and `>>`, if `line` is a command line.
pub fn unwrap_command(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    trimmed
        .strip_prefix("<<")?
        .strip_suffix(">>")
        .map(str::trim)
}

/// If `inner` is an `if` opener, return its condition text.
///
/// `if` must be a whole word: `<<if x>>`, `<<if(x)>>` and `<<if>>` open a
/// block, `<<iffy>>` does not.
pub fn if_condition(inner: &str) -> Option<&str> {
    let head = inner.get(..2)?;
    if !head.eq_ignore_ascii_case("if") {
        return None;
    }
    let rest = &inner[2..];
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => None,
        _ => Some(rest.trim()),
    }
}

/// Parse the inner text of a single `<<…>>` command.
pub fn parse_command(inner: &str) -> Result<Command, CommandSyntaxError> {
    let inner = inner.trim();
    let (head, tail) = inner
        .split_once(char::is_whitespace)
        .unwrap_or((inner, ""));

    if head.eq_ignore_ascii_case("jump") {
        let target = tail.trim();
        if target.is_empty() {
            return Err(CommandSyntaxError::new(
                ErrorCode::MALFORMED_JUMP,
                "jump requires a target node name",
            )
            .with_suggestion("write <<jump NodeName>>"));
        }
        return Ok(Command::Jump {
            target: target.to_string(),
        });
    }

    if head.eq_ignore_ascii_case("set") {
        let Some((name, value)) = tail.split_once('=') else {
            return Err(CommandSyntaxError::new(
                ErrorCode::MALFORMED_SET,
                format!("expected '=' in set command '{inner}'"),
            )
            .with_suggestion("write <<set name = value>>"));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(CommandSyntaxError::new(
                ErrorCode::MALFORMED_SET,
                "set command has no variable name",
            ));
        }
        return Ok(Command::Set {
            name: name.to_string(),
            value: parse_literal(value),
        });
    }

    Err(CommandSyntaxError::new(
        ErrorCode::UNKNOWN_COMMAND,
        format!("unknown command '{head}'"),
    )
    .with_suggestion("known commands are 'jump' and 'set'"))
}

/// Interpret the right-hand side of `set name = value`.
///
/// `true`/`false` (any case) are booleans, `"…"` is a string with the quotes
/// removed, decimal text is a number, and anything else is kept as a string.
pub fn parse_literal(text: &str) -> Value {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return Value::String(text[1..text.len() - 1].to_string());
    }
    match parse_number(text) {
        Some(n) => Value::Number(n),
        None => Value::String(text.to_string()),
    }
}
