use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a script construct.
///
/// Dialogue scripts are line-oriented, so a span never crosses a line
/// boundary. Line and column values are 1-based for human-readable errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub end_column: u32,
}

impl Span {
    /// Create a span covering `column..=end_column` on `line`.
    pub fn new(line: u32, column: u32, end_column: u32) -> Self {
        Self {
            line,
            column,
            end_column: end_column.max(column),
        }
    }

    /// Create a zero-width span at a single position.
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, column)
    }

    /// Span covering the whole of `text` when it sits on `line`.
    pub fn whole_line(line: u32, text: &str) -> Self {
        let width = text.chars().count() as u32;
        Self::new(line, 1, width.max(1))
    }

    /// Shift this span right by `offset` columns.
    pub fn offset(self, offset: u32) -> Span {
        Span::new(self.line, self.column + offset, self.end_column + offset)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A dialogue script together with its name, split into normalized lines.
///
/// Line endings (`\r\n`, lone `\r`) are normalized to `\n` on construction,
/// so every consumer sees the same line numbering.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    lines: Vec<String>,
}

impl SourceFile {
    /// Create a new source file, normalizing line endings.
    pub fn new(name: impl Into<String>, source: impl AsRef<str>) -> Self {
        let source = source.as_ref().replace("\r\n", "\n").replace('\r', "\n");
        let lines = source.split('\n').map(str::to_string).collect();
        Self {
            name: name.into(),
            source,
            lines,
        }
    }

    /// Extract a source line by 1-based line number.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        self.lines.get(idx).map(String::as_str)
    }

    /// All lines, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
