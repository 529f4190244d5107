//! Line-oriented script parser: `title:` / `---` / `===` node framing, steps,
//! choice blocks and nested `<<if>>` blocks.

use skein_types::ast::{
    ChoiceEntry, ChoiceStep, Command, CommandStep, IfStep, LineStep, Node, NodeGraph, Step,
};
use skein_types::{ErrorCode, ScriptError, SourceFile, Span};
use tracing::{debug, warn};

use crate::parse_choice::parse_choice_line;
use crate::parse_command::{if_condition, parse_command, unwrap_command};

/// Parse a whole script into its node graph.
///
/// Parsing stops at the first error. Redefining a node replaces the earlier
/// definition.
pub fn parse_script(source: &SourceFile) -> skein_types::Result<NodeGraph> {
    ScriptParser::new(source).parse()
}

/// The script parser.
///
/// Walks the normalized lines of a [`SourceFile`] with a one-line cursor.
/// Steps that span several lines (choice blocks, `<<if>>` blocks) consume
/// their lines directly.
struct ScriptParser<'src> {
    source: &'src SourceFile,
    /// 0-based index of the current line.
    pos: usize,
    graph: NodeGraph,
}

impl<'src> ScriptParser<'src> {
    fn new(source: &'src SourceFile) -> Self {
        Self {
            source,
            pos: 0,
            graph: NodeGraph::new(),
        }
    }

    fn parse(mut self) -> skein_types::Result<NodeGraph> {
        let mut current: Option<Node> = None;
        let mut in_body = false;

        while let Some(raw) = self.peek_line() {
            let trimmed = raw.trim();

            if let Some(name) = title_name(trimmed) {
                if name.is_empty() {
                    return Err(self.error(ErrorCode::NODE_DELIMITER, "node title is empty")
                        .with_suggestion("write title: NodeName"));
                }
                self.finish_node(current.take());
                current = Some(Node::new(name, self.line_span()));
                in_body = false;
                self.advance();
                continue;
            }

            if trimmed == "---" {
                if current.is_none() {
                    return Err(self
                        .error(ErrorCode::NODE_DELIMITER, "'---' without a preceding title")
                        .with_suggestion("start the node with title: NodeName"));
                }
                in_body = true;
                self.advance();
                continue;
            }

            if trimmed == "===" {
                self.finish_node(current.take());
                in_body = false;
                self.advance();
                continue;
            }

            match current.as_mut() {
                Some(node) if in_body && !trimmed.is_empty() => {
                    let step = self.parse_step()?;
                    node.steps.push(step);
                }
                _ => self.advance(),
            }
        }

        self.finish_node(current);
        Ok(self.graph)
    }

    fn finish_node(&mut self, node: Option<Node>) {
        let Some(node) = node else {
            return;
        };
        let name = node.name.clone();
        debug!(node = %name, steps = node.steps.len(), "registered node");
        if self.graph.insert(node).is_some() {
            warn!(node = %name, "node redefined; keeping the later definition");
        }
    }

    // ── Line cursor ───────────────────────────────────────────────────────────

    fn peek_line(&self) -> Option<&'src str> {
        let source: &'src SourceFile = self.source;
        source.lines().get(self.pos).map(String::as_str)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// 1-based number of the current line.
    fn line_number(&self) -> u32 {
        self.pos as u32 + 1
    }

    fn line_span(&self) -> Span {
        Span::whole_line(self.line_number(), self.peek_line().unwrap_or_default())
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>) -> ScriptError {
        self.error_at(code, message, self.line_span())
    }

    fn error_at(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> ScriptError {
        let source_line = self.source.line(span.line).unwrap_or_default();
        ScriptError::new(self.source.name.clone(), code, message, span, source_line)
    }

    // ── Steps ─────────────────────────────────────────────────────────────────

    /// Parse the step starting at the current (non-blank) line.
    fn parse_step(&mut self) -> skein_types::Result<Step> {
        let raw = self.peek_line().unwrap_or_default();
        let trimmed = raw.trim();
        let span = self.line_span();

        if trimmed.starts_with("->") {
            return self.parse_choice_block();
        }

        if let Some(inner) = unwrap_command(trimmed) {
            if let Some(condition) = if_condition(inner) {
                return self.parse_if_block(condition.to_string(), span);
            }
            let command = parse_command(inner).map_err(|err| {
                let error = self.error(err.code, err.message);
                match err.suggestion {
                    Some(suggestion) => error.with_suggestion(suggestion),
                    None => error,
                }
            })?;
            self.advance();
            return Ok(Step::Command(CommandStep { command, span }));
        }

        self.advance();
        Ok(Step::Line(LineStep {
            text: raw.trim_end().to_string(),
            span,
        }))
    }

    /// `<<if cond>>` … `[<<else>>]` … `<<endif>>`, with the opener as the
    /// current line.
    fn parse_if_block(&mut self, condition: String, span: Span) -> skein_types::Result<Step> {
        self.advance();
        let mut then_steps = Vec::new();
        let mut else_steps = Vec::new();
        let mut in_else = false;

        loop {
            let Some(raw) = self.peek_line() else {
                return Err(self.unterminated_if(span, "end of script"));
            };
            let trimmed = raw.trim();

            if trimmed == "===" || title_name(trimmed).is_some() {
                return Err(self.unterminated_if(span, "end of node"));
            }
            if trimmed.is_empty() {
                self.advance();
                continue;
            }
            if let Some(inner) = unwrap_command(trimmed) {
                if inner.eq_ignore_ascii_case("else") {
                    in_else = true;
                    self.advance();
                    continue;
                }
                if inner.eq_ignore_ascii_case("endif") {
                    self.advance();
                    break;
                }
            }

            let step = self.parse_step()?;
            if in_else {
                else_steps.push(step);
            } else {
                then_steps.push(step);
            }
        }

        Ok(Step::If(IfStep {
            condition,
            then_steps,
            else_steps,
            span,
        }))
    }

    fn unterminated_if(&self, opener: Span, reached: &str) -> ScriptError {
        self.error_at(
            ErrorCode::UNTERMINATED_IF,
            format!("<<if>> block reached {reached} without <<endif>>"),
            opener,
        )
        .with_suggestion("close the block with <<endif>>")
    }

    /// Consume contiguous `->` entries and the indented commands under each.
    fn parse_choice_block(&mut self) -> skein_types::Result<Step> {
        let block_span = self.line_span();
        let mut entries = Vec::new();
        let mut time_limit: Option<f64> = None;

        while let Some(raw) = self.peek_line() {
            let Some(arrow) = raw.find("->").filter(|i| raw[..*i].trim().is_empty()) else {
                break;
            };
            let rest = &raw[arrow + 2..];
            let span = self.line_span();

            let line = parse_choice_line(rest).map_err(|err| {
                let column = raw[..arrow + 2 + err.offset].chars().count() as u32 + 1;
                self.error_at(err.code, err.message, Span::point(span.line, column))
            })?;
            self.advance();

            let commands = self.parse_choice_commands()?;

            if let Some(seconds) = line.time {
                time_limit = Some(time_limit.map_or(seconds, |limit| limit.min(seconds)));
            }
            entries.push(ChoiceEntry {
                text: line.text,
                condition: line.condition,
                commands,
                span,
            });
        }

        Ok(Step::Choice(ChoiceStep {
            entries,
            time_limit,
            default_option: 0,
            span: block_span,
        }))
    }

    /// Indented `<<command>>` lines directly under a choice entry.
    fn parse_choice_commands(&mut self) -> skein_types::Result<Vec<Command>> {
        let mut commands = Vec::new();
        while let Some(raw) = self.peek_line() {
            if !is_indented(raw) {
                break;
            }
            let Some(inner) = unwrap_command(raw) else {
                break;
            };
            // `<<else>>`/`<<endif>>` close an enclosing `<<if>>`.
            if inner.eq_ignore_ascii_case("else") || inner.eq_ignore_ascii_case("endif") {
                break;
            }
            if if_condition(inner).is_some() {
                return Err(self
                    .error(
                        ErrorCode::INVALID_CHOICE_COMMAND,
                        "invalid command under choice: <<if>> cannot open inside an option",
                    )
                    .with_suggestion("guard the option with an [if ...] tag instead"));
            }
            let command = parse_command(inner).map_err(|err| {
                self.error(
                    ErrorCode::INVALID_CHOICE_COMMAND,
                    format!("invalid command under choice: {}", err.message),
                )
            })?;
            commands.push(command);
            self.advance();
        }
        Ok(commands)
    }
}

/// If `trimmed` is a `title:` line (keyword in any case), return the name.
fn title_name(trimmed: &str) -> Option<&str> {
    let keyword = trimmed.get(..6)?;
    keyword
        .eq_ignore_ascii_case("title:")
        .then(|| trimmed[6..].trim())
}

fn is_indented(raw: &str) -> bool {
    raw.starts_with("    ") || raw.starts_with('\t')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> skein_types::Result<NodeGraph> {
        parse_script(&SourceFile::new("test.skein", text))
    }

    fn steps(text: &str) -> Vec<Step> {
        let graph = parse(text).unwrap();
        let steps = graph.nodes().next().unwrap().steps.clone();
        steps
    }

    #[test]
    fn test_title_name() {
        assert_eq!(title_name("title: Intro"), Some("Intro"));
        assert_eq!(title_name("TITLE:Intro  "), Some("Intro"));
        assert_eq!(title_name("title"), None);
        assert_eq!(title_name("titles: x"), None);
    }

    #[test]
    fn test_empty_script() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("just prose\nno nodes").unwrap().is_empty());
    }

    #[test]
    fn test_line_keeps_leading_whitespace() {
        let steps = steps("title: A\n---\n  Indented line   \n===");
        assert_eq!(
            steps,
            vec![Step::Line(LineStep {
                text: "  Indented line".into(),
                span: Span::new(3, 1, 18),
            })]
        );
    }

    #[test]
    fn test_lines_before_body_are_ignored() {
        let steps = steps("title: A\ntags: intro\n---\nHi\n===\nafter");
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_unclosed_node_is_registered_at_eof() {
        let graph = parse("title: A\n---\nHi").unwrap();
        assert!(graph.contains("a"));
    }

    #[test]
    fn test_choice_commands_stop_at_unindented_line() {
        let steps = steps("title: A\n---\n-> One\n    <<set x = 1>>\n<<jump B>>\n===");
        assert_eq!(steps.len(), 2);
        let Step::Choice(choice) = &steps[0] else {
            panic!("expected choice");
        };
        assert_eq!(choice.entries[0].commands.len(), 1);
        assert!(matches!(steps[1], Step::Command(_)));
    }

    #[test]
    fn test_tag_error_column() {
        let err = parse("title: A\n---\n-> Open [if x\n===").unwrap_err();
        assert_eq!(err.code, ErrorCode::MALFORMED_CONDITION_TAG);
        assert_eq!(err.span, Span::point(3, 9));
        assert_eq!(err.source_line, "-> Open [if x");
    }
}
