//! Skein: a branching dialogue scripting language.
//!
//! ```text
//! Script text → Script Parser → NodeGraph → DialogueRunner
//!                                  ↑
//!        condition text → Lexer → Expression Parser → Evaluator (at run time)
//! ```
//!
//! [`load`] compiles a script straight into a ready runner; [`check`]
//! validates a script and reports its nodes or its first error in a
//! serializable form.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use skein_eval::{
    evaluate_condition, interpolate, DialogueEvent, DialogueRunner, EvalError, RunnerConfig,
    VariableStore,
};
pub use skein_parser::{parse_command, parse_expression, parse_script};
pub use skein_types::ast::{Command, NodeGraph};
pub use skein_types::{ErrorCategory, ErrorCode, ExprError, ScriptError, SourceFile, Value};

/// Any failure from loading or running a script.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkeinError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Parse `source` into a node graph.
pub fn parse(source: &str, file_name: &str) -> Result<NodeGraph, ScriptError> {
    let source = SourceFile::new(file_name, source);
    parse_script(&source)
}

/// Parse `source` and wrap the graph in a runner with default settings.
pub fn load(source: &str, file_name: &str) -> Result<DialogueRunner, SkeinError> {
    load_with_config(source, file_name, RunnerConfig::default())
}

/// Parse `source` and wrap the graph in a runner using `config`.
pub fn load_with_config(
    source: &str,
    file_name: &str,
    config: RunnerConfig,
) -> Result<DialogueRunner, SkeinError> {
    let graph = parse(source, file_name)?;
    debug!(file = file_name, nodes = graph.len(), "script loaded");
    Ok(DialogueRunner::with_config(graph, config))
}

/// Outcome of [`check`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub success: bool,
    /// Node names as written, in case-insensitive name order.
    pub nodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ScriptError>,
}

/// Validate a script without building a runner.
pub fn check(source: &str, file_name: &str) -> CheckResult {
    match parse(source, file_name) {
        Ok(graph) => CheckResult {
            success: true,
            nodes: graph.nodes().map(|n| n.name.clone()).collect(),
            error: None,
        },
        Err(error) => CheckResult {
            success: false,
            nodes: Vec::new(),
            error: Some(error),
        },
    }
}

/// Crate version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
