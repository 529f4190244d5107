//! Runtime error types for the dialogue runner.

use skein_types::ExprError;
use thiserror::Error;

/// Dialogue runtime error.
///
/// Every variant aborts the operation that raised it. Steps that already ran
/// before the failure keep their effects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// `StartNode` or `jump` named a node the graph does not contain.
    #[error("unknown node '{0}'")]
    UnknownNode(String),

    /// Every entry of a choice step was filtered out by its condition.
    #[error("choice in node '{node}' has no available options")]
    NoAvailableChoices { node: String },

    /// `Choose` index outside the displayed options.
    #[error("choice index {index} out of range ({available} options displayed)")]
    ChoiceOutOfRange { index: usize, available: usize },

    /// A choice or `<<if>>` condition failed to lex, parse or evaluate.
    #[error("condition '{condition}' failed: {source}")]
    Condition {
        condition: String,
        #[source]
        source: ExprError,
    },

    /// One `Continue` ran more steps than the configured limit without
    /// reaching a line, a choice or the end.
    #[error("step limit of {limit} exceeded in node '{node}'")]
    StepLimitExceeded { limit: u64, node: String },
}

/// Result alias for runtime operations.
pub type EvalResult<T> = Result<T, EvalError>;
