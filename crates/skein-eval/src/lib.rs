//! Skein runtime: condition evaluation, the variable store and the
//! resumable [`DialogueRunner`].
//!
//! The runner owns a parsed [`NodeGraph`](skein_types::ast::NodeGraph) and
//! advances through it on host calls (`start_node`, `continue_dialogue`,
//! `choose`, `tick`), returning at every line, choice and end of dialogue.

pub mod config;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod interpolate;
pub mod runner;

pub use config::RunnerConfig;
pub use env::VariableStore;
pub use error::{EvalError, EvalResult};
pub use evaluator::{evaluate, evaluate_condition, loose_eq};
pub use events::{DialogueEvent, Listener};
pub use interpolate::interpolate;
pub use runner::DialogueRunner;
