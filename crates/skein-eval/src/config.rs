//! Runner configuration.

use serde::{Deserialize, Serialize};

/// Default for [`RunnerConfig::step_limit`].
pub const DEFAULT_STEP_LIMIT: u64 = 10_000;

/// Default for [`RunnerConfig::event_queue_limit`].
pub const DEFAULT_EVENT_QUEUE_LIMIT: usize = 1024;

/// Tunables for a [`DialogueRunner`](crate::DialogueRunner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Most steps one `continue_dialogue` call may execute before it must
    /// reach a line, a choice or the end. Bounds `jump` cycles.
    pub step_limit: u64,
    /// Most undrained events kept for `drain_events`; the oldest are
    /// dropped past this. `0` disables the queue for listener-only hosts.
    pub event_queue_limit: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            event_queue_limit: DEFAULT_EVENT_QUEUE_LIMIT,
        }
    }
}
