//! Events the runner emits to its host.

use serde::{Deserialize, Serialize};
use skein_types::Value;

/// Output of the dialogue runner.
///
/// `LineReady`, `OptionsReady` and `DialogueEnded` are suspension points:
/// the call that emitted them returns right after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DialogueEvent {
    /// A line to display. Text is raw; `{name}` tokens are left for the host
    /// to pass through [`interpolate`](crate::DialogueRunner::interpolate).
    LineReady { text: String },
    /// Labels of the available choice entries, in display order.
    OptionsReady { options: Vec<String> },
    DialogueEnded,
    /// Emitted by `<<set>>` commands only.
    VariableChanged { name: String, value: Value },
    TimerStarted { seconds: f64 },
    TimerUpdated { remaining: f64 },
    TimerExpired,
}

/// Callback registered with [`DialogueRunner::subscribe`](crate::DialogueRunner::subscribe).
pub type Listener = Box<dyn FnMut(&DialogueEvent)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json() {
        let event = DialogueEvent::VariableChanged {
            name: "gold".into(),
            value: Value::Number(10.0),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"event":"variable_changed","name":"gold","value":10.0}"#
        );
        assert_eq!(
            serde_json::to_string(&DialogueEvent::DialogueEnded).unwrap(),
            r#"{"event":"dialogue_ended"}"#
        );
    }
}
