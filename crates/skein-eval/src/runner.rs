//! The dialogue runner: a resumable state machine over a [`NodeGraph`].
//!
//! Execution walks the current node's steps with an explicit frame stack.
//! The bottom frame addresses the node's own steps; entering an `<<if>>`
//! pushes a frame for the chosen branch, and an exhausted branch frame pops
//! back to the step after its `If`. The graph itself is never modified.

use skein_types::ast::{Branch, ChoiceEntry, ChoiceStep, Command, Node, NodeGraph, Step};
use skein_types::Value;
use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::config::RunnerConfig;
use crate::env::VariableStore;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::evaluate_condition;
use crate::events::{DialogueEvent, Listener};
use crate::interpolate;

/// One level of the execution stack.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    /// Index of the `If` step in the parent frame and the branch taken;
    /// `None` for the node's own step list.
    branch: Option<(usize, Branch)>,
    /// Next step to run in this frame.
    pos: usize,
}

impl Frame {
    fn root() -> Self {
        Self {
            branch: None,
            pos: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Cursor {
    /// Node name as registered in the graph.
    node: String,
    frames: Vec<Frame>,
}

/// A choice step waiting for `choose`.
#[derive(Debug, Clone)]
struct PendingChoice {
    /// Entries that passed their conditions, in display order.
    displayed: Vec<ChoiceEntry>,
    default_option: usize,
}

/// The next step to execute, detached from the graph borrow.
enum NextStep {
    Line(String),
    Command(Command),
    Choice(ChoiceStep),
    If { index: usize, condition: String },
}

/// Runs a parsed dialogue graph one suspension point at a time.
///
/// Hosts drive it with [`start_node`](Self::start_node),
/// [`continue_dialogue`](Self::continue_dialogue), [`choose`](Self::choose)
/// and [`tick`](Self::tick), and observe it through
/// [`drain_events`](Self::drain_events) or [`subscribe`](Self::subscribe).
pub struct DialogueRunner {
    graph: NodeGraph,
    vars: VariableStore,
    config: RunnerConfig,
    cursor: Option<Cursor>,
    pending: Option<PendingChoice>,
    /// Remaining seconds while the choice countdown is armed.
    timer: Option<f64>,
    just_jumped: bool,
    /// Undrained events, bounded by `config.event_queue_limit`.
    events: VecDeque<DialogueEvent>,
    listeners: Vec<Listener>,
}

impl DialogueRunner {
    pub fn new(graph: NodeGraph) -> Self {
        Self::with_config(graph, RunnerConfig::default())
    }

    pub fn with_config(graph: NodeGraph, config: RunnerConfig) -> Self {
        Self {
            graph,
            vars: VariableStore::new(),
            config,
            cursor: None,
            pending: None,
            timer: None,
            just_jumped: false,
            events: VecDeque::new(),
            listeners: Vec::new(),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Control
    // ══════════════════════════════════════════════════════════════════════

    /// Jump to `name` and run until the first suspension point.
    ///
    /// An unknown name fails before any state changes. Otherwise a pending
    /// choice is dropped and the countdown disarmed.
    pub fn start_node(&mut self, name: &str) -> EvalResult<()> {
        self.jump(name)?;
        self.pending = None;
        self.timer = None;
        self.continue_dialogue()
    }

    /// Run steps until a line, a choice or the end of the node.
    ///
    /// Does nothing while a choice is pending.
    pub fn continue_dialogue(&mut self) -> EvalResult<()> {
        if self.pending.is_some() {
            return Ok(());
        }

        let mut executed: u64 = 0;
        loop {
            let Some(step) = self.next_step() else {
                self.end();
                return Ok(());
            };

            executed += 1;
            if executed > self.config.step_limit {
                return Err(EvalError::StepLimitExceeded {
                    limit: self.config.step_limit,
                    node: self.current_node().unwrap_or_default().to_string(),
                });
            }

            match step {
                NextStep::Line(text) => {
                    trace!(%text, "line");
                    self.just_jumped = false;
                    self.emit(DialogueEvent::LineReady { text });
                    return Ok(());
                }
                NextStep::Command(command) => {
                    trace!(?command, "command");
                    self.execute(&command)?;
                }
                NextStep::Choice(choice) => {
                    trace!(entries = choice.entries.len(), "choice");
                    return self.present_choice(choice);
                }
                NextStep::If { index, condition } => {
                    let taken = self.check_condition(&condition)?;
                    let branch = if taken { Branch::Then } else { Branch::Else };
                    trace!(%condition, ?branch, "if");
                    if let Some(cursor) = self.cursor.as_mut() {
                        cursor.frames.push(Frame {
                            branch: Some((index, branch)),
                            pos: 0,
                        });
                    }
                }
            }
        }
    }

    /// Select a displayed option by index, run its commands, then continue.
    ///
    /// The countdown is disarmed even when the call fails. An out-of-range
    /// index leaves the choice pending with no countdown, so a timed choice
    /// then waits for a valid `choose`. Without a pending choice this does
    /// nothing.
    pub fn choose(&mut self, index: usize) -> EvalResult<()> {
        self.timer = None;
        let Some(pending) = self.pending.as_ref() else {
            return Ok(());
        };
        let available = pending.displayed.len();
        if index >= available {
            return Err(EvalError::ChoiceOutOfRange { index, available });
        }

        let Some(entry) = self
            .pending
            .take()
            .and_then(|pending| pending.displayed.into_iter().nth(index))
        else {
            return Ok(());
        };
        debug!(index, option = %entry.text, "choice selected");
        for command in &entry.commands {
            self.execute(command)?;
        }
        self.continue_dialogue()
    }

    /// Advance the choice countdown by `delta_seconds`.
    ///
    /// Negative and NaN deltas count as zero. When the countdown reaches
    /// zero the pending choice's default option is selected.
    pub fn tick(&mut self, delta_seconds: f64) -> EvalResult<()> {
        let Some(remaining) = self.timer else {
            return Ok(());
        };
        let Some(default_option) = self.pending.as_ref().map(|p| p.default_option) else {
            self.timer = None;
            return Ok(());
        };

        let remaining = (remaining - delta_seconds.max(0.0)).max(0.0);
        self.timer = Some(remaining);
        self.emit(DialogueEvent::TimerUpdated { remaining });

        if remaining <= 0.0 {
            self.timer = None;
            debug!(default_option, "choice timer expired");
            self.emit(DialogueEvent::TimerExpired);
            return self.choose(default_option);
        }
        Ok(())
    }

    /// Substitute `{name}` tokens with current variable values.
    pub fn interpolate(&self, text: &str) -> String {
        interpolate::interpolate(text, &self.vars)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Events
    // ══════════════════════════════════════════════════════════════════════

    /// Register a callback invoked for every event, in registration order.
    pub fn subscribe(&mut self, listener: impl FnMut(&DialogueEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Take the queued events emitted since the last drain, oldest first.
    ///
    /// At most `event_queue_limit` events are kept between drains; older
    /// ones are discarded.
    pub fn drain_events(&mut self) -> Vec<DialogueEvent> {
        self.events.drain(..).collect()
    }

    fn emit(&mut self, event: DialogueEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
        let limit = self.config.event_queue_limit;
        if limit == 0 {
            return;
        }
        if self.events.len() >= limit {
            self.events.pop_front();
            trace!(limit, "event queue full, oldest event dropped");
        }
        self.events.push_back(event);
    }

    // ══════════════════════════════════════════════════════════════════════
    // Variables
    // ══════════════════════════════════════════════════════════════════════

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Write a variable directly. Unlike `<<set>>`, this emits no event.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.vars.set(name, value);
    }

    pub fn has(&self, name: &str) -> bool {
        self.vars.has(name)
    }

    pub fn variables(&self) -> &VariableStore {
        &self.vars
    }

    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.vars
    }

    // ══════════════════════════════════════════════════════════════════════
    // State
    // ══════════════════════════════════════════════════════════════════════

    /// Name of the node being executed; `None` before start and after the end.
    pub fn current_node(&self) -> Option<&str> {
        self.cursor.as_ref().map(|c| c.node.as_str())
    }

    pub fn is_waiting_for_choice(&self) -> bool {
        self.pending.is_some()
    }

    /// Labels of the pending choice's available entries.
    pub fn displayed_options(&self) -> Vec<&str> {
        self.pending
            .as_ref()
            .map(|p| p.displayed.iter().map(|e| e.text.as_str()).collect())
            .unwrap_or_default()
    }

    /// Seconds left on the countdown, if armed.
    pub fn timer_remaining(&self) -> Option<f64> {
        self.timer
    }

    /// True from a jump until the next line is shown.
    pub fn just_jumped(&self) -> bool {
        self.just_jumped
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.graph.contains(name)
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    // ══════════════════════════════════════════════════════════════════════
    // Execution
    // ══════════════════════════════════════════════════════════════════════

    /// Fetch the next step and move the cursor past it. Exhausted branch
    /// frames are popped; `None` means the node is finished.
    fn next_step(&mut self) -> Option<NextStep> {
        loop {
            let cursor = self.cursor.as_ref()?;
            let node = self.graph.get(&cursor.node)?;
            let frame = cursor.frames.last()?;
            let next = frame_steps(node, &cursor.frames)
                .get(frame.pos)
                .map(|step| detach(step, frame.pos));

            let cursor = self.cursor.as_mut()?;
            match next {
                Some(step) => {
                    if let Some(frame) = cursor.frames.last_mut() {
                        frame.pos += 1;
                    }
                    return Some(step);
                }
                None if cursor.frames.len() > 1 => {
                    cursor.frames.pop();
                }
                None => return None,
            }
        }
    }

    fn end(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            debug!(node = %cursor.node, "dialogue ended");
        }
        self.emit(DialogueEvent::DialogueEnded);
    }

    fn execute(&mut self, command: &Command) -> EvalResult<()> {
        match command {
            Command::Jump { target } => self.jump(target),
            Command::Set { name, value } => {
                debug!(%name, %value, "variable set");
                self.vars.set(name, value.clone());
                self.emit(DialogueEvent::VariableChanged {
                    name: name.clone(),
                    value: value.clone(),
                });
                Ok(())
            }
        }
    }

    fn jump(&mut self, target: &str) -> EvalResult<()> {
        let Some(node) = self.graph.get(target) else {
            return Err(EvalError::UnknownNode(target.to_string()));
        };
        debug!(node = %node.name, "jump");
        self.cursor = Some(Cursor {
            node: node.name.clone(),
            frames: vec![Frame::root()],
        });
        self.just_jumped = true;
        Ok(())
    }

    fn present_choice(&mut self, choice: ChoiceStep) -> EvalResult<()> {
        let mut displayed = Vec::with_capacity(choice.entries.len());
        for entry in choice.entries {
            if self.entry_available(&entry)? {
                displayed.push(entry);
            }
        }
        if displayed.is_empty() {
            return Err(EvalError::NoAvailableChoices {
                node: self.current_node().unwrap_or_default().to_string(),
            });
        }

        let options: Vec<String> = displayed.iter().map(|e| e.text.clone()).collect();
        debug!(?options, time_limit = ?choice.time_limit, "choice presented");
        self.pending = Some(PendingChoice {
            displayed,
            default_option: choice.default_option,
        });
        self.emit(DialogueEvent::OptionsReady { options });

        self.timer = choice.time_limit;
        if let Some(seconds) = choice.time_limit {
            self.emit(DialogueEvent::TimerStarted { seconds });
        }
        Ok(())
    }

    /// Entries without a condition are always shown. A condition whose
    /// trimmed text starts with `!` shows the entry when the rest is false.
    fn entry_available(&self, entry: &ChoiceEntry) -> EvalResult<bool> {
        let Some(condition) = entry.condition.as_deref() else {
            return Ok(true);
        };
        match condition.trim().strip_prefix('!') {
            Some(rest) => Ok(!self.check_condition(rest)?),
            None => self.check_condition(condition),
        }
    }

    fn check_condition(&self, condition: &str) -> EvalResult<bool> {
        evaluate_condition(condition, &self.vars).map_err(|source| EvalError::Condition {
            condition: condition.to_string(),
            source,
        })
    }
}

/// Steps addressed by the innermost frame.
fn frame_steps<'g>(node: &'g Node, frames: &[Frame]) -> &'g [Step] {
    let mut steps: &[Step] = &node.steps;
    for frame in frames {
        if let Some((index, branch)) = frame.branch {
            steps = match steps.get(index) {
                Some(Step::If(step)) => step.branch(branch),
                _ => &[],
            };
        }
    }
    steps
}

fn detach(step: &Step, index: usize) -> NextStep {
    match step {
        Step::Line(line) => NextStep::Line(line.text.clone()),
        Step::Command(command) => NextStep::Command(command.command.clone()),
        Step::Choice(choice) => NextStep::Choice(choice.clone()),
        Step::If(step) => NextStep::If {
            index,
            condition: step.condition.clone(),
        },
    }
}
