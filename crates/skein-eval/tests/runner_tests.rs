//! Dialogue runner tests.
//!
//! Covers: suspension points, choice filtering and selection, commands,
//! if branches, timed choices, interpolation, variable access, event
//! delivery, error cases and the step limit.

use std::cell::RefCell;
use std::rc::Rc;

use skein_eval::{DialogueEvent, DialogueRunner, EvalError, RunnerConfig};
use skein_parser::parse_script;
use skein_types::{ExprError, SourceFile, Value};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn runner(source: &str) -> DialogueRunner {
    let graph = parse_script(&SourceFile::new("test.skein", source))
        .unwrap_or_else(|e| panic!("parse error: {e}"));
    DialogueRunner::new(graph)
}

fn line(text: &str) -> DialogueEvent {
    DialogueEvent::LineReady { text: text.into() }
}

fn options(labels: &[&str]) -> DialogueEvent {
    DialogueEvent::OptionsReady {
        options: labels.iter().map(|s| s.to_string()).collect(),
    }
}

const INTRO: &str = "\
title: Intro
---
Hello!
-> Open door [if hasKey]
    <<jump HasKeyNode>>
-> Leave
===
title: HasKeyNode
---
The door creaks open.
===";

const TIMED: &str = "\
title: Duel
---
-> Parry [time 3]
    <<set parried = true>>
-> Dodge
    <<set dodged = true>>
After
===";

// ─────────────────────────────────────────────────────────────────────
// Lines and choices
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_intro_filters_unavailable_option() {
    let mut r = runner(INTRO);
    r.start_node("Intro").unwrap();
    assert_eq!(r.drain_events(), vec![line("Hello!")]);
    assert!(!r.is_waiting_for_choice());

    r.continue_dialogue().unwrap();
    assert_eq!(r.drain_events(), vec![options(&["Leave"])]);
    assert!(r.is_waiting_for_choice());
    assert_eq!(r.displayed_options(), vec!["Leave"]);
}

#[test]
fn test_available_option_runs_its_commands() {
    let mut r = runner(INTRO);
    r.set("hasKey", true);
    r.start_node("Intro").unwrap();
    r.continue_dialogue().unwrap();
    r.drain_events();
    assert_eq!(r.displayed_options(), vec!["Open door", "Leave"]);

    r.choose(0).unwrap();
    assert_eq!(r.drain_events(), vec![line("The door creaks open.")]);
    assert_eq!(r.current_node(), Some("HasKeyNode"));
    assert!(!r.is_waiting_for_choice());
}

#[test]
fn test_choose_indexes_displayed_list() {
    let mut r = runner(INTRO);
    r.start_node("Intro").unwrap();
    r.continue_dialogue().unwrap();
    // Only "Leave" is shown, so index 0 is "Leave", not "Open door".
    r.choose(0).unwrap();
    assert_eq!(r.drain_events().last(), Some(&DialogueEvent::DialogueEnded));
    assert_eq!(r.current_node(), None);
}

#[test]
fn test_continue_is_noop_while_choice_pending() {
    let mut r = runner(INTRO);
    r.start_node("Intro").unwrap();
    r.continue_dialogue().unwrap();
    r.drain_events();
    r.continue_dialogue().unwrap();
    assert!(r.drain_events().is_empty());
    assert!(r.is_waiting_for_choice());
}

#[test]
fn test_negated_choice_condition() {
    let mut r = runner("title: A\n---\n-> Sneak [if !guardAwake]\n-> Fight\n===");
    r.start_node("A").unwrap();
    assert_eq!(r.drain_events(), vec![options(&["Sneak", "Fight"])]);

    r.set("guardAwake", true);
    r.start_node("A").unwrap();
    assert_eq!(r.drain_events(), vec![options(&["Fight"])]);
}

#[test]
fn test_lines_are_raw_text() {
    let mut r = runner("title: A\n---\nHi {name}!\n===");
    r.set("name", "Ada");
    r.start_node("A").unwrap();
    assert_eq!(r.drain_events(), vec![line("Hi {name}!")]);
    assert_eq!(r.interpolate("Hi {name}!"), "Hi Ada!");
}

#[test]
fn test_end_of_dialogue() {
    let mut r = runner("title: A\n---\nOnly line\n===");
    r.start_node("a").unwrap();
    r.continue_dialogue().unwrap();
    assert_eq!(
        r.drain_events(),
        vec![line("Only line"), DialogueEvent::DialogueEnded]
    );
    // Ending again is harmless.
    r.continue_dialogue().unwrap();
    assert_eq!(r.drain_events(), vec![DialogueEvent::DialogueEnded]);
}

#[test]
fn test_continue_before_start_ends() {
    let mut r = runner(INTRO);
    r.continue_dialogue().unwrap();
    assert_eq!(r.drain_events(), vec![DialogueEvent::DialogueEnded]);
}

// ─────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_set_command_emits_variable_changed() {
    let mut r = runner("title: A\n---\n<<set gold = 10>>\n<<set name = \"Ada\">>\nDone\n===");
    r.start_node("A").unwrap();
    assert_eq!(
        r.drain_events(),
        vec![
            DialogueEvent::VariableChanged {
                name: "gold".into(),
                value: Value::Number(10.0)
            },
            DialogueEvent::VariableChanged {
                name: "name".into(),
                value: "Ada".into()
            },
            line("Done"),
        ]
    );
    assert_eq!(r.variables().get_number("GOLD"), Some(10.0));
}

#[test]
fn test_api_set_emits_nothing() {
    let mut r = runner(INTRO);
    r.set("gold", 5);
    assert!(r.drain_events().is_empty());
    assert!(r.has("Gold"));
    assert_eq!(r.get("gold"), Some(&Value::Number(5.0)));
    assert!(!r.has("silver"));
}

#[test]
fn test_jump_sets_just_jumped_until_line() {
    let mut r = runner("title: A\n---\n<<jump B>>\n===\ntitle: B\n---\n<<set x = 1>>\nIn B\n===");
    r.start_node("A").unwrap();
    assert!(!r.just_jumped());
    assert_eq!(r.current_node(), Some("B"));
    assert_eq!(r.drain_events().last(), Some(&line("In B")));
}

#[test]
fn test_just_jumped_visible_at_choice() {
    let mut r = runner("title: A\n---\n-> Go\n===");
    r.start_node("A").unwrap();
    assert!(r.just_jumped());
}

#[test]
fn test_jump_to_unknown_node() {
    let mut r = runner("title: A\n---\nFirst\n<<jump Nowhere>>\n===");
    r.start_node("A").unwrap();
    r.drain_events();
    let err = r.continue_dialogue().unwrap_err();
    assert_eq!(err, EvalError::UnknownNode("Nowhere".into()));
    assert_eq!(err.to_string(), "unknown node 'Nowhere'");
    assert_eq!(r.current_node(), Some("A"));
    assert!(r.drain_events().is_empty());
}

#[test]
fn test_start_unknown_node_keeps_state() {
    let mut r = runner(INTRO);
    r.start_node("Intro").unwrap();
    r.continue_dialogue().unwrap();
    assert_eq!(
        r.start_node("Missing").unwrap_err(),
        EvalError::UnknownNode("Missing".into())
    );
    assert_eq!(r.current_node(), Some("Intro"));
    assert!(r.is_waiting_for_choice());
}

#[test]
fn test_start_node_drops_pending_choice() {
    let mut r = runner(TIMED);
    r.start_node("Duel").unwrap();
    assert!(r.timer_remaining().is_some());
    r.start_node("Duel").unwrap();
    // The restart presented the choice afresh.
    assert!(r.is_waiting_for_choice());
    assert_eq!(r.timer_remaining(), Some(3.0));
}

// ─────────────────────────────────────────────────────────────────────
// If blocks
// ─────────────────────────────────────────────────────────────────────

const BRANCHY: &str = "\
title: Shop
---
<<if gold >= 10>>
Welcome, rich friend.
<<set vip = true>>
<<else>>
Come back with money.
<<endif>>
Goodbye.
===";

#[test]
fn test_if_then_branch() {
    let mut r = runner(BRANCHY);
    r.set("gold", 12);
    r.start_node("Shop").unwrap();
    r.continue_dialogue().unwrap();
    r.continue_dialogue().unwrap();
    let events = r.drain_events();
    assert_eq!(events[0], line("Welcome, rich friend."));
    assert_eq!(
        events[1],
        DialogueEvent::VariableChanged {
            name: "vip".into(),
            value: Value::Bool(true)
        }
    );
    assert_eq!(events[2], line("Goodbye."));
    assert_eq!(events[3], DialogueEvent::DialogueEnded);
}

#[test]
fn test_if_else_branch() {
    let mut r = runner(BRANCHY);
    r.set("gold", 3);
    r.start_node("Shop").unwrap();
    r.continue_dialogue().unwrap();
    assert_eq!(
        r.drain_events(),
        vec![line("Come back with money."), line("Goodbye.")]
    );
}

#[test]
fn test_revisiting_node_reevaluates_branch() {
    let mut r = runner(BRANCHY);
    r.set("gold", 3);
    r.start_node("Shop").unwrap();
    r.drain_events();

    r.set("gold", 50);
    r.start_node("Shop").unwrap();
    assert_eq!(r.drain_events(), vec![line("Welcome, rich friend.")]);
}

#[test]
fn test_choice_inside_branch() {
    let source = "\
title: A
---
<<if true>>
-> Stay
-> Go
    <<jump B>>
<<endif>>
Stayed.
===
title: B
---
Went.
===";
    let mut r = runner(source);
    r.start_node("A").unwrap();
    assert_eq!(r.drain_events(), vec![options(&["Stay", "Go"])]);
    r.choose(0).unwrap();
    assert_eq!(r.drain_events(), vec![line("Stayed.")]);

    r.start_node("A").unwrap();
    r.choose(1).unwrap();
    assert_eq!(r.drain_events().last(), Some(&line("Went.")));
}

#[test]
fn test_bad_if_condition() {
    let mut r = runner("title: A\n---\n<<if gold > \"lots\">>\nRich\n<<endif>>\n===");
    r.set("gold", 5);
    let err = r.start_node("A").unwrap_err();
    assert_eq!(
        err,
        EvalError::Condition {
            condition: "gold > \"lots\"".into(),
            source: ExprError::NotComparable {
                op: ">",
                left: "Number",
                right: "String"
            }
        }
    );
}

// ─────────────────────────────────────────────────────────────────────
// Choice errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_choose_out_of_range() {
    let mut r = runner("title: A\n---\n-> One\n-> Two\n===");
    r.start_node("A").unwrap();
    assert_eq!(
        r.choose(99).unwrap_err(),
        EvalError::ChoiceOutOfRange {
            index: 99,
            available: 2
        }
    );
    // Still waiting; a valid choice works afterwards.
    assert!(r.is_waiting_for_choice());
    r.choose(1).unwrap();
    assert!(!r.is_waiting_for_choice());
}

#[test]
fn test_out_of_range_choose_stops_countdown() {
    let mut r = runner(TIMED);
    r.start_node("Duel").unwrap();
    r.drain_events();

    assert!(r.choose(5).is_err());
    assert_eq!(r.timer_remaining(), None);
    assert!(r.is_waiting_for_choice());

    // No countdown remains, so the default is never taken by ticking.
    r.tick(100.0).unwrap();
    assert!(r.drain_events().is_empty());
    assert!(r.is_waiting_for_choice());
    assert_eq!(r.get("parried"), None);

    r.choose(1).unwrap();
    assert_eq!(r.get("dodged"), Some(&Value::Bool(true)));
}

#[test]
fn test_choose_without_pending_choice_is_noop() {
    let mut r = runner("title: A\n---\nHello\n===");
    r.start_node("A").unwrap();
    r.drain_events();
    r.choose(0).unwrap();
    assert!(r.drain_events().is_empty());
}

#[test]
fn test_no_available_choices() {
    let mut r = runner("title: Gate\n---\n-> Enter [if hasKey]\n-> Bribe [if gold > 100]\n===");
    r.set("gold", 5);
    assert_eq!(
        r.start_node("Gate").unwrap_err(),
        EvalError::NoAvailableChoices {
            node: "Gate".into()
        }
    );
    assert!(!r.is_waiting_for_choice());
}

// ─────────────────────────────────────────────────────────────────────
// Timed choices
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_timer_started_with_options() {
    let mut r = runner(TIMED);
    r.start_node("Duel").unwrap();
    assert_eq!(
        r.drain_events(),
        vec![
            options(&["Parry", "Dodge"]),
            DialogueEvent::TimerStarted { seconds: 3.0 }
        ]
    );
    assert_eq!(r.timer_remaining(), Some(3.0));
}

#[test]
fn test_tick_past_limit_selects_default() {
    let mut r = runner(TIMED);
    r.start_node("Duel").unwrap();
    r.drain_events();

    r.tick(3.5).unwrap();
    assert_eq!(
        r.drain_events(),
        vec![
            DialogueEvent::TimerUpdated { remaining: 0.0 },
            DialogueEvent::TimerExpired,
            DialogueEvent::VariableChanged {
                name: "parried".into(),
                value: Value::Bool(true)
            },
            line("After"),
        ]
    );
    assert_eq!(r.timer_remaining(), None);
    assert!(!r.is_waiting_for_choice());
}

#[test]
fn test_ticks_accumulate() {
    let mut r = runner(TIMED);
    r.start_node("Duel").unwrap();
    r.drain_events();

    r.tick(1.0).unwrap();
    r.tick(0.0).unwrap();
    r.tick(-4.0).unwrap();
    r.tick(f64::NAN).unwrap();
    assert_eq!(r.timer_remaining(), Some(2.0));
    assert!(r.is_waiting_for_choice());
    assert_eq!(
        r.drain_events(),
        vec![
            DialogueEvent::TimerUpdated { remaining: 2.0 },
            DialogueEvent::TimerUpdated { remaining: 2.0 },
            DialogueEvent::TimerUpdated { remaining: 2.0 },
            DialogueEvent::TimerUpdated { remaining: 2.0 },
        ]
    );

    r.tick(2.0).unwrap();
    assert_eq!(r.get("parried"), Some(&Value::Bool(true)));
}

#[test]
fn test_manual_choice_disarms_timer() {
    let mut r = runner(TIMED);
    r.start_node("Duel").unwrap();
    r.choose(1).unwrap();
    assert_eq!(r.timer_remaining(), None);
    r.drain_events();
    r.tick(10.0).unwrap();
    assert!(r.drain_events().is_empty());
    assert_eq!(r.get("dodged"), Some(&Value::Bool(true)));
    assert_eq!(r.get("parried"), None);
}

#[test]
fn test_tick_without_timer_is_noop() {
    let mut r = runner(INTRO);
    r.tick(1.0).unwrap();
    r.start_node("Intro").unwrap();
    r.continue_dialogue().unwrap();
    r.drain_events();
    r.tick(1.0).unwrap();
    assert!(r.drain_events().is_empty());
}

#[test]
fn test_untimed_choice_disarms_previous_timer() {
    let source = "title: A\n---\n-> Quick [time 5]\n<<jump B>>\n===\ntitle: B\n---\n-> Slow\n===";
    let mut r = runner(source);
    r.start_node("A").unwrap();
    r.choose(0).unwrap();
    assert_eq!(r.displayed_options(), vec!["Slow"]);
    assert_eq!(r.timer_remaining(), None);
}

// ─────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_listeners_receive_events_in_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut r = runner(INTRO);

    let first = Rc::clone(&seen);
    r.subscribe(move |event| first.borrow_mut().push(("first", event.clone())));
    let second = Rc::clone(&seen);
    r.subscribe(move |event| second.borrow_mut().push(("second", event.clone())));

    r.start_node("Intro").unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![("first", line("Hello!")), ("second", line("Hello!"))]
    );
    // The queue is filled as well.
    assert_eq!(r.drain_events(), vec![line("Hello!")]);
}

#[test]
fn test_no_consumers_is_fine() {
    let mut r = runner(INTRO);
    r.start_node("Intro").unwrap();
    r.continue_dialogue().unwrap();
    r.choose(0).unwrap();
    assert_eq!(r.drain_events().len(), 3);
}

#[test]
fn test_queue_bounded_with_listener_attached() {
    let graph = parse_script(&SourceFile::new(
        "wait.skein",
        "title: A\n---\n-> Wait [time 1000000]\n===",
    ))
    .unwrap();
    let mut r = DialogueRunner::with_config(
        graph,
        RunnerConfig {
            event_queue_limit: 16,
            ..RunnerConfig::default()
        },
    );
    let seen = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&seen);
    r.subscribe(move |_| *counter.borrow_mut() += 1);

    r.start_node("A").unwrap();
    for _ in 0..10_000 {
        r.tick(0.001).unwrap();
    }
    assert_eq!(*seen.borrow(), 10_002);

    let queued = r.drain_events();
    assert_eq!(queued.len(), 16);
    // The newest events are kept.
    assert!(queued
        .iter()
        .all(|e| matches!(e, DialogueEvent::TimerUpdated { .. })));
    assert!(r.drain_events().is_empty());
}

#[test]
fn test_default_queue_limit_applies() {
    let mut r = runner("title: A\n---\n-> Wait [time 1000000]\n===");
    r.start_node("A").unwrap();
    for _ in 0..5_000 {
        r.tick(0.001).unwrap();
    }
    assert_eq!(r.drain_events().len(), r.config().event_queue_limit);
}

#[test]
fn test_queue_disabled_for_listener_only_hosts() {
    let graph = parse_script(&SourceFile::new("intro.skein", INTRO)).unwrap();
    let mut r = DialogueRunner::with_config(
        graph,
        RunnerConfig {
            event_queue_limit: 0,
            ..RunnerConfig::default()
        },
    );
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    r.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    r.start_node("Intro").unwrap();
    r.continue_dialogue().unwrap();
    assert_eq!(*seen.borrow(), vec![line("Hello!"), options(&["Leave"])]);
    assert!(r.drain_events().is_empty());
}

// ─────────────────────────────────────────────────────────────────────
// Step limit
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_jump_cycle_hits_step_limit() {
    let source = "title: A\n---\n<<jump B>>\n===\ntitle: B\n---\n<<jump A>>\n===";
    let graph = parse_script(&SourceFile::new("loop.skein", source)).unwrap();
    let mut r = DialogueRunner::with_config(
        graph,
        RunnerConfig {
            step_limit: 50,
            ..RunnerConfig::default()
        },
    );
    assert!(matches!(
        r.start_node("A").unwrap_err(),
        EvalError::StepLimitExceeded { limit: 50, .. }
    ));
}

#[test]
fn test_step_limit_resets_per_call() {
    let source = "title: A\n---\n<<set a = 1>>\n<<set b = 2>>\nOne\n<<set c = 3>>\n<<set d = 4>>\nTwo\n===";
    let graph = parse_script(&SourceFile::new("limit.skein", source)).unwrap();
    let mut r = DialogueRunner::with_config(
        graph,
        RunnerConfig {
            step_limit: 3,
            ..RunnerConfig::default()
        },
    );
    r.start_node("A").unwrap();
    r.continue_dialogue().unwrap();
    assert_eq!(r.drain_events().last(), Some(&line("Two")));
}
