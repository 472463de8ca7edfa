// ABOUTME: Integration tests for the deployment lifecycle state machine.
// ABOUTME: Covers the transition relation, history bookkeeping, and shared access.

use cumulo::deploy::{DeploymentState, SharedStateMachine, StateMachine};
use proptest::prelude::*;
use std::thread;

use DeploymentState::*;

const HAPPY_PATH: [DeploymentState; 6] = [
    ValidatingParameters,
    Linting,
    Planning,
    Deploying,
    VerifyingHealth,
    Completed,
];

#[test]
fn new_machine_starts_initialized_with_one_entry() {
    let machine = StateMachine::new();
    assert_eq!(machine.state(), Initialized);
    assert_eq!(machine.history().len(), 1);
    assert_eq!(machine.history()[0].state, Initialized);
    assert!(!machine.is_terminal());
}

#[test]
fn happy_path_records_seven_entries_in_order() {
    let mut machine = StateMachine::new();
    for state in HAPPY_PATH {
        assert!(machine.transition_to(state), "{state} should be reachable");
    }

    assert_eq!(machine.state(), Completed);
    assert!(machine.is_terminal());

    let states: Vec<_> = machine.history().iter().map(|e| e.state).collect();
    let mut expected = vec![Initialized];
    expected.extend(HAPPY_PATH);
    assert_eq!(states, expected);

    let timestamps: Vec<_> = machine.history().iter().map(|e| e.at).collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn skipping_a_phase_is_rejected_without_side_effects() {
    let mut machine = StateMachine::new();
    assert!(machine.transition_to(ValidatingParameters));

    assert!(!machine.transition_to(Deploying));
    assert_eq!(machine.state(), ValidatingParameters);
    assert_eq!(machine.history().len(), 2);
}

#[test]
fn any_non_terminal_state_can_fail() {
    // Every prefix short of COMPLETED ends in a non-terminal state.
    for index in 0..HAPPY_PATH.len() {
        let mut machine = StateMachine::new();
        for state in &HAPPY_PATH[..index] {
            assert!(machine.transition_to(*state));
        }
        assert!(machine.transition_to(Failed));
        assert_eq!(machine.state(), Failed);
        assert!(machine.is_terminal());
    }
}

#[test]
fn terminal_states_accept_nothing() {
    let mut failed = StateMachine::new();
    assert!(failed.transition_to(Failed));
    for target in DeploymentState::ALL {
        assert!(!failed.transition_to(target));
    }
    assert_eq!(failed.history().len(), 2);
}

#[test]
fn context_is_kept_on_the_history_entry() {
    let mut machine = StateMachine::new();
    assert!(machine.transition_with_context(Failed, Some("cancelled".to_string())));
    let last = machine.history().last().unwrap();
    assert_eq!(last.state, Failed);
    assert_eq!(last.context.as_deref(), Some("cancelled"));
}

#[test]
fn completed_duration_stops_at_last_transition() {
    let mut machine = StateMachine::new();
    for state in HAPPY_PATH {
        machine.transition_to(state);
    }
    let first = machine.duration();
    thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(machine.duration(), first);
}

#[test]
fn running_duration_keeps_growing() {
    let machine = StateMachine::new();
    let first = machine.duration();
    thread::sleep(std::time::Duration::from_millis(20));
    assert!(machine.duration() > first);
}

#[test]
fn shared_machine_accepts_a_contended_edge_once() {
    let shared = SharedStateMachine::new(StateMachine::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || shared.transition_to(ValidatingParameters))
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(shared.snapshot().history.len(), 2);
}

#[test]
fn states_parse_from_their_display_form() {
    for state in DeploymentState::ALL {
        assert_eq!(state.to_string().parse::<DeploymentState>(), Ok(state));
    }
    assert!("ROLLING_BACK".parse::<DeploymentState>().is_err());
}

fn any_state() -> impl Strategy<Value = DeploymentState> {
    prop::sample::select(DeploymentState::ALL.to_vec())
}

proptest! {
    #[test]
    fn history_length_tracks_accepted_transitions(targets in prop::collection::vec(any_state(), 0..40)) {
        let mut machine = StateMachine::new();
        let mut accepted = 0;
        for target in targets {
            let before = machine.state();
            let allowed = before.can_transition_to(target);
            prop_assert_eq!(machine.transition_to(target), allowed);
            if allowed {
                accepted += 1;
                prop_assert_eq!(machine.state(), target);
            } else {
                prop_assert_eq!(machine.state(), before);
            }
        }
        prop_assert_eq!(machine.history().len(), accepted + 1);
    }

    #[test]
    fn allowed_targets_are_next_or_failed(from in any_state(), to in any_state()) {
        let expected = !from.is_terminal() && (to == Failed || from.next() == Some(to));
        prop_assert_eq!(from.can_transition_to(to), expected);
    }
}
