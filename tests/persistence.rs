//! Saving and restoring machines through snapshots.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strata::builder::{StateMachineBuilder, TransitionBuilder};
use strata::checkpoint::{CheckpointError, HistoryEntry, PersistedSnapshot};
use strata::config::MachineConfig;
use strata::core::HistoryPolicy;
use strata::dispatch::{ActiveStateMachine, Dispatcher, PassiveStateMachine};
use strata::MachineError;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
enum Door {
    Closed,
    Open,
    Ajar,
    Wide,
    Locked,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Action {
    Push,
    Widen,
    Shut,
    Lock,
    Unlock,
}

/// Closed | Open{Ajar, Wide} (deep history) | Locked
fn graph() -> strata::core::StateGraph<Door, Action, ()> {
    StateMachineBuilder::new()
        .hierarchy(Door::Open, HistoryPolicy::Deep, Door::Ajar, [Door::Ajar, Door::Wide])
        .transition(TransitionBuilder::new().from(Door::Closed).on(Action::Push).to(Door::Open))
        .unwrap()
        .transition(TransitionBuilder::new().from(Door::Ajar).on(Action::Widen).to(Door::Wide))
        .unwrap()
        .transition(TransitionBuilder::new().from(Door::Open).on(Action::Shut).to(Door::Closed))
        .unwrap()
        .transition(TransitionBuilder::new().from(Door::Closed).on(Action::Lock).to(Door::Locked))
        .unwrap()
        .transition(TransitionBuilder::new().from(Door::Locked).on(Action::Unlock).to(Door::Closed))
        .unwrap()
        .build()
        .unwrap()
}

fn passive() -> PassiveStateMachine<Door, Action, ()> {
    PassiveStateMachine::new(graph(), &MachineConfig::named("door"))
}

fn completed(machine: &impl Dispatcher<Door, Action, ()>) -> Arc<Mutex<Vec<Door>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    machine.on_transition_completed(move |args| sink.lock().push(args.new_state));
    seen
}

#[test]
fn json_snapshot_restores_state_and_history() {
    let original = passive();
    original.initialize(Door::Closed).unwrap();
    original.start().unwrap();
    for action in [Action::Push, Action::Widen, Action::Shut, Action::Lock] {
        original.post(action).unwrap();
    }
    let mut snapshot = PersistedSnapshot::new();
    original.save(&mut snapshot).unwrap();

    let json = snapshot.to_json().unwrap();
    let mut decoded: PersistedSnapshot<Door> = PersistedSnapshot::from_json(&json).unwrap();
    assert_eq!(decoded, snapshot);

    let restored = passive();
    restored.load(&mut decoded).unwrap();
    restored.start().unwrap();
    let original_seen = completed(&original);
    let restored_seen = completed(&restored);

    for action in [Action::Unlock, Action::Push] {
        original.post(action).unwrap();
        restored.post(action).unwrap();
    }

    assert_eq!(restored.current_state(), Some(Door::Wide));
    assert_eq!(*restored_seen.lock(), *original_seen.lock());
    assert_eq!(*restored_seen.lock(), vec![Door::Closed, Door::Wide]);
}

#[test]
fn binary_snapshot_round_trips_through_an_active_machine() {
    let original = ActiveStateMachine::new(graph(), &MachineConfig::named("door-worker"));
    original.initialize(Door::Open).unwrap();
    let mut snapshot = PersistedSnapshot::new();
    original.save(&mut snapshot).unwrap();

    let bytes = snapshot.to_binary().unwrap();
    let mut decoded: PersistedSnapshot<Door> = PersistedSnapshot::from_binary(&bytes).unwrap();

    let restored = ActiveStateMachine::new(graph(), &MachineConfig::named("door-restored"));
    restored.load(&mut decoded).unwrap();
    assert_eq!(restored.current_state(), Some(Door::Ajar));
}

#[test]
fn loading_after_initialization_is_rejected() {
    let machine = passive();
    machine.initialize(Door::Closed).unwrap();
    let mut snapshot = PersistedSnapshot::new();
    snapshot.current_state = Some(Door::Locked);

    let result = machine.load(&mut snapshot);

    assert!(matches!(result, Err(MachineError::AlreadyInitialized)));
    assert_eq!(machine.current_state(), Some(Door::Closed));
}

#[test]
fn history_entry_outside_the_hierarchy_is_rejected() {
    let machine = passive();
    let mut snapshot = PersistedSnapshot::new();
    snapshot.current_state = Some(Door::Closed);
    snapshot.history.push(HistoryEntry {
        super_state: Door::Open,
        last_active: Door::Locked,
    });

    let result = machine.load(&mut snapshot);

    assert!(matches!(result, Err(MachineError::InvalidHistoryState { .. })));
    assert!(!machine.is_initialized());
    assert!(machine.machine().history().is_empty());
}

#[test]
fn empty_snapshot_leaves_the_machine_ready_for_initialize() {
    let machine = passive();
    let mut snapshot = PersistedSnapshot::new();

    machine.load(&mut snapshot).unwrap();

    assert!(!machine.is_initialized());
    machine.initialize(Door::Locked).unwrap();
    assert_eq!(machine.current_state(), Some(Door::Locked));
}

#[test]
fn snapshot_from_a_newer_format_is_refused() {
    let mut snapshot: PersistedSnapshot<Door> = PersistedSnapshot::new();
    snapshot.version += 1;
    let json = snapshot.to_json().unwrap();

    let result = PersistedSnapshot::<Door>::from_json(&json);

    assert!(matches!(result, Err(CheckpointError::UnsupportedVersion { .. })));
}
