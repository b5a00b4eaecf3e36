//! Snapshot and Resume
//!
//! This example demonstrates suspending a machine to JSON and resuming it
//! in a fresh instance.
//!
//! Key concepts:
//! - Saving current state and history into a `PersistedSnapshot`
//! - JSON for readability, binary for compactness
//! - Deep history surviving the round trip
//! - Loading before the machine is initialized
//!
//! Run with: cargo run --example snapshot_resume

use serde::{Deserialize, Serialize};
use strata::builder::{StateMachineBuilder, TransitionBuilder};
use strata::checkpoint::PersistedSnapshot;
use strata::config::MachineConfig;
use strata::core::{HistoryPolicy, StateGraph};
use strata::dispatch::{Dispatcher, PassiveStateMachine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum Order {
    Draft,
    Review,
    Legal,
    Finance,
    Approved,
    Paused,
}

fn definition() -> StateGraph<Order, &'static str, ()> {
    StateMachineBuilder::new()
        .hierarchy(Order::Review, HistoryPolicy::Deep, Order::Legal, [Order::Legal, Order::Finance])
        .transition(TransitionBuilder::new().from(Order::Draft).on("submit").to(Order::Review))
        .unwrap()
        .transition(TransitionBuilder::new().from(Order::Legal).on("cleared").to(Order::Finance))
        .unwrap()
        .transition(TransitionBuilder::new().from(Order::Finance).on("cleared").to(Order::Approved))
        .unwrap()
        .transition(TransitionBuilder::new().from(Order::Review).on("pause").to(Order::Paused))
        .unwrap()
        .transition(TransitionBuilder::new().from(Order::Paused).on("resume").to(Order::Review))
        .unwrap()
        .build()
        .unwrap()
}

fn main() {
    println!("=== Snapshot and Resume ===\n");

    let order = PassiveStateMachine::new(definition(), &MachineConfig::named("order"));
    order.initialize(Order::Draft).unwrap();
    order.start().unwrap();
    for event in ["submit", "cleared", "pause"] {
        order.post(event).unwrap();
    }
    println!("Before suspend: {:?}", order.current_state());

    let mut snapshot = PersistedSnapshot::new();
    order.save(&mut snapshot).unwrap();
    let json = snapshot.to_json().unwrap();
    let binary = snapshot.to_binary().unwrap();
    println!("\nJSON snapshot ({} bytes):\n{json}", json.len());
    println!("Binary snapshot: {} bytes", binary.len());

    println!("\nResuming in a fresh instance:");
    let mut restored = PersistedSnapshot::<Order>::from_json(&json).unwrap();
    let resumed = PassiveStateMachine::new(definition(), &MachineConfig::named("order-resumed"));
    resumed.load(&mut restored).unwrap();
    resumed.start().unwrap();
    println!("  loaded: {:?}", resumed.current_state());

    resumed.post("resume").unwrap();
    println!("  after resume (deep history): {:?}", resumed.current_state());
    resumed.post("cleared").unwrap();
    println!("  after final clearance: {:?}", resumed.current_state());

    println!("\n=== Example Complete ===");
}
