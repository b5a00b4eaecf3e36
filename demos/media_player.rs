//! Media Player
//!
//! This example demonstrates a hierarchical machine with history on the
//! synchronous dispatcher.
//!
//! Key concepts:
//! - Super-states with an initial sub-state
//! - Shallow history resuming the last track
//! - Events bubbling from a track to its super-state
//! - Completion listeners reading the machine they observe
//!
//! Run with: cargo run --example media_player

use std::sync::Arc;
use strata::builder::{StateBuilder, StateMachineBuilder, TransitionBuilder};
use strata::config::MachineConfig;
use strata::core::HistoryPolicy;
use strata::dispatch::{Dispatcher, PassiveStateMachine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Player {
    Stopped,
    Playing,
    Track1,
    Track2,
    Track3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Button {
    Play,
    Next,
    Stop,
}

fn main() {
    println!("=== Media Player ===\n");

    let graph = StateMachineBuilder::<Player, Button, ()>::new()
        .state(
            StateBuilder::new(Player::Playing)
                .on_entry(|_| println!("  [entry] speaker on"))
                .on_exit(|_| println!("  [exit] speaker off")),
        )
        .hierarchy(
            Player::Playing,
            HistoryPolicy::Shallow,
            Player::Track1,
            [Player::Track1, Player::Track2, Player::Track3],
        )
        .transition(TransitionBuilder::new().from(Player::Stopped).on(Button::Play).to(Player::Playing))
        .unwrap()
        .transition(TransitionBuilder::new().from(Player::Track1).on(Button::Next).to(Player::Track2))
        .unwrap()
        .transition(TransitionBuilder::new().from(Player::Track2).on(Button::Next).to(Player::Track3))
        .unwrap()
        .transition(TransitionBuilder::new().from(Player::Track3).on(Button::Next).to(Player::Track1))
        .unwrap()
        .transition(TransitionBuilder::new().from(Player::Playing).on(Button::Stop).to(Player::Stopped))
        .unwrap()
        .build()
        .unwrap();

    let player = Arc::new(PassiveStateMachine::new(graph, &MachineConfig::named("player")));

    let handle = Arc::downgrade(&player);
    player.on_transition_completed(move |args| {
        if let Some(player) = handle.upgrade() {
            println!(
                "  {:?} --{:?}--> {:?} (current: {:?})",
                args.state,
                args.event,
                args.new_state,
                player.current_state()
            );
        }
    });
    player.on_transition_declined(|args| {
        println!("  {:?} ignored in {:?}", args.event, args.state);
    });

    player.initialize(Player::Stopped).unwrap();
    player.start().unwrap();

    println!("Press play, skip twice, stop:");
    for button in [Button::Play, Button::Next, Button::Next, Button::Stop] {
        player.post(button).unwrap();
    }

    println!("\nNext while stopped is declined:");
    player.post(Button::Next).unwrap();

    println!("\nPlay again resumes the last track (shallow history):");
    player.post(Button::Play).unwrap();
    println!("  now playing: {:?}", player.current_state());

    println!("\n=== Example Complete ===");
}
