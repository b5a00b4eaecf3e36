//! Strata: a hierarchical state machine runtime
//!
//! Strata follows a "pure core, imperative shell" split. The core plans
//! transitions as pure functions over an immutable state graph; the shell
//! executes those plans, runs user callbacks and tracks history.
//!
//! # Core Concepts
//!
//! - **State graph**: states with at most one parent, ordered children, an
//!   initial child and a history policy (`None`, `Shallow`, `Deep`)
//! - **Transitions**: per state and event, an ordered list of guarded
//!   candidates; the first whose guard accepts wins
//! - **Engine**: exits up to the nearest common ancestor, runs the
//!   transition actions once, enters down to the target and resolves
//!   history to a leaf
//! - **Dispatchers**: a synchronous [`PassiveStateMachine`] and a
//!   background [`ActiveStateMachine`] sharing one engine
//! - **Extensions and notifications**: observe and intercept every
//!   lifecycle point
//! - **Persistence**: save and load the current state and history
//!
//! # Example
//!
//! ```rust
//! use strata::builder::{StateMachineBuilder, TransitionBuilder};
//! use strata::config::MachineConfig;
//! use strata::core::HistoryPolicy;
//! use strata::dispatch::{Dispatcher, PassiveStateMachine};
//!
//! #[derive(Clone, Debug, PartialEq, Eq, Hash)]
//! enum Player {
//!     Stopped,
//!     Playing,
//!     Track1,
//!     Track2,
//! }
//!
//! let graph = StateMachineBuilder::<Player, &str, ()>::new()
//!     .hierarchy(Player::Playing, HistoryPolicy::Shallow, Player::Track1, [Player::Track1, Player::Track2])
//!     .transition(TransitionBuilder::new().from(Player::Stopped).on("play").to(Player::Playing))
//!     .unwrap()
//!     .transition(TransitionBuilder::new().from(Player::Track1).on("skip").to(Player::Track2))
//!     .unwrap()
//!     .transition(TransitionBuilder::new().from(Player::Playing).on("stop").to(Player::Stopped))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let player = PassiveStateMachine::new(graph, &MachineConfig::named("player"));
//! player.initialize(Player::Stopped).unwrap();
//! player.start().unwrap();
//!
//! player.post("play").unwrap();
//! player.post("skip").unwrap();
//! player.post("stop").unwrap();
//! player.post("play").unwrap();
//!
//! // shallow history resumes the last track
//! assert_eq!(player.current_state(), Some(Player::Track2));
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod effects;
pub mod extension;

// Re-export commonly used types
pub use builder::{StateBuilder, StateMachineBuilder, TransitionBuilder};
pub use checkpoint::{PersistedSnapshot, StateMachineLoader, StateMachineSaver};
pub use config::MachineConfig;
pub use core::{Action, CallbackFault, Guard, HistoryPolicy};
pub use dispatch::{ActiveStateMachine, Dispatcher, EventSender, PassiveStateMachine};
pub use effects::{MachineError, TransitionResult};
pub use extension::{Extension, Intercept};
