//! Core state machine types and logic.
//!
//! This module contains the pure part of the runtime:
//! - State keys and the immutable state graph
//! - Guard and action callbacks
//! - History resolution and exit/entry path planning
//!
//! Nothing in this module mutates a running machine; the engine in
//! [`effects`](crate::effects) executes the plans computed here.

mod callback;
mod graph;
mod guard;
mod history;
mod path;
mod state;

pub use callback::{Action, Callback, CallbackFault};
pub use graph::{StateGraph, TransitionCandidate};
pub use guard::Guard;
pub use history::{resolve_descent, StateHistory};
pub use path::{plan_transition, TransitionPath};
pub use state::{EventArgument, EventKey, HistoryPolicy, StateId, StateKey, StateNode};
