//! Builder API for state machine definitions.
//!
//! This module provides fluent builders for declaring states, their
//! hierarchy and their transitions, and validates the structural
//! invariants of the resulting graph before it is handed to a machine.

pub mod error;
pub mod machine;
pub mod state;
pub mod transition;
mod validate;

pub use error::{BuildError, StructuralError};
pub use machine::{Hierarchy, StateMachineBuilder};
pub use state::StateBuilder;
pub use transition::{Transition, TransitionBuilder};

use crate::core::{EventArgument, Guard};

/// Create an unconditional transition without actions.
///
/// # Example
///
/// ```
/// use strata::builder::simple_transition;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Door { Open, Closed }
///
/// let transition = simple_transition::<_, _, ()>(Door::Open, "close", Door::Closed);
/// assert!(transition.guard.is_none());
/// ```
pub fn simple_transition<S, E, A>(from: S, event: E, to: S) -> Transition<S, E, A> {
    Transition {
        from,
        event,
        to: Some(to),
        guard: None,
        actions: Vec::new(),
    }
}

/// Create a transition with a guard predicate.
///
/// # Example
///
/// ```
/// use strata::builder::guarded_transition;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Door { Open, Closed }
///
/// let transition = guarded_transition(Door::Closed, "open", Door::Open, |key: Option<&u32>| {
///     key == Some(&42)
/// });
/// assert!(transition.guard.is_some());
/// ```
pub fn guarded_transition<S, E, A, F>(from: S, event: E, to: S, guard: F) -> Transition<S, E, A>
where
    A: EventArgument,
    F: Fn(Option<&A>) -> bool + Send + Sync + 'static,
{
    Transition {
        from,
        event,
        to: Some(to),
        guard: Some(Guard::new(guard)),
        actions: Vec::new(),
    }
}
