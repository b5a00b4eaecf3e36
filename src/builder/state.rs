//! Builder for entry and exit behaviour of a single state.

use crate::core::{Action, EventArgument};

/// Entry and exit actions declared for one state.
///
/// Declaring the same state twice appends to its action lists.
pub struct StateBuilder<S, A> {
    pub(crate) key: S,
    pub(crate) entry: Vec<Action<A>>,
    pub(crate) exit: Vec<Action<A>>,
}

impl<S, A: EventArgument> StateBuilder<S, A> {
    pub fn new(key: S) -> Self {
        Self {
            key,
            entry: Vec::new(),
            exit: Vec::new(),
        }
    }

    /// Append an entry action.
    pub fn entry(mut self, action: Action<A>) -> Self {
        self.entry.push(action);
        self
    }

    /// Append an exit action.
    pub fn exit(mut self, action: Action<A>) -> Self {
        self.exit.push(action);
        self
    }

    /// Append an infallible entry action given as a closure.
    pub fn on_entry<F>(self, f: F) -> Self
    where
        F: Fn(Option<&A>) + Send + Sync + 'static,
    {
        self.entry(Action::new(f))
    }

    /// Append an infallible exit action given as a closure.
    pub fn on_exit<F>(self, f: F) -> Self
    where
        F: Fn(Option<&A>) + Send + Sync + 'static,
    {
        self.exit(Action::new(f))
    }
}
