//! Per-instance mutable state of a machine.

use crate::core::{StateHistory, StateId};
use crate::extension::ExtensionPipeline;
use parking_lot::RwLock;
use std::sync::Arc;

/// Copy of the current state readable without locking the context.
pub(crate) type PublishedState = Arc<RwLock<Option<StateId>>>;

/// Current state, history and extensions of one machine instance.
///
/// Only the transition engine, initialization and loading mutate a
/// context; every other access is read-only. Every change of the current
/// state is also written to a [`PublishedState`] cell, so readers never
/// wait for a running transition.
pub struct ExecutionContext<S, E, A> {
    current: Option<StateId>,
    published: PublishedState,
    history: StateHistory,
    extensions: ExtensionPipeline<S, E, A>,
}

impl<S, E, A> ExecutionContext<S, E, A> {
    pub fn new(extensions: ExtensionPipeline<S, E, A>) -> Self {
        Self {
            current: None,
            published: PublishedState::default(),
            history: StateHistory::new(),
            extensions,
        }
    }

    /// The active leaf state, `None` until the machine is initialized.
    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn extensions(&self) -> &ExtensionPipeline<S, E, A> {
        &self.extensions
    }

    pub(crate) fn set_current(&mut self, state: StateId) {
        self.current = Some(state);
        *self.published.write() = Some(state);
    }

    pub(crate) fn published(&self) -> PublishedState {
        Arc::clone(&self.published)
    }

    pub(crate) fn history_mut(&mut self) -> &mut StateHistory {
        &mut self.history
    }
}
