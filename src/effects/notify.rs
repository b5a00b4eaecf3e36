//! Notification channels of a running machine.
//!
//! Four channels are available: transition declined, transition begin,
//! transition completed and fault thrown. Listeners run on the thread
//! that executes the engine.
//!
//! Declined and completed listeners run after the machine's context is
//! unlocked and may call any machine method. Begin and fault listeners
//! run mid-transition with the context locked; they may read the current
//! state and post events, but not read history, save or load.

use crate::core::CallbackFault;
use crate::extension::FaultSource;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

/// Arguments of the declined and begin channels.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionEventArgs<S, E, A> {
    /// State the machine was in when the event was fired.
    pub state: S,
    pub event: E,
    pub argument: Option<A>,
}

/// Arguments of the completed channel.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionCompletedEventArgs<S, E, A> {
    /// State the machine was in when the event was fired.
    pub state: S,
    pub event: E,
    pub argument: Option<A>,
    pub new_state: S,
    pub completed_at: DateTime<Utc>,
}

/// Arguments of the fault channel.
#[derive(Clone, Debug, PartialEq)]
pub struct FaultEventArgs<S, E, A> {
    pub source: FaultSource,
    /// Current state for guard and action faults, the entered or exited
    /// state for entry and exit faults.
    pub state: S,
    /// `None` while entering the initial state.
    pub event: Option<E>,
    pub argument: Option<A>,
    pub fault: CallbackFault,
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Channel<T> {
    listeners: RwLock<Vec<Listener<T>>>,
}

impl<T> Channel<T> {
    fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    fn subscribe(&self, listener: Listener<T>) {
        self.listeners.write().push(listener);
    }

    fn has_listeners(&self) -> bool {
        !self.listeners.read().is_empty()
    }

    fn emit(&self, args: &T) {
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(args))).is_err() {
                warn!("notification listener panicked");
            }
        }
    }
}

/// Listener registry for the four notification channels.
pub struct Notifier<S, E, A> {
    declined: Channel<TransitionEventArgs<S, E, A>>,
    begin: Channel<TransitionEventArgs<S, E, A>>,
    completed: Channel<TransitionCompletedEventArgs<S, E, A>>,
    fault: Channel<FaultEventArgs<S, E, A>>,
}

impl<S, E, A> Default for Notifier<S, E, A> {
    fn default() -> Self {
        Self {
            declined: Channel::new(),
            begin: Channel::new(),
            completed: Channel::new(),
            fault: Channel::new(),
        }
    }
}

impl<S, E, A> Notifier<S, E, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// No candidate accepted the event in the current state or its
    /// ancestors.
    pub fn on_transition_declined<F>(&self, listener: F)
    where
        F: Fn(&TransitionEventArgs<S, E, A>) + Send + Sync + 'static,
    {
        self.declined.subscribe(Arc::new(listener));
    }

    /// A candidate was selected and is about to execute.
    pub fn on_transition_begin<F>(&self, listener: F)
    where
        F: Fn(&TransitionEventArgs<S, E, A>) + Send + Sync + 'static,
    {
        self.begin.subscribe(Arc::new(listener));
    }

    pub fn on_transition_completed<F>(&self, listener: F)
    where
        F: Fn(&TransitionCompletedEventArgs<S, E, A>) + Send + Sync + 'static,
    {
        self.completed.subscribe(Arc::new(listener));
    }

    /// A guard, action, entry or exit callback failed.
    ///
    /// Registering at least one listener here absorbs callback faults;
    /// without one they are escalated to the caller.
    pub fn on_fault<F>(&self, listener: F)
    where
        F: Fn(&FaultEventArgs<S, E, A>) + Send + Sync + 'static,
    {
        self.fault.subscribe(Arc::new(listener));
    }

    pub fn has_fault_listener(&self) -> bool {
        self.fault.has_listeners()
    }

    pub(crate) fn transition_declined(&self, args: &TransitionEventArgs<S, E, A>) {
        self.declined.emit(args);
    }

    pub(crate) fn transition_begin(&self, args: &TransitionEventArgs<S, E, A>) {
        self.begin.emit(args);
    }

    pub(crate) fn transition_completed(&self, args: &TransitionCompletedEventArgs<S, E, A>) {
        self.completed.emit(args);
    }

    pub(crate) fn fault_thrown(&self, args: &FaultEventArgs<S, E, A>) {
        self.fault.emit(args);
    }
}
