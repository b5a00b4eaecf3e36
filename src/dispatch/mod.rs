//! Event dispatchers.
//!
//! A dispatcher owns a [`StateMachine`] and an [`EventQueue`] and decides
//! on which thread queued events are processed:
//!
//! - [`PassiveStateMachine`] drains the queue on the thread that posts or
//!   starts, before the call returns.
//! - [`ActiveStateMachine`] drains the queue on one dedicated worker
//!   thread; posting only enqueues.
//!
//! Both implement [`Dispatcher`], which carries the shared API.
//!
//! # Example
//!
//! ```rust
//! use strata::builder::{StateMachineBuilder, TransitionBuilder};
//! use strata::config::MachineConfig;
//! use strata::dispatch::{Dispatcher, PassiveStateMachine};
//!
//! let graph = StateMachineBuilder::<&str, &str, ()>::new()
//!     .transition(TransitionBuilder::new().from("idle").on("go").to("busy"))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let machine = PassiveStateMachine::new(graph, &MachineConfig::named("worker"));
//! machine.initialize("idle").unwrap();
//! machine.start().unwrap();
//! machine.post("go").unwrap();
//!
//! assert_eq!(machine.current_state(), Some("busy"));
//! ```

mod active;
mod passive;
mod queue;
mod sender;

pub use active::ActiveStateMachine;
pub use passive::PassiveStateMachine;
pub use queue::{EventEnvelope, EventQueue};
pub use sender::EventSender;

use crate::checkpoint::{StateMachineLoader, StateMachineSaver};
use crate::core::{EventArgument, EventKey, StateKey};
use crate::effects::{
    FaultEventArgs, MachineError, StateMachine, TransitionCompletedEventArgs, TransitionEventArgs,
};
use crate::extension::Extension;
use std::sync::Arc;

/// Shared API of the passive and active dispatchers.
pub trait Dispatcher<S, E, A>
where
    S: StateKey,
    E: EventKey,
    A: EventArgument,
{
    fn machine(&self) -> &StateMachine<S, E, A>;

    /// Queue one event and, for a passive machine, process the queue.
    ///
    /// Fails with [`MachineError::NotInitialized`] when the dispatcher is
    /// running and the machine was never initialized; the event is not
    /// queued in that case.
    fn enqueue(&self, envelope: EventEnvelope<E, A>) -> Result<(), MachineError>;

    /// Start processing queued events.
    ///
    /// Fails with [`MachineError::NotInitialized`] when events are queued
    /// and the machine was never initialized; the events stay queued.
    fn start(&self) -> Result<(), MachineError>;

    /// Stop processing after the event in flight, if any.
    fn stop(&self);

    fn is_running(&self) -> bool;

    /// Enter `state` and its ancestors and resolve history to a leaf.
    fn initialize(&self, state: S) -> Result<(), MachineError>;

    fn sender(&self) -> EventSender<S, E, A>;

    fn post(&self, event: E) -> Result<(), MachineError> {
        self.enqueue(EventEnvelope::normal(event, None))
    }

    fn post_with(&self, event: E, argument: A) -> Result<(), MachineError> {
        self.enqueue(EventEnvelope::normal(event, Some(argument)))
    }

    /// Queue an event ahead of all normal events.
    fn post_priority(&self, event: E) -> Result<(), MachineError> {
        self.enqueue(EventEnvelope::priority(event, None))
    }

    fn post_priority_with(&self, event: E, argument: A) -> Result<(), MachineError> {
        self.enqueue(EventEnvelope::priority(event, Some(argument)))
    }

    fn current_state(&self) -> Option<S> {
        self.machine().current_state()
    }

    fn is_initialized(&self) -> bool {
        self.machine().is_initialized()
    }

    fn save<W>(&self, saver: &mut W) -> Result<(), MachineError>
    where
        W: StateMachineSaver<S> + ?Sized,
    {
        self.machine().save(saver)
    }

    /// Restore a saved machine. Only allowed before initialization.
    fn load<L>(&self, loader: &mut L) -> Result<(), MachineError>
    where
        L: StateMachineLoader<S> + ?Sized,
    {
        self.machine().load(loader)
    }

    fn add_extension(&self, extension: Arc<dyn Extension<S, E, A>>) {
        self.machine().extensions().add(extension);
    }

    fn clear_extensions(&self) {
        self.machine().extensions().clear();
    }

    fn on_transition_declined<F>(&self, listener: F)
    where
        F: Fn(&TransitionEventArgs<S, E, A>) + Send + Sync + 'static,
    {
        self.machine().notifications().on_transition_declined(listener);
    }

    fn on_transition_begin<F>(&self, listener: F)
    where
        F: Fn(&TransitionEventArgs<S, E, A>) + Send + Sync + 'static,
    {
        self.machine().notifications().on_transition_begin(listener);
    }

    fn on_transition_completed<F>(&self, listener: F)
    where
        F: Fn(&TransitionCompletedEventArgs<S, E, A>) + Send + Sync + 'static,
    {
        self.machine().notifications().on_transition_completed(listener);
    }

    fn on_fault<F>(&self, listener: F)
    where
        F: Fn(&FaultEventArgs<S, E, A>) + Send + Sync + 'static,
    {
        self.machine().notifications().on_fault(listener);
    }
}
