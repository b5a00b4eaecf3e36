//! Synchronous dispatcher.

use crate::config::MachineConfig;
use crate::core::{EventArgument, EventKey, StateGraph, StateKey};
use crate::dispatch::queue::{EventEnvelope, EventQueue};
use crate::dispatch::sender::{self, EventSender};
use crate::dispatch::Dispatcher;
use crate::effects::{MachineError, StateMachine};
use futures::executor::block_on;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Dispatcher that processes events on the caller's thread.
///
/// While started, `post` drains the whole queue before it returns,
/// including events that callbacks post while the drain is running.
/// While stopped, `post` only queues.
///
/// Several threads may post at once; whichever thread is draining
/// processes the other threads' events before it returns.
///
/// If a callback fault is escalated as
/// [`MachineError::UnhandledFault`], the drain stops after the faulting
/// event and the remaining events stay queued until the next `post` or
/// `start`.
pub struct PassiveStateMachine<S, E, A> {
    machine: StateMachine<S, E, A>,
    queue: Arc<EventQueue<E, A>>,
    executing: AtomicBool,
}

/// Marks a drain (or initialization) in progress; cleared on drop.
struct Executing<'a>(&'a AtomicBool);

impl<'a> Executing<'a> {
    /// `None` when the flag was already set, i.e. on a reentrant call.
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        (!flag.swap(true, Ordering::AcqRel)).then(|| Self(flag))
    }
}

impl Drop for Executing<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S, E, A> PassiveStateMachine<S, E, A>
where
    S: StateKey,
    E: EventKey,
    A: EventArgument,
{
    pub fn new(graph: impl Into<Arc<StateGraph<S, E, A>>>, config: &MachineConfig) -> Self {
        Self {
            machine: StateMachine::new(graph, config),
            queue: Arc::new(EventQueue::new()),
            executing: AtomicBool::new(false),
        }
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn execute(&self) -> Result<(), MachineError> {
        loop {
            {
                let Some(_executing) = Executing::enter(&self.executing) else {
                    // the outer drain picks the new events up
                    return Ok(());
                };
                self.drain()?;
            }
            // a post from another thread may have found the flag still set
            // after the drain saw an empty queue
            if !self.queue.is_running() || self.queue.is_empty() {
                return Ok(());
            }
        }
    }

    fn drain(&self) -> Result<(), MachineError> {
        while self.queue.is_running() {
            if !self.machine.is_initialized() {
                return if self.queue.is_empty() {
                    Ok(())
                } else {
                    Err(MachineError::NotInitialized)
                };
            }
            let Some(envelope) = self.queue.pop() else {
                break;
            };
            block_on(self.machine.fire(envelope.event, envelope.argument))?;
        }
        Ok(())
    }
}

impl<S, E, A> Dispatcher<S, E, A> for PassiveStateMachine<S, E, A>
where
    S: StateKey,
    E: EventKey,
    A: EventArgument,
{
    fn machine(&self) -> &StateMachine<S, E, A> {
        &self.machine
    }

    fn enqueue(&self, envelope: EventEnvelope<E, A>) -> Result<(), MachineError> {
        if self.queue.is_running() && !self.machine.is_initialized() {
            return Err(MachineError::NotInitialized);
        }
        sender::enqueue(&self.queue, self.machine.extensions(), envelope);
        self.execute()
    }

    fn start(&self) -> Result<(), MachineError> {
        if !self.machine.is_initialized() && !self.queue.is_empty() {
            return Err(MachineError::NotInitialized);
        }
        if !self.queue.is_running() {
            self.queue.set_running(true);
            debug!(machine = self.machine.name(), "started");
            self.machine
                .extensions()
                .for_each(|extension| extension.started());
        }
        self.execute()
    }

    fn stop(&self) {
        if self.queue.is_running() {
            self.queue.set_running(false);
            debug!(machine = self.machine.name(), "stopped");
            self.machine
                .extensions()
                .for_each(|extension| extension.stopped());
        }
    }

    fn is_running(&self) -> bool {
        self.queue.is_running()
    }

    fn initialize(&self, state: S) -> Result<(), MachineError> {
        if self.machine.is_initialized() {
            return Err(MachineError::AlreadyInitialized);
        }
        {
            let Some(_executing) = Executing::enter(&self.executing) else {
                return Err(MachineError::AlreadyInitialized);
            };
            block_on(self.machine.initialize(&state))?;
        }
        self.execute()
    }

    fn sender(&self) -> EventSender<S, E, A> {
        EventSender::new(Arc::clone(&self.queue), self.machine.extensions().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{StateMachineBuilder, TransitionBuilder};
    use crate::checkpoint::PersistedSnapshot;
    use parking_lot::Mutex;

    type Machine = PassiveStateMachine<&'static str, &'static str, ()>;

    fn machine() -> Arc<Machine> {
        let graph = StateMachineBuilder::new()
            .transition(TransitionBuilder::new().from("A").on("next").to("B"))
            .unwrap()
            .transition(TransitionBuilder::new().from("B").on("next").to("C"))
            .unwrap()
            .transition(TransitionBuilder::new().from("C").on("next").to("A"))
            .unwrap()
            .build()
            .unwrap();
        Arc::new(PassiveStateMachine::new(graph, &MachineConfig::named("passive")))
    }

    #[test]
    fn stopped_machine_only_queues() {
        let machine = machine();
        machine.initialize("A").unwrap();

        machine.post("next").unwrap();
        machine.post("next").unwrap();

        assert_eq!(machine.pending(), 2);
        assert_eq!(machine.current_state(), Some("A"));

        machine.start().unwrap();

        assert_eq!(machine.pending(), 0);
        assert_eq!(machine.current_state(), Some("C"));
    }

    #[test]
    fn post_to_running_uninitialized_machine_fails() {
        let machine = machine();
        machine.start().unwrap();

        let result = machine.post("next");

        assert!(matches!(result, Err(MachineError::NotInitialized)));
        assert_eq!(machine.pending(), 0);
    }

    #[test]
    fn start_with_queued_events_requires_initialization() {
        let machine = machine();
        machine.post("next").unwrap();

        let result = machine.start();

        assert!(matches!(result, Err(MachineError::NotInitialized)));
        assert!(!machine.is_running());
        assert_eq!(machine.pending(), 1);
    }

    #[test]
    fn reentrant_posts_are_drained_before_post_returns() {
        let machine = machine();
        let sender = machine.sender();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        machine.on_transition_completed(move |args| {
            log.lock().push(args.new_state);
            if args.new_state == "B" {
                sender.post("next");
            }
        });
        machine.initialize("A").unwrap();
        machine.start().unwrap();

        machine.post("next").unwrap();

        assert_eq!(*seen.lock(), vec!["B", "C"]);
        assert_eq!(machine.current_state(), Some("C"));
    }

    #[test]
    fn stop_from_a_callback_halts_the_drain() {
        let machine = machine();
        let handle = Arc::downgrade(&machine);
        machine.on_transition_completed(move |_| {
            if let Some(machine) = handle.upgrade() {
                machine.stop();
            }
        });
        machine.initialize("A").unwrap();
        machine.post("next").unwrap();
        machine.post("next").unwrap();

        machine.start().unwrap();

        assert_eq!(machine.current_state(), Some("B"));
        assert_eq!(machine.pending(), 1);
    }

    #[test]
    fn sender_event_for_uninitialized_machine_stays_queued() {
        let machine = machine();
        machine.start().unwrap();

        machine.sender().post("next");

        assert_eq!(machine.pending(), 1);
        assert!(matches!(machine.post("next"), Err(MachineError::NotInitialized)));
        assert!(matches!(machine.start(), Err(MachineError::NotInitialized)));
        assert_eq!(machine.pending(), 1);
    }

    #[test]
    fn completion_listener_may_query_and_save_the_machine() {
        let machine = machine();
        let handle = Arc::downgrade(&machine);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        machine.on_transition_completed(move |_| {
            if let Some(machine) = handle.upgrade() {
                let mut snapshot = PersistedSnapshot::new();
                machine.save(&mut snapshot).unwrap();
                log.lock().push((machine.current_state(), snapshot.current_state));
            }
        });
        machine.initialize("A").unwrap();
        machine.start().unwrap();

        machine.post("next").unwrap();
        machine.post("next").unwrap();

        assert_eq!(*seen.lock(), vec![(Some("B"), Some("B")), (Some("C"), Some("C"))]);
    }
}
