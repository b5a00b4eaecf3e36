//! Background dispatcher.

use crate::config::MachineConfig;
use crate::core::{EventArgument, EventKey, StateGraph, StateKey};
use crate::dispatch::queue::{EventEnvelope, EventQueue};
use crate::dispatch::sender::{self, EventSender};
use crate::dispatch::Dispatcher;
use crate::effects::{MachineError, StateMachine};
use futures::executor::block_on;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Dispatcher that processes events on a dedicated worker thread.
///
/// `post` only enqueues. The worker is named after the machine and
/// processes one event at a time. Nobody waits on the worker, so
/// escalated faults and other processing errors are logged at `error`
/// level instead of being returned.
pub struct ActiveStateMachine<S, E, A> {
    machine: Arc<StateMachine<S, E, A>>,
    queue: Arc<EventQueue<E, A>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stack_size: Option<usize>,
}

impl<S, E, A> ActiveStateMachine<S, E, A>
where
    S: StateKey,
    E: EventKey,
    A: EventArgument,
{
    pub fn new(graph: impl Into<Arc<StateGraph<S, E, A>>>, config: &MachineConfig) -> Self {
        Self {
            machine: Arc::new(StateMachine::new(graph, config)),
            queue: Arc::new(EventQueue::new()),
            worker: Mutex::new(None),
            stack_size: config.worker_stack_size,
        }
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn spawn_worker(&self) -> Result<(), MachineError> {
        let machine = Arc::clone(&self.machine);
        let queue = Arc::clone(&self.queue);

        let mut builder = thread::Builder::new().name(self.machine.name().to_string());
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        let handle = builder
            .spawn(move || run_worker(&machine, &queue))
            .map_err(|e| {
                self.queue.release_consumer();
                self.queue.set_running(false);
                MachineError::WorkerSpawn(e)
            })?;

        // a previous worker has already given up its slot and is exiting
        let previous = self.worker.lock().replace(handle);
        if let Some(previous) = previous {
            join(previous);
        }
        Ok(())
    }
}

impl<S, E, A> ActiveStateMachine<S, E, A> {
    fn halt(&self) {
        let was_running = self.queue.is_running();
        self.queue.set_running(false);

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                // stopped from a callback; the worker exits after this event
                *self.worker.lock() = Some(handle);
            } else {
                join(handle);
            }
        }

        if was_running {
            debug!(machine = self.machine.name(), "stopped");
            self.machine
                .extensions()
                .for_each(|extension| extension.stopped());
        }
    }
}

fn join(handle: JoinHandle<()>) {
    if handle.thread().id() == thread::current().id() {
        return;
    }
    if handle.join().is_err() {
        error!("state machine worker panicked");
    }
}

fn run_worker<S, E, A>(machine: &StateMachine<S, E, A>, queue: &EventQueue<E, A>)
where
    S: StateKey,
    E: EventKey,
    A: EventArgument,
{
    debug!(machine = machine.name(), "worker started");
    while let Some(envelope) = queue.next_blocking() {
        let event = envelope.event.clone();
        if let Err(e) = block_on(machine.fire(envelope.event, envelope.argument)) {
            error!(machine = machine.name(), event = ?event, error = %e, "event processing failed");
        }
    }
    debug!(machine = machine.name(), "worker exited");
}

impl<S, E, A> Dispatcher<S, E, A> for ActiveStateMachine<S, E, A>
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
        Ok(())
    }

    fn start(&self) -> Result<(), MachineError> {
        if !self.machine.is_initialized() && !self.queue.is_empty() {
            return Err(MachineError::NotInitialized);
        }
        let was_running = self.queue.is_running();
        if self.queue.start_consumer() {
            self.spawn_worker()?;
        }
        if !was_running {
            debug!(machine = self.machine.name(), "started");
            self.machine
                .extensions()
                .for_each(|extension| extension.started());
        }
        Ok(())
    }

    /// Stop the worker after its in-flight event and wait for it to exit.
    ///
    /// Called from a callback running on the worker itself, this does not
    /// wait; the worker exits once the callback's event is done.
    fn stop(&self) {
        self.halt();
    }

    fn is_running(&self) -> bool {
        self.queue.is_running()
    }

    /// Initialization runs on the calling thread.
    fn initialize(&self, state: S) -> Result<(), MachineError> {
        if self.machine.is_initialized() {
            return Err(MachineError::AlreadyInitialized);
        }
        block_on(self.machine.initialize(&state)).map(|_| ())
    }

    fn sender(&self) -> EventSender<S, E, A> {
        EventSender::new(Arc::clone(&self.queue), self.machine.extensions().clone())
    }
}

impl<S, E, A> Drop for ActiveStateMachine<S, E, A> {
    fn drop(&mut self) {
        self.halt();
    }
}
