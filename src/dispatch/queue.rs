//! Event queue shared by a dispatcher, its senders and its worker.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// An event waiting to be processed.
#[derive(Clone, Debug, PartialEq)]
pub struct EventEnvelope<E, A> {
    pub event: E,
    pub argument: Option<A>,
    pub priority: bool,
}

impl<E, A> EventEnvelope<E, A> {
    pub fn normal(event: E, argument: Option<A>) -> Self {
        Self {
            event,
            argument,
            priority: false,
        }
    }

    pub fn priority(event: E, argument: Option<A>) -> Self {
        Self {
            event,
            argument,
            priority: true,
        }
    }
}

struct QueueState<E, A> {
    events: VecDeque<EventEnvelope<E, A>>,
    running: bool,
    consumer_alive: bool,
}

/// FIFO queue with head insertion for priority events.
///
/// Normal events are appended to the tail, priority events are inserted
/// at the head, so priority events posted in a row are processed in
/// reverse order. The queue also carries the running flag of its
/// dispatcher so that a blocked consumer wakes up when it changes.
pub struct EventQueue<E, A> {
    state: Mutex<QueueState<E, A>>,
    signal: Condvar,
}

impl<E, A> Default for EventQueue<E, A> {
    fn default() -> Self {
        Self {
            state: Mutex::new(QueueState {
                events: VecDeque::new(),
                running: false,
                consumer_alive: false,
            }),
            signal: Condvar::new(),
        }
    }
}

impl<E, A> EventQueue<E, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, envelope: EventEnvelope<E, A>) {
        let mut state = self.state.lock();
        if envelope.priority {
            state.events.push_front(envelope);
        } else {
            state.events.push_back(envelope);
        }
        drop(state);
        self.signal.notify_one();
    }

    /// Take the head of the queue without waiting.
    pub fn pop(&self) -> Option<EventEnvelope<E, A>> {
        self.state.lock().events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().events.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn set_running(&self, running: bool) {
        self.state.lock().running = running;
        self.signal.notify_all();
    }

    /// Mark the queue running and claim the consumer slot.
    ///
    /// Returns `true` when no consumer is alive and the caller must start
    /// one; a consumer that is still finishing its last event keeps
    /// consuming instead.
    pub(crate) fn start_consumer(&self) -> bool {
        let mut state = self.state.lock();
        state.running = true;
        let spawn = !state.consumer_alive;
        state.consumer_alive = true;
        spawn
    }

    /// Give the consumer slot back after a failed start.
    pub(crate) fn release_consumer(&self) {
        self.state.lock().consumer_alive = false;
    }

    /// Block until an event is available while running.
    ///
    /// Returns `None` once the queue is stopped; the consumer slot is
    /// released atomically with that decision.
    pub(crate) fn next_blocking(&self) -> Option<EventEnvelope<E, A>> {
        let mut state = self.state.lock();
        loop {
            if !state.running {
                state.consumer_alive = false;
                return None;
            }
            if let Some(envelope) = state.events.pop_front() {
                return Some(envelope);
            }
            self.signal.wait(&mut state);
        }
    }
}
