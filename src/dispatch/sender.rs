//! Cloneable handle for posting events from anywhere.

use crate::dispatch::queue::{EventEnvelope, EventQueue};
use crate::extension::ExtensionPipeline;
use std::sync::Arc;

/// Enqueue-only handle to a dispatcher's queue.
///
/// A sender never processes events itself. Events posted through it are
/// picked up by the worker of an active machine, or by the drain that is
/// running (or the next one to run) on a passive machine. This makes it
/// the way for callbacks to post follow-up events.
///
/// Unlike the dispatcher's own `post`, a sender does not check that the
/// machine is initialized. On a running but uninitialized active machine
/// the worker drops such an event and logs it. On a passive machine the
/// event stays queued and the next `post` or `start` returns
/// [`MachineError::NotInitialized`](crate::MachineError::NotInitialized).
pub struct EventSender<S, E, A> {
    queue: Arc<EventQueue<E, A>>,
    extensions: ExtensionPipeline<S, E, A>,
}

impl<S, E, A> Clone for EventSender<S, E, A> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            extensions: self.extensions.clone(),
        }
    }
}

impl<S, E, A> EventSender<S, E, A> {
    pub(crate) fn new(queue: Arc<EventQueue<E, A>>, extensions: ExtensionPipeline<S, E, A>) -> Self {
        Self { queue, extensions }
    }

    pub fn post(&self, event: E) {
        self.send(EventEnvelope::normal(event, None));
    }

    pub fn post_with(&self, event: E, argument: A) {
        self.send(EventEnvelope::normal(event, Some(argument)));
    }

    pub fn post_priority(&self, event: E) {
        self.send(EventEnvelope::priority(event, None));
    }

    pub fn post_priority_with(&self, event: E, argument: A) {
        self.send(EventEnvelope::priority(event, Some(argument)));
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn send(&self, envelope: EventEnvelope<E, A>) {
        enqueue(&self.queue, &self.extensions, envelope);
    }
}

/// Notify extensions about `envelope` and append it to `queue`.
pub(crate) fn enqueue<S, E, A>(
    queue: &EventQueue<E, A>,
    extensions: &ExtensionPipeline<S, E, A>,
    envelope: EventEnvelope<E, A>,
) {
    let argument = envelope.argument.as_ref();
    if envelope.priority {
        extensions.for_each(|extension| {
            extension.event_queued_with_priority(&envelope.event, argument)
        });
    } else {
        extensions.for_each(|extension| extension.event_queued(&envelope.event, argument));
    }
    queue.push(envelope);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::Extension;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct QueueWatcher {
        seen: Mutex<Vec<(u8, bool)>>,
    }

    impl Extension<u8, u8, ()> for QueueWatcher {
        fn event_queued(&self, event: &u8, _argument: Option<&()>) {
            self.seen.lock().push((*event, false));
        }

        fn event_queued_with_priority(&self, event: &u8, _argument: Option<&()>) {
            self.seen.lock().push((*event, true));
        }
    }

    #[test]
    fn sender_enqueues_and_notifies_extensions() {
        let queue = Arc::new(EventQueue::new());
        let extensions: ExtensionPipeline<u8, u8, ()> = ExtensionPipeline::new();
        let watcher = Arc::new(QueueWatcher::default());
        extensions.add(watcher.clone());
        let sender = EventSender::new(Arc::clone(&queue), extensions);

        sender.post(1);
        sender.clone().post_priority(2);

        assert_eq!(sender.pending(), 2);
        assert_eq!(*watcher.seen.lock(), vec![(1, false), (2, true)]);
        assert_eq!(queue.pop().map(|envelope| envelope.event), Some(2));
    }
}
