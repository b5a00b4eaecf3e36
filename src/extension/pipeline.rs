//! Ordered list of extensions shared by a machine and its senders.

use crate::extension::{Extension, Intercept};
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

type Extensions<S, E, A> = Vec<Arc<dyn Extension<S, E, A>>>;

/// Registration-ordered extensions.
///
/// Cloning the pipeline shares the same list. Hooks are invoked on a
/// snapshot of the list, so an extension may add or clear extensions from
/// inside a hook without deadlocking; the change applies to the next hook.
pub struct ExtensionPipeline<S, E, A> {
    extensions: Arc<RwLock<Extensions<S, E, A>>>,
}

impl<S, E, A> Clone for ExtensionPipeline<S, E, A> {
    fn clone(&self) -> Self {
        Self {
            extensions: Arc::clone(&self.extensions),
        }
    }
}

impl<S, E, A> Default for ExtensionPipeline<S, E, A> {
    fn default() -> Self {
        Self {
            extensions: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<S, E, A> ExtensionPipeline<S, E, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, extension: Arc<dyn Extension<S, E, A>>) {
        self.extensions.write().push(extension);
    }

    pub fn clear(&self) {
        self.extensions.write().clear();
    }

    pub fn len(&self) -> usize {
        self.extensions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.read().is_empty()
    }

    fn snapshot(&self) -> Extensions<S, E, A> {
        self.extensions.read().clone()
    }

    /// Call `hook` on every extension in registration order.
    pub fn for_each<F>(&self, hook: F)
    where
        F: Fn(&dyn Extension<S, E, A>),
    {
        for extension in self.snapshot() {
            if panic::catch_unwind(AssertUnwindSafe(|| hook(extension.as_ref()))).is_err() {
                warn!("extension panicked while observing; continuing with the next one");
            }
        }
    }

    /// Thread `value` through every extension; each sees the value as
    /// replaced by the extensions before it.
    pub fn intercept<T, F>(&self, value: T, hook: F) -> T
    where
        F: Fn(&dyn Extension<S, E, A>, &T) -> Intercept<T>,
    {
        let mut value = value;
        for extension in self.snapshot() {
            match panic::catch_unwind(AssertUnwindSafe(|| hook(extension.as_ref(), &value))) {
                Ok(Intercept::Continue) => {}
                Ok(Intercept::Replace(replacement)) => value = replacement,
                Err(_) => {
                    warn!("extension panicked while intercepting; keeping the current value")
                }
            }
        }
        value
    }
}
