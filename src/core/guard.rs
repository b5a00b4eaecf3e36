//! Guard predicates for controlling transitions.
//!
//! Guards decide whether a transition candidate is eligible for the event
//! being fired. They see the event argument only and should not have side
//! effects; the engine evaluates them strictly in declaration order.

use crate::core::callback::{Callback, CallbackFault};
use std::future::Future;

/// Predicate that determines if a transition candidate can fire.
///
/// A guard that fails (returns an error or panics) is treated exactly
/// like a guard that returned `false`; the fault is still reported.
///
/// # Example
///
/// ```rust
/// use strata::core::Guard;
/// use futures::executor::block_on;
///
/// let large_order = Guard::new(|amount: Option<&u32>| amount.is_some_and(|a| *a > 100));
///
/// assert!(block_on(large_order.check(Some(&250))).unwrap());
/// assert!(!block_on(large_order.check(Some(&5))).unwrap());
/// assert!(!block_on(large_order.check(None)).unwrap());
/// ```
pub struct Guard<A>(pub(crate) Callback<A, bool>);

impl<A> Clone for Guard<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Clone + Send + 'static> Guard<A> {
    /// Create a guard from an infallible predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(Option<&A>) -> bool + Send + Sync + 'static,
    {
        Self(Callback::blocking(move |argument| Ok(predicate(argument))))
    }

    /// Create a guard whose evaluation may fail.
    pub fn try_new<F>(predicate: F) -> Self
    where
        F: Fn(Option<&A>) -> Result<bool, CallbackFault> + Send + Sync + 'static,
    {
        Self(Callback::blocking(predicate))
    }

    /// Create a guard whose evaluation may suspend.
    pub fn suspending<F, Fut>(predicate: F) -> Self
    where
        F: Fn(Option<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, CallbackFault>> + Send + 'static,
    {
        Self(Callback::suspending(predicate))
    }

    /// Evaluate the guard for an event argument.
    pub async fn check(&self, argument: Option<&A>) -> Result<bool, CallbackFault> {
        self.0.invoke(argument).await
    }
}
