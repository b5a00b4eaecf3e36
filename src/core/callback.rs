//! Caller-supplied callbacks and the fault type they report.
//!
//! A callback is either *blocking* (a plain closure) or *suspending*
//! (a closure returning a future). Both are invoked through the same
//! `async` entry point so the engine is written once; blocking callbacks
//! simply complete on the first poll.
//!
//! Panics raised by a callback are caught and turned into a
//! [`CallbackFault`], so a misbehaving callback can never unwind through
//! the engine.

use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by a guard, action, entry or exit callback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CallbackFault {
    message: String,
}

impl CallbackFault {
    /// Create a fault with a human-readable message.
    ///
    /// # Example
    ///
    /// ```rust
    /// use strata::core::CallbackFault;
    ///
    /// let fault = CallbackFault::new("inventory service unavailable");
    /// assert_eq!(fault.message(), "inventory service unavailable");
    /// ```
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wrap any error, keeping its display text.
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Self::new(error.to_string())
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::new(format!("callback panicked: {detail}"))
    }
}

type BlockingFn<A, T> = Arc<dyn Fn(Option<&A>) -> Result<T, CallbackFault> + Send + Sync>;

type SuspendingFn<A, T> =
    Arc<dyn Fn(Option<A>) -> BoxFuture<'static, Result<T, CallbackFault>> + Send + Sync>;

/// A callback producing `T` from the optional event argument.
pub enum Callback<A, T> {
    /// Runs to completion on the calling thread.
    Blocking(BlockingFn<A, T>),

    /// Returns a future; the engine awaits it before invoking the next
    /// callback. Receives its own copy of the argument.
    Suspending(SuspendingFn<A, T>),
}

impl<A, T> Clone for Callback<A, T> {
    fn clone(&self) -> Self {
        match self {
            Self::Blocking(f) => Self::Blocking(Arc::clone(f)),
            Self::Suspending(f) => Self::Suspending(Arc::clone(f)),
        }
    }
}

impl<A, T> Callback<A, T>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
{
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(Option<&A>) -> Result<T, CallbackFault> + Send + Sync + 'static,
    {
        Self::Blocking(Arc::new(f))
    }

    pub fn suspending<F, Fut>(f: F) -> Self
    where
        F: Fn(Option<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CallbackFault>> + Send + 'static,
    {
        Self::Suspending(Arc::new(move |argument| f(argument).boxed()))
    }

    /// Invoke the callback, converting panics into faults.
    pub async fn invoke(&self, argument: Option<&A>) -> Result<T, CallbackFault> {
        match self {
            Self::Blocking(f) => panic::catch_unwind(AssertUnwindSafe(|| f(argument)))
                .unwrap_or_else(|payload| Err(CallbackFault::from_panic(payload))),
            Self::Suspending(f) => {
                let future = match panic::catch_unwind(AssertUnwindSafe(|| f(argument.cloned())))
                {
                    Ok(future) => future,
                    Err(payload) => return Err(CallbackFault::from_panic(payload)),
                };
                AssertUnwindSafe(future)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| Err(CallbackFault::from_panic(payload)))
            }
        }
    }
}

/// Transition, entry or exit action.
///
/// # Example
///
/// ```rust
/// use strata::core::{Action, CallbackFault};
///
/// let log = Action::<String>::new(|arg| println!("entered with {arg:?}"));
/// let checked = Action::<String>::try_new(|arg| match arg {
///     Some(_) => Ok(()),
///     None => Err(CallbackFault::new("argument required")),
/// });
/// # let _ = (log, checked);
/// ```
pub struct Action<A>(pub(crate) Callback<A, ()>);

impl<A> Clone for Action<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Clone + Send + 'static> Action<A> {
    /// Action that cannot fail (other than by panicking).
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&A>) + Send + Sync + 'static,
    {
        Self(Callback::blocking(move |argument| {
            f(argument);
            Ok(())
        }))
    }

    /// Action that may report a fault.
    pub fn try_new<F>(f: F) -> Self
    where
        F: Fn(Option<&A>) -> Result<(), CallbackFault> + Send + Sync + 'static,
    {
        Self(Callback::blocking(f))
    }

    /// Action whose body may suspend.
    pub fn suspending<F, Fut>(f: F) -> Self
    where
        F: Fn(Option<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackFault>> + Send + 'static,
    {
        Self(Callback::suspending(f))
    }

    pub async fn execute(&self, argument: Option<&A>) -> Result<(), CallbackFault> {
        self.0.invoke(argument).await
    }
}
