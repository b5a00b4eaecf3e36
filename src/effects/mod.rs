//! The imperative shell around the pure core.
//!
//! [`core`](crate::core) plans which states to exit and enter; this module
//! runs those plans: it invokes guards and actions, records history,
//! switches the current state and reports what happened to extensions and
//! notification listeners.
//!
//! # Key Concepts
//!
//! - **Execution context**: current state, history and extensions of one
//!   machine instance
//! - **Engine**: an `async` algorithm that awaits each callback before the
//!   next one; dispatchers drive it to completion
//! - **Fault containment**: a failing or panicking callback never aborts a
//!   transition. It is reported on the fault channel, or escalated to the
//!   caller as [`MachineError::UnhandledFault`] when nobody listens

mod context;
mod engine;
mod error;
mod machine;
mod notify;

pub use context::ExecutionContext;
pub use engine::TransitionResult;
pub use error::MachineError;
pub use machine::StateMachine;
pub use notify::{FaultEventArgs, Notifier, TransitionCompletedEventArgs, TransitionEventArgs};
