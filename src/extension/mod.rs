//! Extensions observe and intercept every lifecycle point of a machine.
//!
//! An [`Extension`] has one hook per lifecycle point, all with no-op
//! defaults, so implementors only override what they need. Hooks that
//! may change what the engine does return an [`Intercept`]: `Continue`
//! keeps the value, `Replace` substitutes it for the following
//! extensions and for the engine.
//!
//! Extensions run in registration order. A panicking extension is logged
//! and skipped; the remaining extensions still run.
//!
//! # Example
//!
//! ```rust
//! use strata::extension::{Extension, Intercept};
//!
//! /// Rewrites every `"ping"` event into `"pong"`.
//! struct Rewrite;
//!
//! impl Extension<u8, &'static str, ()> for Rewrite {
//!     fn firing_event(
//!         &self,
//!         event: &&'static str,
//!         argument: Option<&()>,
//!     ) -> Intercept<(&'static str, Option<()>)> {
//!         if *event == "ping" {
//!             Intercept::Replace(("pong", argument.cloned()))
//!         } else {
//!             Intercept::Continue
//!         }
//!     }
//! }
//! ```

mod pipeline;

pub use pipeline::ExtensionPipeline;

use crate::core::CallbackFault;
use std::collections::HashMap;

/// Decision of an intercepting hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intercept<T> {
    /// Keep the value unchanged.
    Continue,

    /// Replace the value.
    Replace(T),
}

/// Which kind of callback raised a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultSource {
    Guard,
    Action,
    Entry,
    Exit,
}

/// Where a fault happened.
#[derive(Debug)]
pub struct FaultSite<'a, S, E, A> {
    pub source: FaultSource,
    pub state: &'a S,
    /// `None` while entering the initial state.
    pub event: Option<&'a E>,
    pub argument: Option<&'a A>,
}

/// A transition the engine is looking at.
#[derive(Debug)]
pub struct TransitionInfo<'a, S, E, A> {
    /// State the transition is declared on.
    pub source: &'a S,
    /// `None` for internal transitions.
    pub target: Option<&'a S>,
    pub event: &'a E,
    pub argument: Option<&'a A>,
}

/// Observer/interceptor attached to a state machine.
#[allow(unused_variables)]
pub trait Extension<S, E, A>: Send + Sync {
    fn started(&self) {}

    fn stopped(&self) {}

    fn event_queued(&self, event: &E, argument: Option<&A>) {}

    fn event_queued_with_priority(&self, event: &E, argument: Option<&A>) {}

    /// Called before an event is fired; may rewrite the event and argument.
    fn firing_event(&self, event: &E, argument: Option<&A>) -> Intercept<(E, Option<A>)> {
        Intercept::Continue
    }

    /// Called after an event was processed, fired or declined.
    fn fired_event(&self, state: &S, event: &E, argument: Option<&A>) {}

    /// Called before a callback fault is reported; may replace the fault.
    fn handling_fault(
        &self,
        site: &FaultSite<'_, S, E, A>,
        fault: &CallbackFault,
    ) -> Intercept<CallbackFault> {
        Intercept::Continue
    }

    /// Called after a callback fault was reported.
    fn handled_fault(&self, site: &FaultSite<'_, S, E, A>, fault: &CallbackFault) {}

    /// A candidate whose guard did not accept the event.
    fn skipped_transition(&self, transition: &TransitionInfo<'_, S, E, A>) {}

    fn executing_transition(&self, transition: &TransitionInfo<'_, S, E, A>) {}

    fn executed_transition(&self, transition: &TransitionInfo<'_, S, E, A>) {}

    /// The current state changed. `old` is `None` when the machine leaves
    /// the uninitialized state.
    fn switched_state(&self, old: Option<&S>, new: &S) {}

    fn entering_initial_state(&self, state: &S) {}

    /// `state` is the state passed to `initialize`, `leaf` the state the
    /// machine ended up in after history resolution.
    fn entered_initial_state(&self, state: &S, leaf: &S) {}

    /// A snapshot was loaded into the machine.
    fn loaded(&self, current: Option<&S>, history: &HashMap<S, S>) {}
}
