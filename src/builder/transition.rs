//! Builder for constructing transitions.

use crate::builder::error::BuildError;
use crate::core::{Action, CallbackFault, EventArgument, Guard};

/// A transition as declared by the definition, before it is attached to
/// the state graph.
pub struct Transition<S, E, A> {
    pub from: S,
    pub event: E,
    pub to: Option<S>,
    pub guard: Option<Guard<A>>,
    pub actions: Vec<Action<A>>,
}

/// Builder for constructing transitions with a fluent API.
///
/// Omitting [`to`](Self::to) declares an internal transition: its actions
/// run without leaving the source state.
///
/// # Example
///
/// ```rust
/// use strata::builder::TransitionBuilder;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Light { Red, Green }
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Signal { Go }
///
/// let transition = TransitionBuilder::<Light, Signal, u32>::new()
///     .from(Light::Red)
///     .on(Signal::Go)
///     .to(Light::Green)
///     .when(|cars| cars.is_some_and(|n| *n > 0))
///     .execute(|_| println!("switching"))
///     .build()
///     .unwrap();
///
/// assert_eq!(transition.to, Some(Light::Green));
/// ```
pub struct TransitionBuilder<S, E, A> {
    from: Option<S>,
    event: Option<E>,
    to: Option<S>,
    guard: Option<Guard<A>>,
    actions: Vec<Action<A>>,
}

impl<S, E, A: EventArgument> TransitionBuilder<S, E, A> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            from: None,
            event: None,
            to: None,
            guard: None,
            actions: Vec::new(),
        }
    }

    /// Set the source state (required).
    pub fn from(mut self, state: S) -> Self {
        self.from = Some(state);
        self
    }

    /// Set the triggering event (required).
    pub fn on(mut self, event: E) -> Self {
        self.event = Some(event);
        self
    }

    /// Set the target state. Without a target the transition is internal.
    pub fn to(mut self, state: S) -> Self {
        self.to = Some(state);
        self
    }

    /// Add a guard (optional).
    pub fn guard(mut self, guard: Guard<A>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<&A>) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Add a guard using a closure that may fail (optional).
    pub fn try_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<&A>) -> Result<bool, CallbackFault> + Send + Sync + 'static,
    {
        self.guard = Some(Guard::try_new(predicate));
        self
    }

    /// Append an action. Actions run in the order they were added.
    pub fn action(mut self, action: Action<A>) -> Self {
        self.actions.push(action);
        self
    }

    /// Append an action using a closure.
    pub fn execute<F>(self, f: F) -> Self
    where
        F: Fn(Option<&A>) + Send + Sync + 'static,
    {
        self.action(Action::new(f))
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition<S, E, A>, BuildError> {
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        let event = self.event.ok_or(BuildError::MissingEvent)?;

        Ok(Transition {
            from,
            event,
            to: self.to,
            guard: self.guard,
            actions: self.actions,
        })
    }
}

impl<S, E, A: EventArgument> Default for TransitionBuilder<S, E, A> {
    fn default() -> Self {
        Self::new()
    }
}
