//! The transition engine.
//!
//! The engine executes the plans computed by [`core`](crate::core) against
//! one [`ExecutionContext`]: it selects a candidate, runs exit actions,
//! transition actions and entry actions in order, records history and
//! switches the current state. Every callback is awaited to completion
//! before the next one starts; faults are contained per callback.

use crate::core::{
    plan_transition, resolve_descent, Action, CallbackFault, EventArgument, EventKey, StateGraph,
    StateId, StateKey, TransitionCandidate,
};
use crate::effects::context::ExecutionContext;
use crate::effects::error::MachineError;
use crate::effects::notify::{
    FaultEventArgs, Notifier, TransitionCompletedEventArgs, TransitionEventArgs,
};
use crate::extension::{ExtensionPipeline, FaultSite, FaultSource, TransitionInfo};
use chrono::Utc;
use tracing::{debug, trace, warn};

/// Outcome of firing one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionResult<S> {
    /// A candidate was executed; carries the new current state.
    Fired(S),

    /// No candidate accepted the event.
    NotFired,
}

impl<S> TransitionResult<S> {
    pub fn is_fired(&self) -> bool {
        matches!(self, Self::Fired(_))
    }

    pub fn new_state(&self) -> Option<&S> {
        match self {
            Self::Fired(state) => Some(state),
            Self::NotFired => None,
        }
    }
}

enum Outcome<S, E, A> {
    Completed(TransitionCompletedEventArgs<S, E, A>),
    Declined(TransitionEventArgs<S, E, A>),
}

/// A processed event whose notifications are still pending.
///
/// The engine runs under the context lock; the completed or declined
/// notification and the `fired_event` hook are published by
/// [`publish`](Self::publish) once the lock is released.
#[must_use]
pub(crate) struct Processed<S, E, A> {
    result: TransitionResult<S>,
    outcome: Outcome<S, E, A>,
    /// Current state after processing.
    state: S,
    event: E,
    argument: Option<A>,
    escalation: Result<(), MachineError>,
}

impl<S, E, A> Processed<S, E, A> {
    pub(crate) fn publish(
        self,
        notifier: &Notifier<S, E, A>,
        extensions: &ExtensionPipeline<S, E, A>,
    ) -> Result<TransitionResult<S>, MachineError> {
        match &self.outcome {
            Outcome::Completed(args) => notifier.transition_completed(args),
            Outcome::Declined(args) => notifier.transition_declined(args),
        }
        extensions.for_each(|extension| {
            extension.fired_event(&self.state, &self.event, self.argument.as_ref())
        });

        self.escalation?;
        Ok(self.result)
    }
}

/// An initialization whose `entered_initial_state` hook is still pending.
#[must_use]
pub(crate) struct Entered<S> {
    state: S,
    leaf: S,
    escalation: Result<(), MachineError>,
}

impl<S> Entered<S> {
    pub(crate) fn publish<E, A>(
        self,
        extensions: &ExtensionPipeline<S, E, A>,
    ) -> Result<S, MachineError> {
        extensions
            .for_each(|extension| extension.entered_initial_state(&self.state, &self.leaf));

        self.escalation?;
        Ok(self.leaf)
    }
}

/// One engine run over a locked context.
///
/// Faults reported while no fault listener is registered are collected
/// and returned as [`MachineError::UnhandledFault`] when the run's
/// result is published.
pub(crate) struct Engine<'m, S, E, A> {
    graph: &'m StateGraph<S, E, A>,
    context: &'m mut ExecutionContext<S, E, A>,
    extensions: ExtensionPipeline<S, E, A>,
    notifier: &'m Notifier<S, E, A>,
    unhandled: Vec<CallbackFault>,
}

impl<'m, S, E, A> Engine<'m, S, E, A>
where
    S: StateKey,
    E: EventKey,
    A: EventArgument,
{
    pub(crate) fn new(
        graph: &'m StateGraph<S, E, A>,
        context: &'m mut ExecutionContext<S, E, A>,
        notifier: &'m Notifier<S, E, A>,
    ) -> Self {
        let extensions = context.extensions().clone();
        Self {
            graph,
            context,
            extensions,
            notifier,
            unhandled: Vec::new(),
        }
    }

    /// Process one event against the current state.
    pub(crate) async fn fire(
        mut self,
        event: E,
        argument: Option<A>,
    ) -> Result<Processed<S, E, A>, MachineError> {
        let current = self.context.current().ok_or(MachineError::NotInitialized)?;
        let graph = self.graph;

        let (event, argument) = self
            .extensions
            .intercept((event, argument), |extension, (event, argument)| {
                extension.firing_event(event, argument.as_ref())
            });
        trace!(state = ?graph.key(current), event = ?event, "firing event");

        let result = self.select(current, &event, argument.as_ref()).await;

        let state = graph.key(current).clone();
        let outcome = match &result {
            TransitionResult::Fired(new_state) => {
                debug!(from = ?state, to = ?new_state, event = ?event, "transition completed");
                Outcome::Completed(TransitionCompletedEventArgs {
                    state,
                    event: event.clone(),
                    argument: argument.clone(),
                    new_state: new_state.clone(),
                    completed_at: Utc::now(),
                })
            }
            TransitionResult::NotFired => {
                debug!(state = ?state, event = ?event, "transition declined");
                Outcome::Declined(TransitionEventArgs {
                    state,
                    event: event.clone(),
                    argument: argument.clone(),
                })
            }
        };

        let now = self.context.current().unwrap_or(current);
        Ok(Processed {
            result,
            outcome,
            state: graph.key(now).clone(),
            event,
            argument,
            escalation: self.escalate(),
        })
    }

    /// Enter `state` and its ancestors top-down, then resolve history to a
    /// leaf and make it current.
    pub(crate) async fn initialize(mut self, state: StateId) -> Result<Entered<S>, MachineError> {
        if self.context.is_initialized() {
            return Err(MachineError::AlreadyInitialized);
        }
        let graph = self.graph;
        let key = graph.key(state);

        self.extensions
            .for_each(|extension| extension.entering_initial_state(key));

        let mut path: Vec<StateId> = graph.ancestors(state).collect();
        path.reverse();
        for ancestor in path {
            self.enter(ancestor, None, None).await;
        }

        let leaf = self.descend(state, None, None).await;
        self.switch_state(None, leaf);
        debug!(state = ?key, leaf = ?graph.key(leaf), "entered initial state");

        Ok(Entered {
            state: key.clone(),
            leaf: graph.key(leaf).clone(),
            escalation: self.escalate(),
        })
    }

    async fn select(
        &mut self,
        current: StateId,
        event: &E,
        argument: Option<&A>,
    ) -> TransitionResult<S> {
        let graph = self.graph;

        let Some((source, candidates)) = graph.ancestors(current).find_map(|state| {
            let candidates = graph.node(state).candidates(event);
            (!candidates.is_empty()).then_some((state, candidates))
        }) else {
            return TransitionResult::NotFired;
        };

        for candidate in candidates {
            let info = TransitionInfo {
                source: graph.key(source),
                target: candidate.target().map(|target| graph.key(target)),
                event,
                argument,
            };

            let accepted = match candidate.guard() {
                None => true,
                Some(guard) => match guard.check(argument).await {
                    Ok(accepted) => accepted,
                    Err(fault) => {
                        self.report_fault(FaultSource::Guard, current, Some(event), argument, fault);
                        false
                    }
                },
            };

            if !accepted {
                trace!(source = ?info.source, target = ?info.target, "guard rejected candidate");
                self.extensions
                    .for_each(|extension| extension.skipped_transition(&info));
                continue;
            }

            let new_state = self
                .execute(current, source, candidate, &info, event, argument)
                .await;
            return TransitionResult::Fired(graph.key(new_state).clone());
        }

        TransitionResult::NotFired
    }

    async fn execute(
        &mut self,
        current: StateId,
        source: StateId,
        candidate: &'m TransitionCandidate<A>,
        info: &TransitionInfo<'_, S, E, A>,
        event: &E,
        argument: Option<&A>,
    ) -> StateId {
        let graph = self.graph;

        self.notifier.transition_begin(&TransitionEventArgs {
            state: graph.key(current).clone(),
            event: event.clone(),
            argument: argument.cloned(),
        });
        self.extensions
            .for_each(|extension| extension.executing_transition(info));

        let new_state = match candidate.target() {
            None => {
                self.run_actions(candidate.actions(), current, event, argument)
                    .await;
                current
            }
            Some(target) => {
                let path = plan_transition(graph, current, source, target);
                for state in path.exits {
                    self.exit(state, Some(event), argument).await;
                }
                self.run_actions(candidate.actions(), current, event, argument)
                    .await;
                for state in path.entries {
                    self.enter(state, Some(event), argument).await;
                }
                let leaf = self.descend(target, Some(event), argument).await;
                self.switch_state(Some(current), leaf);
                leaf
            }
        };

        self.extensions
            .for_each(|extension| extension.executed_transition(info));
        new_state
    }

    /// Enter the history-resolved sub-states below `state`; returns the leaf.
    async fn descend(&mut self, state: StateId, event: Option<&E>, argument: Option<&A>) -> StateId {
        let descent = resolve_descent(self.graph, state, self.context.history());
        let leaf = descent.last().copied().unwrap_or(state);
        for sub_state in descent {
            self.enter(sub_state, event, argument).await;
        }
        leaf
    }

    async fn run_actions(
        &mut self,
        actions: &'m [Action<A>],
        current: StateId,
        event: &E,
        argument: Option<&A>,
    ) {
        for action in actions {
            if let Err(fault) = action.execute(argument).await {
                self.report_fault(FaultSource::Action, current, Some(event), argument, fault);
            }
        }
    }

    async fn enter(&mut self, state: StateId, event: Option<&E>, argument: Option<&A>) {
        let graph = self.graph;
        let node = graph.node(state);
        trace!(state = ?node.key(), "entering");
        for action in &node.entry_actions {
            if let Err(fault) = action.execute(argument).await {
                self.report_fault(FaultSource::Entry, state, event, argument, fault);
            }
        }
    }

    async fn exit(&mut self, state: StateId, event: Option<&E>, argument: Option<&A>) {
        let graph = self.graph;
        let node = graph.node(state);
        trace!(state = ?node.key(), "exiting");
        for action in &node.exit_actions {
            if let Err(fault) = action.execute(argument).await {
                self.report_fault(FaultSource::Exit, state, event, argument, fault);
            }
        }
        if let Some(parent) = node.parent() {
            self.context.history_mut().record(parent, state);
        }
    }

    fn switch_state(&mut self, old: Option<StateId>, new: StateId) {
        let graph = self.graph;
        self.context.set_current(new);
        self.extensions.for_each(|extension| {
            extension.switched_state(old.map(|state| graph.key(state)), graph.key(new))
        });
    }

    fn report_fault(
        &mut self,
        source: FaultSource,
        state: StateId,
        event: Option<&E>,
        argument: Option<&A>,
        fault: CallbackFault,
    ) {
        let graph = self.graph;
        let key = graph.key(state);
        let site = FaultSite {
            source,
            state: key,
            event,
            argument,
        };

        let fault = self
            .extensions
            .intercept(fault, |extension, fault| extension.handling_fault(&site, fault));
        warn!(source = ?source, state = ?key, fault = %fault, "callback fault");

        if self.notifier.has_fault_listener() {
            self.notifier.fault_thrown(&FaultEventArgs {
                source,
                state: key.clone(),
                event: event.cloned(),
                argument: argument.cloned(),
                fault: fault.clone(),
            });
        } else {
            self.unhandled.push(fault.clone());
        }

        self.extensions
            .for_each(|extension| extension.handled_fault(&site, &fault));
    }

    fn escalate(&mut self) -> Result<(), MachineError> {
        let mut faults = std::mem::take(&mut self.unhandled);
        if faults.is_empty() {
            return Ok(());
        }
        let count = faults.len();
        Err(MachineError::UnhandledFault {
            first: faults.swap_remove(0),
            count,
        })
    }
}
