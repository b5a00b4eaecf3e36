//! The machine core shared by both dispatchers.

use crate::checkpoint::{self, StateMachineLoader, StateMachineSaver};
use crate::config::MachineConfig;
use crate::core::{EventArgument, EventKey, StateGraph, StateKey};
use crate::effects::context::{ExecutionContext, PublishedState};
use crate::effects::engine::{Engine, TransitionResult};
use crate::effects::error::MachineError;
use crate::effects::notify::Notifier;
use crate::extension::ExtensionPipeline;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A state graph bound to one execution context.
///
/// The context is locked for the whole of one event, one initialization
/// or one load. Completed and declined notifications, `fired_event`,
/// `entered_initial_state` and `loaded` are published after the lock is
/// released, so their listeners may use the whole machine API.
///
/// Guards, actions, entry and exit actions, begin and fault listeners and
/// the remaining extension hooks run while the context is locked. They may
/// call [`current_state`](Self::current_state), which never takes the
/// lock, and post events, but must not call [`history`](Self::history),
/// [`save`](Self::save) or [`load`](Self::load).
pub struct StateMachine<S, E, A> {
    name: String,
    graph: Arc<StateGraph<S, E, A>>,
    context: Mutex<ExecutionContext<S, E, A>>,
    current: PublishedState,
    extensions: ExtensionPipeline<S, E, A>,
    notifier: Notifier<S, E, A>,
    initialized: AtomicBool,
}

impl<S, E, A> StateMachine<S, E, A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &StateGraph<S, E, A> {
        &self.graph
    }

    pub fn extensions(&self) -> &ExtensionPipeline<S, E, A> {
        &self.extensions
    }

    pub fn notifications(&self) -> &Notifier<S, E, A> {
        &self.notifier
    }

    /// Whether a current state is set. Does not lock the context.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}

impl<S, E, A> StateMachine<S, E, A>
where
    S: StateKey,
    E: EventKey,
    A: EventArgument,
{
    pub fn new(graph: impl Into<Arc<StateGraph<S, E, A>>>, config: &MachineConfig) -> Self {
        let extensions = ExtensionPipeline::new();
        let context = ExecutionContext::new(extensions.clone());
        Self {
            name: config.name.clone(),
            graph: graph.into(),
            current: context.published(),
            context: Mutex::new(context),
            extensions,
            notifier: Notifier::new(),
            initialized: AtomicBool::new(false),
        }
    }

    /// The active leaf state. Does not lock the context.
    pub fn current_state(&self) -> Option<S> {
        let current = *self.current.read();
        current.map(|state| self.graph.key(state).clone())
    }

    /// Recorded history as super-state to last active sub-state.
    pub fn history(&self) -> HashMap<S, S> {
        let context = self.context.lock();
        context
            .history()
            .iter()
            .map(|(super_state, last_active)| {
                (
                    self.graph.key(super_state).clone(),
                    self.graph.key(last_active).clone(),
                )
            })
            .collect()
    }

    /// Enter `state` and resolve its history down to a leaf; returns the
    /// leaf.
    pub async fn initialize(&self, state: &S) -> Result<S, MachineError> {
        let target = self.graph.id_of(state)?;
        let entered = {
            let mut context = self.context.lock();
            debug!(machine = %self.name, state = ?state, "initializing");
            let entered = Engine::new(self.graph(), &mut *context, &self.notifier)
                .initialize(target)
                .await;
            self.mark_initialized(&context);
            entered
        }?;
        entered.publish(&self.extensions)
    }

    /// Fire one event through the engine, then publish its notifications
    /// with the context unlocked.
    pub async fn fire(
        &self,
        event: E,
        argument: Option<A>,
    ) -> Result<TransitionResult<S>, MachineError> {
        let processed = {
            let mut context = self.context.lock();
            // bound so the engine future is dropped before the guard
            let processed = Engine::new(self.graph(), &mut *context, &self.notifier)
                .fire(event, argument)
                .await;
            processed
        }?;
        processed.publish(&self.notifier, &self.extensions)
    }

    pub fn save<W>(&self, saver: &mut W) -> Result<(), MachineError>
    where
        W: StateMachineSaver<S> + ?Sized,
    {
        let context = self.context.lock();
        checkpoint::save(self.graph(), &*context, saver)
    }

    pub fn load<L>(&self, loader: &mut L) -> Result<(), MachineError>
    where
        L: StateMachineLoader<S> + ?Sized,
    {
        let restored = {
            let mut context = self.context.lock();
            let restored = checkpoint::load(self.graph(), &mut *context, loader)?;
            self.mark_initialized(&context);
            restored
        };
        self.extensions.for_each(|extension| {
            extension.loaded(restored.current.as_ref(), &restored.history)
        });
        Ok(())
    }

    fn mark_initialized(&self, context: &ExecutionContext<S, E, A>) {
        if context.is_initialized() {
            self.initialized.store(true, Ordering::Release);
        }
    }
}

impl<S, E, A> std::fmt::Debug for StateMachine<S, E, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("initialized", &self.initialized.load(Ordering::Acquire))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{StateMachineBuilder, TransitionBuilder};
    use crate::checkpoint::PersistedSnapshot;
    use crate::core::HistoryPolicy;
    use futures::executor::block_on;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    enum Light {
        Off,
        On,
        Dim,
        Bright,
    }

    fn machine() -> StateMachine<Light, &'static str, u8> {
        let graph = StateMachineBuilder::new()
            .hierarchy(Light::On, HistoryPolicy::Shallow, Light::Dim, [Light::Dim, Light::Bright])
            .transition(TransitionBuilder::new().from(Light::Off).on("switch").to(Light::On))
            .unwrap()
            .transition(TransitionBuilder::new().from(Light::On).on("switch").to(Light::Off))
            .unwrap()
            .transition(TransitionBuilder::new().from(Light::Dim).on("up").to(Light::Bright))
            .unwrap()
            .build()
            .unwrap();
        StateMachine::new(graph, &MachineConfig::named("light"))
    }

    #[test]
    fn initialize_sets_flag_and_current_state() {
        let machine = machine();
        assert!(!machine.is_initialized());

        let leaf = block_on(machine.initialize(&Light::On)).unwrap();

        assert_eq!(leaf, Light::Dim);
        assert!(machine.is_initialized());
        assert_eq!(machine.current_state(), Some(Light::Dim));
    }

    #[test]
    fn shallow_history_survives_leaving_the_super_state() {
        let machine = machine();
        block_on(machine.initialize(&Light::Off)).unwrap();

        block_on(machine.fire("switch", None)).unwrap();
        block_on(machine.fire("up", None)).unwrap();
        block_on(machine.fire("switch", None)).unwrap();
        let result = block_on(machine.fire("switch", None)).unwrap();

        assert_eq!(result, TransitionResult::Fired(Light::Bright));
        assert_eq!(machine.history().get(&Light::On), Some(&Light::Bright));
    }

    #[test]
    fn saved_machine_loads_into_a_fresh_instance() {
        let machine = machine();
        block_on(machine.initialize(&Light::On)).unwrap();
        block_on(machine.fire("up", None)).unwrap();
        block_on(machine.fire("switch", None)).unwrap();
        let mut snapshot = PersistedSnapshot::new();
        machine.save(&mut snapshot).unwrap();

        let restored = self::machine();
        restored.load(&mut snapshot).unwrap();

        assert!(restored.is_initialized());
        assert_eq!(restored.current_state(), Some(Light::Off));
        assert_eq!(restored.history(), machine.history());
        assert!(matches!(
            block_on(restored.initialize(&Light::Off)),
            Err(MachineError::AlreadyInitialized)
        ));
    }

    #[test]
    fn unknown_initial_state_is_rejected() {
        let graph = StateMachineBuilder::<Light, &'static str, u8>::new()
            .transition(TransitionBuilder::new().from(Light::Off).on("switch").to(Light::On))
            .unwrap()
            .build()
            .unwrap();
        let machine = StateMachine::new(graph, &MachineConfig::default());

        let result = block_on(machine.initialize(&Light::Dim));

        assert!(matches!(result, Err(MachineError::UnknownState { .. })));
        assert!(!machine.is_initialized());
    }
}
