//! Moving the persisted parts of an execution context in and out.

use crate::checkpoint::{StateMachineLoader, StateMachineSaver};
use crate::core::{EventArgument, EventKey, StateGraph, StateId, StateKey};
use crate::effects::{ExecutionContext, MachineError};
use std::collections::HashMap;
use tracing::debug;

/// Hand the current state and history of `context` to `saver`.
pub(crate) fn save<S, E, A, W>(
    graph: &StateGraph<S, E, A>,
    context: &ExecutionContext<S, E, A>,
    saver: &mut W,
) -> Result<(), MachineError>
where
    S: StateKey,
    E: EventKey,
    A: EventArgument,
    W: StateMachineSaver<S> + ?Sized,
{
    let history: HashMap<S, S> = context
        .history()
        .iter()
        .map(|(super_state, last_active)| {
            (
                graph.key(super_state).clone(),
                graph.key(last_active).clone(),
            )
        })
        .collect();

    saver.save_current_state(context.current().map(|state| graph.key(state)))?;
    saver.save_history(&history)?;
    debug!(entries = history.len(), "saved state machine");
    Ok(())
}

/// What a successful load applied, for the `loaded` hook.
pub(crate) struct Restored<S> {
    pub(crate) current: Option<S>,
    pub(crate) history: HashMap<S, S>,
}

/// Validate what `loader` supplies and apply it to an uninitialized
/// context. Nothing is applied when validation fails.
pub(crate) fn load<S, E, A, L>(
    graph: &StateGraph<S, E, A>,
    context: &mut ExecutionContext<S, E, A>,
    loader: &mut L,
) -> Result<Restored<S>, MachineError>
where
    S: StateKey,
    E: EventKey,
    A: EventArgument,
    L: StateMachineLoader<S> + ?Sized,
{
    if context.is_initialized() {
        return Err(MachineError::AlreadyInitialized);
    }

    let current = loader.load_current_state()?;
    let history = loader.load_history()?;

    let entries = resolve_history(graph, &history)?;
    let current_id = current
        .as_ref()
        .map(|state| graph.id_of(state))
        .transpose()?;

    context.history_mut().replace(entries);
    if let Some(state) = current_id {
        context.set_current(state);
    }
    debug!(current = ?current, entries = history.len(), "loaded state machine");

    Ok(Restored { current, history })
}

fn resolve_history<S, E, A>(
    graph: &StateGraph<S, E, A>,
    history: &HashMap<S, S>,
) -> Result<HashMap<StateId, StateId>, MachineError>
where
    S: StateKey,
    E: EventKey,
{
    history
        .iter()
        .map(|(super_state, last_active)| {
            let parent = graph.id_of(super_state)?;
            let child = graph.id_of(last_active)?;
            if !graph.is_child_of(child, parent) {
                return Err(MachineError::InvalidHistoryState {
                    super_state: format!("{super_state:?}"),
                    sub_state: format!("{last_active:?}"),
                });
            }
            Ok((parent, child))
        })
        .collect()
}
