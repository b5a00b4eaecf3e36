//! Runtime errors raised to callers of a state machine.

use crate::checkpoint::CheckpointError;
use crate::core::CallbackFault;
use thiserror::Error;

/// Errors returned by state machine operations.
///
/// Callback faults never appear here while a fault listener is
/// registered; they are reported through the fault channel instead.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("State '{state}' is not declared in the state machine definition")]
    UnknownState { state: String },

    #[error("State machine is already initialized")]
    AlreadyInitialized,

    #[error("State machine is not initialized. Call initialize(state) or load() first")]
    NotInitialized,

    #[error("Cannot restore history: '{sub_state}' is not a sub-state of '{super_state}'")]
    InvalidHistoryState {
        super_state: String,
        sub_state: String,
    },

    #[error("Unhandled fault in state machine processing ({count} fault(s), first: {first})")]
    UnhandledFault { first: CallbackFault, count: usize },

    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("Checkpoint operation failed: {0}")]
    Checkpoint(#[from] CheckpointError),
}
