//! Error types for the pipeline coordinator.

use crate::config::ConfigError;
use crate::state::StateMachineError;
use thiserror::Error;

/// Errors that prevent a line from starting.
///
/// Once a run has started nothing is reported as an error: faults,
/// interruptions and failures all end up in the run summary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The line configuration is invalid.
    #[error("Invalid line configuration: {0}")]
    Config(#[from] ConfigError),

    /// A producer's state machine could not be built.
    #[error("Failed to build stage: {0}")]
    StateMachine(#[from] StateMachineError),
}

/// Type alias for Result with CoordinatorError.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
