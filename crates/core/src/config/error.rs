//! Error types for line configuration.
//!
//! This module defines all errors that can occur while validating a
//! [`LineConfig`](twin_protocol::LineConfig) or applying overrides to it.

use thiserror::Error;

/// Errors that can occur while validating or overriding line configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The shared queue must hold at least one envelope.
    #[error("Queue capacity must be at least 1")]
    ZeroCapacity,

    /// The shared queue cannot track more slots than this.
    #[error("Queue capacity {capacity} exceeds the maximum of {max}")]
    CapacityTooLarge { capacity: usize, max: usize },

    /// A line without producers or consumers cannot run.
    #[error("Line has no {0} stages")]
    NoStages(&'static str),

    /// Two stages with the same role share a name.
    #[error("Duplicate {role} stage name '{name}'")]
    DuplicateStage { role: &'static str, name: String },

    /// A producer's state list or cycle marker is unusable.
    #[error("Invalid states for producer '{stage}': {reason}")]
    InvalidStates { stage: String, reason: String },

    /// A producer would publish in a busy loop.
    #[error("Producer '{0}' has a zero cadence")]
    ZeroCadence(String),

    /// A producer would stop before publishing anything.
    #[error("Producer '{0}' has a cycle limit of zero")]
    ZeroCycleLimit(String),

    /// An override names a stage that is not part of the line.
    #[error("Unknown {role} stage '{name}'")]
    UnknownStage { role: &'static str, name: String },

    /// An override is not of the form `STAGE=VALUE`.
    #[error("Invalid override '{input}': {reason}")]
    InvalidOverride { input: String, reason: String },
}

/// Type alias for Result with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
