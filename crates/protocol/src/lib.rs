//! # twin-protocol
//!
//! Shared data models for the digital-twin production line.
//!
//! This crate defines the structures exchanged between the coordination
//! engine (`twin-core`) and anything observing it:
//! - The message unit carried through the shared queue
//! - Stage roles, outcomes and run summaries
//! - Line configuration models
//! - The event stream emitted while a run is in progress
//!
//! ## Modules
//!
//! - [`envelope`]: The message unit published by producers
//! - [`stage_models`]: Stage roles, outcomes and reports
//! - [`config_models`]: Line, producer and consumer configuration
//! - [`ipc`]: Events emitted by the core during a run

pub mod config_models;
pub mod envelope;
pub mod ipc;
pub mod stage_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use envelope::*;
pub use ipc::*;
pub use stage_models::*;
