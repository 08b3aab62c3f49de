//! # twin-core
//!
//! Coordination engine for the digital-twin production line.
//!
//! This crate provides:
//! - Cyclic per-stage state machines
//! - The single shared, capacity-bounded queue between stages
//! - A one-shot cancellation signal for line-wide shutdown
//! - Producer and consumer stage tasks
//! - The coordinator that runs them and turns consumer faults into a shutdown
//! - A timestamped console + file logger
//!
//! ## Modules
//!
//! - [`config`]: Line configuration validation and overrides
//! - [`context`]: Shared resources handed to every stage
//! - [`engine`]: Pipeline coordinator
//! - [`logger`]: Console and file logging
//! - [`queue`]: Bounded FIFO queue
//! - [`signal`]: Cancellation signal
//! - [`stages`]: Producer and consumer stages
//! - [`state`]: Cyclic state machines

pub mod config;
pub mod context;
pub mod engine;
pub mod logger;
pub mod queue;
pub mod signal;
pub mod stages;
pub mod state;

pub use context::PipelineContext;
pub use engine::PipelineCoordinator;
pub use logger::Logger;
pub use queue::{BoundedQueue, PublishOutcome};
pub use signal::CancellationSignal;
