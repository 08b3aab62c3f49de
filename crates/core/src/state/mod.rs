//! Per-stage state tracking.
//!
//! This module provides the cyclic state machine each producer advances
//! before it publishes.

pub mod machine;

pub use machine::{Advance, StageStateMachine, StateMachineError};
