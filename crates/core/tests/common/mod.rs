//! Common test utilities shared by the integration tests.
//!
//! This module provides:
//! - Line fixtures with short cadences
//! - Event collection and assertion helpers

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
