//! Line configuration validation and overrides.
//!
//! Configuration starts from [`LineConfig::standard`] and is adjusted by
//! the entry point (for example from command-line flags) before the line
//! is validated and run.

pub mod error;

pub use error::{ConfigError, ConfigResult};

use crate::state::StageStateMachine;
use std::collections::HashSet;
use tokio::sync::Semaphore;
use twin_protocol::LineConfig;

/// Largest queue capacity a line can be configured with.
pub const MAX_QUEUE_CAPACITY: usize = Semaphore::MAX_PERMITS;

/// Check that `config` describes a runnable line.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The queue capacity is zero or above [`MAX_QUEUE_CAPACITY`]
/// - There are no producers or no consumers
/// - Two stages with the same role share a name
/// - A producer has fewer than two states, an unknown cycle marker or a
///   zero cadence or cycle limit
pub fn validate(config: &LineConfig) -> ConfigResult<()> {
    if config.queue_capacity == 0 {
        return Err(ConfigError::ZeroCapacity);
    }
    if config.queue_capacity > MAX_QUEUE_CAPACITY {
        return Err(ConfigError::CapacityTooLarge {
            capacity: config.queue_capacity,
            max: MAX_QUEUE_CAPACITY,
        });
    }
    if config.producers.is_empty() {
        return Err(ConfigError::NoStages("producer"));
    }
    if config.consumers.is_empty() {
        return Err(ConfigError::NoStages("consumer"));
    }

    unique_names("producer", config.producers.iter().map(|p| p.name.as_str()))?;
    unique_names("consumer", config.consumers.iter().map(|c| c.name.as_str()))?;

    for producer in &config.producers {
        StageStateMachine::new(producer.states.clone(), &producer.cycle_marker).map_err(|e| {
            ConfigError::InvalidStates {
                stage: producer.name.clone(),
                reason: e.to_string(),
            }
        })?;

        if producer.cadence_ms == 0 {
            return Err(ConfigError::ZeroCadence(producer.name.clone()));
        }
        if producer.cycle_limit == Some(0) {
            return Err(ConfigError::ZeroCycleLimit(producer.name.clone()));
        }
    }

    Ok(())
}

/// Parse a `STAGE=VALUE` override such as `Hopper=500`.
pub fn parse_override(input: &str) -> ConfigResult<(String, u64)> {
    let invalid = |reason: &str| ConfigError::InvalidOverride {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let (stage, value) = input
        .split_once('=')
        .ok_or_else(|| invalid("expected STAGE=VALUE"))?;
    let stage = stage.trim();
    if stage.is_empty() {
        return Err(invalid("missing stage name"));
    }

    let value = value
        .trim()
        .parse::<u64>()
        .map_err(|e| invalid(&e.to_string()))?;

    Ok((stage.to_string(), value))
}

/// Set the cadence of the producer called `stage`.
pub fn set_cadence(config: &mut LineConfig, stage: &str, cadence_ms: u64) -> ConfigResult<()> {
    let producer = config
        .producer_mut(stage)
        .ok_or_else(|| ConfigError::UnknownStage {
            role: "producer",
            name: stage.to_string(),
        })?;
    producer.cadence_ms = cadence_ms;
    Ok(())
}

/// Set the fault threshold of the consumer called `stage`.
pub fn set_fault_threshold(config: &mut LineConfig, stage: &str, threshold: u64) -> ConfigResult<()> {
    let consumer = config
        .consumer_mut(stage)
        .ok_or_else(|| ConfigError::UnknownStage {
            role: "consumer",
            name: stage.to_string(),
        })?;
    consumer.fault_threshold = threshold;
    Ok(())
}

fn unique_names<'a>(role: &'static str, names: impl Iterator<Item = &'a str>) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateStage {
                role,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
