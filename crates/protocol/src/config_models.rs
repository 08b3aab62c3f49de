//! Production line configuration models.
//!
//! These structures describe the shape of a line: how big the shared
//! queue is, which producers publish into it and at what cadence, and
//! which consumers drain it and when they fault.

use serde::{Deserialize, Serialize};

/// Capacity of the shared queue in the standard line.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Per-envelope processing delay of the standard consumers.
pub const DEFAULT_PROCESSING_DELAY_MS: u64 = 500;

/// Label of the cycle-complete state in the standard line.
pub const PRODUCTION_COMPLETE: &str = "ProductionComplete";

/// A producer stage: a cyclic state machine publishing at a fixed cadence.
///
/// # Example
///
/// ```json
/// {
///   "name": "Hopper",
///   "states": ["State_H1", "State_H2", "ProductionComplete"],
///   "cycle_marker": "ProductionComplete",
///   "cadence_ms": 1000
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProducerConfig {
    /// Stage name used in logs and reports.
    pub name: String,

    /// Ordered state labels. The machine wraps around after the last one.
    pub states: Vec<String>,

    /// Label of the state that marks a finished production cycle.
    ///
    /// Must be one of `states`.
    pub cycle_marker: String,

    /// Delay between successive publishes.
    pub cadence_ms: u64,

    /// Units credited to the stage each time a cycle completes.
    #[serde(default = "default_units_per_cycle")]
    pub units_per_cycle: u64,

    /// Stop cleanly after this many completed cycles.
    ///
    /// `None` keeps the producer running until the line is cancelled.
    #[serde(default)]
    pub cycle_limit: Option<u64>,

    /// Console color name for this stage's log lines (e.g. `cyan`).
    #[serde(default = "default_color")]
    pub color: String,
}

impl ProducerConfig {
    /// Build a producer with the standard `<prefix>1..=<prefix>5` states
    /// followed by [`PRODUCTION_COMPLETE`].
    pub fn standard(name: &str, prefix: &str, cadence_ms: u64, color: &str) -> Self {
        let mut states: Vec<String> = (1..=5).map(|i| format!("{prefix}{i}")).collect();
        states.push(PRODUCTION_COMPLETE.to_string());

        Self {
            name: name.to_string(),
            states,
            cycle_marker: PRODUCTION_COMPLETE.to_string(),
            cadence_ms,
            units_per_cycle: default_units_per_cycle(),
            cycle_limit: None,
            color: color.to_string(),
        }
    }

    pub fn with_units_per_cycle(mut self, units: u64) -> Self {
        self.units_per_cycle = units;
        self
    }
}

/// A consumer stage: drains the shared queue and faults past a threshold.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Stage name used in logs and reports.
    pub name: String,

    /// Simulated processing time per envelope.
    #[serde(default = "default_processing_delay_ms")]
    pub processing_delay_ms: u64,

    /// Maximum number of envelopes consumed before the overflow fault.
    ///
    /// The fault fires on the envelope that takes the count past this value.
    pub fault_threshold: u64,

    /// Console color name for this stage's log lines.
    #[serde(default = "default_color")]
    pub color: String,
}

impl ConsumerConfig {
    pub fn new(name: &str, fault_threshold: u64) -> Self {
        Self {
            name: name.to_string(),
            processing_delay_ms: default_processing_delay_ms(),
            fault_threshold,
            color: default_color(),
        }
    }

    pub fn with_processing_delay_ms(mut self, delay_ms: u64) -> Self {
        self.processing_delay_ms = delay_ms;
        self
    }
}

/// Complete description of a production line run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LineConfig {
    /// Capacity of the single shared queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    pub producers: Vec<ProducerConfig>,

    pub consumers: Vec<ConsumerConfig>,
}

impl LineConfig {
    /// The Hopper/Blender/Extruder line.
    ///
    /// Three producers publish at 1000, 800 and 600 ms so they interleave
    /// rather than run in lock-step. The Blender consumer faults after 30
    /// envelopes and the Extruder consumer after 20.
    pub fn standard() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            producers: vec![
                ProducerConfig::standard("Hopper", "State_H", 1000, "yellow"),
                ProducerConfig::standard("Blender", "State_B", 800, "cyan"),
                ProducerConfig::standard("Extruder", "State_E", 600, "magenta")
                    .with_units_per_cycle(20),
            ],
            consumers: vec![
                ConsumerConfig::new("Blender", 30),
                ConsumerConfig::new("Extruder", 20),
            ],
        }
    }

    /// Find a producer by name.
    pub fn producer_mut(&mut self, name: &str) -> Option<&mut ProducerConfig> {
        self.producers.iter_mut().find(|p| p.name == name)
    }

    /// Find a consumer by name.
    pub fn consumer_mut(&mut self, name: &str) -> Option<&mut ConsumerConfig> {
        self.consumers.iter_mut().find(|c| c.name == name)
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_processing_delay_ms() -> u64 {
    DEFAULT_PROCESSING_DELAY_MS
}

fn default_units_per_cycle() -> u64 {
    1
}

fn default_color() -> String {
    "white".to_string()
}
