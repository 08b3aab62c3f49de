//! Cyclic per-stage state machine.
//!
//! A stage walks an ordered list of named states round-robin. One of the
//! states is the cycle-complete marker: producing it counts a finished
//! cycle, but the walk simply wraps around after it.

use thiserror::Error;

/// Errors raised while building a state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    /// A cyclic machine needs at least two states.
    #[error("State machine needs at least 2 states, got {0}")]
    TooFewStates(usize),

    /// The cycle-complete marker is not one of the declared states.
    #[error("Cycle marker '{0}' is not a declared state")]
    UnknownCycleMarker(String),
}

/// Result of a single [`StageStateMachine::advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    /// The state that was produced.
    pub label: String,

    /// Progress through the current cycle, two decimals.
    pub completion_percent: f64,

    /// True when `label` is the cycle-complete marker.
    pub cycle_completed: bool,
}

/// Ordered cyclic states plus the counters derived from advancing them.
///
/// Owned by exactly one producer; never shared.
#[derive(Debug, Clone)]
pub struct StageStateMachine {
    states: Vec<String>,
    marker: usize,
    index: usize,
    completed: u64,
    cycles: u64,
    units_per_cycle: u64,
    total_units: u64,
}

impl StageStateMachine {
    /// Build a machine over `states` with `cycle_marker` as the
    /// cycle-complete state.
    pub fn new(states: Vec<String>, cycle_marker: &str) -> Result<Self, StateMachineError> {
        if states.len() < 2 {
            return Err(StateMachineError::TooFewStates(states.len()));
        }

        let marker = states
            .iter()
            .position(|s| s == cycle_marker)
            .ok_or_else(|| StateMachineError::UnknownCycleMarker(cycle_marker.to_string()))?;

        Ok(Self {
            states,
            marker,
            index: 0,
            completed: 0,
            cycles: 0,
            units_per_cycle: 1,
            total_units: 0,
        })
    }

    /// Credit `units` per completed cycle instead of one.
    pub fn with_units_per_cycle(mut self, units: u64) -> Self {
        self.units_per_cycle = units;
        self
    }

    /// Produce the current state and move to the next one.
    ///
    /// The k-th call within a cycle reports `100 * k / N` percent, so the
    /// last state of a cycle reports 100 and the next call starts over.
    pub fn advance(&mut self) -> Advance {
        let produced = self.index;
        self.index = (self.index + 1) % self.states.len();
        self.completed += 1;

        let cycle_completed = produced == self.marker;
        if cycle_completed {
            self.cycles += 1;
            self.total_units += self.units_per_cycle;
        }

        Advance {
            label: self.states[produced].clone(),
            completion_percent: self.completion_percent(),
            cycle_completed,
        }
    }

    /// Progress through the current cycle after the latest advance.
    pub fn completion_percent(&self) -> f64 {
        let n = self.states.len() as u64;
        let position = match self.completed % n {
            0 if self.completed > 0 => n,
            r => r,
        };
        round2(position as f64 / n as f64 * 100.0)
    }

    /// Label that the next call to [`advance`](Self::advance) will produce.
    pub fn current(&self) -> &str {
        &self.states[self.index]
    }

    pub fn cycle_marker(&self) -> &str {
        &self.states[self.marker]
    }

    /// Number of times the cycle-complete state has been produced.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Total number of advances.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn units_per_cycle(&self) -> u64 {
        self.units_per_cycle
    }

    /// `cycles * units_per_cycle`.
    pub fn total_units(&self) -> u64 {
        self.total_units
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
