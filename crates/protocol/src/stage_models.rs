//! Stage lifecycle models.
//!
//! Every producer and consumer task ends with a [`StageReport`]; the
//! coordinator folds those reports into a [`RunSummary`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which side of the shared queue a stage sits on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageRole {
    /// Advances a state machine and publishes envelopes.
    Producer,

    /// Drains envelopes from the queue.
    Consumer,
}

impl std::fmt::Display for StageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Producer => f.write_str("producer"),
            Self::Consumer => f.write_str("consumer"),
        }
    }
}

/// How a single stage task ended.
///
/// The lifecycle of a stage is:
/// Running -> Completed | Interrupted | Faulted | Failed
///
/// - Interrupted: the line-wide cancellation signal was observed
/// - Faulted: the injected overflow fault fired
/// - Failed: anything else went wrong inside the task
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageOutcome {
    /// The stage's loop ran out of work on its own.
    Completed,

    /// The stage stopped because the line was cancelled.
    ///
    /// This is the effect of a shutdown, never a cause of one.
    Interrupted,

    /// A consumer crossed its consumption threshold.
    Faulted { reason: String },

    /// An unexpected failure ended the task.
    Failed { error: String },
}

impl StageOutcome {
    /// Whether this outcome, reported by a stage with `role`, asks the
    /// coordinator to cancel the whole line.
    ///
    /// Only consumers escalate. A failed producer just stops.
    pub fn requests_shutdown(&self, role: StageRole) -> bool {
        role == StageRole::Consumer
            && matches!(self, Self::Faulted { .. } | Self::Failed { .. })
    }

    /// Human readable reason for faulted or failed outcomes.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Faulted { reason } => Some(reason),
            Self::Failed { error } => Some(error),
            Self::Completed | Self::Interrupted => None,
        }
    }
}

/// Final report of one stage task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// Stage name, e.g. `Hopper`.
    pub stage: String,

    pub role: StageRole,

    pub outcome: StageOutcome,

    /// Envelopes published (producers) or consumed (consumers).
    pub processed: u64,
}

/// Overall result of a line run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    /// Every stage ended without asking for a shutdown.
    Completed,

    /// A consumer asked for a shutdown and the line was cancelled.
    Halted { stage: String, reason: String },
}

impl RunOutcome {
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted { .. })
    }
}

/// Summary of a finished run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Unique identifier of this run.
    pub run_id: Uuid,

    pub outcome: RunOutcome,

    /// One report per stage, in the order the stages finished.
    pub reports: Vec<StageReport>,
}

impl RunSummary {
    /// Look up the report of a stage by name and role.
    pub fn report(&self, stage: &str, role: StageRole) -> Option<&StageReport> {
        self.reports
            .iter()
            .find(|r| r.stage == stage && r.role == role)
    }
}
