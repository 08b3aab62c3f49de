//! Events emitted by the core while a line is running.
//!
//! The core pushes these onto a channel so an observer (CLI, test,
//! dashboard) can follow the run without parsing log lines. Emission is
//! fire-and-forget: a missing or closed receiver never affects the run.
//!
//! Uses tagged enum serialization:
//! ```json
//! {
//!   "type": "stateProduced",
//!   "payload": {
//!     "stage": "Hopper",
//!     "label": "State_H2",
//!     "completion_percent": 33.33,
//!     "cycle": 0
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stage_models::{RunSummary, StageReport, StageRole};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The coordinator has created the queue and signal and is about to
    /// launch the stages.
    RunStarted { run_id: Uuid, queue_capacity: usize },

    /// A stage task has started.
    StageStarted { stage: String, role: StageRole },

    /// A producer published an envelope.
    StateProduced {
        stage: String,
        label: String,
        completion_percent: f64,
        /// Completed cycles so far, including this publish.
        cycle: u64,
    },

    /// A producer emitted its cycle-complete state.
    CycleCompleted {
        stage: String,
        cycles: u64,
        total_units: u64,
    },

    /// A consumer finished processing an envelope.
    EnvelopeConsumed {
        stage: String,
        label: String,
        consumed: u64,
    },

    /// A consumer hit its injected overflow fault.
    FaultDetected { stage: String, reason: String },

    /// The coordinator set the cancellation signal on behalf of `stage`.
    CancellationRequested { stage: String },

    /// A stage task has exited.
    StageFinished { report: StageReport },

    /// Every stage has exited.
    RunFinished { summary: RunSummary },
}
