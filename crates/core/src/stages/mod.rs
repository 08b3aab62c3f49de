//! Producer and consumer stages.
//!
//! Every stage is a failure-isolation unit: it runs its own loop, owns
//! its own counters and always ends with a [`StageReport`]. The only thing
//! that crosses stage boundaries is the line's cancellation signal.

pub mod consumer;
pub mod producer;

pub use consumer::StageConsumer;
pub use producer::StageProducer;

use crate::context::PipelineContext;
use async_trait::async_trait;
use colored::Color;
use twin_protocol::{Event, StageOutcome, StageReport, StageRole};

/// A task the coordinator can launch on the shared line.
#[async_trait]
pub trait Stage: Send {
    /// Stage name, e.g. `Hopper`.
    fn name(&self) -> &str;

    fn role(&self) -> StageRole;

    /// Run until the stage's loop exits and report how it ended.
    ///
    /// Implementations never return errors: every failure is folded into
    /// the report's [`StageOutcome`].
    async fn run(self: Box<Self>, ctx: PipelineContext) -> StageReport;
}

/// Log how a stage ended, emit `StageFinished` and build its report.
pub(crate) fn finish_stage(
    ctx: &PipelineContext,
    stage: &str,
    role: StageRole,
    outcome: StageOutcome,
    processed: u64,
) -> StageReport {
    match &outcome {
        StageOutcome::Interrupted => {
            ctx.logger
                .log(format!("{stage} was interrupted."), Color::Magenta);
        }
        StageOutcome::Faulted { reason } => {
            ctx.logger.log(format!("{stage} error: {reason}"), Color::Red);
        }
        StageOutcome::Failed { error } => {
            ctx.logger
                .error_with_detail(format!("{stage} error: {error}"), &outcome);
        }
        StageOutcome::Completed => {}
    }

    let verb = match role {
        StageRole::Producer => "producing",
        StageRole::Consumer => "consuming",
    };
    ctx.logger
        .log(format!("{stage} is done {verb}."), Color::Blue);

    let report = StageReport {
        stage: stage.to_string(),
        role,
        outcome,
        processed,
    };
    ctx.emit(Event::StageFinished {
        report: report.clone(),
    });
    report
}
