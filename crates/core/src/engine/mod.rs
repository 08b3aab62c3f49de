//! Pipeline coordinator.
//!
//! The coordinator builds the shared queue and cancellation signal,
//! launches every producer and consumer as its own task and waits for all
//! of them to exit. It is the only place that turns a consumer's fault into
//! a line-wide shutdown.

pub mod error;

pub use error::{CoordinatorError, CoordinatorResult};

use crate::config;
use crate::context::PipelineContext;
use crate::logger::Logger;
use crate::stages::{Stage, StageConsumer, StageProducer};
use colored::Color;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{JoinError, JoinSet};
use twin_protocol::{
    Event, LineConfig, RunOutcome, RunSummary, StageOutcome, StageReport, StageRole,
};
use uuid::Uuid;

/// Runs one production line from start to finish.
pub struct PipelineCoordinator {
    config: LineConfig,
    logger: Logger,
    events_tx: Option<UnboundedSender<Event>>,
}

impl PipelineCoordinator {
    /// Create a coordinator for `config`, logging through `logger`.
    pub fn new(config: LineConfig, logger: Logger) -> Self {
        Self {
            config,
            logger,
            events_tx: None,
        }
    }

    /// Send run events to `events_tx`.
    pub fn with_events(mut self, events_tx: UnboundedSender<Event>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Run the configured line until every stage has exited.
    ///
    /// # Errors
    ///
    /// Returns an error only if the configuration is invalid. A run that
    /// ends on a consumer fault still returns `Ok`, with
    /// [`RunOutcome::Halted`] in the summary.
    pub async fn run(&self) -> CoordinatorResult<RunSummary> {
        config::validate(&self.config)?;
        let stages = build_stages(&self.config)?;

        let mut ctx = PipelineContext::new(self.config.queue_capacity, self.logger.clone());
        if let Some(tx) = &self.events_tx {
            ctx = ctx.with_events(tx.clone());
        }

        Ok(run_stages(ctx, stages).await)
    }
}

/// Build producers then consumers from the line configuration.
pub fn build_stages(config: &LineConfig) -> CoordinatorResult<Vec<Box<dyn Stage>>> {
    let mut stages: Vec<Box<dyn Stage>> = Vec::new();

    for producer in &config.producers {
        stages.push(Box::new(StageProducer::from_config(producer)?));
    }
    for consumer in &config.consumers {
        stages.push(Box::new(StageConsumer::from_config(consumer)));
    }

    Ok(stages)
}

/// Launch `stages` on `ctx` and wait for all of them.
///
/// - The first consumer to report a fault (or an unexpected failure) sets
///   the cancellation signal; later reports are no-ops.
/// - Producer failures are logged by the producer and never cancel.
/// - When the last producer exits the queue is closed so consumers can
///   drain it and finish.
pub async fn run_stages(ctx: PipelineContext, stages: Vec<Box<dyn Stage>>) -> RunSummary {
    let run_id = Uuid::new_v4();
    ctx.logger.log("*** STARTING EXECUTION ***", Color::White);
    ctx.emit(Event::RunStarted {
        run_id,
        queue_capacity: ctx.queue.capacity(),
    });

    let mut producers_left = stages
        .iter()
        .filter(|s| s.role() == StageRole::Producer)
        .count();

    let mut tasks = JoinSet::new();
    for stage in stages {
        tasks.spawn(supervise(stage, ctx.clone()));
    }

    let mut reports = Vec::new();
    let mut halted = None;

    while let Some(joined) = tasks.join_next().await {
        let report = match joined {
            Ok(report) => report,
            // `supervise` already catches stage panics; this only fires if
            // the supervisor itself could not finish.
            Err(e) => {
                ctx.logger
                    .error_with_detail("Stage supervisor failed", &e);
                continue;
            }
        };

        if report.role == StageRole::Producer {
            producers_left = producers_left.saturating_sub(1);
            if producers_left == 0 {
                ctx.queue.close();
            }
        }

        if report.outcome.requests_shutdown(report.role) && ctx.signal.cancel() {
            ctx.logger.log(
                format!("{} requested a line shutdown. Cancelling all stages.", report.stage),
                Color::Red,
            );
            ctx.emit(Event::CancellationRequested {
                stage: report.stage.clone(),
            });
            halted = Some(RunOutcome::Halted {
                stage: report.stage.clone(),
                reason: report.outcome.reason().unwrap_or_default().to_string(),
            });
        }

        reports.push(report);
    }

    ctx.logger.log("*** EXECUTION COMPLETE ***", Color::White);

    let summary = RunSummary {
        run_id,
        outcome: halted.unwrap_or(RunOutcome::Completed),
        reports,
    };
    ctx.emit(Event::RunFinished {
        summary: summary.clone(),
    });
    summary
}

/// Run one stage on its own task and turn a panic into a `Failed` report.
async fn supervise(stage: Box<dyn Stage>, ctx: PipelineContext) -> StageReport {
    let name = stage.name().to_string();
    let role = stage.role();

    match tokio::spawn(stage.run(ctx.clone())).await {
        Ok(report) => report,
        Err(e) => {
            let error = panic_message(e);
            ctx.logger
                .error_with_detail(format!("{name} error: {error}"), &error);

            let report = StageReport {
                stage: name,
                role,
                outcome: StageOutcome::Failed { error },
                processed: 0,
            };
            ctx.emit(Event::StageFinished {
                report: report.clone(),
            });
            report
        }
    }
}

fn panic_message(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }

    let payload = e.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("stage panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("stage panicked: {s}")
    } else {
        "stage panicked".to_string()
    }
}
