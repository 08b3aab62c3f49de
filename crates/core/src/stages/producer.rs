//! Producer stage: advance the state machine, publish, wait a cadence.

use crate::context::PipelineContext;
use crate::logger::parse_color;
use crate::queue::PublishOutcome;
use crate::stages::{finish_stage, Stage};
use crate::state::{StageStateMachine, StateMachineError};
use async_trait::async_trait;
use colored::Color;
use std::time::Duration;
use twin_protocol::{Envelope, Event, ProducerConfig, StageOutcome, StageReport, StageRole};

/// Publishes the states of one cyclic machine into the shared queue.
///
/// The loop checks the cancellation signal at its head, while waiting for
/// queue space and while sleeping between publishes, so a cancelled line
/// never waits longer than it takes to notice the signal.
#[derive(Debug)]
pub struct StageProducer {
    name: String,
    machine: StageStateMachine,
    cadence: Duration,
    cycle_limit: Option<u64>,
    color: Color,
    published: u64,
}

impl StageProducer {
    pub fn new(name: impl Into<String>, machine: StageStateMachine, cadence: Duration) -> Self {
        Self {
            name: name.into(),
            machine,
            cadence,
            cycle_limit: None,
            color: Color::White,
            published: 0,
        }
    }

    /// Build a producer from its line configuration.
    pub fn from_config(config: &ProducerConfig) -> Result<Self, StateMachineError> {
        let machine = StageStateMachine::new(config.states.clone(), &config.cycle_marker)?
            .with_units_per_cycle(config.units_per_cycle);

        Ok(Self::new(&config.name, machine, Duration::from_millis(config.cadence_ms))
            .with_cycle_limit(config.cycle_limit)
            .with_color(parse_color(&config.color)))
    }

    /// Stop with `Completed` after `limit` cycles.
    pub fn with_cycle_limit(mut self, limit: Option<u64>) -> Self {
        self.cycle_limit = limit;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    async fn produce(&mut self, ctx: &PipelineContext) -> StageOutcome {
        loop {
            if ctx.signal.is_cancelled() {
                return StageOutcome::Interrupted;
            }

            let step = self.machine.advance();
            if step.cycle_completed {
                self.record_cycle(ctx);
            }

            match ctx
                .queue
                .publish(Envelope::new(step.label.as_str()), &ctx.signal)
                .await
            {
                PublishOutcome::Enqueued => self.published += 1,
                PublishOutcome::Cancelled => return StageOutcome::Interrupted,
                PublishOutcome::Closed => {
                    return StageOutcome::Failed {
                        error: format!("queue closed while publishing '{}'", step.label),
                    }
                }
            }

            ctx.logger.log(
                format!(
                    "{} > Published state: '{}', Completion: {:.2}%",
                    self.name, step.label, step.completion_percent
                ),
                self.color,
            );
            ctx.emit(Event::StateProduced {
                stage: self.name.clone(),
                label: step.label,
                completion_percent: step.completion_percent,
                cycle: self.machine.cycles(),
            });

            if self
                .cycle_limit
                .is_some_and(|limit| self.machine.cycles() >= limit)
            {
                return StageOutcome::Completed;
            }

            if !ctx.signal.sleep(self.cadence).await {
                return StageOutcome::Interrupted;
            }
        }
    }

    fn record_cycle(&self, ctx: &PipelineContext) {
        let cycles = self.machine.cycles();
        let total_units = self.machine.total_units();

        ctx.logger
            .log(format!("{} Run Count: {cycles}", self.name), Color::Red);
        if self.machine.units_per_cycle() > 1 {
            ctx.logger.log(
                format!("{} Total Unit Count: {total_units}", self.name),
                Color::Red,
            );
        }

        ctx.emit(Event::CycleCompleted {
            stage: self.name.clone(),
            cycles,
            total_units,
        });
    }
}

#[async_trait]
impl Stage for StageProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> StageRole {
        StageRole::Producer
    }

    async fn run(mut self: Box<Self>, ctx: PipelineContext) -> StageReport {
        ctx.emit(Event::StageStarted {
            stage: self.name.clone(),
            role: StageRole::Producer,
        });

        let outcome = self.produce(&ctx).await;
        finish_stage(&ctx, &self.name, StageRole::Producer, outcome, self.published)
    }
}
