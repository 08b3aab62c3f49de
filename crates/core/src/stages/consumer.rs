//! Consumer stage: drain the shared queue and fault past a threshold.

use crate::context::PipelineContext;
use crate::logger::parse_color;
use crate::stages::{finish_stage, Stage};
use async_trait::async_trait;
use colored::Color;
use std::time::Duration;
use tokio_stream::StreamExt;
use twin_protocol::{ConsumerConfig, Event, StageOutcome, StageReport, StageRole};

/// Drains envelopes, simulating a fixed processing time for each.
///
/// Once `consumed` goes past `fault_threshold` the consumer stops with an
/// injected overflow fault, which the coordinator turns into a line-wide
/// shutdown.
#[derive(Debug)]
pub struct StageConsumer {
    name: String,
    processing_delay: Duration,
    fault_threshold: u64,
    color: Color,
    consumed: u64,
}

impl StageConsumer {
    pub fn new(name: impl Into<String>, processing_delay: Duration, fault_threshold: u64) -> Self {
        Self {
            name: name.into(),
            processing_delay,
            fault_threshold,
            color: Color::White,
            consumed: 0,
        }
    }

    /// Build a consumer from its line configuration.
    pub fn from_config(config: &ConsumerConfig) -> Self {
        Self::new(
            &config.name,
            Duration::from_millis(config.processing_delay_ms),
            config.fault_threshold,
        )
        .with_color(parse_color(&config.color))
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    async fn consume(&mut self, ctx: &PipelineContext) -> StageOutcome {
        ctx.logger
            .log(format!("{} > Starting to consume", self.name), Color::Green);

        let stopped = {
            let envelopes = ctx.queue.stream(&ctx.signal);
            tokio::pin!(envelopes);

            loop {
                let Some(envelope) = envelopes.next().await else {
                    break None;
                };

                ctx.logger.log(
                    format!("{} received: {}", self.name, envelope.label()),
                    self.color,
                );
                if !ctx.signal.sleep(self.processing_delay).await {
                    break Some(StageOutcome::Interrupted);
                }

                self.consumed += 1;
                ctx.emit(Event::EnvelopeConsumed {
                    stage: self.name.clone(),
                    label: envelope.label().to_string(),
                    consumed: self.consumed,
                });

                if self.consumed > self.fault_threshold {
                    break Some(self.overflow(ctx));
                }
            }
        };

        ctx.logger
            .log(format!("{} > Stopping consumption", self.name), Color::Red);

        // The stream only ends on its own when the line was cancelled or
        // the queue was closed and drained.
        stopped.unwrap_or_else(|| {
            if ctx.signal.is_cancelled() {
                StageOutcome::Interrupted
            } else {
                StageOutcome::Completed
            }
        })
    }

    fn overflow(&self, ctx: &PipelineContext) -> StageOutcome {
        let reason = format!("{} consumed too much.", self.name);

        ctx.logger.log(
            format!("{} is overflowing! Simulating an error.", self.name),
            Color::Red,
        );
        ctx.emit(Event::FaultDetected {
            stage: self.name.clone(),
            reason: reason.clone(),
        });

        StageOutcome::Faulted { reason }
    }
}

#[async_trait]
impl Stage for StageConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> StageRole {
        StageRole::Consumer
    }

    async fn run(mut self: Box<Self>, ctx: PipelineContext) -> StageReport {
        ctx.emit(Event::StageStarted {
            stage: self.name.clone(),
            role: StageRole::Consumer,
        });

        let outcome = self.consume(&ctx).await;
        finish_stage(&ctx, &self.name, StageRole::Consumer, outcome, self.consumed)
    }
}
