//! Shared resources handed to every stage task.

use crate::logger::Logger;
use crate::queue::BoundedQueue;
use crate::signal::CancellationSignal;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use twin_protocol::{Envelope, Event};

/// Everything a stage shares with the rest of the line.
///
/// Cloning is cheap: the queue, signal and logger are all shared handles.
/// Stage-local state (state machines, counters) never lives here.
#[derive(Clone, Debug)]
pub struct PipelineContext {
    /// The single queue between producers and consumers.
    pub queue: Arc<BoundedQueue<Envelope>>,

    /// One-shot shutdown flag for the whole line.
    pub signal: CancellationSignal,

    pub logger: Logger,

    /// Optional observer of run events.
    events: Option<UnboundedSender<Event>>,
}

impl PipelineContext {
    /// Build a fresh context with an empty queue of `capacity` and an
    /// unset signal.
    pub fn new(capacity: usize, logger: Logger) -> Self {
        Self {
            queue: Arc::new(BoundedQueue::new(capacity)),
            signal: CancellationSignal::new(),
            logger,
            events: None,
        }
    }

    /// Send run events to `events_tx`.
    pub fn with_events(mut self, events_tx: UnboundedSender<Event>) -> Self {
        self.events = Some(events_tx);
        self
    }

    /// Emit an event to the observer, if there is one.
    ///
    /// A dropped receiver is ignored.
    pub fn emit(&self, event: Event) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
