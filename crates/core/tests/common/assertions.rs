//! Custom assertion helpers for line events.

use twin_protocol::{Event, StageOutcome, StageRole};

/// Labels published by `stage`, in publish order.
#[allow(dead_code)]
pub fn produced_labels(events: &[Event], stage: &str) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StateProduced { stage: s, label, .. } if s == stage => Some(label.clone()),
            _ => None,
        })
        .collect()
}

/// Outcome reported by `stage` with `role` in a `StageFinished` event.
#[allow(dead_code)]
pub fn finished_outcome(events: &[Event], stage: &str, role: StageRole) -> Option<StageOutcome> {
    events.iter().find_map(|e| match e {
        Event::StageFinished { report } if report.stage == stage && report.role == role => {
            Some(report.outcome.clone())
        }
        _ => None,
    })
}

/// Number of `CancellationRequested` events.
#[allow(dead_code)]
pub fn count_cancellations(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::CancellationRequested { .. }))
        .count()
}

/// Assert the run is bracketed by `RunStarted` and `RunFinished`.
#[allow(dead_code)]
pub fn assert_run_bracketed(events: &[Event]) {
    assert!(
        matches!(events.first(), Some(Event::RunStarted { .. })),
        "First event should be RunStarted, got: {:?}",
        events.first()
    );
    assert!(
        matches!(events.last(), Some(Event::RunFinished { .. })),
        "Last event should be RunFinished, got: {:?}",
        events.last()
    );
}

/// Index of the first event matching `pred`.
#[allow(dead_code)]
pub fn position(events: &[Event], pred: impl Fn(&Event) -> bool) -> Option<usize> {
    events.iter().position(pred)
}
