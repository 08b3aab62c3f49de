//! Test fixtures for building small, fast production lines.

use std::time::Duration;
use tokio::sync::mpsc;
use twin_protocol::{ConsumerConfig, Event, LineConfig, ProducerConfig};

/// A producer cycling through `states`, with the last one as cycle marker.
#[allow(dead_code)]
pub fn producer(name: &str, states: &[&str], cadence_ms: u64) -> ProducerConfig {
    let states: Vec<String> = states.iter().map(|s| s.to_string()).collect();
    let cycle_marker = states.last().cloned().unwrap_or_default();

    ProducerConfig {
        name: name.to_string(),
        states,
        cycle_marker,
        cadence_ms,
        units_per_cycle: 1,
        cycle_limit: None,
        color: "white".to_string(),
    }
}

/// A consumer with a 1 ms processing delay.
#[allow(dead_code)]
pub fn consumer(name: &str, fault_threshold: u64) -> ConsumerConfig {
    ConsumerConfig::new(name, fault_threshold).with_processing_delay_ms(1)
}

/// The standard Hopper/Blender/Extruder line with every delay scaled down
/// to a few milliseconds. Thresholds are kept.
#[allow(dead_code)]
pub fn fast_standard_line() -> LineConfig {
    let mut config = LineConfig::standard();
    for producer in &mut config.producers {
        producer.cadence_ms /= 100;
    }
    for consumer in &mut config.consumers {
        consumer.processing_delay_ms = 1;
    }
    config
}

/// Drain every event currently buffered in `rx`.
#[allow(dead_code)]
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Collect events until `RunFinished` arrives or `timeout` passes.
#[allow(dead_code)]
pub async fn collect_until_finished(
    rx: &mut mpsc::UnboundedReceiver<Event>,
    timeout: Duration,
) -> Vec<Event> {
    let mut events = Vec::new();
    let _ = tokio::time::timeout(timeout, async {
        while let Some(event) = rx.recv().await {
            let finished = matches!(event, Event::RunFinished { .. });
            events.push(event);
            if finished {
                break;
            }
        }
    })
    .await;
    events
}
