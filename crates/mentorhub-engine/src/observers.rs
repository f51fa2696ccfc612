use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use mentorhub_core::steps::{StepEvent, StepName, StepObserver, StepStatus};
use mentorhub_telemetry::MetricsRecorder;

/// One structured log line per step.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl StepObserver for TracingObserver {
    fn on_step(&self, event: &StepEvent) {
        let duration_ms = event.duration.as_millis() as u64;
        match (&event.status, &event.error) {
            (StepStatus::Failed, error) => warn!(
                attempt_id = %event.attempt_id,
                step = %event.name,
                status = event.status.as_str(),
                severity = ?event.name.severity(),
                error = error.as_deref().unwrap_or("unknown"),
                duration_ms,
                "booking step failed"
            ),
            _ => info!(
                attempt_id = %event.attempt_id,
                step = %event.name,
                status = event.status.as_str(),
                duration_ms,
                "booking step finished"
            ),
        }
    }
}

/// Feeds `booking_steps_total` and `booking_step_duration_ms`.
pub struct MetricsObserver {
    metrics: Arc<MetricsRecorder>,
}

impl MetricsObserver {
    pub const STEPS_TOTAL: &'static str = "booking_steps_total";
    pub const STEP_DURATION_MS: &'static str = "booking_step_duration_ms";

    pub fn new(metrics: Arc<MetricsRecorder>) -> Self {
        Self { metrics }
    }
}

impl StepObserver for MetricsObserver {
    fn on_step(&self, event: &StepEvent) {
        let step = event.name.as_str();
        self.metrics.counter_inc(
            Self::STEPS_TOTAL,
            &[("step", step), ("status", event.status.as_str())],
            1,
        );
        self.metrics.histogram_observe(
            Self::STEP_DURATION_MS,
            &[("step", step)],
            event.duration.as_millis() as f64,
        );
    }
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<StepEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StepEvent> {
        self.events.lock().clone()
    }

    /// Status of the first event recorded for `name`.
    pub fn status_of(&self, name: StepName) -> Option<StepStatus> {
        self.events
            .lock()
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.status)
    }

    pub fn count_for(&self, name: StepName) -> usize {
        self.events.lock().iter().filter(|e| e.name == name).count()
    }
}

impl StepObserver for RecordingObserver {
    fn on_step(&self, event: &StepEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Forwards each event to every inner observer, in order.
pub struct FanoutObserver {
    observers: Vec<Arc<dyn StepObserver>>,
}

impl FanoutObserver {
    pub fn new(observers: Vec<Arc<dyn StepObserver>>) -> Self {
        Self { observers }
    }
}

impl StepObserver for FanoutObserver {
    fn on_step(&self, event: &StepEvent) {
        for observer in &self.observers {
            observer.on_step(event);
        }
    }
}
