//! Session-booking orchestration: one authoritative commit followed by
//! independent, best-effort side effects.

pub mod aggregator;
pub mod error;
pub mod mock;
pub mod observers;
pub mod report;
pub mod runner;
pub mod steps;
pub mod workflow;

pub use aggregator::LogMessenger;
pub use error::{BookingError, StepError};
pub use observers::{FanoutObserver, MetricsObserver, RecordingObserver, TracingObserver};
pub use report::{StepEntry, WorkflowStatusReport};
pub use runner::{StepOutcome, StepRunner, StepSpec};
pub use workflow::{BookingOutcome, BookingWorkflow, Collaborators, WorkflowConfig, WorkflowState};
