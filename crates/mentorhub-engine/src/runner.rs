use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::error;

use mentorhub_core::ids::AttemptId;
use mentorhub_core::steps::{duration_ms, StepEvent, StepName, StepObserver, StepStatus};

use crate::error::StepError;

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(15);

/// A named unit of work. Required steps abort the workflow when they fail;
/// optional ones only record the failure. Unbounded steps are not subject
/// to the runner's step timeout.
pub struct StepSpec<'a, T> {
    pub name: StepName,
    pub required: bool,
    pub bounded: bool,
    pub action: BoxFuture<'a, Result<T, StepError>>,
}

impl<'a, T> StepSpec<'a, T> {
    pub fn required<F>(name: StepName, action: F) -> Self
    where
        F: Future<Output = Result<T, StepError>> + Send + 'a,
    {
        Self {
            name,
            required: true,
            bounded: true,
            action: action.boxed(),
        }
    }

    pub fn optional<F>(name: StepName, action: F) -> Self
    where
        F: Future<Output = Result<T, StepError>> + Send + 'a,
    {
        Self {
            name,
            required: false,
            bounded: true,
            action: action.boxed(),
        }
    }

    /// Run to completion however long it takes. Panics are still caught.
    pub fn unbounded(mut self) -> Self {
        self.bounded = false;
        self
    }
}

/// What happened to one step. Produced once and never modified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub name: StepName,
    pub required: bool,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Success
    }
}

pub struct StepResult<T> {
    pub outcome: StepOutcome,
    pub value: Option<T>,
}

/// A required step failed. Every step in the phase still ran to completion.
#[derive(Debug)]
pub struct PhaseAborted {
    pub outcomes: Vec<StepOutcome>,
    pub step: StepName,
    pub error: StepError,
}

/// Executes step descriptors concurrently on the calling task.
pub struct StepRunner {
    observer: Arc<dyn StepObserver>,
    step_timeout: Duration,
}

impl StepRunner {
    pub fn new(observer: Arc<dyn StepObserver>) -> Self {
        Self {
            observer,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Run every step, join them all, then report. Results keep the order of `steps`.
    pub async fn run_phase<'a, T>(
        &self,
        attempt_id: &AttemptId,
        steps: Vec<StepSpec<'a, T>>,
    ) -> Result<Vec<StepResult<T>>, PhaseAborted> {
        let executed =
            join_all(steps.into_iter().map(|spec| self.execute(attempt_id, spec))).await;

        let mut abort: Option<(StepName, StepError)> = None;
        let mut results = Vec::with_capacity(executed.len());
        for (outcome, required, result) in executed {
            match result {
                Ok(value) => results.push(StepResult {
                    outcome,
                    value: Some(value),
                }),
                Err(e) => {
                    if required && abort.is_none() {
                        abort = Some((outcome.name, e));
                    }
                    results.push(StepResult {
                        outcome,
                        value: None,
                    });
                }
            }
        }

        match abort {
            Some((step, error)) => Err(PhaseAborted {
                outcomes: results.into_iter().map(|r| r.outcome).collect(),
                step,
                error,
            }),
            None => Ok(results),
        }
    }

    async fn execute<T>(
        &self,
        attempt_id: &AttemptId,
        spec: StepSpec<'_, T>,
    ) -> (StepOutcome, bool, Result<T, StepError>) {
        let StepSpec {
            name,
            required,
            bounded,
            action,
        } = spec;

        let start = Instant::now();
        let guarded = std::panic::AssertUnwindSafe(action).catch_unwind();
        let finished = if bounded {
            tokio::time::timeout(self.step_timeout, guarded)
                .await
                .map_err(|_| StepError::Timeout(self.step_timeout))
        } else {
            Ok(guarded.await)
        };
        let result = match finished {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => {
                let msg = panic_message(&panic);
                error!(attempt_id = %attempt_id, step = %name, panic = %msg, "step panicked");
                Err(StepError::Panicked(msg))
            }
            Err(timed_out) => Err(timed_out),
        };
        let duration = start.elapsed();

        let (status, error) = match &result {
            Ok(_) => (StepStatus::Success, None),
            Err(e) => (StepStatus::Failed, Some(e.to_string())),
        };

        self.observer.on_step(&StepEvent {
            attempt_id: attempt_id.clone(),
            name,
            status,
            error: error.clone(),
            duration,
        });

        let outcome = StepOutcome {
            name,
            required,
            status,
            error,
            duration,
        };
        (outcome, required, result)
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    panic
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
        .to_string()
}
