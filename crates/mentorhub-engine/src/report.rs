use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use mentorhub_core::steps::{Severity, StepName, StepStatus};

use crate::runner::StepOutcome;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Alert level of a failed step. Absent unless the step failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl StepEntry {
    fn pending() -> Self {
        Self {
            status: StepStatus::Pending,
            error: None,
            severity: None,
        }
    }
}

/// Per-attempt record of the post-commit steps.
///
/// `steps` always holds the tracked notification and email steps; each
/// moves from pending to a terminal status once. `outcomes` lists every
/// step that ran, tracked or not, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStatusReport {
    steps: BTreeMap<StepName, StepEntry>,
    outcomes: Vec<StepOutcome>,
}

impl WorkflowStatusReport {
    pub fn new() -> Self {
        Self {
            steps: StepName::TRACKED
                .iter()
                .map(|name| (*name, StepEntry::pending()))
                .collect(),
            outcomes: Vec::new(),
        }
    }

    pub fn from_outcomes(outcomes: impl IntoIterator<Item = StepOutcome>) -> Self {
        let mut report = Self::new();
        for outcome in outcomes {
            report.record(outcome);
        }
        report
    }

    /// Record a finished step. A second terminal outcome for the same
    /// tracked step is ignored.
    pub fn record(&mut self, outcome: StepOutcome) {
        if outcome.status == StepStatus::Pending {
            warn!(step = %outcome.name, "ignoring non-terminal step outcome");
            return;
        }
        if let Some(entry) = self.steps.get_mut(&outcome.name) {
            if entry.status.is_terminal() {
                warn!(step = %outcome.name, "step already settled, ignoring outcome");
                return;
            }
            entry.status = outcome.status;
            entry.error = outcome.error.clone();
            entry.severity = (outcome.status == StepStatus::Failed).then(|| outcome.name.severity());
        }
        self.outcomes.push(outcome);
    }

    /// Status of a step, or `None` when it never ran and is not tracked.
    pub fn status(&self, name: StepName) -> Option<StepStatus> {
        self.steps
            .get(&name)
            .map(|e| e.status)
            .or_else(|| self.outcome(name).map(|o| o.status))
    }

    pub fn entry(&self, name: StepName) -> Option<&StepEntry> {
        self.steps.get(&name)
    }

    pub fn outcome(&self, name: StepName) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn failed(&self, name: StepName) -> bool {
        self.status(name) == Some(StepStatus::Failed)
    }

    pub fn failed_steps(&self) -> Vec<StepName> {
        self.outcomes
            .iter()
            .filter(|o| o.status == StepStatus::Failed)
            .map(|o| o.name)
            .collect()
    }

    /// Failed steps whose severity is at least `severity`.
    pub fn failures_at_least(&self, severity: Severity) -> Vec<StepName> {
        self.failed_steps()
            .into_iter()
            .filter(|name| name.severity() >= severity)
            .collect()
    }

    /// True once no tracked step is pending.
    pub fn is_settled(&self) -> bool {
        self.steps.values().all(|e| e.status.is_terminal())
    }

    pub fn is_clean(&self) -> bool {
        self.failed_steps().is_empty()
    }
}
