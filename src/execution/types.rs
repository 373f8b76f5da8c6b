use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assessment::RecommendedAction;
use crate::config::ExecutionMode;
use crate::detection::Ecosystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Passed,
    Failed,
    Skipped,
    RolledBack,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[default]
    Pending,
    Passed,
    Failed,
    RolledBack,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Passed => "passed",
            BatchStatus::Failed => "failed",
            BatchStatus::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One removal action and, after execution, its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub step_id: String,
    pub phase: u8,
    pub item_path: String,
    pub action_type: RecommendedAction,
    pub command: String,
    #[serde(default)]
    pub linked_tool: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub validation_steps: Vec<String>,
    #[serde(default)]
    pub rollback_command: Option<String>,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub execution_time_seconds: f64,
    #[serde(default)]
    pub commit_hash: Option<String>,
}

impl ExecutionStep {
    /// Whether the step targets a manifest dependency rather than a path.
    pub fn is_library(&self) -> bool {
        Ecosystem::from_item_path(&self.item_path).is_some()
    }

    /// Library name or last path component.
    pub fn target_name(&self) -> &str {
        if self.is_library() {
            self.item_path
                .rsplit_once(':')
                .map(|(_, name)| name)
                .unwrap_or(&self.item_path)
        } else {
            self.item_path
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(&self.item_path)
        }
    }

    /// Steps a batch rollback should try to undo.
    pub fn is_rollback_eligible(&self) -> bool {
        match self.status {
            StepStatus::Passed | StepStatus::Failed => {
                self.commit_hash.is_some() || self.rollback_command.is_some()
            }
            _ => false,
        }
    }

    pub(crate) fn fail(&mut self, error: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.error = error.into();
    }

    pub(crate) fn finish(&mut self, status: StepStatus, output: impl Into<String>) {
        self.status = status;
        self.output = output.into();
    }
}

/// Steps executed together and validated as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    pub phase: u8,
    pub steps: Vec<ExecutionStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub phase: u8,
    pub status: BatchStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_items: usize,
    pub successful_items: usize,
    pub failed_items: usize,
    pub skipped_items: usize,
    pub rolled_back_items: usize,
    /// A failure stopped the batch before its last step
    pub halted: bool,
    pub steps: Vec<ExecutionStep>,
}

impl BatchResult {
    pub fn pending(batch: &Batch) -> Self {
        Self {
            batch_id: batch.batch_id.clone(),
            phase: batch.phase,
            status: BatchStatus::Pending,
            started_at: None,
            finished_at: None,
            total_items: batch.steps.len(),
            successful_items: 0,
            failed_items: 0,
            skipped_items: 0,
            rolled_back_items: 0,
            halted: false,
            steps: batch.steps.clone(),
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        }
    }

    /// Recount step outcomes after execution or rollback.
    pub(crate) fn tally(&mut self) {
        let count = |status: StepStatus| self.steps.iter().filter(|s| s.status == status).count();
        self.successful_items = count(StepStatus::Passed);
        self.failed_items = count(StepStatus::Failed);
        self.skipped_items = count(StepStatus::Skipped);
        self.rolled_back_items = count(StepStatus::RolledBack);
    }
}

/// Batches ordered SAFE, CAUTION, RISKY.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemovalPlan {
    pub batches: Vec<Batch>,
}

impl RemovalPlan {
    pub fn steps(&self) -> impl Iterator<Item = &ExecutionStep> {
        self.batches.iter().flat_map(|b| b.steps.iter())
    }

    pub fn step_count(&self) -> usize {
        self.batches.iter().map(|b| b.steps.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.step_count() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_batches: usize,
    pub total_steps: usize,
    pub successful_steps: usize,
    pub failed_steps: usize,
    pub skipped_steps: usize,
    pub rolled_back_steps: usize,
    pub total_execution_time: f64,
}

impl ExecutionSummary {
    pub fn from_batches(batches: &[BatchResult]) -> Self {
        Self {
            total_batches: batches.len(),
            total_steps: batches.iter().map(|b| b.total_items).sum(),
            successful_steps: batches.iter().map(|b| b.successful_items).sum(),
            failed_steps: batches.iter().map(|b| b.failed_items).sum(),
            skipped_steps: batches.iter().map(|b| b.skipped_items).sum(),
            rolled_back_steps: batches.iter().map(|b| b.rolled_back_items).sum(),
            total_execution_time: batches.iter().map(BatchResult::duration_seconds).sum(),
        }
    }
}

/// Outcome of executing a whole plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub mode: ExecutionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The run stopped early on a failed batch
    pub halted: bool,
    #[serde(default)]
    pub backup_branch: Option<String>,
    pub summary: ExecutionSummary,
    pub batches: Vec<BatchResult>,
    /// Repository fingerprint before a dry run
    #[serde(default)]
    pub fingerprint_before: Option<String>,
    #[serde(default)]
    pub fingerprint_after: Option<String>,
}

impl ExecutionReport {
    /// Whether a dry run left the repository untouched.
    pub fn repository_unchanged(&self) -> Option<bool> {
        match (&self.fingerprint_before, &self.fingerprint_after) {
            (Some(before), Some(after)) => Some(before == after),
            _ => None,
        }
    }
}
