//! Session-level artifacts: `final-report.json` and the Markdown summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use super::write_json;
use crate::assessment::{AssessmentSummary, ImpactAssessment, RiskCategory};
use crate::config::DecruftConfig;
use crate::errors::Result;
use crate::execution::{ExecutionReport, StepStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCounts {
    pub total_legacy_items: usize,
    pub items_assessed: usize,
    pub batches_executed: usize,
    pub successful_steps: usize,
    pub failed_steps: usize,
}

/// Contents of `final-report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub session_id: String,
    pub project_root: PathBuf,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub status: SessionStatus,
    pub phases_completed: Vec<String>,
    pub summary: SessionCounts,
    /// Effective configuration after merging the file over defaults
    pub configuration: DecruftConfig,
    /// Artifact name to path
    #[serde(default)]
    pub reports: BTreeMap<String, PathBuf>,
}

impl FinalReport {
    pub fn start(
        session_id: impl Into<String>,
        project_root: impl Into<PathBuf>,
        configuration: DecruftConfig,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            project_root: project_root.into(),
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: None,
            status: SessionStatus::InProgress,
            phases_completed: Vec::new(),
            summary: SessionCounts::default(),
            configuration,
            reports: BTreeMap::new(),
        }
    }

    pub fn complete_phase(&mut self, phase: &str) {
        if !self.phases_completed.iter().any(|p| p == phase) {
            self.phases_completed.push(phase.to_string());
        }
    }

    pub fn record_artifact(&mut self, name: &str, path: &Path) {
        self.reports.insert(name.to_string(), path.to_path_buf());
    }

    pub fn finish(&mut self, status: SessionStatus) {
        let end = Utc::now();
        self.duration_seconds = Some((end - self.start_time).num_milliseconds() as f64 / 1000.0);
        self.end_time = Some(end);
        self.status = status;
    }
}

pub fn write_final_report(path: &Path, report: &FinalReport) -> Result<()> {
    write_json(path, report)
}

/// Human summary written as `legacy-removal-summary.md`.
pub fn render_markdown_summary(
    report: &FinalReport,
    assessments: &[ImpactAssessment],
    execution: Option<&ExecutionReport>,
) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Legacy Removal Summary\n");
    let _ = writeln!(md, "- **Session:** `{}`", report.session_id);
    let _ = writeln!(md, "- **Project:** `{}`", report.project_root.display());
    let _ = writeln!(md, "- **Started:** {}", report.start_time.to_rfc3339());
    let _ = writeln!(md, "- **Status:** {}", report.status);
    let _ = writeln!(md, "- **Legacy items found:** {}", report.summary.total_legacy_items);

    if !assessments.is_empty() {
        let summary = AssessmentSummary::from_assessments(assessments);
        let _ = writeln!(md, "\n## Impact Assessment\n");
        let _ = writeln!(md, "| Tier | Items |");
        let _ = writeln!(md, "|------|-------|");
        let _ = writeln!(md, "| SAFE | {} |", summary.safe_removals);
        let _ = writeln!(md, "| CAUTION | {} |", summary.caution_items);
        let _ = writeln!(md, "| RISKY | {} |", summary.risky_items);
        let _ = writeln!(
            md,
            "\nEstimated effort: {} hours, average confidence {:.0}%.",
            summary.total_effort_hours,
            summary.average_confidence * 100.0
        );

        let risky: Vec<&ImpactAssessment> = assessments
            .iter()
            .filter(|a| a.risk_category == RiskCategory::Risky)
            .collect();
        if !risky.is_empty() {
            let _ = writeln!(md, "\n### Migration required\n");
            for a in risky {
                let _ = writeln!(
                    md,
                    "- `{}` ({} dependents, ~{}h)",
                    a.item_path,
                    a.dependents.len(),
                    a.estimated_effort_hours
                );
            }
        }
    }

    if let Some(execution) = execution {
        let summary = &execution.summary;
        let _ = writeln!(md, "\n## Execution ({})\n", execution.mode);
        let _ = writeln!(
            md,
            "{} steps in {} batches: {} passed, {} failed, {} skipped, {} rolled back.",
            summary.total_steps,
            summary.total_batches,
            summary.successful_steps,
            summary.failed_steps,
            summary.skipped_steps,
            summary.rolled_back_steps
        );
        if execution.halted {
            let _ = writeln!(md, "\nThe run halted after a failed batch.");
        }
        if let Some(unchanged) = execution.repository_unchanged() {
            let verdict = if unchanged { "unchanged" } else { "CHANGED" };
            let _ = writeln!(md, "\nDry run left the repository {verdict}.");
        }

        let removed: Vec<&str> = execution
            .batches
            .iter()
            .flat_map(|b| &b.steps)
            .filter(|s| execution.mode.is_mutating() && s.status == StepStatus::Passed)
            .map(|s| s.item_path.as_str())
            .collect();
        if !removed.is_empty() {
            let _ = writeln!(md, "\n### Completed\n");
            for path in removed {
                let _ = writeln!(md, "- `{path}`");
            }
        }

        let failed: Vec<_> = execution
            .batches
            .iter()
            .flat_map(|b| &b.steps)
            .filter(|s| matches!(s.status, StepStatus::Failed | StepStatus::RolledBack))
            .collect();
        if !failed.is_empty() {
            let _ = writeln!(md, "\n### Failed or rolled back\n");
            for step in failed {
                let _ = writeln!(md, "- `{}` ({}): {}", step.item_path, step.status, step.error);
            }
        }

        if let Some(branch) = &execution.backup_branch {
            let _ = writeln!(md, "\n## Recovery\n");
            let _ = writeln!(
                md,
                "A backup branch was created before any change. To restore the original state:\n"
            );
            let _ = writeln!(md, "```sh\ngit reset --hard {branch}\n```");
        }
    }

    if !report.reports.is_empty() {
        let _ = writeln!(md, "\n## Artifacts\n");
        for name in report.reports.keys() {
            let _ = writeln!(md, "- {name}");
        }
    }
    md
}
