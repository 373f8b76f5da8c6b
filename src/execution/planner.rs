//! Turns assessments into a tiered, batched removal plan.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::types::{Batch, ExecutionStep, RemovalPlan, StepStatus};
use crate::assessment::{ImpactAssessment, RecommendedAction, RiskCategory};
use crate::config::{ExecutionConfig, LinkedToolConfig};
use crate::detection::{Ecosystem, ItemType};
use crate::errors::{DecruftError, Result};
use crate::observability::{set_phase, PipelinePhase};
use crate::process::shell_quote;

const LIST_SEPARATOR: &str = "; ";

/// One row of `removal-plan.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    #[serde(rename = "Phase")]
    pub phase: u8,
    #[serde(rename = "Action Type")]
    pub action_type: String,
    #[serde(rename = "Item Path")]
    pub item_path: String,
    #[serde(rename = "Command")]
    pub command: String,
    #[serde(rename = "Linked Skill", default)]
    pub linked_tool: String,
    #[serde(rename = "Prerequisites", default)]
    pub prerequisites: String,
    #[serde(rename = "Verification Steps", default)]
    pub verification_steps: String,
    #[serde(rename = "Rollback Command", default)]
    pub rollback_command: String,
}

fn phase_prerequisites(phase: u8) -> Vec<String> {
    let list: &[&str] = match phase {
        1 => &["Create backup branch"],
        2 => &["Complete Phase 1", "Team review"],
        _ => &["Complete Phase 2", "Migration planning"],
    };
    list.iter().map(|s| s.to_string()).collect()
}

fn phase_validation(phase: u8) -> Vec<String> {
    let list: &[&str] = match phase {
        1 => &["Run tests", "Build project"],
        2 => &["Manual inspection", "Dependency verification"],
        _ => &["Comprehensive testing", "Performance verification"],
    };
    list.iter().map(|s| s.to_string()).collect()
}

/// Command, linked tool and rollback command for one assessment.
struct StepCommands {
    command: String,
    linked_tool: String,
    rollback: Option<String>,
}

fn safe_commands(assessment: &ImpactAssessment, tools: &LinkedToolConfig) -> StepCommands {
    let path = &assessment.item_path;
    if assessment.item_type == ItemType::Library {
        let name = shell_quote(&assessment.item_name);
        let (command, rollback) = match Ecosystem::from_item_path(path) {
            Some(Ecosystem::Python) => (
                format!("pip uninstall -y {name}"),
                format!("pip install {name}"),
            ),
            _ => (format!("npm uninstall {name}"), format!("npm install {name}")),
        };
        return StepCommands {
            command,
            linked_tool: tools.resolve("library_removal").to_string(),
            rollback: Some(rollback),
        };
    }
    let quoted = shell_quote(path);
    let tool = if assessment.item_type == ItemType::Config {
        "config_cleanup"
    } else {
        "folder_removal"
    };
    StepCommands {
        command: format!("git rm -r -- {quoted}"),
        linked_tool: tools.resolve(tool).to_string(),
        rollback: Some(format!("git checkout HEAD -- {quoted}")),
    }
}

fn caution_commands(
    assessment: &ImpactAssessment,
    config: &ExecutionConfig,
    tools: &LinkedToolConfig,
) -> StepCommands {
    let path = &assessment.item_path;
    let archivable = matches!(assessment.item_type, ItemType::File | ItemType::Directory);
    if assessment.recommended_action == RecommendedAction::Archive && archivable {
        let archive_dir = config.archive_dir.trim_end_matches('/');
        let target = format!("{archive_dir}/{path}");
        let target_parent = Path::new(&target)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| archive_dir.to_string());
        return StepCommands {
            command: format!(
                "mkdir -p {} && git mv -- {} {}",
                shell_quote(&target_parent),
                shell_quote(path),
                shell_quote(&target)
            ),
            linked_tool: tools.resolve("folder_removal").to_string(),
            rollback: Some(format!(
                "git mv -- {} {}",
                shell_quote(&target),
                shell_quote(path)
            )),
        };
    }
    StepCommands {
        command: format!("# Manual review required for {path}"),
        linked_tool: tools.resolve("code_review").to_string(),
        rollback: None,
    }
}

fn risky_commands(assessment: &ImpactAssessment, tools: &LinkedToolConfig) -> StepCommands {
    let path = &assessment.item_path;
    let command = if assessment.migration_steps.is_empty() {
        format!("# Migration required for {path}")
    } else {
        format!(
            "# Migration required for {path}: {}",
            assessment.migration_steps.join(" -> ")
        )
    };
    StepCommands {
        command,
        linked_tool: tools.resolve("migration_assist").to_string(),
        rollback: None,
    }
}

fn step_for(
    assessment: &ImpactAssessment,
    config: &ExecutionConfig,
    tools: &LinkedToolConfig,
) -> ExecutionStep {
    let phase = assessment.risk_category.phase();
    let commands = match assessment.risk_category {
        RiskCategory::Safe => safe_commands(assessment, tools),
        RiskCategory::Caution => caution_commands(assessment, config, tools),
        RiskCategory::Risky => risky_commands(assessment, tools),
    };
    ExecutionStep {
        step_id: String::new(),
        phase,
        item_path: assessment.item_path.clone(),
        action_type: assessment.recommended_action,
        command: commands.command,
        linked_tool: Some(commands.linked_tool),
        prerequisites: phase_prerequisites(phase),
        validation_steps: phase_validation(phase),
        rollback_command: commands.rollback,
        status: StepStatus::Pending,
        output: String::new(),
        error: String::new(),
        execution_time_seconds: 0.0,
        commit_hash: None,
    }
}

/// Group steps by phase (stable), number them and cut size-bounded batches.
fn batch_steps(mut steps: Vec<ExecutionStep>, batch_size: usize) -> RemovalPlan {
    steps.sort_by_key(|s| s.phase);
    for (i, step) in steps.iter_mut().enumerate() {
        step.step_id = format!("step-{:03}", i + 1);
    }

    let mut batches = Vec::new();
    for phase in 1..=3u8 {
        let tier: Vec<ExecutionStep> = steps.iter().filter(|s| s.phase == phase).cloned().collect();
        for (n, chunk) in tier.chunks(batch_size).enumerate() {
            batches.push(Batch {
                batch_id: format!("phase{phase}-batch{:02}", n + 1),
                phase,
                steps: chunk.to_vec(),
            });
        }
    }
    RemovalPlan { batches }
}

/// Plan SAFE, CAUTION and RISKY items as phases 1, 2 and 3.
pub fn plan_batches(
    assessments: &[ImpactAssessment],
    config: &ExecutionConfig,
    tools: &LinkedToolConfig,
) -> RemovalPlan {
    let _phase = set_phase(PipelinePhase::Planning);
    let steps = assessments
        .iter()
        .map(|a| step_for(a, config, tools))
        .collect();
    let plan = batch_steps(steps, config.effective_batch_size());
    tracing::info!(
        batches = plan.batches.len(),
        steps = plan.step_count(),
        "removal plan created"
    );
    plan
}

fn split_list(field: &str) -> Vec<String> {
    field
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(field: &str) -> Option<String> {
    let field = field.trim();
    (!field.is_empty()).then(|| field.to_string())
}

/// Rebuild a plan from `removal-plan.csv` rows.
pub fn plan_from_rows(rows: &[PlanRow], config: &ExecutionConfig) -> Result<RemovalPlan> {
    let steps = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            if !(1..=3).contains(&row.phase) {
                return Err(DecruftError::Plan(format!(
                    "row {}: phase must be 1, 2 or 3, got {}",
                    i + 1,
                    row.phase
                )));
            }
            let action_type = row
                .action_type
                .parse::<RecommendedAction>()
                .map_err(|e| DecruftError::Plan(format!("row {}: {e}", i + 1)))?;
            Ok(ExecutionStep {
                step_id: String::new(),
                phase: row.phase,
                item_path: row.item_path.trim().to_string(),
                action_type,
                command: row.command.trim().to_string(),
                linked_tool: non_empty(&row.linked_tool),
                prerequisites: split_list(&row.prerequisites),
                validation_steps: split_list(&row.verification_steps),
                rollback_command: non_empty(&row.rollback_command),
                status: StepStatus::Pending,
                output: String::new(),
                error: String::new(),
                execution_time_seconds: 0.0,
                commit_hash: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(batch_steps(steps, config.effective_batch_size()))
}

/// Flatten a plan into CSV rows.
pub fn plan_rows(plan: &RemovalPlan) -> Vec<PlanRow> {
    plan.steps()
        .map(|step| PlanRow {
            phase: step.phase,
            action_type: step.action_type.as_str().to_string(),
            item_path: step.item_path.clone(),
            command: step.command.clone(),
            linked_tool: step.linked_tool.clone().unwrap_or_default(),
            prerequisites: step.prerequisites.join(LIST_SEPARATOR),
            verification_steps: step.validation_steps.join(LIST_SEPARATOR),
            rollback_command: step.rollback_command.clone().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assessment(
        path: &str,
        item_type: ItemType,
        category: RiskCategory,
        action: RecommendedAction,
    ) -> ImpactAssessment {
        ImpactAssessment {
            item_path: path.into(),
            item_type,
            item_name: path.rsplit([':', '/']).next().unwrap_or(path).into(),
            risk_score: 0.5,
            risk_category: category,
            impact_score: 0.5,
            direct_dependencies: vec![],
            indirect_dependencies: vec![],
            dependents: vec![],
            test_coverage: 0.0,
            build_impact: String::new(),
            rollback_complexity: String::new(),
            recommended_action: action,
            migration_steps: vec![],
            estimated_effort_hours: 1,
            confidence_level: 0.8,
        }
    }

    #[test]
    fn test_safe_library_commands() {
        let plan = plan_batches(
            &[
                assessment("package.json:moment", ItemType::Library, RiskCategory::Safe, RecommendedAction::RemoveImmediately),
                assessment("requirements.txt:six", ItemType::Library, RiskCategory::Safe, RecommendedAction::RemoveImmediately),
            ],
            &ExecutionConfig::default(),
            &LinkedToolConfig::default(),
        );
        let steps: Vec<_> = plan.steps().collect();
        assert_eq!(steps[0].command, "npm uninstall moment");
        assert_eq!(steps[0].rollback_command.as_deref(), Some("npm install moment"));
        assert_eq!(steps[0].linked_tool.as_deref(), Some("/skill-remove-library"));
        assert_eq!(steps[1].command, "pip uninstall -y six");
        assert_eq!(steps[0].prerequisites, vec!["Create backup branch"]);
        assert_eq!(steps[0].validation_steps, vec!["Run tests", "Build project"]);
    }

    #[test]
    fn test_tiers_ordered_and_chunked() {
        let config = ExecutionConfig {
            batch_size: 2,
            ..Default::default()
        };
        let assessments = vec![
            assessment("risky.js", ItemType::File, RiskCategory::Risky, RecommendedAction::ReviewRequired),
            assessment("a.js", ItemType::File, RiskCategory::Safe, RecommendedAction::RemoveImmediately),
            assessment("old", ItemType::Directory, RiskCategory::Caution, RecommendedAction::Archive),
            assessment("b.js", ItemType::File, RiskCategory::Safe, RecommendedAction::RemoveImmediately),
            assessment("c.js", ItemType::File, RiskCategory::Safe, RecommendedAction::RemoveImmediately),
        ];
        let plan = plan_batches(&assessments, &config, &LinkedToolConfig::default());

        let ids: Vec<_> = plan.batches.iter().map(|b| b.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["phase1-batch01", "phase1-batch02", "phase2-batch01", "phase3-batch01"]);
        let paths: Vec<_> = plan.steps().map(|s| s.item_path.as_str()).collect();
        assert_eq!(paths, vec!["a.js", "b.js", "c.js", "old", "risky.js"]);
        let step_ids: Vec<_> = plan.steps().map(|s| s.step_id.as_str()).collect();
        assert_eq!(step_ids, vec!["step-001", "step-002", "step-003", "step-004", "step-005"]);
    }

    #[test]
    fn test_caution_archive_and_review() {
        let plan = plan_batches(
            &[
                assessment("src/legacy", ItemType::Directory, RiskCategory::Caution, RecommendedAction::Archive),
                assessment("package.json:jquery", ItemType::Library, RiskCategory::Caution, RecommendedAction::ReviewRequired),
            ],
            &ExecutionConfig::default(),
            &LinkedToolConfig::default(),
        );
        let steps: Vec<_> = plan.steps().collect();
        assert_eq!(
            steps[0].command,
            "mkdir -p legacy-archive/src && git mv -- src/legacy legacy-archive/src/legacy"
        );
        assert_eq!(
            steps[0].rollback_command.as_deref(),
            Some("git mv -- legacy-archive/src/legacy src/legacy")
        );
        assert_eq!(steps[1].command, "# Manual review required for package.json:jquery");
        assert_eq!(steps[1].linked_tool.as_deref(), Some("/skill-request-code-review"));
        assert_eq!(steps[1].prerequisites, vec!["Complete Phase 1", "Team review"]);
    }

    #[test]
    fn test_risky_migration_command() {
        let mut risky = assessment(
            "package.json:moment",
            ItemType::Library,
            RiskCategory::Risky,
            RecommendedAction::MigrationRequired,
        );
        risky.migration_steps = vec!["Find replacement".into(), "Remove it".into()];
        let plan = plan_batches(&[risky], &ExecutionConfig::default(), &LinkedToolConfig::default());
        let step = plan.steps().next().unwrap();
        assert_eq!(
            step.command,
            "# Migration required for package.json:moment: Find replacement -> Remove it"
        );
        assert_eq!(step.phase, 3);
        assert_eq!(step.validation_steps, vec!["Comprehensive testing", "Performance verification"]);
    }

    #[test]
    fn test_rows_round_trip_through_plan() {
        let plan = plan_batches(
            &[
                assessment("a.js", ItemType::File, RiskCategory::Safe, RecommendedAction::RemoveImmediately),
                assessment("old", ItemType::Directory, RiskCategory::Caution, RecommendedAction::ReviewRequired),
            ],
            &ExecutionConfig::default(),
            &LinkedToolConfig::default(),
        );
        let rows = plan_rows(&plan);
        assert_eq!(rows[0].prerequisites, "Create backup branch");
        assert_eq!(rows[1].rollback_command, "");

        let rebuilt = plan_from_rows(&rows, &ExecutionConfig::default()).unwrap();
        assert_eq!(rebuilt, plan);
    }

    #[test]
    fn test_bad_rows_rejected() {
        let mut row = PlanRow {
            phase: 1,
            action_type: "obliterate".into(),
            item_path: "a.js".into(),
            command: "true".into(),
            linked_tool: String::new(),
            prerequisites: String::new(),
            verification_steps: String::new(),
            rollback_command: String::new(),
        };
        assert!(plan_from_rows(std::slice::from_ref(&row), &ExecutionConfig::default()).is_err());
        row.action_type = "remove_immediately".into();
        row.phase = 9;
        assert!(plan_from_rows(&[row], &ExecutionConfig::default()).is_err());
    }
}
