use chrono::{Local, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::linked_tool::{CommandLinkedTool, LinkedTool};
use super::operator::{Operator, TerminalOperator};
use super::types::{
    Batch, BatchResult, BatchStatus, ExecutionReport, ExecutionStep, ExecutionSummary, RemovalPlan,
    StepStatus,
};
use super::validation::Validator;
use crate::assessment::RecommendedAction;
use crate::config::{DecruftConfig, ExecutionMode};
use crate::errors::{DecruftError, Result};
use crate::observability::{increment_processed, set_current_item, set_phase, set_progress, PipelinePhase};
use crate::process::CommandRunner;
use crate::snapshot::fingerprint;
use crate::vcs::Git;

const BACKUP_PREREQUISITE: &str = "Create backup branch";

/// Runs removal plans step by step.
///
/// Steps and batches run strictly in order. In fail-stop modes the first
/// failed step halts its batch and the rest of the run.
pub struct Executor<'a> {
    root: PathBuf,
    config: &'a DecruftConfig,
    runner: &'a dyn CommandRunner,
    linked_tool: Box<dyn LinkedTool + 'a>,
    operator: Box<dyn Operator + 'a>,
    backup_branch: Option<String>,
    backup_attempted: bool,
    failed_phases: BTreeSet<u8>,
    git_enabled: bool,
}

impl<'a> Executor<'a> {
    pub fn new(root: impl Into<PathBuf>, config: &'a DecruftConfig, runner: &'a dyn CommandRunner) -> Self {
        let root = root.into();
        let git_enabled = Git::new(runner, &root).is_work_tree();
        Self {
            linked_tool: Box::new(CommandLinkedTool::new(runner, &root, &config.linked_tools)),
            operator: Box::new(TerminalOperator),
            root,
            config,
            runner,
            backup_branch: None,
            backup_attempted: false,
            failed_phases: BTreeSet::new(),
            git_enabled,
        }
    }

    pub fn with_linked_tool(mut self, tool: Box<dyn LinkedTool + 'a>) -> Self {
        self.linked_tool = tool;
        self
    }

    pub fn with_operator(mut self, operator: Box<dyn Operator + 'a>) -> Self {
        self.operator = operator;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the backup branch created during this run, if any.
    pub fn backup_branch(&self) -> Option<&str> {
        self.backup_branch.as_deref()
    }

    fn git(&self) -> Git<'a> {
        Git::new(self.runner, &self.root)
    }

    /// Fails when a mutating run needs git and the root is not a work tree.
    pub fn ensure_repository(&self, mode: ExecutionMode) -> Result<()> {
        if mode.is_mutating() && self.config.git.requires_repository() && !self.git_enabled {
            return Err(DecruftError::Vcs(format!(
                "{} is not a git work tree; disable git.auto_commit and git.create_backup_branch to run without git",
                self.root.display()
            )));
        }
        Ok(())
    }

    /// Execute every batch of `plan` in order.
    pub fn execute_plan(&mut self, plan: &RemovalPlan, mode: ExecutionMode) -> Result<ExecutionReport> {
        let _phase = set_phase(PipelinePhase::Execution);
        self.ensure_repository(mode)?;

        let config = self.config;
        let excluded = &config.detection.excluded_paths;
        let fingerprint_before = (!mode.is_mutating()).then(|| fingerprint(&self.root, self.runner, excluded));
        let started_at = Utc::now();
        log::info!(
            "Executing {} steps in {} batches ({} mode)",
            plan.step_count(),
            plan.batches.len(),
            mode
        );
        set_progress(0, plan.step_count());

        if mode.is_mutating() {
            self.ensure_backup_branch();
        }

        let mut results = Vec::with_capacity(plan.batches.len());
        let mut halted = false;
        for batch in &plan.batches {
            let result = self.execute_batch(batch, mode);
            let stop = result.halted;
            results.push(result);
            if stop {
                log::warn!("Batch {} failed; stopping the run", batch.batch_id);
                halted = true;
                break;
            }
        }

        let fingerprint_after = fingerprint_before
            .is_some()
            .then(|| fingerprint(&self.root, self.runner, excluded));

        Ok(ExecutionReport {
            mode,
            started_at,
            finished_at: Utc::now(),
            halted,
            backup_branch: self.backup_branch.clone(),
            summary: ExecutionSummary::from_batches(&results),
            batches: results,
            fingerprint_before,
            fingerprint_after,
        })
    }

    /// Execute one batch; in fail-stop modes a failure halts it and may roll it back.
    pub fn execute_batch(&mut self, batch: &Batch, mode: ExecutionMode) -> BatchResult {
        let mut result = BatchResult::pending(batch);
        result.started_at = Some(Utc::now());
        log::info!("Executing batch {} ({} steps)", batch.batch_id, batch.steps.len());

        let mut failed_at = None;
        for i in 0..result.steps.len() {
            self.execute_step(&mut result.steps[i], mode);
            increment_processed();
            if result.steps[i].status == StepStatus::Failed {
                self.failed_phases.insert(batch.phase);
                if mode.is_fail_stop() {
                    failed_at = Some(i);
                    break;
                }
            }
        }

        if let Some(i) = failed_at {
            result.halted = true;
            for step in result.steps.iter_mut().skip(i + 1) {
                step.finish(StepStatus::Skipped, "Not executed: batch halted");
            }
        }

        result.tally();
        result.status = if result.failed_items == 0 {
            BatchStatus::Passed
        } else {
            BatchStatus::Failed
        };

        if result.halted && self.config.execution.rollback_on_failure {
            self.rollback_batch(&mut result);
        }

        result.finished_at = Some(Utc::now());
        log::info!(
            "Batch {} {}: {} passed, {} failed, {} skipped, {} rolled back",
            result.batch_id,
            result.status,
            result.successful_items,
            result.failed_items,
            result.skipped_items,
            result.rolled_back_items
        );
        result
    }

    fn execute_step(&mut self, step: &mut ExecutionStep, mode: ExecutionMode) {
        let _item = set_current_item(&step.step_id);
        let started = Instant::now();
        log::info!("{}: {} {}", step.step_id, step.action_type, step.item_path);
        self.run_step(step, mode);
        step.execution_time_seconds = started.elapsed().as_secs_f64();
        match step.status {
            StepStatus::Failed => log::warn!("{} failed: {}", step.step_id, step.error),
            status => log::debug!("{} {}", step.step_id, status),
        }
    }

    fn run_step(&mut self, step: &mut ExecutionStep, mode: ExecutionMode) {
        if mode == ExecutionMode::DryRun {
            step.finish(StepStatus::Passed, describe_dry_run(step));
            return;
        }
        if mode == ExecutionMode::SafeOnly && step.action_type != RecommendedAction::RemoveImmediately {
            step.finish(StepStatus::Skipped, "Skipped: Not a safe removal");
            return;
        }

        let unmet = self.unmet_prerequisites(step, mode);
        if !unmet.is_empty() {
            step.fail(format!("Prerequisites not met: {}", unmet.join(", ")));
            return;
        }
        if mode == ExecutionMode::ManualReview {
            let prompt = format!("Execute {} for {}: `{}`?", step.step_id, step.item_path, step.command);
            if !self.operator.confirm(&prompt) {
                step.finish(StepStatus::Skipped, "Skipped: Declined by operator");
                return;
            }
        }
        if !step.is_library() && !self.root.join(&step.item_path).exists() {
            step.finish(StepStatus::Passed, format!("Item already removed: {}", step.item_path));
            return;
        }

        let timeout = Duration::from_secs(self.config.execution.command_timeout_seconds);
        match self.runner.run_shell(&step.command, &self.root, Some(timeout)) {
            Ok(output) if output.success() => step.output = output.stdout,
            Ok(output) => {
                step.output = output.stdout.clone();
                step.fail(format!("Command failed: {}", output.failure_message()));
                return;
            }
            Err(e) => {
                step.fail(format!("Command could not be started: {e}"));
                return;
            }
        }

        if let Some(tool) = step.linked_tool.clone() {
            let retry = &self.config.linked_tools.retry;
            let (outcome, attempts) = retry.run(|attempt| {
                log::debug!("Linked tool {} attempt {}", tool, attempt);
                self.linked_tool.invoke(&tool, step)
            });
            match outcome {
                Ok(out) => {
                    if !step.output.is_empty() && !step.output.ends_with('\n') {
                        step.output.push('\n');
                    }
                    step.output.push_str(&format!("Linked tool output: {out}"));
                }
                Err(e) => {
                    step.fail(format!(
                        "Linked tool {tool} failed after {attempts} attempt(s): {e}"
                    ));
                    return;
                }
            }
        }

        if self.config.git.auto_commit && self.git_enabled {
            step.commit_hash = self.commit_step(step);
        }

        if self.config.execution.validate_after_batch {
            let mut validator = Validator::new(&self.root, self.runner, &self.config.validation);
            if mode == ExecutionMode::ManualReview {
                validator = validator.with_operator(self.operator.as_ref());
            }
            if let Err(e) = validator.run_all(&step.validation_steps) {
                step.fail(e);
                return;
            }
        }

        step.status = StepStatus::Passed;
    }

    fn unmet_prerequisites(&mut self, step: &ExecutionStep, mode: ExecutionMode) -> Vec<String> {
        let mut unmet = Vec::new();
        for prerequisite in &step.prerequisites {
            let prerequisite = prerequisite.trim();
            if prerequisite == BACKUP_PREREQUISITE {
                if mode.is_mutating() {
                    self.ensure_backup_branch();
                }
            } else if let Some(phase) = completed_phase(prerequisite) {
                if self.failed_phases.contains(&phase) {
                    unmet.push(prerequisite.to_string());
                }
            } else if mode == ExecutionMode::ManualReview {
                if !self.operator.confirm(&format!("Prerequisite for {}: {}. Met?", step.step_id, prerequisite)) {
                    unmet.push(prerequisite.to_string());
                }
            } else {
                log::info!("Assuming prerequisite '{}' for {}", prerequisite, step.step_id);
            }
        }
        unmet
    }

    /// Create the backup branch once per run; failure only warns.
    fn ensure_backup_branch(&mut self) {
        if self.backup_attempted || !self.config.git.create_backup_branch || !self.git_enabled {
            return;
        }
        self.backup_attempted = true;
        let name = format!("legacy-removal-backup-{}", Local::now().format("%Y%m%d-%H%M%S"));
        match self.git().create_branch(&name) {
            Ok(()) => {
                log::info!("Created backup branch {}", name);
                self.backup_branch = Some(name);
            }
            Err(e) => log::warn!("Could not create backup branch: {}", e),
        }
    }

    fn commit_step(&self, step: &ExecutionStep) -> Option<String> {
        let git = self.git();
        match git.is_dirty() {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                log::warn!("Could not check working tree for {}: {}", step.step_id, e);
                return None;
            }
        }
        let mut message = format!(
            "{} {}: {}",
            self.config.git.commit_prefix, step.action_type, step.item_path
        );
        if let Some(tool) = &step.linked_tool {
            message.push_str(&format!(" (via {tool})"));
        }
        match git.commit_all(&message) {
            Ok(hash) => {
                log::info!("Committed {} as {}", step.step_id, short_hash(&hash));
                Some(hash)
            }
            Err(e) => {
                log::warn!("Could not commit {}: {}", step.step_id, e);
                None
            }
        }
    }

    /// Undo one step: revert its commit, else run its rollback command.
    pub fn rollback_step(&self, step: &mut ExecutionStep) -> bool {
        let _item = set_current_item(&step.step_id);
        let reverted = self.undo_changes(step);
        if reverted {
            step.status = StepStatus::RolledBack;
        }
        reverted
    }

    /// Undo whatever a failed step changed. The step stays `Failed`.
    ///
    /// Changes the step left uncommitted are stashed when its rollback
    /// command cannot account for them, so reverts of earlier commits
    /// start from a clean tree.
    fn undo_failed_step(&self, step: &mut ExecutionStep) -> bool {
        let _item = set_current_item(&step.step_id);
        let mut undone = step.is_rollback_eligible() && self.undo_changes(step);

        // Under auto_commit every uncommitted change belongs to this step.
        let leftovers_are_its_own = self.config.git.auto_commit || !undone;
        if self.git_enabled && step.commit_hash.is_none() && leftovers_are_its_own {
            undone = match self.git().is_dirty() {
                Ok(false) => true,
                Ok(true) => self.stash_leftovers(step),
                Err(e) => {
                    log::warn!("Could not check working tree after {}: {}", step.step_id, e);
                    false
                }
            };
        }

        if undone {
            if !step.output.is_empty() && !step.output.ends_with('\n') {
                step.output.push('\n');
            }
            step.output.push_str("Changes rolled back");
        }
        undone
    }

    fn undo_changes(&self, step: &ExecutionStep) -> bool {
        if let Some(hash) = &step.commit_hash {
            match self.git().revert(hash) {
                Ok(()) => {
                    log::info!("Reverted {} ({})", step.step_id, short_hash(hash));
                    true
                }
                Err(e) => {
                    log::warn!("Could not revert {}: {}", step.step_id, e);
                    false
                }
            }
        } else if let Some(command) = &step.rollback_command {
            let timeout = Duration::from_secs(self.config.execution.command_timeout_seconds);
            match self.runner.run_shell(command, &self.root, Some(timeout)) {
                Ok(output) if output.success() => true,
                Ok(output) => {
                    log::warn!("Rollback of {} failed: {}", step.step_id, output.failure_message());
                    false
                }
                Err(e) => {
                    log::warn!("Rollback of {} could not start: {}", step.step_id, e);
                    false
                }
            }
        } else {
            log::warn!("No automatic rollback available for {}", step.step_id);
            false
        }
    }

    fn stash_leftovers(&self, step: &ExecutionStep) -> bool {
        let message = format!(
            "{} uncommitted changes from failed {}",
            self.config.git.commit_prefix, step.step_id
        );
        match self.git().stash_all(&message) {
            Ok(()) => {
                log::info!("Stashed uncommitted changes left by {}", step.step_id);
                true
            }
            Err(e) => {
                log::warn!("Could not stash changes left by {}: {}", step.step_id, e);
                false
            }
        }
    }

    /// Roll back a halted batch, failed step first, then the earlier steps
    /// in reverse order. Returns how many steps were undone.
    pub fn rollback_batch(&self, result: &mut BatchResult) -> usize {
        log::info!("Rolling back batch {}", result.batch_id);
        let mut eligible = 0;
        let mut reverted = 0;
        for step in result.steps.iter_mut().rev() {
            let undone = match step.status {
                StepStatus::Failed if step.is_rollback_eligible() || self.git_enabled => {
                    self.undo_failed_step(step)
                }
                _ if step.is_rollback_eligible() => self.rollback_step(step),
                _ => continue,
            };
            eligible += 1;
            if undone {
                reverted += 1;
            }
        }
        result.tally();
        if eligible > 0 && reverted == eligible {
            result.status = BatchStatus::RolledBack;
        } else if result.failed_items > 0 || reverted < eligible {
            result.status = BatchStatus::Failed;
        }
        log::info!("Rolled back {}/{} steps of {}", reverted, eligible, result.batch_id);
        reverted
    }
}

/// `Complete Phase N` prerequisites name the phase that must be clean.
fn completed_phase(prerequisite: &str) -> Option<u8> {
    prerequisite
        .strip_prefix("Complete Phase ")
        .and_then(|n| n.trim().parse().ok())
}

fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

fn describe_dry_run(step: &ExecutionStep) -> String {
    let command = step.command.trim();
    if command.starts_with("npm uninstall") || command.starts_with("pip uninstall") {
        format!("DRY RUN: Would uninstall {}", step.target_name())
    } else if command.starts_with("git rm") {
        format!("DRY RUN: Would remove {}", step.item_path)
    } else if let Some(tool) = &step.linked_tool {
        format!("DRY RUN: Would execute linked tool {tool}")
    } else {
        format!("DRY RUN: Would execute: {command}")
    }
}
