use anyhow::{Context, Result};
use std::path::PathBuf;

use super::session::Session;
use crate::config::ExecutionMode;
use crate::execution::{
    plan_from_rows, AutoApprove, ExecutionReport, Executor, Operator, RemovalPlan, TerminalOperator,
};
use crate::observability::{set_phase, PipelinePhase};
use crate::report::{self, console};

#[derive(Debug, Clone)]
pub struct ExecuteConfig {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub plan: PathBuf,
    pub mode: Option<ExecutionMode>,
    pub batch_size: Option<usize>,
    /// `Some(true)` for `--validate`, `Some(false)` for `--no-validate`
    pub validate: Option<bool>,
    pub yes: bool,
    pub output_dir: Option<PathBuf>,
    pub plain: bool,
}

/// `--yes` approves every confirmation; otherwise the terminal is asked.
pub fn operator_for(yes: bool) -> Box<dyn Operator> {
    if yes {
        Box::new(AutoApprove)
    } else {
        Box::new(TerminalOperator)
    }
}

/// Phase 3: confirm, execute and write `execution-report.json`.
///
/// Returns `None` when the operator cancels the run.
pub fn run_execution(
    session: &Session,
    plan: &RemovalPlan,
    mode: ExecutionMode,
    operator: Box<dyn Operator>,
) -> Result<Option<ExecutionReport>> {
    println!("{}", console::phase_banner(3, "Execution Automation"));
    println!("Execution mode: {mode}");

    if plan.is_empty() {
        println!("Removal plan is empty; nothing to execute.");
    }

    if mode.is_mutating() && session.config.safety.require_confirmation {
        let prompt = format!(
            "About to execute {} steps of legacy removal in {mode} mode. Continue?",
            plan.step_count()
        );
        if !operator.confirm(&prompt) {
            println!("Execution cancelled by operator");
            return Ok(None);
        }
    }

    let mut executor =
        Executor::new(&session.root, &session.config, &session.runner).with_operator(operator);
    let execution = executor.execute_plan(plan, mode)?;

    let _phase = set_phase(PipelinePhase::Reporting);
    report::write_json(&session.output.file(report::EXECUTION_REPORT_JSON), &execution)
        .context("Failed to write the execution report")?;
    println!("{}", console::execution_summary(&execution, session.plain));
    Ok(Some(execution))
}

pub fn execute_plan(config: ExecuteConfig) -> Result<()> {
    let mut session = Session::open(
        &config.path,
        config.config.as_deref(),
        config.output_dir.as_deref(),
        config.plain,
    )?;
    if let Some(batch_size) = config.batch_size {
        session.config.execution.batch_size = batch_size;
    }
    if let Some(validate) = config.validate {
        session.config.execution.validate_after_batch = validate;
    }
    let mode = config.mode.unwrap_or(session.config.execution.default_mode);

    let rows = report::read_plan_csv(&config.plan)
        .with_context(|| format!("Failed to read removal plan {}", config.plan.display()))?;
    let plan = plan_from_rows(&rows, &session.config.execution)?;
    run_execution(&session, &plan, mode, operator_for(config.yes))?;
    Ok(())
}
