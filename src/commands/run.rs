use anyhow::Result;
use std::path::PathBuf;

use super::assess::run_assessment;
use super::detect::run_detection;
use super::execute::{operator_for, run_execution};
use super::session::Session;
use crate::assessment::ImpactAssessment;
use crate::cli::RunMode;
use crate::detection::FocusArea;
use crate::execution::ExecutionReport;
use crate::observability::{set_phase, PipelinePhase};
use crate::report::{self, FinalReport, SessionStatus};

const ARTIFACTS: [&str; 7] = [
    report::INVENTORY_CSV,
    report::DIRECTORY_TREE,
    report::DETECTION_SUMMARY_JSON,
    report::ASSESSMENT_REPORT_JSON,
    report::REMOVAL_PLAN_CSV,
    report::EXECUTION_REPORT_JSON,
    report::SUMMARY_MARKDOWN,
];

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub mode: RunMode,
    pub focus: Vec<FocusArea>,
    pub no_confirmation: bool,
    pub plain: bool,
}

#[derive(Default)]
struct PhaseResults {
    assessments: Vec<ImpactAssessment>,
    execution: Option<ExecutionReport>,
}

fn run_phases(
    session: &Session,
    config: &RunConfig,
    report: &mut FinalReport,
    results: &mut PhaseResults,
) -> Result<()> {
    let items = run_detection(session, &config.focus)?;
    report.summary.total_legacy_items = items.len();
    report.complete_phase("detection");

    if config.mode == RunMode::DetectionOnly {
        println!("\nDetection complete. Use --mode assessment_only to continue.");
        return Ok(());
    }
    if items.is_empty() {
        println!("\nNo legacy items to assess.");
        return Ok(());
    }

    let outcome = run_assessment(session, &items)?;
    report.summary.items_assessed = outcome.assessments.len();
    report.complete_phase("assessment");
    results.assessments = outcome.assessments;

    let Some(mode) = config.mode.execution_mode() else {
        println!("\nAssessment complete. Use --mode dry_run to continue.");
        return Ok(());
    };
    if let Some(execution) =
        run_execution(session, &outcome.plan, mode, operator_for(config.no_confirmation))?
    {
        report.summary.batches_executed = execution.summary.total_batches;
        report.summary.successful_steps = execution.summary.successful_steps;
        report.summary.failed_steps = execution.summary.failed_steps;
        report.complete_phase("execution");
        results.execution = Some(execution);
    }
    Ok(())
}

/// Run the pipeline up to `config.mode`, then write the session reports.
///
/// The final report and Markdown summary are written even when a phase
/// fails; the phase error is returned afterwards.
pub fn run_pipeline(config: RunConfig) -> Result<FinalReport> {
    let session = Session::open(
        &config.path,
        config.config.as_deref(),
        config.output_dir.as_deref(),
        config.plain,
    )?;
    println!("Legacy removal session {}", session.id);
    println!("Project: {}", session.root.display());
    println!("Output: {}", session.output.path().display());

    let mut final_report = FinalReport::start(&session.id, &session.root, session.config.clone());
    let mut results = PhaseResults::default();
    let outcome = run_phases(&session, &config, &mut final_report, &mut results);

    let _phase = set_phase(PipelinePhase::Reporting);
    final_report.finish(if outcome.is_ok() {
        SessionStatus::Completed
    } else {
        SessionStatus::Failed
    });

    let summary = report::render_markdown_summary(
        &final_report,
        &results.assessments,
        results.execution.as_ref(),
    );
    let written = report::write_text(&session.output.file(report::SUMMARY_MARKDOWN), &summary)
        .map(|_| final_report.complete_phase("documentation"));
    for name in ARTIFACTS {
        let path = session.output.file(name);
        if path.is_file() {
            final_report.record_artifact(name, &path);
        }
    }
    let final_written =
        report::write_final_report(&session.output.file(report::FINAL_REPORT_JSON), &final_report);

    outcome?;
    written?;
    final_written?;

    println!("\nLegacy removal session {} {}", session.id, final_report.status);
    println!("All reports saved to: {}", session.output.path().display());
    Ok(final_report)
}
