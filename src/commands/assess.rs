use anyhow::{Context, Result};
use std::path::PathBuf;

use super::detect::run_detection;
use super::session::Session;
use crate::assessment::{ImpactAssessment, ImpactAssessor};
use crate::detection::LegacyItem;
use crate::execution::{plan_batches, RemovalPlan};
use crate::graph;
use crate::observability::{set_phase, PipelinePhase};
use crate::report::{self, console, AssessmentReport};

#[derive(Debug, Clone)]
pub struct AssessConfig {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    /// Inventory from an earlier `detect`; a fresh scan runs when absent
    pub inventory: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub plain: bool,
}

pub struct AssessmentOutcome {
    pub assessments: Vec<ImpactAssessment>,
    pub plan: RemovalPlan,
}

/// Phase 2: graph, assess and plan, then write the report and plan CSV.
pub fn run_assessment(session: &Session, items: &[LegacyItem]) -> Result<AssessmentOutcome> {
    println!("{}", console::phase_banner(2, "Impact Assessment & Risk Analysis"));

    let config = &session.config;
    let output_excluded = session.excluded_output();
    let mut excluded = config.detection.excluded_paths.clone();
    excluded.extend(output_excluded.iter().cloned());

    let graph = graph::build_with_exclusions(&session.root, items, &config.detection, &output_excluded);
    let assessments = ImpactAssessor::new(&session.root, &config.assessment, &config.risk_thresholds)
        .with_excluded(&excluded)
        .assess_all(items, &graph);
    let plan = plan_batches(&assessments, &config.execution, &config.linked_tools);

    let _phase = set_phase(PipelinePhase::Reporting);
    let assessment_report = AssessmentReport::new(assessments, &graph);
    let output = &session.output;
    report::write_assessment_report(
        &output.file(report::ASSESSMENT_REPORT_JSON),
        &assessment_report,
    )
    .context("Failed to write the impact assessment report")?;
    report::write_plan_csv(&output.file(report::REMOVAL_PLAN_CSV), &plan)
        .context("Failed to write the removal plan")?;

    println!(
        "{}",
        console::assessment_summary(
            &assessment_report.summary,
            assessment_report.total_items_assessed
        )
    );
    Ok(AssessmentOutcome {
        assessments: assessment_report.assessments,
        plan,
    })
}

pub fn assess_legacy(config: AssessConfig) -> Result<()> {
    let session = Session::open(
        &config.path,
        config.config.as_deref(),
        config.output_dir.as_deref(),
        config.plain,
    )?;
    let items = match &config.inventory {
        Some(path) => report::read_inventory_csv(path)
            .with_context(|| format!("Failed to read inventory {}", path.display()))?,
        None => run_detection(&session, &[])?,
    };
    if items.is_empty() {
        println!("No legacy items to assess.");
        return Ok(());
    }
    run_assessment(&session, &items)?;
    Ok(())
}
