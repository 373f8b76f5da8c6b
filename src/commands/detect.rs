use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;

use super::session::Session;
use crate::detection::{Detector, FocusArea, LegacyItem};
use crate::observability::{set_phase, PipelinePhase};
use crate::report::{self, console, DetectionSummary};
use crate::vcs::{git_installed, Git, GitHistory, HistoryProvider, NoHistory};

#[derive(Debug, Clone)]
pub struct DetectConfig {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub focus: Vec<FocusArea>,
    pub plain: bool,
}

/// Phase 1: scan the tree and write the inventory, tree and summary.
pub fn run_detection(session: &Session, focus: &[FocusArea]) -> Result<Vec<LegacyItem>> {
    println!("{}", console::phase_banner(1, "Legacy Detection & Inventory"));

    let git = Git::new(&session.runner, &session.root);
    let history: Box<dyn HistoryProvider + '_> = if !git_installed() {
        log::warn!("git not found on PATH; ages fall back to file timestamps");
        Box::new(NoHistory)
    } else if git.is_work_tree() {
        Box::new(GitHistory::new(git))
    } else {
        log::warn!(
            "{} is not a git work tree; ages fall back to file timestamps",
            session.root.display()
        );
        Box::new(NoHistory)
    };

    let items = Detector::new(&session.root, &session.config.detection, history.as_ref())
        .with_excluded(session.excluded_output())
        .detect(focus)?;

    let _phase = set_phase(PipelinePhase::Reporting);
    let summary = DetectionSummary::from_items(&items, Utc::now());
    let output = &session.output;
    report::write_inventory_csv(&output.file(report::INVENTORY_CSV), &items)
        .context("Failed to write the legacy inventory")?;
    report::write_directory_tree(&output.file(report::DIRECTORY_TREE), &items)?;
    report::write_summary_json(&output.file(report::DETECTION_SUMMARY_JSON), &summary)?;

    println!("{}", console::detection_summary(&summary));
    println!("   Reports saved to: {}", output.path().display());
    Ok(items)
}

pub fn detect_legacy(config: DetectConfig) -> Result<()> {
    let session = Session::open(
        &config.path,
        config.config.as_deref(),
        config.output_dir.as_deref(),
        config.plain,
    )?;
    run_detection(&session, &config.focus)?;
    Ok(())
}
