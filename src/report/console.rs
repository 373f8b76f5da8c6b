//! Coloured running summary printed between phases.
//!
//! Colour is controlled globally through `colored`; `plain` here only
//! switches the table borders to ASCII.

use colored::*;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use std::fmt::Write as _;

use super::inventory::DetectionSummary;
use crate::assessment::AssessmentSummary;
use crate::execution::{BatchStatus, ExecutionReport};

pub fn phase_banner(number: u8, title: &str) -> String {
    let rule = "=".repeat(60);
    format!("\n{rule}\n{}\n{rule}", format!("PHASE {number}: {title}").bold())
}

pub fn detection_summary(summary: &DetectionSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Phase 1 Summary:".bold());
    let _ = writeln!(out, "   Total legacy items: {}", summary.total_items);
    let high = summary.high_risk().to_string();
    let high = if summary.high_risk() > 0 {
        high.red().bold()
    } else {
        high.normal()
    };
    let _ = writeln!(out, "   High risk items: {high}");
    for (item_type, count) in &summary.by_type {
        let _ = writeln!(out, "   {item_type}: {count}");
    }
    out
}

pub fn assessment_summary(summary: &AssessmentSummary, total: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Phase 2 Summary:".bold());
    let _ = writeln!(out, "   Items assessed: {total}");
    let _ = writeln!(out, "   Safe to remove: {}", summary.safe_removals.to_string().green());
    let _ = writeln!(out, "   Requires review: {}", summary.caution_items.to_string().yellow());
    let _ = writeln!(
        out,
        "   Risky (migration needed): {}",
        summary.risky_items.to_string().red()
    );
    let _ = writeln!(out, "   Total estimated effort: {} hours", summary.total_effort_hours);
    out
}

fn status_color(status: BatchStatus) -> Color {
    match status {
        BatchStatus::Passed => Color::Green,
        BatchStatus::Failed => Color::Red,
        BatchStatus::RolledBack => Color::Yellow,
        BatchStatus::Pending => Color::Grey,
    }
}

/// Per-batch table followed by the run totals.
pub fn execution_summary(report: &ExecutionReport, plain: bool) -> String {
    let mut table = Table::new();
    table
        .load_preset(if plain { presets::ASCII_FULL } else { presets::UTF8_FULL })
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Batch", "Phase", "Status", "Passed", "Failed", "Skipped", "Rolled back"]);

    for batch in &report.batches {
        let status = Cell::new(batch.status.as_str());
        let status = if plain {
            status
        } else {
            status.fg(status_color(batch.status))
        };
        table.add_row(vec![
            Cell::new(&batch.batch_id),
            Cell::new(batch.phase),
            status,
            Cell::new(batch.successful_items),
            Cell::new(batch.failed_items),
            Cell::new(batch.skipped_items),
            Cell::new(batch.rolled_back_items),
        ]);
    }

    let summary = &report.summary;
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Phase 3 Summary:".bold());
    let _ = writeln!(out, "{table}");
    let _ = writeln!(out, "   Batches executed: {}", summary.total_batches);
    let _ = writeln!(out, "   Successful steps: {}", summary.successful_steps);
    let _ = writeln!(out, "   Failed steps: {}", summary.failed_steps);
    if report.halted {
        let _ = writeln!(out, "   {}", "Run halted after a failed batch".red());
    }
    if let Some(branch) = &report.backup_branch {
        let _ = writeln!(out, "   Backup branch: {}", branch.cyan());
    }
    if let Some(unchanged) = report.repository_unchanged() {
        let verdict = if unchanged {
            "repository unchanged".green()
        } else {
            "repository CHANGED during dry run".red().bold()
        };
        let _ = writeln!(out, "   Dry run: {verdict}");
    }
    out
}
