//! Crash reports for panics during a removal run.
//!
//! A panic halfway through execution can leave the working tree between
//! steps, so the report names the phase and item that were in flight and
//! points at the backup branch for recovery.

use super::context::{get_current_context, get_progress, PipelineContext};
use std::panic::PanicHookInfo;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const WIDTH: usize = 72;

/// Replace the default panic output with a decruft crash report.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = extract_panic_message(info);
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        eprintln!();
        eprint!(
            "{}",
            format_crash_report(&message, location.as_deref(), &get_current_context(), get_progress())
        );
        if std::env::var("RUST_BACKTRACE").is_ok() {
            eprintln!("{}", std::backtrace::Backtrace::capture());
        }
    }));
}

/// Render the crash report box.
pub fn format_crash_report(
    message: &str,
    location: Option<&str>,
    context: &PipelineContext,
    (processed, total): (usize, usize),
) -> String {
    let rule = "=".repeat(WIDTH);
    let mut lines = vec![
        rule.clone(),
        line(&format!("DECRUFT CRASH REPORT  v{VERSION}")),
        line(&format!(
            "Time: {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        )),
        rule.clone(),
        line(&format!("Panic: {message}")),
    ];
    if let Some(location) = location {
        lines.push(line(&format!("Location: {location}")));
    }

    lines.push(rule.clone());
    match &context.phase {
        Some(phase) => lines.push(line(&format!("Phase: {phase}"))),
        None => lines.push(line("Phase: (pipeline not started)")),
    }
    if let Some(item) = &context.current_item {
        lines.push(line(&format!("Item: {item}")));
    }
    if total > 0 {
        lines.push(line(&format!("Progress: {processed} / {total} items")));
    }
    lines.push(rule.clone());
    lines.push(line(
        "The working tree may be mid-step. Inspect `git status` and",
    ));
    lines.push(line("restore from the legacy-removal-backup-* branch if needed."));
    if std::env::var("RUST_BACKTRACE").is_err() {
        lines.push(line("Run with RUST_BACKTRACE=1 for a stack trace."));
    }
    lines.push(rule);

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn line(text: &str) -> String {
    format!("| {:<width$} |", truncate(text, WIDTH - 4), width = WIDTH - 4)
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::PipelinePhase;

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let result = truncate("répertoire-légué-très-ancien", 10);
        assert_eq!(result.chars().count(), 10);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_report_names_phase_and_item() {
        let context = PipelineContext {
            phase: Some(PipelinePhase::Execution),
            current_item: Some("step-003".to_string()),
        };
        let report = format_crash_report("boom", Some("src/x.rs:1:1"), &context, (2, 5));
        assert!(report.contains("Phase: execution"));
        assert!(report.contains("Item: step-003"));
        assert!(report.contains("Progress: 2 / 5 items"));
        assert!(report.contains("legacy-removal-backup-"));
    }

    #[test]
    fn test_report_lines_have_fixed_width() {
        let report = format_crash_report(&"x".repeat(200), None, &PipelineContext::new(), (0, 0));
        for line in report.lines() {
            assert_eq!(line.chars().count(), WIDTH);
        }
    }
}
