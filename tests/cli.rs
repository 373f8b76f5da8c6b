//! End-to-end tests of the `decruft` binary.

mod common;

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn decruft(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_decruft"))
        .args(args)
        .env("DECRUFT_PLAIN", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run decruft")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn seed(root: &Path) {
    common::write(root, "package.json", r#"{"dependencies":{"moment":"^2.29.0"}}"#);
    common::write(root, "src/app.js", "export default 1;\n");
    common::write(root, "Gruntfile.js", "module.exports = function () {};\n");
}

#[test]
fn test_init_writes_config_and_refuses_to_overwrite() {
    let temp = TempDir::new().unwrap();
    let dir = path_str(temp.path());

    let first = decruft(&["init", dir]);
    assert!(first.status.success(), "{}", String::from_utf8_lossy(&first.stderr));
    let written = std::fs::read_to_string(temp.path().join(".decruft.yml")).unwrap();
    assert!(written.contains("risk_thresholds:"));

    let second = decruft(&["init", dir]);
    assert!(!second.status.success());

    let forced = decruft(&["init", dir, "--force"]);
    assert!(forced.status.success());
}

#[test]
fn test_run_assessment_only_writes_reports() {
    let repo = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    seed(repo.path());

    let output = decruft(&[
        "run",
        path_str(repo.path()),
        "--mode",
        "assessment_only",
        "--output-dir",
        path_str(out.path()),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    for name in [
        "legacy-inventory.csv",
        "legacy-directories.tree",
        "legacy-summary.json",
        "impact-assessment-report.json",
        "removal-plan.csv",
        "legacy-removal-summary.md",
        "final-report.json",
    ] {
        assert!(out.path().join(name).is_file(), "{name} was not written");
    }
    assert!(!out.path().join("execution-report.json").exists());

    let inventory = std::fs::read_to_string(out.path().join("legacy-inventory.csv")).unwrap();
    assert!(inventory.starts_with("Type,Path,Name,"));
    assert!(inventory.contains("package.json:moment"));

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out.path().join("final-report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["status"], "completed");
    assert_eq!(
        report["phases_completed"],
        serde_json::json!(["detection", "assessment", "documentation"])
    );

    // Nothing in the repository was touched.
    assert!(repo.path().join("Gruntfile.js").exists());
}

#[test]
fn test_execute_dry_run_from_saved_plan() {
    let repo = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    seed(repo.path());

    let assess = decruft(&[
        "assess",
        path_str(repo.path()),
        "--output-dir",
        path_str(out.path()),
    ]);
    assert!(assess.status.success(), "{}", String::from_utf8_lossy(&assess.stderr));

    let plan = out.path().join("removal-plan.csv");
    let execute = decruft(&[
        "execute",
        path_str(repo.path()),
        "--plan",
        path_str(&plan),
        "--mode",
        "dry_run",
        "--output-dir",
        path_str(out.path()),
    ]);
    assert!(execute.status.success(), "{}", String::from_utf8_lossy(&execute.stderr));

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out.path().join("execution-report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["mode"], "dry_run");
    assert_eq!(report["fingerprint_before"], report["fingerprint_after"]);
    assert_eq!(report["summary"]["failed_steps"], 0);
}

#[test]
fn test_manual_review_without_terminal_declines() {
    let repo = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    seed(repo.path());

    let assess = decruft(&["assess", path_str(repo.path()), "--output-dir", path_str(out.path())]);
    assert!(assess.status.success(), "{}", String::from_utf8_lossy(&assess.stderr));

    let plan = out.path().join("removal-plan.csv");
    let execute = decruft(&[
        "execute",
        path_str(repo.path()),
        "--plan",
        path_str(&plan),
        "--mode",
        "manual_review",
        "--output-dir",
        path_str(out.path()),
    ]);
    assert!(execute.status.success(), "{}", String::from_utf8_lossy(&execute.stderr));
    assert!(String::from_utf8_lossy(&execute.stdout).contains("Execution cancelled by operator"));
    assert!(!out.path().join("execution-report.json").exists());
    assert!(repo.path().join("Gruntfile.js").exists());
}

#[test]
fn test_missing_root_fails() {
    let output = decruft(&["detect", "/no/such/repository/anywhere"]);
    assert!(!output.status.success());
}
