//! Run artifacts: CSV inventories and plans, JSON reports, the directory
//! tree and the Markdown summary.
//!
//! Every writer takes the destination path explicitly; the run directory
//! layout lives in [`RunDirectory`].

pub mod assessment;
pub mod console;
pub mod inventory;
pub mod plan;
pub mod session;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{DecruftError, Result};

pub use assessment::{write_assessment_report, AssessmentReport};
pub use inventory::{
    read_inventory_csv, write_directory_tree, write_inventory_csv, write_summary_json,
    DetectionSummary,
};
pub use plan::{read_plan_csv, write_plan_csv};
pub use session::{render_markdown_summary, write_final_report, FinalReport, SessionStatus};

pub const INVENTORY_CSV: &str = "legacy-inventory.csv";
pub const DIRECTORY_TREE: &str = "legacy-directories.tree";
pub const DETECTION_SUMMARY_JSON: &str = "legacy-summary.json";
pub const ASSESSMENT_REPORT_JSON: &str = "impact-assessment-report.json";
pub const REMOVAL_PLAN_CSV: &str = "removal-plan.csv";
pub const EXECUTION_REPORT_JSON: &str = "execution-report.json";
pub const FINAL_REPORT_JSON: &str = "final-report.json";
pub const SUMMARY_MARKDOWN: &str = "legacy-removal-summary.md";

/// Directory that receives one run's artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    path: PathBuf,
}

impl RunDirectory {
    /// Create `path` and any missing parents.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path).map_err(|e| DecruftError::file_system(&path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

/// Pretty-printed JSON with a trailing newline.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    write_text(path, &json)
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| DecruftError::file_system(path, e))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_directory_creates_parents() {
        let temp = TempDir::new().unwrap();
        let dir = RunDirectory::create(temp.path().join("out/session-1")).unwrap();
        assert!(dir.path().is_dir());
        assert_eq!(dir.file(INVENTORY_CSV), temp.path().join("out/session-1/legacy-inventory.csv"));
    }

    #[test]
    fn test_write_json_is_pretty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x.json");
        write_json(&path, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "{\n  \"a\": 1\n}\n");
    }
}
