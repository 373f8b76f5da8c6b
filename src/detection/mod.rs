//! Phase 1: find legacy artifacts in a repository.
//!
//! The detector reads dependency manifests, walks the tree for stale or
//! legacy-named directories and files, and checks for obsolete build-tool
//! configs. Each finding becomes a [`LegacyItem`] with a risk score in
//! `[0, 1]`.

pub mod catalog;
mod detector;
pub mod manifests;
pub mod scoring;
pub mod usage;

pub use detector::{detect, Detector};
pub use manifests::Ecosystem;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of legacy artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Library,
    Directory,
    File,
    Config,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Library => "library",
            ItemType::Directory => "directory",
            ItemType::File => "file",
            ItemType::Config => "config",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "library" => Ok(ItemType::Library),
            "directory" => Ok(ItemType::Directory),
            "file" => Ok(ItemType::File),
            "config" => Ok(ItemType::Config),
            other => Err(format!("unknown item type: {other}")),
        }
    }
}

/// One legacy artifact found by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyItem {
    pub item_type: ItemType,
    /// Repository-relative path; libraries use `<manifest>:<name>`
    pub path: String,
    pub name: String,
    pub risk_score: f64,
    pub size_kb: f64,
    /// `YYYY-MM-DD`, `None` when unknown
    #[serde(default)]
    pub last_reference_date: Option<String>,
    #[serde(default)]
    pub last_updated_date: Option<String>,
    pub suggested_action: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub legacy_reasons: Vec<String>,
}

impl LegacyItem {
    pub fn is_deprecated(&self) -> bool {
        self.legacy_reasons
            .iter()
            .any(|r| r.starts_with("Deprecated:") || r.starts_with("Legacy framework:"))
    }

    /// Manifest ecosystem for library items.
    pub fn ecosystem(&self) -> Option<Ecosystem> {
        match self.item_type {
            ItemType::Library => Ecosystem::from_item_path(&self.path),
            _ => None,
        }
    }
}

/// Subset of scanners to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusArea {
    Dependencies,
    Dirs,
    Files,
    Configs,
}

impl FocusArea {
    pub const ALL: [FocusArea; 4] = [
        FocusArea::Dependencies,
        FocusArea::Dirs,
        FocusArea::Files,
        FocusArea::Configs,
    ];
}

impl FromStr for FocusArea {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dependencies" | "deps" => Ok(FocusArea::Dependencies),
            "dirs" | "directories" => Ok(FocusArea::Dirs),
            "files" => Ok(FocusArea::Files),
            "configs" | "config" => Ok(FocusArea::Configs),
            other => Err(format!(
                "unknown focus area '{other}' (expected dependencies, dirs, files or configs)"
            )),
        }
    }
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FocusArea::Dependencies => "dependencies",
            FocusArea::Dirs => "dirs",
            FocusArea::Files => "files",
            FocusArea::Configs => "configs",
        };
        f.write_str(name)
    }
}
