use serde::{Deserialize, Serialize};

use super::detection::DetectionConfig;
use super::execution::{ExecutionConfig, LinkedToolConfig, ValidationConfig};
use super::thresholds::{AssessmentConfig, RiskThresholds};

/// Root configuration structure for decruft.
///
/// Every section is optional in the YAML file; missing sections and keys
/// fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DecruftConfig {
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub risk_thresholds: RiskThresholds,

    #[serde(default)]
    pub assessment: AssessmentConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub linked_tools: LinkedToolConfig,

    #[serde(default)]
    pub safety: SafetyConfig,
}

impl DecruftConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.risk_thresholds.validate()?;
        for pattern in &self.detection.safe_folder_patterns {
            regex::Regex::new(pattern)
                .map_err(|e| format!("invalid safe_folder_patterns entry '{pattern}': {e}"))?;
        }
        Ok(())
    }
}

/// Version-control behaviour during execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    /// Commit after every step that changed the tree
    #[serde(default = "default_true")]
    pub auto_commit: bool,

    #[serde(default = "default_commit_prefix")]
    pub commit_prefix: String,

    /// Create a `legacy-removal-backup-<timestamp>` branch before mutating
    #[serde(default = "default_true")]
    pub create_backup_branch: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            auto_commit: true,
            commit_prefix: default_commit_prefix(),
            create_backup_branch: true,
        }
    }
}

impl GitConfig {
    /// Whether a mutating run depends on a git work tree.
    pub fn requires_repository(&self) -> bool {
        self.auto_commit || self.create_backup_branch
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Ask before a mutating run starts
    #[serde(default = "default_true")]
    pub require_confirmation: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            require_confirmation: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_commit_prefix() -> String {
    "[legacy-removal]".to_string()
}
