use super::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How the executor treats a removal plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Describe every step, execute nothing.
    #[default]
    DryRun,
    /// Only `remove_immediately` steps run; everything else is skipped.
    SafeOnly,
    /// Every step runs; the first failure halts the batch and the run.
    BatchExecution,
    /// Like batch execution, with an operator confirming each step.
    ManualReview,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::DryRun => "dry_run",
            ExecutionMode::SafeOnly => "safe_only",
            ExecutionMode::BatchExecution => "batch_execution",
            ExecutionMode::ManualReview => "manual_review",
        }
    }

    /// Modes that change the working tree.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, ExecutionMode::DryRun)
    }

    /// Modes where one failed step halts the batch and the run.
    pub fn is_fail_stop(&self) -> bool {
        matches!(
            self,
            ExecutionMode::BatchExecution | ExecutionMode::ManualReview
        )
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "dry_run" => Ok(ExecutionMode::DryRun),
            "safe_only" => Ok(ExecutionMode::SafeOnly),
            "batch_execution" => Ok(ExecutionMode::BatchExecution),
            "manual_review" => Ok(ExecutionMode::ManualReview),
            other => Err(format!("unknown execution mode: {other}")),
        }
    }
}

/// Planner and executor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub default_mode: ExecutionMode,

    /// Maximum steps per batch; zero is treated as one
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_true")]
    pub validate_after_batch: bool,

    #[serde(default = "default_true")]
    pub rollback_on_failure: bool,

    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,

    /// Repository-relative directory that CAUTION archives move into
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_mode: ExecutionMode::default(),
            batch_size: default_batch_size(),
            validate_after_batch: true,
            rollback_on_failure: true,
            command_timeout_seconds: default_command_timeout(),
            archive_dir: default_archive_dir(),
        }
    }
}

impl ExecutionConfig {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

/// Commands that prove the project still works after a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_test_commands")]
    pub test_commands: Vec<String>,

    #[serde(default = "default_build_commands")]
    pub build_commands: Vec<String>,

    /// Timeout in seconds applied to each validation command
    #[serde(default = "default_command_timeout")]
    pub max_validation_time: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            test_commands: default_test_commands(),
            build_commands: default_build_commands(),
            max_validation_time: default_command_timeout(),
        }
    }
}

/// Linked tools: opaque collaborators named by each plan step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedToolConfig {
    #[serde(default = "default_linked_tool_timeout")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Tool key to external identifier
    #[serde(default = "default_mappings")]
    pub mappings: BTreeMap<String, String>,

    /// Tool key to shell template with `{path}` and `{name}` placeholders
    #[serde(default)]
    pub commands: BTreeMap<String, String>,
}

impl Default for LinkedToolConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_linked_tool_timeout(),
            retry: RetryConfig::default(),
            mappings: default_mappings(),
            commands: BTreeMap::new(),
        }
    }
}

impl LinkedToolConfig {
    /// External identifier for a tool key, falling back to the key itself.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.mappings.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Shell template for a tool, looked up by identifier or by key.
    pub fn command_for(&self, tool: &str) -> Option<&str> {
        if let Some(template) = self.commands.get(tool) {
            return Some(template);
        }
        self.mappings
            .iter()
            .find(|(_, identifier)| identifier.as_str() == tool)
            .and_then(|(key, _)| self.commands.get(key))
            .map(String::as_str)
    }
}

fn default_true() -> bool {
    true
}
fn default_batch_size() -> usize {
    5
}
fn default_command_timeout() -> u64 {
    300
}
fn default_linked_tool_timeout() -> u64 {
    60
}
fn default_archive_dir() -> String {
    "legacy-archive".to_string()
}
fn default_test_commands() -> Vec<String> {
    vec!["npm test".to_string()]
}
fn default_build_commands() -> Vec<String> {
    vec!["npm run build".to_string()]
}

fn default_mappings() -> BTreeMap<String, String> {
    [
        ("library_removal", "/skill-remove-library"),
        ("folder_removal", "/skill-code-folder-remove"),
        ("config_cleanup", "/skill-config-cleanup"),
        ("code_review", "/skill-request-code-review"),
        ("migration_assist", "/skill-migration-assist"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing_accepts_dashes() {
        assert_eq!(
            "batch-execution".parse::<ExecutionMode>(),
            Ok(ExecutionMode::BatchExecution)
        );
        assert!("yolo".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn test_fail_stop_modes() {
        assert!(ExecutionMode::BatchExecution.is_fail_stop());
        assert!(ExecutionMode::ManualReview.is_fail_stop());
        assert!(!ExecutionMode::SafeOnly.is_fail_stop());
        assert!(!ExecutionMode::DryRun.is_mutating());
    }

    #[test]
    fn test_zero_batch_size_is_one() {
        let config = ExecutionConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_batch_size(), 1);
    }

    #[test]
    fn test_linked_tool_resolution() {
        let config = LinkedToolConfig::default();
        assert_eq!(config.resolve("library_removal"), "/skill-remove-library");
        assert_eq!(config.resolve("custom"), "custom");
    }

    #[test]
    fn test_command_template_by_identifier_or_key() {
        let mut config = LinkedToolConfig::default();
        config
            .commands
            .insert("library_removal".into(), "echo {name}".into());
        assert_eq!(config.command_for("/skill-remove-library"), Some("echo {name}"));
        assert_eq!(config.command_for("library_removal"), Some("echo {name}"));
        assert_eq!(config.command_for("/skill-config-cleanup"), None);
    }
}
