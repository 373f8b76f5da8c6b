//! Configuration for decruft, loaded from `.decruft.yml`.

mod core;
mod detection;
mod execution;
mod loader;
pub mod retry;
mod thresholds;

pub use self::core::{DecruftConfig, GitConfig, SafetyConfig};
pub use detection::DetectionConfig;
pub use execution::{ExecutionConfig, ExecutionMode, LinkedToolConfig, ValidationConfig};
pub use loader::{
    directory_ancestors, discover_config, load_config, parse_and_validate_config,
    CONFIG_FILE_NAME,
};
pub use retry::{RetryConfig, RetryStrategy};
pub use thresholds::{AssessmentConfig, RiskThresholds};
