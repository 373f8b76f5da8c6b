use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::CONFIG_FILE_NAME;

pub const DEFAULT_CONFIG: &str = r#"# decruft configuration
#
# Every section and key is optional; anything left out keeps the value shown.

detection:
  # Years without a commit before a directory or file counts as untouched
  min_years_untouched: 2
  # Items at or below this risk are not reported (deprecated libraries always are)
  min_risk_score: 0.3
  safe_folder_patterns: ['^src/legacy/', '^old/', '^bak/', '^deprecated/', '^v[0-9]+/']
  protected_packages: [core-js, typescript, react, vue, angular]
  excluded_paths: [node_modules, .git, dist, build, coverage, legacy-removal-output]
  scan_file_types: [.js, .ts, .jsx, .tsx, .py, .java, .go, .rs, .php, .rb]

risk_thresholds:
  # SAFE requires risk <= safe_removal and no dependents
  safe_removal: 0.2
  caution_zone: 0.6

assessment:
  # Depth bound for indirect dependencies
  max_depth: 3

execution:
  # dry_run | safe_only | batch_execution | manual_review
  default_mode: dry_run
  batch_size: 5
  validate_after_batch: true
  rollback_on_failure: true
  command_timeout_seconds: 300
  archive_dir: legacy-archive

validation:
  test_commands: [npm test]
  build_commands: [npm run build]
  max_validation_time: 300

git:
  auto_commit: true
  commit_prefix: '[legacy-removal]'
  create_backup_branch: true

linked_tools:
  timeout_seconds: 60
  retry:
    enabled: true
    max_retries: 3
    base_delay_ms: 100
    strategy: exponential
  mappings:
    library_removal: /skill-remove-library
    folder_removal: /skill-code-folder-remove
    config_cleanup: /skill-config-cleanup
    code_review: /skill-request-code-review
    migration_assist: /skill-migration-assist
  # Shell templates per tool key; {path} and {name} are substituted, quoted
  commands: {}

safety:
  # Ask before a mutating run starts
  require_confirmation: true
"#;

/// Write a commented default `.decruft.yml` into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {} configuration file", config_path.display());

    Ok(())
}
