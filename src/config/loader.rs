use std::fs;
use std::path::{Path, PathBuf};

use super::core::DecruftConfig;
use crate::errors::{DecruftError, Result};

/// File name searched for in the repository root and its ancestors.
pub const CONFIG_FILE_NAME: &str = ".decruft.yml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse a YAML document and validate the resulting configuration.
///
/// An empty document yields the defaults.
pub fn parse_and_validate_config(contents: &str) -> std::result::Result<DecruftConfig, String> {
    let config = if contents.trim().is_empty() {
        DecruftConfig::default()
    } else {
        serde_yaml::from_str::<DecruftConfig>(contents)
            .map_err(|e| format!("Failed to parse {CONFIG_FILE_NAME}: {e}"))?
    };
    Ok(config)
}

/// Directory ancestors of `start`, nearest first, at most `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Locate the nearest `.decruft.yml` walking up from `root`.
pub fn discover_config(root: &Path) -> Option<PathBuf> {
    directory_ancestors(root.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Load the configuration for a run.
///
/// An explicit file must exist and parse. A discovered file that fails to
/// parse is reported and replaced by defaults. Threshold violations are
/// rejected in both cases.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<DecruftConfig> {
    let config = match explicit {
        Some(path) => {
            let contents = fs::read_to_string(path).map_err(|e| {
                DecruftError::config_at(format!("cannot read {}: {e}", path.display()), path)
            })?;
            let config = parse_and_validate_config(&contents)
                .map_err(|message| DecruftError::config_at(message, path))?;
            log::debug!("Loaded config from {}", path.display());
            (config, Some(path.to_path_buf()))
        }
        None => match discover_config(root) {
            Some(path) => (try_load_discovered(&path), Some(path)),
            None => {
                log::debug!(
                    "No {} found within {} directories, using defaults",
                    CONFIG_FILE_NAME,
                    MAX_TRAVERSAL_DEPTH
                );
                (DecruftConfig::default(), None)
            }
        },
    };

    let (config, source) = config;
    config.validate().map_err(|message| match source {
        Some(path) => DecruftError::config_at(message, path),
        None => DecruftError::config(message),
    })?;
    Ok(config)
}

fn try_load_discovered(path: &Path) -> DecruftConfig {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("Failed to read config file {}: {}", path.display(), e);
            return DecruftConfig::default();
        }
    };
    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            DecruftConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionMode;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_partial_yaml_merges_over_defaults() {
        let config = parse_and_validate_config(indoc! {"
            execution:
              batch_size: 2
              default_mode: safe_only
            git:
              auto_commit: false
        "})
        .unwrap();
        assert_eq!(config.execution.batch_size, 2);
        assert_eq!(config.execution.default_mode, ExecutionMode::SafeOnly);
        assert!(config.execution.rollback_on_failure);
        assert!(!config.git.auto_commit);
        assert_eq!(config.git.commit_prefix, "[legacy-removal]");
        assert_eq!(config.risk_thresholds.safe_removal, 0.2);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(
            parse_and_validate_config("  \n").unwrap(),
            DecruftConfig::default()
        );
    }

    #[test]
    fn test_directory_ancestors_respects_depth() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c/d"), 2).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a/b/c/d"), PathBuf::from("/a/b/c")]);
    }

    #[test]
    fn test_discovers_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("project");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "execution:\n  batch_size: 9\n",
        )
        .unwrap();

        let config = load_config(&nested, None).unwrap();
        assert_eq!(config.execution.batch_size, 9);
    }

    #[test]
    fn test_invalid_discovered_yaml_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "execution: [unclosed").unwrap();
        let config = load_config(temp.path(), None).unwrap();
        assert_eq!(config, DecruftConfig::default());
    }

    #[test]
    fn test_invalid_explicit_yaml_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.yml");
        fs::write(&path, "execution: [unclosed").unwrap();
        let err = load_config(temp.path(), Some(&path)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "risk_thresholds:\n  safe_removal: 0.9\n  caution_zone: 0.1\n",
        )
        .unwrap();
        let err = load_config(temp.path(), None).unwrap_err();
        assert!(matches!(err, DecruftError::Config { .. }));
    }
}
