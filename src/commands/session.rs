//! Per-invocation state shared by every subcommand: the resolved root,
//! the effective configuration and the run directory.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::config::{load_config, DecruftConfig};
use crate::errors::DecruftError;
use crate::process::SystemRunner;
use crate::report::RunDirectory;

/// Default parent of run directories, relative to the repository root.
pub const OUTPUT_ROOT: &str = "legacy-removal-output";

pub fn session_id(now: DateTime<Local>) -> String {
    format!("legacy-removal-{}", now.format("%Y%m%d-%H%M%S"))
}

/// Canonical repository root; missing or non-directory roots are fatal.
pub fn resolve_root(path: &Path) -> crate::errors::Result<PathBuf> {
    let root = path
        .canonicalize()
        .map_err(|e| DecruftError::repository_root(path, e.to_string()))?;
    if !root.is_dir() {
        return Err(DecruftError::repository_root(path, "not a directory"));
    }
    Ok(root)
}

pub struct Session {
    pub id: String,
    pub root: PathBuf,
    pub config: DecruftConfig,
    pub output: RunDirectory,
    pub plain: bool,
    pub runner: SystemRunner,
}

impl Session {
    pub fn open(
        path: &Path,
        config_path: Option<&Path>,
        output_dir: Option<&Path>,
        plain: bool,
    ) -> Result<Self> {
        let root = resolve_root(path)?;
        let config = load_config(&root, config_path)?;
        let id = session_id(Local::now());
        let output_path = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => root.join(OUTPUT_ROOT).join(&id),
        };
        let output = RunDirectory::create(&output_path)
            .with_context(|| format!("Failed to create output directory {}", output_path.display()))?;

        tracing::info!(session = %id, root = %root.display(), "session started");
        Ok(Self {
            id,
            root,
            config,
            output,
            plain,
            runner: SystemRunner,
        })
    }

    /// The run directory relative to the root, when it lies inside it.
    ///
    /// Scanners exclude it so a run never inventories its own reports.
    pub fn excluded_output(&self) -> Vec<String> {
        self.output
            .path()
            .canonicalize()
            .ok()
            .and_then(|p| pathdiff::diff_paths(p, &self.root))
            .filter(|rel| {
                !rel.as_os_str().is_empty()
                    && !matches!(rel.components().next(), Some(std::path::Component::ParentDir))
            })
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .into_iter()
            .collect()
    }
}
