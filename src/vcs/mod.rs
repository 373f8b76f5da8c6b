//! Git operations and history queries.
//!
//! Git is driven through the shared [`CommandRunner`] rather than a
//! library binding, so the same timeout and capture rules apply to it as
//! to every other subprocess.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{DecruftError, Result};
use crate::process::{CommandOutput, CommandRunner};

const GIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Whether a `git` executable is on `PATH`.
pub fn git_installed() -> bool {
    which::which("git").is_ok()
}

/// Thin wrapper over the `git` binary for one repository.
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    root: PathBuf,
}

impl<'a> Git<'a> {
    pub fn new(runner: &'a dyn CommandRunner, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn git(&self, args: &[&str]) -> Result<CommandOutput> {
        self.runner
            .run("git", args, &self.root, Some(GIT_TIMEOUT))
            .map_err(|e| DecruftError::Vcs(format!("failed to run git {}: {e}", args.join(" "))))
    }

    fn git_ok(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.git(args)?;
        if output.success() {
            Ok(output)
        } else {
            Err(DecruftError::Vcs(format!(
                "git {} failed: {}",
                args.join(" "),
                output.failure_message()
            )))
        }
    }

    /// Whether the root lies inside a git work tree.
    pub fn is_work_tree(&self) -> bool {
        self.git(&["rev-parse", "--is-inside-work-tree"])
            .map(|out| out.success() && out.stdout.trim() == "true")
            .unwrap_or(false)
    }

    /// Commit time of the newest commit touching `path`.
    pub fn last_commit_date(&self, path: &Path) -> Option<DateTime<Utc>> {
        let path = path.to_string_lossy();
        let output = self
            .git(&["log", "-1", "--format=%cI", "--", path.as_ref()])
            .ok()?;
        parse_commit_date(&output)
    }

    /// Commit time of the newest commit whose patch adds or removes `needle`.
    pub fn last_mention_date(&self, needle: &str) -> Option<DateTime<Utc>> {
        let pickaxe = format!("-S{needle}");
        let output = self
            .git(&["log", "-1", "--format=%cI", pickaxe.as_str()])
            .ok()?;
        parse_commit_date(&output)
    }

    /// Create `name` pointing at the current HEAD without switching to it.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        self.git_ok(&["branch", name]).map(|_| ())
    }

    /// Whether the work tree or index has uncommitted changes.
    pub fn is_dirty(&self) -> Result<bool> {
        let output = self.git_ok(&["status", "--porcelain"])?;
        Ok(!output.stdout.trim().is_empty())
    }

    /// Stage everything and commit; returns the new HEAD hash.
    pub fn commit_all(&self, message: &str) -> Result<String> {
        self.git_ok(&["add", "-A"])?;
        self.git_ok(&["commit", "-m", message])?;
        self.head()
    }

    pub fn head(&self) -> Result<String> {
        let output = self.git_ok(&["rev-parse", "HEAD"])?;
        Ok(output.stdout.trim().to_string())
    }

    /// Revert a single commit with the default message.
    ///
    /// A revert that stops on a conflict is aborted, so the repository is
    /// never left mid-revert.
    pub fn revert(&self, hash: &str) -> Result<()> {
        let err = match self.git_ok(&["revert", "--no-edit", hash]) {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };
        if let Err(abort) = self.git_ok(&["revert", "--abort"]) {
            log::debug!("git revert --abort: {}", abort);
        }
        Err(err)
    }

    /// Move uncommitted changes, untracked files included, onto the stash.
    pub fn stash_all(&self, message: &str) -> Result<()> {
        self.git_ok(&["stash", "push", "--include-untracked", "-m", message])
            .map(|_| ())
    }

    /// Repository-relative paths of all tracked files.
    pub fn tracked_files(&self) -> Result<Vec<PathBuf>> {
        let output = self.git_ok(&["ls-files"])?;
        Ok(output
            .stdout
            .lines()
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}

fn parse_commit_date(output: &CommandOutput) -> Option<DateTime<Utc>> {
    if !output.success() {
        return None;
    }
    let line = output.stdout.lines().next()?.trim();
    DateTime::parse_from_rfc3339(line)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Source of "when was this last touched" answers for the detector.
pub trait HistoryProvider {
    /// Newest commit touching the repository-relative `path`.
    fn last_modified(&self, path: &Path) -> Option<DateTime<Utc>>;

    /// Newest commit whose patch mentions `needle`.
    fn last_mentioned(&self, needle: &str) -> Option<DateTime<Utc>>;
}

/// History backed by `git log`.
pub struct GitHistory<'a> {
    git: Git<'a>,
}

impl<'a> GitHistory<'a> {
    pub fn new(git: Git<'a>) -> Self {
        Self { git }
    }
}

impl HistoryProvider for GitHistory<'_> {
    fn last_modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.git.last_commit_date(path)
    }

    fn last_mentioned(&self, needle: &str) -> Option<DateTime<Utc>> {
        self.git.last_mention_date(needle)
    }
}

/// History for directories that are not under version control.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl HistoryProvider for NoHistory {
    fn last_modified(&self, _path: &Path) -> Option<DateTime<Utc>> {
        None
    }

    fn last_mentioned(&self, _needle: &str) -> Option<DateTime<Utc>> {
        None
    }
}

/// Fixed answers, keyed by path or needle.
#[derive(Debug, Default, Clone)]
pub struct StaticHistory {
    pub modified: HashMap<PathBuf, DateTime<Utc>>,
    pub mentioned: HashMap<String, DateTime<Utc>>,
}

impl StaticHistory {
    pub fn with_modified(mut self, path: impl Into<PathBuf>, at: DateTime<Utc>) -> Self {
        self.modified.insert(path.into(), at);
        self
    }

    pub fn with_mentioned(mut self, needle: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.mentioned.insert(needle.into(), at);
        self
    }
}

impl HistoryProvider for StaticHistory {
    fn last_modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.modified.get(path).copied()
    }

    fn last_mentioned(&self, needle: &str) -> Option<DateTime<Utc>> {
        self.mentioned.get(needle).copied()
    }
}
