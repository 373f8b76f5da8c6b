// Shared fixtures for decruft integration tests
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::Command;

use decruft::config::DecruftConfig;

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn git_available() -> bool {
    decruft::vcs::git_installed()
}

/// Run git in `root`, panicking on failure, and return trimmed stdout.
pub fn git(root: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialise a throwaway repository with a local identity.
pub fn init_repo(root: &Path) {
    git(root, &["init", "-q"]);
    git(root, &["config", "user.name", "Decruft Test"]);
    git(root, &["config", "user.email", "decruft@example.com"]);
    git(root, &["config", "commit.gpgsign", "false"]);
}

pub fn commit_all(root: &Path, message: &str) {
    git(root, &["add", "-A"]);
    git(root, &["commit", "-q", "-m", message]);
}

/// Defaults with validation and linked-tool retries that finish instantly.
pub fn quiet_config() -> DecruftConfig {
    let mut config = DecruftConfig::default();
    config.validation.test_commands = vec!["true".to_string()];
    config.validation.build_commands = vec!["true".to_string()];
    config.linked_tools.retry.base_delay_ms = 0;
    config.safety.require_confirmation = false;
    config
}
