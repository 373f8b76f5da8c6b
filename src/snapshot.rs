//! Repository fingerprints used to prove a dry run changed nothing.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::io::RepoWalker;
use crate::process::CommandRunner;
use crate::vcs::Git;

/// SHA-256 over the path and content of every tracked file, plus `HEAD`.
///
/// Outside a git work tree every non-excluded file counts as tracked.
pub fn fingerprint(root: &Path, runner: &dyn CommandRunner, excluded: &[String]) -> String {
    let git = Git::new(runner, root);
    let mut hasher = Sha256::new();

    let mut files: Vec<PathBuf> = match git.is_work_tree().then(|| git.tracked_files()) {
        Some(Ok(files)) => {
            if let Ok(head) = git.head() {
                hasher.update(b"HEAD ");
                hasher.update(head.as_bytes());
                hasher.update([0u8]);
            }
            files
        }
        Some(Err(e)) => {
            log::warn!("Falling back to a directory walk for fingerprinting: {}", e);
            walked_files(root, excluded)
        }
        None => walked_files(root, excluded),
    };
    files.sort();

    for rel in &files {
        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        match std::fs::read(root.join(rel)) {
            Ok(bytes) => hasher.update(&bytes),
            Err(_) => hasher.update(b"<missing>"),
        }
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

fn walked_files(root: &Path, excluded: &[String]) -> Vec<PathBuf> {
    RepoWalker::new(root)
        .with_excluded(excluded)
        .files()
        .into_iter()
        .filter_map(|p| p.strip_prefix(root).ok().map(Path::to_path_buf))
        .collect()
}
