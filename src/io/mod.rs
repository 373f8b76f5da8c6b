pub mod walker;

pub use walker::{directory_stats, RepoWalker};

use std::path::Path;

/// Read a file as text, replacing invalid UTF-8.
///
/// Unreadable files are logged and yield `None`; callers skip them.
pub fn read_text(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            log::warn!("Skipping unreadable file {}: {}", path.display(), e);
            None
        }
    }
}

/// Repository-relative form of `path` using `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
