//! Filename-convention test coverage heuristic.
//!
//! This is not instrumentation. A source file counts as covered when a test
//! file sits where the usual naming conventions would put it.

use std::path::{Path, PathBuf};

use crate::detection::{ItemType, LegacyItem};
use crate::io::{read_text, RepoWalker};

const SOURCE_EXTENSIONS: &[&str] = &["js", "ts", "py", "java"];
const TEST_FILE_EXTENSIONS: &[&str] = &["js", "ts", "py"];

/// Coverage percentage in `[0, 100]` for `item`.
pub fn test_coverage(root: &Path, item: &LegacyItem, excluded: &[String]) -> f64 {
    match item.item_type {
        ItemType::Directory => directory_coverage(root, &root.join(&item.path)),
        ItemType::File => file_coverage(root, &root.join(&item.path)),
        ItemType::Library => library_coverage(root, &item.name, excluded),
        ItemType::Config => 0.0,
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.contains(&e))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `test_<name>` and `<stem>_test.<ext>` next to the source file.
fn sibling_candidates(source: &Path) -> Vec<PathBuf> {
    let parent = source.parent().unwrap_or(Path::new(""));
    let name = file_name(source);
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    vec![
        parent.join(format!("test_{name}")),
        parent.join(format!("{stem}_test{suffix}")),
    ]
}

fn is_test_file(path: &Path) -> bool {
    file_name(path).to_lowercase().contains("test")
        || path
            .parent()
            .and_then(|p| p.file_name())
            .is_some_and(|n| n.to_string_lossy().eq_ignore_ascii_case("test"))
}

fn directory_coverage(root: &Path, dir: &Path) -> f64 {
    if !dir.is_dir() {
        return 0.0;
    }
    let sources: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_extension(p, SOURCE_EXTENSIONS) && !is_test_file(p))
        .collect();

    if sources.is_empty() {
        return 100.0;
    }

    let covered = sources
        .iter()
        .filter(|source| {
            let mut candidates = sibling_candidates(source);
            if let Some(parent) = source.parent() {
                candidates.push(parent.join("test").join(file_name(source)));
            }
            if let Ok(rel) = source.strip_prefix(root) {
                candidates.push(root.join("test").join(rel));
            }
            candidates.iter().any(|c| c.exists())
        })
        .count();

    covered as f64 / sources.len() as f64 * 100.0
}

fn file_coverage(root: &Path, file: &Path) -> f64 {
    if !file.exists() {
        return 0.0;
    }
    let mut candidates = sibling_candidates(file);
    if let Ok(rel) = file.strip_prefix(root) {
        candidates.push(root.join("test").join(rel));
        candidates.push(root.join("__tests__").join(rel));
    }
    if candidates.iter().any(|c| c.exists()) {
        100.0
    } else {
        0.0
    }
}

fn library_coverage(root: &Path, library: &str, excluded: &[String]) -> f64 {
    let mentioned = RepoWalker::new(root)
        .with_excluded(excluded)
        .files()
        .into_iter()
        .filter(|p| file_name(p).to_lowercase().contains("test"))
        .filter(|p| has_extension(p, TEST_FILE_EXTENSIONS))
        .any(|p| read_text(&p).is_some_and(|content| content.contains(library)));
    if mentioned {
        100.0
    } else {
        0.0
    }
}
