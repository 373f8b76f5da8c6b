use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Repository walker honouring the configured exclusions.
///
/// An exclusion containing glob metacharacters is matched against the
/// repository-relative path; one containing `/` excludes that path prefix;
/// anything else excludes every path with a component of that name.
pub struct RepoWalker {
    root: PathBuf,
    components: Vec<String>,
    prefixes: Vec<PathBuf>,
    patterns: Vec<glob::Pattern>,
    extensions: Option<Vec<String>>,
}

impl RepoWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            components: Vec::new(),
            prefixes: Vec::new(),
            patterns: Vec::new(),
            extensions: None,
        }
    }

    pub fn with_excluded(mut self, excluded: &[String]) -> Self {
        for entry in excluded {
            let entry = entry.trim().trim_end_matches('/');
            if entry.is_empty() {
                continue;
            }
            if entry.contains(['*', '?', '[']) {
                match glob::Pattern::new(entry) {
                    Ok(pattern) => self.patterns.push(pattern),
                    Err(e) => log::warn!("Ignoring invalid exclusion pattern '{}': {}", entry, e),
                }
            } else if entry.contains('/') {
                self.prefixes.push(PathBuf::from(entry));
            } else {
                self.components.push(entry.to_string());
            }
        }
        self
    }

    /// Restrict [`files`](Self::files) to these extensions (leading dot optional).
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = Some(
            extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        );
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a repository-relative path is excluded.
    pub fn is_excluded(&self, rel: &Path) -> bool {
        if rel
            .components()
            .any(|c| self.components.iter().any(|e| c.as_os_str() == e.as_str()))
        {
            return true;
        }
        if self.prefixes.iter().any(|p| rel.starts_with(p)) {
            return true;
        }
        let rel_str = rel.to_string_lossy();
        self.patterns.iter().any(|p| p.matches(&rel_str))
    }

    fn entries(&self) -> impl Iterator<Item = walkdir::DirEntry> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                let rel = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
                !self.is_excluded(rel)
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable path: {}", e);
                    None
                }
            })
    }

    /// All non-excluded directories below the root, in path order.
    pub fn directories(&self) -> Vec<PathBuf> {
        self.entries()
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.into_path())
            .collect()
    }

    /// All non-excluded regular files matching the extension filter.
    pub fn files(&self) -> Vec<PathBuf> {
        self.entries()
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.matches_extension(p))
            .collect()
    }

    fn matches_extension(&self, path: &Path) -> bool {
        let Some(extensions) = &self.extensions else {
            return true;
        };
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

/// Files under `dir` (recursive) together with their total size in bytes.
pub fn directory_stats(dir: &Path) -> (usize, u64) {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .fold((0, 0), |(count, bytes), entry| {
            let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
            (count + 1, bytes + len)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/legacy")).unwrap();
        fs::create_dir_all(root.join("node_modules/moment")).unwrap();
        fs::create_dir_all(root.join("vendor/lib")).unwrap();
        fs::write(root.join("src/app.js"), "x").unwrap();
        fs::write(root.join("src/legacy/old.js"), "x").unwrap();
        fs::write(root.join("src/notes.md"), "x").unwrap();
        fs::write(root.join("node_modules/moment/index.js"), "x").unwrap();
        fs::write(root.join("vendor/lib/a.js"), "x").unwrap();
        temp
    }

    fn rel(root: &Path, paths: Vec<PathBuf>) -> Vec<String> {
        paths
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_component_exclusion_prunes_subtree() {
        let temp = fixture();
        let walker = RepoWalker::new(temp.path()).with_excluded(&["node_modules".to_string()]);
        let dirs = rel(temp.path(), walker.directories());
        assert!(dirs.contains(&"src/legacy".to_string()));
        assert!(!dirs.iter().any(|d| d.starts_with("node_modules")));
    }

    #[test]
    fn test_glob_and_prefix_exclusions() {
        let temp = fixture();
        let walker = RepoWalker::new(temp.path())
            .with_excluded(&["vendor/lib".to_string(), "**/*.md".to_string()])
            .with_excluded(&["node_modules".to_string()]);
        let files = rel(temp.path(), walker.files());
        assert_eq!(files, vec!["src/app.js", "src/legacy/old.js"]);
    }

    #[test]
    fn test_extension_filter() {
        let temp = fixture();
        let walker = RepoWalker::new(temp.path())
            .with_excluded(&["node_modules".to_string(), "vendor".to_string()])
            .with_extensions(&[".md".to_string()]);
        assert_eq!(rel(temp.path(), walker.files()), vec!["src/notes.md"]);
    }

    #[test]
    fn test_directory_stats_counts_nested_files() {
        let temp = fixture();
        let (count, bytes) = directory_stats(&temp.path().join("src"));
        assert_eq!(count, 3);
        assert_eq!(bytes, 3);
    }
}
