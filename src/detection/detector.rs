use chrono::{DateTime, Duration, Utc};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::catalog::{self, CONTENT_MARKERS, LEGACY_CONFIG_FILES, LEGACY_DIRECTORY_NAMES};
use super::manifests::{load_manifests, Ecosystem};
use super::scoring;
use super::usage::{is_js_source, is_python_source, UsageMatcher};
use super::{FocusArea, ItemType, LegacyItem};
use crate::config::DetectionConfig;
use crate::errors::{DecruftError, Result};
use crate::io::{directory_stats, read_text, relative_path, RepoWalker};
use crate::observability::{set_current_item, set_phase, PipelinePhase};
use crate::vcs::HistoryProvider;

const LIBRARY_SIZE_KB: f64 = 50.0;
const UNKNOWN_AGE_DAYS: i64 = 365;

/// Scans one repository root.
pub struct Detector<'a> {
    root: PathBuf,
    config: &'a DetectionConfig,
    history: &'a dyn HistoryProvider,
    now: DateTime<Utc>,
    extra_excluded: Vec<String>,
}

/// Run every focused scanner over `root`.
pub fn detect(
    root: &Path,
    config: &DetectionConfig,
    history: &dyn HistoryProvider,
    focus: &[FocusArea],
) -> Result<Vec<LegacyItem>> {
    Detector::new(root, config, history).detect(focus)
}

impl<'a> Detector<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        config: &'a DetectionConfig,
        history: &'a dyn HistoryProvider,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            history,
            now: Utc::now(),
            extra_excluded: Vec::new(),
        }
    }

    /// Pin the clock used for age calculations.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Exclude additional repository-relative paths, such as the run output directory.
    pub fn with_excluded(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.extra_excluded.extend(paths);
        self
    }

    /// Run the focused scanners; an empty focus runs all of them.
    ///
    /// Results are sorted by descending risk, then by path.
    pub fn detect(&self, focus: &[FocusArea]) -> Result<Vec<LegacyItem>> {
        let _phase = set_phase(PipelinePhase::Detection);
        self.check_root()?;

        let focus: HashSet<FocusArea> = if focus.is_empty() {
            FocusArea::ALL.into_iter().collect()
        } else {
            focus.iter().copied().collect()
        };

        let mut items = Vec::new();
        if focus.contains(&FocusArea::Dependencies) {
            items.extend(self.scan_dependencies());
        }
        if focus.contains(&FocusArea::Dirs) {
            items.extend(self.scan_directories());
        }
        if focus.contains(&FocusArea::Files) {
            items.extend(self.scan_files());
        }
        if focus.contains(&FocusArea::Configs) {
            items.extend(self.scan_configs());
        }

        items.retain(|item| self.keep(item));
        items.sort_by(|a, b| {
            b.risk_score
                .total_cmp(&a.risk_score)
                .then_with(|| a.path.cmp(&b.path))
        });
        tracing::info!(count = items.len(), "detection finished");
        Ok(items)
    }

    fn check_root(&self) -> Result<()> {
        let metadata = fs::metadata(&self.root)
            .map_err(|e| DecruftError::repository_root(&self.root, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(DecruftError::repository_root(&self.root, "not a directory"));
        }
        fs::read_dir(&self.root)
            .map(|_| ())
            .map_err(|e| DecruftError::repository_root(&self.root, e.to_string()))
    }

    fn keep(&self, item: &LegacyItem) -> bool {
        item.risk_score > self.config.min_risk_score
            || (item.item_type == ItemType::Library && item.is_deprecated())
    }

    fn walker(&self) -> RepoWalker {
        RepoWalker::new(&self.root)
            .with_excluded(&self.config.excluded_paths)
            .with_excluded(&self.extra_excluded)
    }

    fn days_since(&self, at: DateTime<Utc>) -> i64 {
        (self.now - at).num_days().max(0)
    }

    /// Last change for a path: history first, then file mtimes, then one year ago.
    fn last_change(&self, rel: &str, abs: &Path) -> DateTime<Utc> {
        self.history
            .last_modified(Path::new(rel))
            .or_else(|| newest_mtime(abs))
            .unwrap_or_else(|| self.now - Duration::days(UNKNOWN_AGE_DAYS))
    }

    fn scan_dependencies(&self) -> Vec<LegacyItem> {
        let entries = load_manifests(&self.root);
        if entries.is_empty() {
            return Vec::new();
        }

        let sources: Vec<(PathBuf, String)> = self
            .walker()
            .files()
            .into_iter()
            .filter(|p| is_js_source(p) || is_python_source(p))
            .filter_map(|p| read_text(&p).map(|c| (p, c)))
            .collect();

        entries
            .into_iter()
            .filter(|entry| !self.config.is_protected(&entry.name))
            .map(|entry| {
                let path = format!("{}:{}", entry.ecosystem.manifest_name(), entry.name);
                let _item = set_current_item(&path);

                let mut reasons = Vec::new();
                let catalogued = match entry.ecosystem {
                    Ecosystem::Npm => catalog::deprecated_javascript(&entry.name),
                    Ecosystem::Python => None,
                };
                if let Some(info) = catalogued {
                    reasons.push(format!("Deprecated: {}", info.reason));
                }
                if entry.ecosystem == Ecosystem::Npm && catalog::legacy_framework(&entry.name).is_some() {
                    reasons.push(format!("Legacy framework: {}", entry.name));
                }
                let deprecated = !reasons.is_empty();

                let matcher = UsageMatcher::new(entry.ecosystem, &entry.name);
                let usage_count = sources
                    .iter()
                    .filter(|(p, content)| matcher.applies_to(p) && matcher.is_match(content))
                    .count();

                let last_reference = self.history.last_mentioned(&entry.name);
                let risk = scoring::dependency_risk(
                    deprecated,
                    usage_count,
                    last_reference.map(|d| self.days_since(d)),
                );

                let mut evidence = vec![entry.evidence(), format!("Used in {usage_count} files")];
                if let Some(info) = catalogued {
                    evidence.push(format!("Replacement: {}", info.replacement));
                }

                LegacyItem {
                    item_type: ItemType::Library,
                    path,
                    name: entry.name.clone(),
                    risk_score: risk,
                    size_kb: LIBRARY_SIZE_KB,
                    last_reference_date: last_reference.map(format_date),
                    last_updated_date: None,
                    suggested_action: scoring::suggest_dependency_action(risk, deprecated, usage_count)
                        .to_string(),
                    evidence,
                    legacy_reasons: reasons,
                }
            })
            .collect()
    }

    fn folder_patterns(&self) -> Vec<Regex> {
        self.config
            .safe_folder_patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("Ignoring invalid folder pattern '{}': {}", p, e);
                    None
                }
            })
            .collect()
    }

    fn scan_directories(&self) -> Vec<LegacyItem> {
        let patterns = self.folder_patterns();
        let untouched_days = i64::from(self.config.min_years_untouched) * 365;

        self.walker()
            .directories()
            .into_iter()
            .map(|dir| {
                let rel = relative_path(&self.root, &dir);
                let _item = set_current_item(&rel);
                let name = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| rel.clone());

                let lower = name.to_lowercase();
                let with_slash = format!("{rel}/");
                let legacy_pattern = LEGACY_DIRECTORY_NAMES.iter().any(|f| lower.contains(f))
                    || patterns.iter().any(|p| p.is_match(&with_slash));

                let updated = self.last_change(&rel, &dir);
                let days = self.days_since(updated);
                let (file_count, bytes) = directory_stats(&dir);
                let size_kb = bytes as f64 / 1024.0;

                let mut reasons = Vec::new();
                if legacy_pattern {
                    reasons.push(format!("Matches legacy pattern: {name}"));
                }
                if days > untouched_days {
                    reasons.push(format!("Untouched for {} years", days / 365));
                }
                if file_count == 0 {
                    reasons.push("Empty directory".to_string());
                }

                let risk = scoring::directory_risk(legacy_pattern, days, file_count, size_kb);
                LegacyItem {
                    item_type: ItemType::Directory,
                    path: rel,
                    name,
                    risk_score: risk,
                    size_kb,
                    last_reference_date: Some(format_date(updated)),
                    last_updated_date: Some(format_date(updated)),
                    suggested_action: scoring::suggest_directory_action(risk, file_count, days)
                        .to_string(),
                    evidence: vec![format!("{file_count} files"), format!("{size_kb:.1} KB")],
                    legacy_reasons: reasons,
                }
            })
            .collect()
    }

    fn scan_files(&self) -> Vec<LegacyItem> {
        let markers: Vec<(&str, Regex)> = CONTENT_MARKERS
            .iter()
            .filter_map(|m| {
                RegexBuilder::new(m)
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .map(|re| (*m, re))
            })
            .collect();
        let untouched_days = i64::from(self.config.min_years_untouched) * 365;

        self.walker()
            .with_extensions(&self.config.scan_file_types)
            .files()
            .into_iter()
            .filter_map(|file| {
                let rel = relative_path(&self.root, &file);
                let _item = set_current_item(&rel);
                let content = read_text(&file)?;
                let name = file.file_name()?.to_string_lossy().into_owned();
                let lower = name.to_lowercase();

                let legacy_name = catalog::LEGACY_FILE_INDICATORS
                    .iter()
                    .any(|i| lower.contains(i));
                let found: Vec<&str> = markers
                    .iter()
                    .filter(|(_, re)| re.is_match(&content))
                    .map(|(m, _)| *m)
                    .collect();

                let updated = self.last_change(&rel, &file);
                let days = self.days_since(updated);

                let mut reasons = Vec::new();
                if legacy_name {
                    reasons.push(format!("Filename contains legacy indicator: {lower}"));
                }
                reasons.extend(found.iter().map(|m| format!("Content: {m}")));
                if days > untouched_days {
                    reasons.push(format!("File untouched for {} years", days / 365));
                }

                let risk = scoring::file_risk(legacy_name, found.len(), days);
                let bytes = fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
                // History lookups are costly; only items that survive the filter pay for them.
                let last_reference = if risk > self.config.min_risk_score {
                    self.history.last_mentioned(&name).map(format_date)
                } else {
                    None
                };

                Some(LegacyItem {
                    item_type: ItemType::File,
                    path: rel,
                    name,
                    risk_score: risk,
                    size_kb: bytes as f64 / 1024.0,
                    last_reference_date: last_reference,
                    last_updated_date: Some(format_date(updated)),
                    suggested_action: scoring::suggest_file_action(risk, found.len(), days)
                        .to_string(),
                    evidence: vec![format!("Size: {bytes} bytes")],
                    legacy_reasons: reasons,
                })
            })
            .collect()
    }

    fn scan_configs(&self) -> Vec<LegacyItem> {
        LEGACY_CONFIG_FILES
            .iter()
            .filter_map(|(file, reason)| {
                let abs = self.root.join(file);
                if !abs.is_file() {
                    return None;
                }
                let updated = self.last_change(file, &abs);
                let bytes = fs::metadata(&abs).map(|m| m.len()).unwrap_or(0);
                Some(LegacyItem {
                    item_type: ItemType::Config,
                    path: file.to_string(),
                    name: file.to_string(),
                    risk_score: 0.8,
                    size_kb: bytes as f64 / 1024.0,
                    last_reference_date: Some(format_date(updated)),
                    last_updated_date: Some(format_date(updated)),
                    suggested_action: "Review and migrate to modern alternative".to_string(),
                    evidence: vec![format!("Legacy configuration: {reason}")],
                    legacy_reasons: vec![reason.to_string()],
                })
            })
            .collect()
    }
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Newest modification time of `path` or any file below it.
fn newest_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let own = fs::metadata(path).and_then(|m| m.modified()).ok();
    let newest_file = walkdir::WalkDir::new(path)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok()?.modified().ok())
        .max();
    newest_file.or(own).map(system_time_to_utc)
}

fn system_time_to_utc(at: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::{NoHistory, StaticHistory};
    use tempfile::TempDir;

    #[test]
    fn test_missing_root_is_fatal() {
        let config = DetectionConfig::default();
        let err = detect(Path::new("/no/such/repo/here"), &config, &NoHistory, &[]).unwrap_err();
        assert!(matches!(err, DecruftError::RepositoryRoot { .. }));
    }

    #[test]
    fn test_protected_packages_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{"dependencies": {"react": "18.0.0", "left-pad": "1.3.0"}}"#,
        )
        .unwrap();
        let config = DetectionConfig::default();
        let items = detect(temp.path(), &config, &NoHistory, &[FocusArea::Dependencies]).unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["left-pad"]);
    }

    #[test]
    fn test_used_framework_still_reported() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{"dependencies": {"jquery": "3.0.0"}}"#,
        )
        .unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        for i in 0..3 {
            fs::write(
                temp.path().join(format!("src/page{i}.js")),
                "import $ from 'jquery';\n",
            )
            .unwrap();
        }
        let config = DetectionConfig::default();
        let items = detect(temp.path(), &config, &NoHistory, &[FocusArea::Dependencies]).unwrap();
        assert_eq!(items.len(), 1);
        let jquery = &items[0];
        assert!((jquery.risk_score - 0.6).abs() < 1e-9);
        assert!(jquery.evidence.contains(&"Used in 3 files".to_string()));
        assert_eq!(jquery.suggested_action, "Migrate to modern replacement");
    }

    #[test]
    fn test_legacy_config_detected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Gruntfile.js"), "module.exports = {};").unwrap();
        let config = DetectionConfig::default();
        let items = detect(temp.path(), &config, &NoHistory, &[FocusArea::Configs]).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_type, ItemType::Config);
        assert_eq!(items[0].risk_score, 0.8);
    }

    #[test]
    fn test_stale_file_with_markers() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("lib")).unwrap();
        fs::write(
            temp.path().join("lib/util_old.js"),
            "// TODO: remove this temporary shim\n",
        )
        .unwrap();
        let now = Utc::now();
        let history =
            StaticHistory::default().with_modified("lib/util_old.js", now - Duration::days(800));
        let config = DetectionConfig::default();
        let items = Detector::new(temp.path(), &config, &history)
            .at(now)
            .detect(&[FocusArea::Files])
            .unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.path, "lib/util_old.js");
        assert_eq!(item.risk_score, 1.0);
        assert!(item
            .legacy_reasons
            .contains(&"Filename contains legacy indicator: util_old.js".to_string()));
        assert!(item.legacy_reasons.contains(&"File untouched for 2 years".to_string()));
    }

    #[test]
    fn test_excluded_directories_not_reported() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("node_modules/old")).unwrap();
        let config = DetectionConfig::default();
        let items = detect(temp.path(), &config, &NoHistory, &[FocusArea::Dirs]).unwrap();
        assert!(items.iter().all(|i| !i.path.starts_with("node_modules")));
    }
}
