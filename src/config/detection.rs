use serde::{Deserialize, Serialize};

/// Phase 1 scanning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Years without a commit before a path counts as untouched (default: 2)
    #[serde(default = "default_min_years_untouched")]
    pub min_years_untouched: u32,

    /// Items at or below this risk are dropped, deprecated libraries excepted (default: 0.3)
    #[serde(default = "default_min_risk_score")]
    pub min_risk_score: f64,

    /// Regexes matched against `<relative dir>/`
    #[serde(default = "default_safe_folder_patterns")]
    pub safe_folder_patterns: Vec<String>,

    /// Packages never reported, whatever their usage
    #[serde(default = "default_protected_packages")]
    pub protected_packages: Vec<String>,

    /// Path components or glob patterns skipped while walking
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    /// Extensions (with leading dot) of files treated as source
    #[serde(default = "default_scan_file_types")]
    pub scan_file_types: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_years_untouched: default_min_years_untouched(),
            min_risk_score: default_min_risk_score(),
            safe_folder_patterns: default_safe_folder_patterns(),
            protected_packages: default_protected_packages(),
            excluded_paths: default_excluded_paths(),
            scan_file_types: default_scan_file_types(),
        }
    }
}

impl DetectionConfig {
    pub fn is_protected(&self, package: &str) -> bool {
        self.protected_packages.iter().any(|p| p == package)
    }

    /// Whether `path` has one of the configured source extensions.
    pub fn is_source_file(&self, path: &std::path::Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.scan_file_types
            .iter()
            .any(|t| t.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

fn default_min_years_untouched() -> u32 {
    2
}

fn default_min_risk_score() -> f64 {
    0.3
}

fn default_safe_folder_patterns() -> Vec<String> {
    ["^src/legacy/", "^old/", "^bak/", "^deprecated/", "^v[0-9]+/"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_protected_packages() -> Vec<String> {
    ["core-js", "typescript", "react", "vue", "angular"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_excluded_paths() -> Vec<String> {
    [
        "node_modules",
        ".git",
        "dist",
        "build",
        "coverage",
        "legacy-removal-output",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_scan_file_types() -> Vec<String> {
    [
        ".js", ".ts", ".jsx", ".tsx", ".py", ".java", ".go", ".rs", ".php", ".rb",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
