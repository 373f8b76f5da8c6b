//! Dependency manifest parsing.

use serde_json::Value;
use std::path::Path;

/// Package manager a manifest belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    Npm,
    Python,
}

impl Ecosystem {
    pub fn manifest_name(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "package.json",
            Ecosystem::Python => "requirements.txt",
        }
    }

    /// Ecosystem implied by a `<manifest>:<name>` item path.
    pub fn from_item_path(path: &str) -> Option<Self> {
        match path.split_once(':')?.0 {
            "package.json" => Some(Ecosystem::Npm),
            "requirements.txt" => Some(Ecosystem::Python),
            _ => None,
        }
    }
}

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub ecosystem: Ecosystem,
    pub name: String,
    /// Version range for npm, the raw requirement line for Python
    pub spec: String,
}

impl ManifestEntry {
    pub fn evidence(&self) -> String {
        match self.ecosystem {
            Ecosystem::Npm => format!("Version: {}", self.spec),
            Ecosystem::Python => format!("Requirement: {}", self.spec),
        }
    }
}

/// Parse `package.json` text; `dependencies` first, then `devDependencies`.
///
/// A package listed in both keeps its first occurrence.
pub fn parse_package_json(contents: &str) -> Result<Vec<ManifestEntry>, String> {
    let value: Value =
        serde_json::from_str(contents).map_err(|e| format!("invalid package.json: {e}"))?;
    let mut entries: Vec<ManifestEntry> = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        let Some(deps) = value.get(section).and_then(Value::as_object) else {
            continue;
        };
        for (name, version) in deps {
            if entries.iter().any(|e| &e.name == name) {
                continue;
            }
            let spec = match version {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            entries.push(ManifestEntry {
                ecosystem: Ecosystem::Npm,
                name: name.clone(),
                spec,
            });
        }
    }
    Ok(entries)
}

/// Parse `requirements.txt` text.
pub fn parse_requirements(contents: &str) -> Vec<ManifestEntry> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| {
            let requirement = line.split('#').next().unwrap_or(line).trim();
            let name = requirement_name(requirement);
            (!name.is_empty()).then(|| ManifestEntry {
                ecosystem: Ecosystem::Python,
                name: name.to_string(),
                spec: requirement.to_string(),
            })
        })
        .collect()
}

fn requirement_name(requirement: &str) -> &str {
    let cut = ["==", ">=", "<=", "~=", "!=", ">", "<", "[", ";", " "]
        .iter()
        .filter_map(|op| requirement.find(op))
        .min()
        .unwrap_or(requirement.len());
    requirement[..cut].trim()
}

/// Read and parse every manifest present at the root.
///
/// A manifest that cannot be read or parsed is reported and skipped.
pub fn load_manifests(root: &Path) -> Vec<ManifestEntry> {
    let mut entries = Vec::new();

    let package_json = root.join(Ecosystem::Npm.manifest_name());
    if package_json.is_file() {
        match std::fs::read_to_string(&package_json)
            .map_err(|e| e.to_string())
            .and_then(|c| parse_package_json(&c))
        {
            Ok(found) => entries.extend(found),
            Err(e) => log::warn!("Skipping {}: {}", package_json.display(), e),
        }
    }

    let requirements = root.join(Ecosystem::Python.manifest_name());
    if requirements.is_file() {
        match std::fs::read_to_string(&requirements) {
            Ok(contents) => entries.extend(parse_requirements(&contents)),
            Err(e) => log::warn!("Skipping {}: {}", requirements.display(), e),
        }
    }

    entries
}
