//! Phase 1 artifacts: the inventory CSV, the directory tree and the
//! detection summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use super::{write_json, write_text};
use crate::detection::{ItemType, LegacyItem};
use crate::errors::{DecruftError, Result};

const REASON_SEPARATOR: &str = "; ";
const HIGH_RISK: f64 = 0.7;
const LOW_RISK: f64 = 0.3;

/// One row of `legacy-inventory.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct InventoryRow {
    #[serde(rename = "Type")]
    item_type: String,
    #[serde(rename = "Path")]
    path: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Last Reference", default)]
    last_reference: String,
    #[serde(rename = "Last Updated", default)]
    last_updated: String,
    #[serde(rename = "Risk Score")]
    risk_score: String,
    #[serde(rename = "Size (KB)")]
    size_kb: String,
    #[serde(rename = "Suggested Action", default)]
    suggested_action: String,
    #[serde(rename = "Legacy Reasons", default)]
    legacy_reasons: String,
}

impl From<&LegacyItem> for InventoryRow {
    fn from(item: &LegacyItem) -> Self {
        Self {
            item_type: item.item_type.to_string(),
            path: item.path.clone(),
            name: item.name.clone(),
            last_reference: item.last_reference_date.clone().unwrap_or_default(),
            last_updated: item.last_updated_date.clone().unwrap_or_default(),
            risk_score: format!("{:.2}", item.risk_score),
            size_kb: format!("{:.1}", item.size_kb),
            suggested_action: item.suggested_action.clone(),
            legacy_reasons: item.legacy_reasons.join(REASON_SEPARATOR),
        }
    }
}

impl InventoryRow {
    fn into_item(self, line: usize) -> Result<LegacyItem> {
        let invalid = |field: &str, value: &str| {
            DecruftError::Plan(format!("inventory row {line}: invalid {field} '{value}'"))
        };
        let item_type: ItemType = self
            .item_type
            .parse()
            .map_err(|_| invalid("Type", &self.item_type))?;
        let risk_score: f64 = self
            .risk_score
            .trim()
            .parse()
            .map_err(|_| invalid("Risk Score", &self.risk_score))?;
        let size_kb: f64 = self
            .size_kb
            .trim()
            .parse()
            .map_err(|_| invalid("Size (KB)", &self.size_kb))?;

        Ok(LegacyItem {
            item_type,
            path: self.path,
            name: self.name,
            risk_score: risk_score.clamp(0.0, 1.0),
            size_kb,
            last_reference_date: non_empty(self.last_reference),
            last_updated_date: non_empty(self.last_updated),
            suggested_action: self.suggested_action,
            evidence: Vec::new(),
            legacy_reasons: self
                .legacy_reasons
                .split(REASON_SEPARATOR)
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn write_inventory_csv(path: &Path, items: &[LegacyItem]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for item in items {
        writer.serialize(InventoryRow::from(item))?;
    }
    writer.flush()?;
    log::info!("Wrote {} inventory rows to {}", items.len(), path.display());
    Ok(())
}

/// Load an inventory written by [`write_inventory_csv`].
///
/// Evidence is not part of the CSV and comes back empty.
pub fn read_inventory_csv(path: &Path) -> Result<Vec<LegacyItem>> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<InventoryRow>()
        .enumerate()
        .map(|(i, row)| row?.into_item(i + 2))
        .collect()
}

/// Indented listing of the legacy directories, one entry per item.
pub fn render_directory_tree(items: &[LegacyItem]) -> String {
    let mut directories: Vec<&LegacyItem> = items
        .iter()
        .filter(|i| i.item_type == ItemType::Directory)
        .collect();
    directories.sort_by(|a, b| a.path.cmp(&b.path));

    let mut out = String::from("# Legacy Directories Tree\n\n");
    for item in directories {
        let indent = "  ".repeat(item.path.matches('/').count());
        let _ = writeln!(
            out,
            "{indent}📁 {} (Risk: {:.2}, Size: {:.1}KB)",
            item.name, item.risk_score, item.size_kb
        );
        let _ = writeln!(out, "{indent}   └─ {}", item.suggested_action);
    }
    out
}

pub fn write_directory_tree(path: &Path, items: &[LegacyItem]) -> Result<()> {
    write_text(path, &render_directory_tree(items))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionBreakdown {
    pub remove_immediately: usize,
    pub review_required: usize,
    pub migrate_required: usize,
}

/// Contents of `legacy-summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub scan_date: DateTime<Utc>,
    pub total_items: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_risk: RiskBreakdown,
    pub total_size_kb: f64,
    pub recommended_actions: ActionBreakdown,
}

impl DetectionSummary {
    pub fn from_items(items: &[LegacyItem], scan_date: DateTime<Utc>) -> Self {
        let mut by_type = BTreeMap::new();
        let mut by_risk = RiskBreakdown::default();
        let mut actions = ActionBreakdown::default();

        for item in items {
            *by_type.entry(item.item_type.to_string()).or_insert(0) += 1;

            match item.risk_score {
                r if r > HIGH_RISK => by_risk.high_risk += 1,
                r if r > LOW_RISK => by_risk.medium_risk += 1,
                _ => by_risk.low_risk += 1,
            }

            let action = item.suggested_action.to_lowercase();
            if action.contains("remove immediately") {
                actions.remove_immediately += 1;
            }
            if action.contains("review") {
                actions.review_required += 1;
            }
            if action.contains("migrate") {
                actions.migrate_required += 1;
            }
        }

        Self {
            scan_date,
            total_items: items.len(),
            by_type,
            by_risk,
            total_size_kb: items.iter().map(|i| i.size_kb).sum(),
            recommended_actions: actions,
        }
    }

    pub fn high_risk(&self) -> usize {
        self.by_risk.high_risk
    }
}

pub fn write_summary_json(path: &Path, summary: &DetectionSummary) -> Result<()> {
    write_json(path, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn item(item_type: ItemType, path: &str, risk: f64, action: &str) -> LegacyItem {
        LegacyItem {
            item_type,
            path: path.into(),
            name: path.rsplit(['/', ':']).next().unwrap_or(path).into(),
            risk_score: risk,
            size_kb: 12.34,
            last_reference_date: None,
            last_updated_date: Some("2021-03-04".into()),
            suggested_action: action.into(),
            evidence: vec!["found in package.json".into()],
            legacy_reasons: vec!["Deprecated: moment".into(), "Unused".into()],
        }
    }

    #[test]
    fn test_inventory_csv_columns_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("legacy-inventory.csv");
        let items = vec![item(
            ItemType::Library,
            "package.json:moment",
            0.856,
            "Remove immediately (deprecated and unused)",
        )];
        write_inventory_csv(&path, &items).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Type,Path,Name,Last Reference,Last Updated,Risk Score,Size (KB),Suggested Action,Legacy Reasons"
        );
        assert_eq!(
            lines.next().unwrap(),
            "library,package.json:moment,moment,,2021-03-04,0.86,12.3,Remove immediately (deprecated and unused),Deprecated: moment; Unused"
        );

        let loaded = read_inventory_csv(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].item_type, ItemType::Library);
        assert_eq!(loaded[0].risk_score, 0.86);
        assert_eq!(loaded[0].last_reference_date, None);
        assert_eq!(loaded[0].legacy_reasons, vec!["Deprecated: moment", "Unused"]);
        assert!(loaded[0].evidence.is_empty());
    }

    #[test]
    fn test_inventory_rejects_unknown_type() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.csv");
        std::fs::write(
            &path,
            "Type,Path,Name,Last Reference,Last Updated,Risk Score,Size (KB),Suggested Action,Legacy Reasons\n\
             widget,a,a,,,0.5,1.0,Monitor,\n",
        )
        .unwrap();
        let err = read_inventory_csv(&path).unwrap_err();
        assert!(err.to_string().contains("inventory row 2"), "{err}");
    }

    #[test]
    fn test_directory_tree_indents_by_depth() {
        let items = vec![
            item(ItemType::Directory, "src/legacy/old-widget", 0.5, "Archive if not needed"),
            item(ItemType::Library, "package.json:moment", 0.9, "Remove"),
            item(ItemType::Directory, "old", 0.8, "Review for possible removal"),
        ];
        let tree = render_directory_tree(&items);
        assert_eq!(
            tree,
            "# Legacy Directories Tree\n\n\
             📁 old (Risk: 0.80, Size: 12.3KB)\n   └─ Review for possible removal\n\
             \x20   📁 old-widget (Risk: 0.50, Size: 12.3KB)\n       └─ Archive if not needed\n"
        );
    }

    #[test]
    fn test_summary_buckets() {
        let items = vec![
            item(ItemType::Library, "package.json:a", 0.9, "Remove immediately (deprecated and unused)"),
            item(ItemType::Library, "package.json:b", 0.5, "Migrate to modern replacement"),
            item(ItemType::File, "old.js", 0.3, "Review and update"),
        ];
        let summary = DetectionSummary::from_items(&items, Utc::now());
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.by_type["library"], 2);
        assert_eq!(summary.by_type["file"], 1);
        assert_eq!(
            summary.by_risk,
            RiskBreakdown {
                high_risk: 1,
                medium_risk: 1,
                low_risk: 1
            }
        );
        assert_eq!(
            summary.recommended_actions,
            ActionBreakdown {
                remove_immediately: 1,
                review_required: 1,
                migrate_required: 1
            }
        );
        assert!((summary.total_size_kb - 37.02).abs() < 1e-9);
    }
}
