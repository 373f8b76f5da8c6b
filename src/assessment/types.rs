use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::detection::ItemType;

/// Removal tier, which also decides the execution phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskCategory {
    Safe,
    Caution,
    Risky,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Safe => "SAFE",
            RiskCategory::Caution => "CAUTION",
            RiskCategory::Risky => "RISKY",
        }
    }

    /// Execution phase for this tier, 1 through 3.
    pub fn phase(&self) -> u8 {
        match self {
            RiskCategory::Safe => 1,
            RiskCategory::Caution => 2,
            RiskCategory::Risky => 3,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    RemoveImmediately,
    ReviewRequired,
    MigrationRequired,
    Archive,
    Monitor,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::RemoveImmediately => "remove_immediately",
            RecommendedAction::ReviewRequired => "review_required",
            RecommendedAction::MigrationRequired => "migration_required",
            RecommendedAction::Archive => "archive",
            RecommendedAction::Monitor => "monitor",
        }
    }

    /// Hours before per-dependent and per-type surcharges.
    pub fn base_effort_hours(&self) -> u32 {
        match self {
            RecommendedAction::RemoveImmediately => 1,
            RecommendedAction::Archive => 2,
            RecommendedAction::ReviewRequired => 4,
            RecommendedAction::MigrationRequired => 16,
            RecommendedAction::Monitor => 1,
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendedAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "remove_immediately" => Ok(RecommendedAction::RemoveImmediately),
            "review_required" => Ok(RecommendedAction::ReviewRequired),
            "migration_required" => Ok(RecommendedAction::MigrationRequired),
            "archive" => Ok(RecommendedAction::Archive),
            "monitor" => Ok(RecommendedAction::Monitor),
            other => Err(format!("unknown action type: {other}")),
        }
    }
}

/// Result of assessing one legacy item against the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub item_path: String,
    pub item_type: ItemType,
    pub item_name: String,
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    pub impact_score: f64,
    pub direct_dependencies: Vec<String>,
    pub indirect_dependencies: Vec<String>,
    pub dependents: Vec<String>,
    /// Heuristic percentage in `[0, 100]`
    pub test_coverage: f64,
    pub build_impact: String,
    pub rollback_complexity: String,
    pub recommended_action: RecommendedAction,
    #[serde(default)]
    pub migration_steps: Vec<String>,
    pub estimated_effort_hours: u32,
    pub confidence_level: f64,
}

/// Aggregate figures for the assessment report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub safe_removals: usize,
    pub caution_items: usize,
    pub risky_items: usize,
    pub total_effort_hours: u32,
    pub average_confidence: f64,
}

impl AssessmentSummary {
    pub fn from_assessments(assessments: &[ImpactAssessment]) -> Self {
        let count = |category: RiskCategory| {
            assessments
                .iter()
                .filter(|a| a.risk_category == category)
                .count()
        };
        let average_confidence = if assessments.is_empty() {
            0.0
        } else {
            assessments.iter().map(|a| a.confidence_level).sum::<f64>() / assessments.len() as f64
        };
        Self {
            safe_removals: count(RiskCategory::Safe),
            caution_items: count(RiskCategory::Caution),
            risky_items: count(RiskCategory::Risky),
            total_effort_hours: assessments.iter().map(|a| a.estimated_effort_hours).sum(),
            average_confidence,
        }
    }
}
