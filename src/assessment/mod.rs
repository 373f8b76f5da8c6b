//! Phase 2: impact assessment.
//!
//! Each legacy item is placed in a SAFE / CAUTION / RISKY tier from its
//! risk score and its dependents in the [`DependencyGraph`], then given a
//! recommended action, an effort estimate and a confidence level.

mod coverage;
mod types;

pub use coverage::test_coverage;
pub use types::{AssessmentSummary, ImpactAssessment, RecommendedAction, RiskCategory};

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::config::{AssessmentConfig, DecruftConfig, RiskThresholds};
use crate::detection::{ItemType, LegacyItem};
use crate::graph::DependencyGraph;
use crate::io::read_text;
use crate::observability::{increment_processed, set_current_item, set_phase, set_progress, PipelinePhase};

const BUILD_FILES: &[&str] = &[
    "package.json",
    "webpack.config.js",
    "vite.config.js",
    "tsconfig.json",
    "pom.xml",
    "build.gradle",
];

const MIN_CONFIDENCE: f64 = 0.3;

pub fn classify_risk(risk_score: f64, dependents: usize, thresholds: &RiskThresholds) -> RiskCategory {
    if risk_score <= thresholds.safe_removal && dependents == 0 {
        RiskCategory::Safe
    } else if risk_score <= thresholds.caution_zone || dependents <= 2 {
        RiskCategory::Caution
    } else {
        RiskCategory::Risky
    }
}

pub fn recommend_action(category: RiskCategory, dependents: usize, coverage: f64) -> RecommendedAction {
    match category {
        RiskCategory::Safe => RecommendedAction::RemoveImmediately,
        RiskCategory::Caution if dependents == 0 => RecommendedAction::Archive,
        RiskCategory::Caution => RecommendedAction::ReviewRequired,
        RiskCategory::Risky if coverage > 80.0 => RecommendedAction::MigrationRequired,
        RiskCategory::Risky => RecommendedAction::ReviewRequired,
    }
}

/// Weighted blend of risk, dependent count and missing coverage, capped at 1.
pub fn impact_score(risk_score: f64, dependents: usize, coverage: f64) -> f64 {
    let dependency_factor = (dependents as f64 / 10.0).min(1.0);
    let coverage_factor = (100.0 - coverage) / 100.0;
    (risk_score * 0.4 + dependency_factor * 0.3 + coverage_factor * 0.3).clamp(0.0, 1.0)
}

pub fn estimate_effort(
    item_type: ItemType,
    action: RecommendedAction,
    dependents: usize,
    migration_steps: usize,
) -> u32 {
    let surcharge = match item_type {
        ItemType::Library => 4,
        ItemType::Config => 6,
        _ => 0,
    };
    action.base_effort_hours() + 2 * dependents as u32 + 2 * migration_steps as u32 + surcharge
}

pub fn confidence_level(item_type: ItemType, direct_dependencies: usize, coverage: f64) -> f64 {
    let mut confidence: f64 = 0.8;
    if direct_dependencies > 5 {
        confidence -= 0.1;
    }
    if coverage < 50.0 {
        confidence -= 0.2;
    }
    if item_type == ItemType::Directory {
        confidence -= 0.1;
    }
    confidence.max(MIN_CONFIDENCE)
}

pub fn rollback_complexity(dependents: usize) -> &'static str {
    match dependents {
        0 => "Simple - Git revert",
        1..=3 => "Moderate - May need dependency restoration",
        _ => "Complex - Requires careful dependency restoration",
    }
}

/// Ordered migration plan; empty unless migration is required.
pub fn migration_steps(item: &LegacyItem, action: RecommendedAction) -> Vec<String> {
    if action != RecommendedAction::MigrationRequired {
        return Vec::new();
    }
    let name = &item.name;
    match item.item_type {
        ItemType::Library => vec![
            format!("Identify modern replacement for {name}"),
            "Update all import statements to use replacement".to_string(),
            "Update package.json to include new dependency".to_string(),
            "Run tests to verify compatibility".to_string(),
            format!("Remove {name} from dependencies"),
        ],
        ItemType::Config => vec![
            "Create new configuration using modern tools".to_string(),
            "Test new configuration in development".to_string(),
            "Migrate environment-specific settings".to_string(),
            "Update documentation".to_string(),
            "Remove legacy configuration".to_string(),
        ],
        _ => vec![
            format!("Analyze current functionality of {name}"),
            "Identify modern alternatives".to_string(),
            "Implement replacement".to_string(),
            "Test replacement thoroughly".to_string(),
            "Remove legacy implementation".to_string(),
        ],
    }
}

/// Label describing how removal would affect the build.
pub fn build_impact(root: &Path, item: &LegacyItem) -> String {
    match item.item_type {
        ItemType::Config => "HIGH - Build configuration file".to_string(),
        ItemType::Library => "MEDIUM - May affect dependency resolution".to_string(),
        ItemType::Directory | ItemType::File => {
            let referenced = BUILD_FILES.iter().any(|name| {
                let path = root.join(name);
                path.is_file() && read_text(&path).is_some_and(|c| c.contains(item.path.as_str()))
            });
            if referenced {
                "HIGH - Referenced in build configuration".to_string()
            } else {
                "LOW - No build references found".to_string()
            }
        }
    }
}

/// Successors reachable within `max_depth` hops, excluding `start`.
pub fn indirect_dependencies(graph: &DependencyGraph, start: &str, max_depth: usize) -> Vec<String> {
    fn walk(
        graph: &DependencyGraph,
        start: &str,
        node: &str,
        depth: usize,
        max_depth: usize,
        visited: &mut HashSet<String>,
        found: &mut BTreeSet<String>,
    ) {
        if depth >= max_depth || !visited.insert(node.to_string()) {
            return;
        }
        for next in graph.successors(node) {
            if next != start {
                found.insert(next.clone());
                walk(graph, start, &next, depth + 1, max_depth, visited, found);
            }
        }
    }

    let mut visited = HashSet::new();
    let mut found = BTreeSet::new();
    walk(graph, start, start, 0, max_depth, &mut visited, &mut found);
    found.into_iter().collect()
}

/// Assesses items against one graph and configuration.
pub struct ImpactAssessor<'a> {
    root: &'a Path,
    config: &'a AssessmentConfig,
    thresholds: &'a RiskThresholds,
    excluded: Vec<String>,
}

impl<'a> ImpactAssessor<'a> {
    pub fn new(root: &'a Path, config: &'a AssessmentConfig, thresholds: &'a RiskThresholds) -> Self {
        Self {
            root,
            config,
            thresholds,
            excluded: Vec::new(),
        }
    }

    /// Paths skipped when searching for test files.
    pub fn with_excluded(mut self, excluded: &[String]) -> Self {
        self.excluded.extend(excluded.iter().cloned());
        self
    }

    pub fn assess(&self, item: &LegacyItem, graph: &DependencyGraph) -> ImpactAssessment {
        let _item = set_current_item(&item.path);

        let direct_dependencies = graph.successors(&item.path);
        let indirect_dependencies = indirect_dependencies(graph, &item.path, self.config.max_depth);
        let dependents = graph.predecessors(&item.path);
        let coverage = test_coverage(self.root, item, &self.excluded);

        let risk_category = classify_risk(item.risk_score, dependents.len(), self.thresholds);
        let recommended_action = recommend_action(risk_category, dependents.len(), coverage);
        let migration_steps = migration_steps(item, recommended_action);

        ImpactAssessment {
            item_path: item.path.clone(),
            item_type: item.item_type,
            item_name: item.name.clone(),
            risk_score: item.risk_score,
            risk_category,
            impact_score: impact_score(item.risk_score, dependents.len(), coverage),
            estimated_effort_hours: estimate_effort(
                item.item_type,
                recommended_action,
                dependents.len(),
                migration_steps.len(),
            ),
            confidence_level: confidence_level(item.item_type, direct_dependencies.len(), coverage),
            rollback_complexity: rollback_complexity(dependents.len()).to_string(),
            build_impact: build_impact(self.root, item),
            test_coverage: coverage,
            direct_dependencies,
            indirect_dependencies,
            dependents,
            recommended_action,
            migration_steps,
        }
    }

    pub fn assess_all(&self, items: &[LegacyItem], graph: &DependencyGraph) -> Vec<ImpactAssessment> {
        let _phase = set_phase(PipelinePhase::Assessment);
        set_progress(0, items.len());
        items
            .iter()
            .map(|item| {
                let assessment = self.assess(item, graph);
                increment_processed();
                log::debug!(
                    "Assessed {} as {} ({})",
                    assessment.item_path,
                    assessment.risk_category,
                    assessment.recommended_action
                );
                assessment
            })
            .collect()
    }
}

/// Assess a single item with the thresholds and exclusions of `config`.
pub fn assess(
    item: &LegacyItem,
    graph: &DependencyGraph,
    root: &Path,
    config: &DecruftConfig,
) -> ImpactAssessment {
    ImpactAssessor::new(root, &config.assessment, &config.risk_thresholds)
        .with_excluded(&config.detection.excluded_paths)
        .assess(item, graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, NodeAttributes};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn item(item_type: ItemType, path: &str, name: &str, risk_score: f64) -> LegacyItem {
        LegacyItem {
            item_type,
            path: path.into(),
            name: name.into(),
            risk_score,
            size_kb: 1.0,
            last_reference_date: None,
            last_updated_date: None,
            suggested_action: String::new(),
            evidence: vec![],
            legacy_reasons: vec![],
        }
    }

    fn node(graph: &mut DependencyGraph, id: &str) {
        graph.add_node(
            id,
            NodeAttributes {
                node_type: ItemType::File,
                risk_score: 0.0,
                size_kb: 0.0,
            },
        );
    }

    #[test]
    fn test_risk_table() {
        let t = RiskThresholds::default();
        assert_eq!(classify_risk(0.1, 0, &t), RiskCategory::Safe);
        assert_eq!(classify_risk(0.1, 1, &t), RiskCategory::Caution);
        assert_eq!(classify_risk(0.9, 2, &t), RiskCategory::Caution);
        assert_eq!(classify_risk(0.5, 7, &t), RiskCategory::Caution);
        assert_eq!(classify_risk(0.9, 3, &t), RiskCategory::Risky);
    }

    #[test]
    fn test_action_table() {
        use RecommendedAction::*;
        assert_eq!(recommend_action(RiskCategory::Safe, 0, 0.0), RemoveImmediately);
        assert_eq!(recommend_action(RiskCategory::Caution, 0, 0.0), Archive);
        assert_eq!(recommend_action(RiskCategory::Caution, 2, 0.0), ReviewRequired);
        assert_eq!(recommend_action(RiskCategory::Risky, 5, 90.0), MigrationRequired);
        assert_eq!(recommend_action(RiskCategory::Risky, 5, 80.0), ReviewRequired);
    }

    #[test]
    fn test_impact_score_weights() {
        assert!((impact_score(1.0, 0, 100.0) - 0.4).abs() < 1e-9);
        assert!((impact_score(0.0, 20, 100.0) - 0.3).abs() < 1e-9);
        assert!((impact_score(1.0, 20, 0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_effort_and_confidence() {
        assert_eq!(
            estimate_effort(ItemType::Library, RecommendedAction::MigrationRequired, 3, 5),
            16 + 6 + 10 + 4
        );
        assert_eq!(
            estimate_effort(ItemType::Directory, RecommendedAction::Archive, 0, 0),
            2
        );
        assert!((confidence_level(ItemType::File, 0, 100.0) - 0.8).abs() < 1e-9);
        assert!((confidence_level(ItemType::Directory, 9, 0.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_rollback_labels() {
        assert_eq!(rollback_complexity(0), "Simple - Git revert");
        assert_eq!(rollback_complexity(3), "Moderate - May need dependency restoration");
        assert_eq!(rollback_complexity(4), "Complex - Requires careful dependency restoration");
    }

    #[test]
    fn test_indirect_dependencies_respect_depth() {
        let mut graph = DependencyGraph::new();
        for id in ["a", "b", "c", "d", "e"] {
            node(&mut graph, id);
        }
        graph.add_edge("a", "b", EdgeType::CodeDependency);
        graph.add_edge("b", "c", EdgeType::CodeDependency);
        graph.add_edge("c", "d", EdgeType::CodeDependency);
        graph.add_edge("d", "e", EdgeType::CodeDependency);
        graph.add_edge("c", "a", EdgeType::CodeDependency);

        assert_eq!(indirect_dependencies(&graph, "a", 3), vec!["b", "c", "d"]);
        assert_eq!(indirect_dependencies(&graph, "a", 1), vec!["b"]);
    }

    #[test]
    fn test_migration_steps_only_for_migration() {
        let lib = item(ItemType::Library, "package.json:moment", "moment", 0.9);
        assert!(migration_steps(&lib, RecommendedAction::Archive).is_empty());
        let steps = migration_steps(&lib, RecommendedAction::MigrationRequired);
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0], "Identify modern replacement for moment");
        assert_eq!(steps[4], "Remove moment from dependencies");
    }

    #[test]
    fn test_build_impact_labels() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("tsconfig.json"), r#"{"include": ["src/legacy"]}"#).unwrap();

        let dir = item(ItemType::Directory, "src/legacy", "legacy", 0.5);
        let other = item(ItemType::Directory, "old", "old", 0.5);
        let config = item(ItemType::Config, "Gruntfile.js", "Gruntfile.js", 0.8);
        let lib = item(ItemType::Library, "package.json:moment", "moment", 0.8);

        assert_eq!(build_impact(temp.path(), &dir), "HIGH - Referenced in build configuration");
        assert_eq!(build_impact(temp.path(), &other), "LOW - No build references found");
        assert_eq!(build_impact(temp.path(), &config), "HIGH - Build configuration file");
        assert_eq!(build_impact(temp.path(), &lib), "MEDIUM - May affect dependency resolution");
    }

    #[test]
    fn test_unused_library_with_lenient_threshold_is_safe() {
        let temp = TempDir::new().unwrap();
        let lib = item(ItemType::Library, "package.json:moment", "moment", 1.0);
        let mut graph = DependencyGraph::new();
        node(&mut graph, &lib.path);

        let thresholds = RiskThresholds {
            safe_removal: 1.0,
            caution_zone: 1.0,
        };
        let config = AssessmentConfig::default();
        let assessment = ImpactAssessor::new(temp.path(), &config, &thresholds).assess(&lib, &graph);

        assert_eq!(assessment.risk_category, RiskCategory::Safe);
        assert_eq!(assessment.recommended_action, RecommendedAction::RemoveImmediately);
        assert!(assessment.dependents.is_empty());
        assert_eq!(assessment.estimated_effort_hours, 1 + 4);
    }

    #[test]
    fn test_dependents_push_item_out_of_safe() {
        let temp = TempDir::new().unwrap();
        let lib = item(ItemType::Library, "package.json:moment", "moment", 0.1);
        let mut graph = DependencyGraph::new();
        node(&mut graph, &lib.path);
        node(&mut graph, "src/app.js");
        graph.add_edge("src/app.js", &lib.path, EdgeType::ImportDependency);

        let assessment = assess(&lib, &graph, temp.path(), &DecruftConfig::default());
        assert_eq!(assessment.risk_category, RiskCategory::Caution);
        assert_eq!(assessment.recommended_action, RecommendedAction::ReviewRequired);
        assert_eq!(assessment.dependents, vec!["src/app.js"]);
        assert_eq!(assessment.rollback_complexity, "Moderate - May need dependency restoration");
    }

    #[test]
    fn test_summary_counts() {
        let temp = TempDir::new().unwrap();
        let items = vec![
            item(ItemType::File, "a.js", "a.js", 0.1),
            item(ItemType::File, "b.js", "b.js", 0.5),
        ];
        let mut graph = DependencyGraph::new();
        node(&mut graph, "a.js");
        node(&mut graph, "b.js");
        let config = AssessmentConfig::default();
        let thresholds = RiskThresholds::default();
        let assessments = ImpactAssessor::new(temp.path(), &config, &thresholds).assess_all(&items, &graph);

        let summary = AssessmentSummary::from_assessments(&assessments);
        assert_eq!(summary.safe_removals, 1);
        assert_eq!(summary.caution_items, 1);
        assert_eq!(summary.risky_items, 0);
        assert_eq!(summary.total_effort_hours, 1 + 2);
        assert!((summary.average_confidence - 0.6).abs() < 1e-9);
    }
}
