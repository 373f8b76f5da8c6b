use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::write_json;
use crate::assessment::{AssessmentSummary, ImpactAssessment};
use crate::errors::Result;
use crate::graph::{DependencyGraph, GraphStats};

/// Contents of `impact-assessment-report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub assessment_date: DateTime<Utc>,
    pub total_items_assessed: usize,
    pub summary: AssessmentSummary,
    pub assessments: Vec<ImpactAssessment>,
    pub dependency_graph: GraphStats,
}

impl AssessmentReport {
    pub fn new(assessments: Vec<ImpactAssessment>, graph: &DependencyGraph) -> Self {
        Self {
            assessment_date: Utc::now(),
            total_items_assessed: assessments.len(),
            summary: AssessmentSummary::from_assessments(&assessments),
            assessments,
            dependency_graph: graph.stats(),
        }
    }
}

pub fn write_assessment_report(path: &Path, report: &AssessmentReport) -> Result<()> {
    write_json(path, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, NodeAttributes};
    use crate::detection::ItemType;
    use tempfile::TempDir;

    #[test]
    fn test_report_carries_graph_stats() {
        let mut graph = DependencyGraph::new();
        let attrs = NodeAttributes {
            node_type: ItemType::File,
            risk_score: 0.5,
            size_kb: 1.0,
        };
        graph.add_node("a.js", attrs.clone());
        graph.add_node("b.js", attrs.clone());
        graph.add_node("c.js", attrs);
        graph.add_edge("a.js", "b.js", EdgeType::ImportDependency);

        let report = AssessmentReport::new(Vec::new(), &graph);
        assert_eq!(report.total_items_assessed, 0);
        assert_eq!(report.dependency_graph.nodes, 3);
        assert_eq!(report.dependency_graph.edges, 1);
        assert_eq!(report.dependency_graph.connected_components, 2);

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("impact-assessment-report.json");
        write_assessment_report(&path, &report).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["dependency_graph"]["connected_components"], 2);
        assert_eq!(json["summary"]["safe_removals"], 0);
    }
}
