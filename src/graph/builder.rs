use std::path::Path;

use super::{DependencyGraph, EdgeType, NodeAttributes};
use crate::config::DetectionConfig;
use crate::detection::usage::{extract_import_specifiers, normalize_specifier, specifier_stem, UsageMatcher};
use crate::detection::{ItemType, LegacyItem};
use crate::io::{read_text, relative_path, RepoWalker};
use crate::observability::{set_current_item, set_phase, PipelinePhase};

/// Specifiers shorter than this match nearly every path.
const MIN_SPECIFIER_LEN: usize = 2;

struct SourceFile {
    rel: String,
    content: String,
    size_kb: f64,
    /// Normalized import specifiers
    specifiers: Vec<String>,
}

impl SourceFile {
    fn is_within(&self, item: &LegacyItem) -> bool {
        match item.item_type {
            ItemType::Library => false,
            _ => {
                self.rel == item.path
                    || self
                        .rel
                        .strip_prefix(item.path.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

/// Build the graph for `items` by scanning the source files under `root`.
pub fn build(root: &Path, items: &[LegacyItem], config: &DetectionConfig) -> DependencyGraph {
    build_with_exclusions(root, items, config, &[])
}

/// [`build`] with extra excluded paths, such as the run output directory.
pub fn build_with_exclusions(
    root: &Path,
    items: &[LegacyItem],
    config: &DetectionConfig,
    extra_excluded: &[String],
) -> DependencyGraph {
    let _phase = set_phase(PipelinePhase::GraphBuilding);
    let mut graph = DependencyGraph::new();

    for item in items {
        graph.add_node(
            &item.path,
            NodeAttributes {
                node_type: item.item_type,
                risk_score: item.risk_score,
                size_kb: item.size_kb,
            },
        );
    }

    let sources = load_sources(root, config, extra_excluded);
    add_item_imports(&mut graph, items, &sources);
    add_file_references(&mut graph, items, &sources);
    add_config_references(&mut graph, root, items);

    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "dependency graph built"
    );
    graph
}

fn load_sources(root: &Path, config: &DetectionConfig, extra_excluded: &[String]) -> Vec<SourceFile> {
    RepoWalker::new(root)
        .with_excluded(&config.excluded_paths)
        .with_excluded(extra_excluded)
        .with_extensions(&config.scan_file_types)
        .files()
        .into_iter()
        .filter_map(|path| {
            let content = read_text(&path)?;
            let size_kb = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0) as f64 / 1024.0;
            let specifiers = extract_import_specifiers(&content)
                .iter()
                .map(|s| normalize_specifier(s))
                .filter(|s| s.len() >= MIN_SPECIFIER_LEN)
                .collect();
            Some(SourceFile {
                rel: relative_path(root, &path),
                content,
                size_kb,
                specifiers,
            })
        })
        .collect()
}

/// File and directory items referencing other items through their own imports.
fn add_item_imports(graph: &mut DependencyGraph, items: &[LegacyItem], sources: &[SourceFile]) {
    for item in items
        .iter()
        .filter(|i| matches!(i.item_type, ItemType::File | ItemType::Directory))
    {
        let _item = set_current_item(&item.path);
        let mut specifiers: Vec<&str> = sources
            .iter()
            .filter(|f| f.is_within(item))
            .flat_map(|f| f.specifiers.iter().map(String::as_str))
            .collect();
        specifiers.sort_unstable();
        specifiers.dedup();

        for spec in specifiers {
            for other in items.iter().filter(|o| o.path != item.path) {
                if other.path.contains(spec) || other.name.contains(spec) {
                    graph.add_edge(&item.path, &other.path, EdgeType::CodeDependency);
                }
            }
        }
    }
}

/// Repository files that import a library or mention an item.
fn add_file_references(graph: &mut DependencyGraph, items: &[LegacyItem], sources: &[SourceFile]) {
    let matchers: Vec<Option<UsageMatcher>> = items
        .iter()
        .map(|item| item.ecosystem().map(|eco| UsageMatcher::new(eco, &item.name)))
        .collect();

    for file in sources {
        for (item, matcher) in items.iter().zip(&matchers) {
            if file.is_within(item) {
                continue;
            }
            let edge = match (item.item_type, matcher) {
                (ItemType::Library, Some(m)) => (m.applies_to(Path::new(&file.rel))
                    && m.is_match(&file.content))
                .then_some(EdgeType::ImportDependency),
                (ItemType::Library, None) => None,
                _ => references_item(file, item).then_some(EdgeType::CodeDependency),
            };
            if let Some(edge) = edge {
                graph.add_node(
                    &file.rel,
                    NodeAttributes {
                        node_type: ItemType::File,
                        risk_score: 0.0,
                        size_kb: file.size_kb,
                    },
                );
                graph.add_edge(&file.rel, &item.path, edge);
            }
        }
    }
}

fn references_item(file: &SourceFile, item: &LegacyItem) -> bool {
    if file.content.contains(item.path.as_str()) {
        return true;
    }
    match item.item_type {
        ItemType::Directory => file
            .specifiers
            .iter()
            .any(|s| s.split('/').any(|segment| segment == item.name)),
        _ => {
            let stem = Path::new(&item.name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(item.name.as_str());
            !stem.is_empty() && file.specifiers.iter().any(|s| specifier_stem(s) == stem)
        }
    }
}

/// Config items whose text names another item's path.
fn add_config_references(graph: &mut DependencyGraph, root: &Path, items: &[LegacyItem]) {
    for config in items.iter().filter(|i| i.item_type == ItemType::Config) {
        let Some(content) = read_text(&root.join(&config.path)) else {
            continue;
        };
        for other in items.iter().filter(|o| o.path != config.path) {
            if content.contains(other.path.as_str()) {
                graph.add_edge(&config.path, &other.path, EdgeType::ConfigDependency);
            }
        }
    }
}
