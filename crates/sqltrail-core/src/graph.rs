//! Graph rendering of a consolidated lineage map.
//!
//! Nodes are restricted to objects that exist in a live catalog snapshot, so
//! references to since-dropped tables never clutter the picture. Output is
//! Graphviz DOT with nodes grouped into warehouse-layer buckets that each get
//! their own fill color.

use crate::qualify::qualify;
use crate::types::{CatalogObject, ObjectKind};
use crate::LineageMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
#[cfg(feature = "tracing")]
use tracing::debug;

/// The set of currently existing tables and stages, held in qualified form so
/// membership tests line up with extractor output.
#[derive(Debug, Clone, Default)]
pub struct LiveCatalog {
    tables: HashSet<String>,
    stages: Vec<String>,
}

impl LiveCatalog {
    pub fn from_objects(objects: impl IntoIterator<Item = CatalogObject>) -> Self {
        let mut catalog = Self::default();
        for obj in objects {
            match obj.kind {
                ObjectKind::Table => {
                    catalog
                        .tables
                        .insert(qualify(&obj.database, &obj.schema, &obj.name));
                }
                ObjectKind::Stage => {
                    let name = format!("@{}", obj.name);
                    catalog
                        .stages
                        .push(qualify(&obj.database, &obj.schema, &name));
                }
            }
        }
        catalog
    }

    /// Whether a qualified reference resolves to a live object.
    ///
    /// Stage references carry arbitrary path suffixes (`@STG/2024/x.csv`),
    /// so stages match by prefix with the closing quote ignored.
    pub fn contains(&self, name: &str) -> bool {
        if name.starts_with('@') || name.starts_with("\"@") {
            self.stages
                .iter()
                .any(|stage| name.starts_with(stage.trim_end_matches('"')))
        } else {
            self.tables.contains(name)
        }
    }
}

/// Warehouse layer a node belongs to, decided from its display label.
/// Declaration order is render order in the DOT output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    External,
    Staging,
    Raw,
    Dimension,
    Fact,
    Aggregate,
    Other,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 7] = [
        NodeCategory::External,
        NodeCategory::Staging,
        NodeCategory::Raw,
        NodeCategory::Dimension,
        NodeCategory::Fact,
        NodeCategory::Aggregate,
        NodeCategory::Other,
    ];

    fn classify(label: &str) -> Self {
        if label.starts_with('@') {
            NodeCategory::External
        } else if label.ends_with("STAGING") {
            NodeCategory::Staging
        } else if label.ends_with("RAW") {
            NodeCategory::Raw
        } else if label.ends_with("CORE") && label.starts_with("DIM_") {
            NodeCategory::Dimension
        } else if label.ends_with("CORE") && label.starts_with("FACT_") {
            NodeCategory::Fact
        } else if label.ends_with("CORE") && label.starts_with("AGG_") {
            NodeCategory::Aggregate
        } else {
            NodeCategory::Other
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            NodeCategory::External => "#D7CCC8",
            NodeCategory::Staging => "#FFECB3",
            NodeCategory::Raw => "#DCEDC8",
            NodeCategory::Dimension => "#B2EBF2",
            NodeCategory::Fact => "#C5CAE9",
            NodeCategory::Aggregate => "#E1BEE7",
            NodeCategory::Other => "#B388FF",
        }
    }
}

/// A renderable node: the qualified name it came from plus the two-line
/// display label (`OBJECT\nSchema: SCHEMA`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub name: String,
    pub label: String,
    pub category: NodeCategory,
}

/// One directed dependency, source feeding target, both as display labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Strips qualification down to the display label, keeping the `@` marker for
/// stage references. Names shorter than three parts keep whatever they have.
fn node_label(name: &str) -> String {
    let stage = name.starts_with('@') || name.starts_with("\"@");
    let bare = name.trim_start_matches('@');
    let parts: Vec<&str> = bare.split('.').collect();
    let object = parts.get(2).or_else(|| parts.last()).copied().unwrap_or("").trim_matches('"');
    let schema = parts.get(1).copied().unwrap_or("").trim_matches('"');
    let marker = if stage { "@" } else { "" };
    format!("{marker}{object}\\nSchema: {schema}")
}

/// Builds the node and edge lists for every lineage entry whose endpoints are
/// both live. A target with no live sources still contributes its node.
pub fn build_graph(map: &LineageMap, catalog: &LiveCatalog) -> LineageGraph {
    let mut graph = LineageGraph::default();
    let mut seen: HashSet<String> = HashSet::new();
    for (target, entry) in map.iter() {
        if !catalog.contains(target) {
            #[cfg(feature = "tracing")]
            debug!(target_name = target, "skipping dropped target");
            continue;
        }
        let target_label = node_label(target);
        if seen.insert(target.to_string()) {
            graph.nodes.push(GraphNode {
                name: target.to_string(),
                label: target_label.clone(),
                category: NodeCategory::classify(&target_label),
            });
        }
        for source in &entry.sources {
            if !catalog.contains(source) {
                continue;
            }
            let source_label = node_label(source);
            if seen.insert(source.clone()) {
                graph.nodes.push(GraphNode {
                    name: source.clone(),
                    label: source_label.clone(),
                    category: NodeCategory::classify(&source_label),
                });
            }
            graph.edges.push(GraphEdge {
                source: source_label,
                target: target_label.clone(),
            });
        }
    }
    graph
}

impl LineageGraph {
    /// Renders the graph as Graphviz DOT, left-to-right, with one node block
    /// per category so the fill color applies to the whole layer.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph G {\n\n");
        dot.push_str("  graph [ rankdir=\"LR\" bgcolor=\"#ffffff\" ]\n");
        for category in NodeCategory::ALL {
            let _ = writeln!(
                dot,
                "  node [ style=\"filled\" shape=\"record\" color=\"{}\" ]",
                category.color()
            );
            for node in self.nodes.iter().filter(|n| n.category == category) {
                let _ = writeln!(dot, "  \"{}\";", node.label);
            }
        }
        dot.push_str("  edge [ penwidth=\"2\" color=\"#696969\" dir=\"forward\" ]\n\n");
        for edge in &self.edges {
            let _ = writeln!(
                dot,
                "  \"{}\" -> \"{}\" [ style=\"solid\" ];",
                edge.source, edge.target
            );
        }
        dot.push('}');
        dot
    }
}
