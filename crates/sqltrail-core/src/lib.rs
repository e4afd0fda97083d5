pub mod aggregate;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod qualify;
pub mod tokenizer;
pub mod types;

// Re-export main types and functions
pub use aggregate::{LineageMap, LineagePair, TargetLineage};
pub use error::TokenizeError;
pub use extractor::{extract, extract_execution};
pub use graph::{build_graph, GraphEdge, GraphNode, LineageGraph, LiveCatalog, NodeCategory};
pub use qualify::qualify;
pub use tokenizer::{tokenize, SqlToken};
pub use types::{CatalogObject, Dialect, ObjectKind, QueryExecution, StatementLineage};
