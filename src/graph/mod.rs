pub mod export;
pub mod knowledge_graph;
pub mod relationship;

// Re-export the graph types for convenience
pub use crate::graph::export::{ExportedGraph, ExportedLink, ExportedNode};
pub use crate::graph::knowledge_graph::KnowledgeGraph;
pub use crate::graph::relationship::{LabeledEdge, Triple};
