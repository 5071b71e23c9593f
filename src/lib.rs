// Expose modules as public for use by other crates
pub mod canonicalize;
pub mod error;
pub mod extraction;
pub mod graph;
pub mod input;
pub mod prompt;

// Re-export core types for convenience
pub use canonicalize::{AliasClassifier, AliasGroup, AliasMap, Canonicalizer};
pub use error::{ClassificationError, ExtractionError, GraphIoError};
pub use extraction::{ExtractionPipeline, Passage, RelationExtractor};
pub use graph::{ExportedGraph, KnowledgeGraph, Triple};
