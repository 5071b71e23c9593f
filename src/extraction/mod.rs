pub mod llm_extractor;
pub mod pipeline;

use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::graph::Triple;

pub use llm_extractor::LlmExtractor;
pub use pipeline::{ExtractionPipeline, ExtractionReport, PassageFailure, ProgressSnapshot};

/// One unit of input text with its position in the input sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub index: usize,
    pub text: String,
}

impl Passage {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Turns one passage into subject-relation-object triples.
///
/// Implementations own their retry policy; the pipeline calls each passage
/// exactly once.
#[async_trait]
pub trait RelationExtractor: Send + Sync {
    async fn extract(&self, text: &str, context: &str) -> Result<Vec<Triple>, ExtractionError>;
}
