pub mod alias;
pub mod llm_classifier;
pub mod pass;

use async_trait::async_trait;

use crate::error::ClassificationError;

pub use alias::{AliasConflict, AliasGroup, AliasMap};
pub use llm_classifier::LlmAliasClassifier;
pub use pass::{
    apply_alias_map, AliasBuildReport, BatchFailure, CanonicalizationResult, Canonicalizer,
    RewriteStats,
};

/// Groups a batch of entity names into aliases of a canonical name.
///
/// The answer is advisory: groups are only ever taken as evidence that
/// names match, and names left out of every group stay as they are.
#[async_trait]
pub trait AliasClassifier: Send + Sync {
    async fn classify(&self, names: &[String]) -> Result<Vec<AliasGroup>, ClassificationError>;
}
