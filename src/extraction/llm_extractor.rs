use async_trait::async_trait;
use reqwest::Client;

use super::RelationExtractor;
use crate::error::ExtractionError;
use crate::graph::Triple;
use crate::prompt::extraction_prompt::build_extraction_prompt;
use crate::prompt::llm_integration::{build_client, query_llm, LlmConfig};
use crate::prompt::response::parse_triples;

/// Relation extractor backed by a chat-completion model
pub struct LlmExtractor {
    config: LlmConfig,
    client: Client,
}

impl LlmExtractor {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        tracing::info!(
            "Relation extraction via {} ({})",
            config.provider,
            config.model
        );
        Ok(Self {
            config,
            client: build_client()?,
        })
    }
}

#[async_trait]
impl RelationExtractor for LlmExtractor {
    async fn extract(&self, text: &str, context: &str) -> Result<Vec<Triple>, ExtractionError> {
        let prompt = build_extraction_prompt(text, context);
        let response = query_llm(&self.client, &prompt, &self.config).await?;
        parse_triples(&response)
    }
}
