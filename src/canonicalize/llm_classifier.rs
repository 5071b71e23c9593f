use async_trait::async_trait;
use reqwest::Client;

use super::{AliasClassifier, AliasGroup};
use crate::error::ClassificationError;
use crate::prompt::alias_prompt::build_alias_prompt;
use crate::prompt::llm_integration::{build_client, query_llm, LlmConfig};
use crate::prompt::response::parse_alias_groups;

/// Alias classifier backed by a chat-completion model
pub struct LlmAliasClassifier {
    config: LlmConfig,
    client: Client,
}

impl LlmAliasClassifier {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        tracing::info!("Alias classification via {} ({})", config.provider, config.model);
        Ok(Self {
            config,
            client: build_client()?,
        })
    }
}

#[async_trait]
impl AliasClassifier for LlmAliasClassifier {
    async fn classify(&self, names: &[String]) -> Result<Vec<AliasGroup>, ClassificationError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = build_alias_prompt(names);
        let response = query_llm(&self.client, &prompt, &self.config).await?;
        tracing::debug!("Raw classification response: {}", response);
        parse_alias_groups(&response)
    }
}
