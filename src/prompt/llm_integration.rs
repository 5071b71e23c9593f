use anyhow::{Context, Result};
use clap::ValueEnum;
use reqwest::Client;
use serde_json::Value;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const MAX_RETRIES: u32 = 3;

/// Supported chat-completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmProvider {
    #[value(name = "openrouter")]
    OpenRouter,
    #[value(name = "openai")]
    OpenAI,
    /// Google's OpenAI-compatible endpoint
    #[value(alias = "google")]
    Gemini,
    /// Local Ollama server, no API key
    Ollama,
    /// Offline provider that answers every prompt with an empty JSON array
    Mock,
}

impl LlmProvider {
    fn default_endpoint(&self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "https://openrouter.ai/api/v1/chat/completions",
            LlmProvider::OpenAI => "https://api.openai.com/v1/chat/completions",
            LlmProvider::Gemini => {
                "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
            }
            LlmProvider::Ollama => "http://localhost:11434/v1/chat/completions",
            LlmProvider::Mock => "",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "google/gemini-2.0-flash-lite-001",
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Gemini => "gemini-2.0-flash-lite",
            LlmProvider::Ollama => "llama3",
            LlmProvider::Mock => "mock",
        }
    }

    fn api_key_var(&self) -> Option<&'static str> {
        match self {
            LlmProvider::OpenRouter => Some("OPENROUTER_API_KEY"),
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::Gemini => Some("GOOGLE_API_KEY"),
            LlmProvider::Ollama | LlmProvider::Mock => None,
        }
    }
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openrouter" => Ok(LlmProvider::OpenRouter),
            "openai" => Ok(LlmProvider::OpenAI),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "ollama" => Ok(LlmProvider::Ollama),
            "mock" => Ok(LlmProvider::Mock),
            other => Err(anyhow::anyhow!("Unknown LLM provider: {}", other)),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::OpenRouter => write!(f, "openrouter"),
            LlmProvider::OpenAI => write!(f, "openai"),
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::Ollama => write!(f, "ollama"),
            LlmProvider::Mock => write!(f, "mock"),
        }
    }
}

/// Connection settings for one provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub endpoint_url: Option<String>,
}

impl LlmConfig {
    pub fn mock() -> Self {
        Self {
            provider: LlmProvider::Mock,
            model: LlmProvider::Mock.default_model().to_string(),
            api_key: String::new(),
            temperature: 0.0,
            max_tokens: 0,
            endpoint_url: None,
        }
    }

    fn endpoint(&self) -> &str {
        self.endpoint_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }
}

/// Resolve the LLM configuration.
///
/// An explicit provider wins over `LLM_PROVIDER`, which wins over OpenRouter;
/// an unrecognised `LLM_PROVIDER` is an error. A keyed provider without its
/// API key falls back to `Mock`.
pub fn get_llm_config(provider: Option<LlmProvider>, model: Option<&str>) -> Result<LlmConfig> {
    let provider = resolve_provider(provider, env::var("LLM_PROVIDER").ok())?;

    let api_key = provider
        .api_key_var()
        .and_then(|var| env::var(var).ok())
        .unwrap_or_default();

    if provider.api_key_var().is_some() && api_key.is_empty() {
        tracing::warn!(
            "{} not set, using mock provider (no relations or aliases will be produced)",
            provider.api_key_var().unwrap_or_default()
        );
        return Ok(LlmConfig::mock());
    }

    let model = model
        .map(|m| m.to_string())
        .or_else(|| env::var("LLM_MODEL").ok())
        .unwrap_or_else(|| provider.default_model().to_string());

    Ok(LlmConfig {
        model,
        api_key,
        temperature: 0.0,
        max_tokens: 4096,
        endpoint_url: env::var("LLM_ENDPOINT_URL").ok(),
        provider,
    })
}

fn resolve_provider(explicit: Option<LlmProvider>, from_env: Option<String>) -> Result<LlmProvider> {
    match (explicit, from_env) {
        (Some(provider), _) => Ok(provider),
        (None, Some(name)) => name
            .parse::<LlmProvider>()
            .context("Invalid LLM_PROVIDER value"),
        (None, None) => Ok(LlmProvider::OpenRouter),
    }
}

/// Build the HTTP client shared by every call of one port
pub fn build_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(120))
        .build()?;
    Ok(client)
}

/// Send one prompt to the configured provider, retrying transport failures
/// with exponential backoff.
pub async fn query_llm(client: &Client, prompt: &str, config: &LlmConfig) -> Result<String> {
    if config.provider == LlmProvider::Mock {
        return Ok("[]".to_string());
    }

    let body = serde_json::json!({
        "model": config.model,
        "messages": [
            {"role": "system", "content": "You extract structured knowledge and answer only with JSON."},
            {"role": "user", "content": prompt}
        ],
        "temperature": config.temperature,
        "max_tokens": config.max_tokens
    });

    let mut attempt = 0;

    loop {
        attempt += 1;
        tracing::debug!("LLM API call attempt {}/{}", attempt, MAX_RETRIES);

        match try_llm_query(client, config, &body).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= MAX_RETRIES {
                    return Err(anyhow::anyhow!(
                        "Failed after {} attempts: {}",
                        MAX_RETRIES,
                        e
                    ));
                }
                // Exponential backoff
                let backoff = Duration::from_millis(500 * 2u64.pow(attempt - 1));
                tracing::warn!("LLM API call failed: {}. Retrying in {:?}...", e, backoff);
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

async fn try_llm_query(client: &Client, config: &LlmConfig, body: &Value) -> Result<String> {
    let mut request = client
        .post(config.endpoint())
        .header("Content-Type", "application/json")
        .json(body);

    if !config.api_key.is_empty() {
        request = request.bearer_auth(&config.api_key);
    }

    let res = request.send().await?;

    // Check for HTTP errors
    if !res.status().is_success() {
        let status = res.status();
        let error_text = res
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(anyhow::anyhow!("HTTP error {}: {}", status, error_text));
    }

    let json: Value = res.json().await?;
    extract_message_content(&json)
}

fn extract_message_content(json: &Value) -> Result<String> {
    if let Some(choice) = json["choices"].as_array().and_then(|arr| arr.first()) {
        if let Some(msg) = choice["message"]["content"].as_str() {
            return Ok(msg.to_string());
        }
    }

    // Check for error message in the response
    if let Some(message) = json["error"]["message"].as_str() {
        return Err(anyhow::anyhow!("API error: {}", message));
    }

    Err(anyhow::anyhow!("Invalid response format from LLM API"))
}
