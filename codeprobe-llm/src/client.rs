//! LLM client construction using siumai

use codeprobe_core::{ErrorContext, LlmConfig, ProbeError, ProbeResult};
use siumai::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Chat client for the configured provider
pub struct ProbeLlmClient {
    client: Box<dyn LlmClient>,
    config: LlmConfig,
}

impl ProbeLlmClient {
    pub async fn new(config: LlmConfig) -> ProbeResult<Self> {
        let client = Self::build_client(&config).await?;

        info!(
            "Created LLM client for provider: {} with model: {}",
            config.provider, config.model
        );

        Ok(Self { client, config })
    }

    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn build_client(config: &LlmConfig) -> ProbeResult<Box<dyn LlmClient>> {
        match config.provider.as_str() {
            "openai" => {
                let api_key = required_key(config)?;
                let mut builder = LlmBuilder::new()
                    .openai()
                    .api_key(api_key)
                    .model(&config.model)
                    .temperature(config.temperature);

                if let Some(max_tokens) = config.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }
                if let Some(base_url) = &config.base_url {
                    builder = builder.base_url(base_url);
                }

                let client = builder
                    .build()
                    .await
                    .map_err(|e| build_error(config, &e.to_string()))?;
                Ok(Box::new(client))
            }
            "anthropic" => {
                let api_key = required_key(config)?;
                let mut builder = LlmBuilder::new()
                    .anthropic()
                    .api_key(api_key)
                    .model(&config.model)
                    .temperature(config.temperature);

                if let Some(max_tokens) = config.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }

                let client = builder
                    .build()
                    .await
                    .map_err(|e| build_error(config, &e.to_string()))?;
                Ok(Box::new(client))
            }
            "ollama" => {
                let base_url = config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "http://localhost:11434".to_string());

                let mut builder = LlmBuilder::new()
                    .ollama()
                    .model(&config.model)
                    .base_url(&base_url)
                    .temperature(config.temperature);

                if let Some(max_tokens) = config.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }

                let client = builder
                    .build()
                    .await
                    .map_err(|e| build_error(config, &e.to_string()))?;
                Ok(Box::new(client))
            }
            "groq" => {
                let api_key = required_key(config)?;
                let mut builder = LlmBuilder::new()
                    .groq()
                    .api_key(api_key)
                    .model(&config.model)
                    .temperature(config.temperature);

                if let Some(max_tokens) = config.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }

                let client = builder
                    .build()
                    .await
                    .map_err(|e| build_error(config, &e.to_string()))?;
                Ok(Box::new(client))
            }
            provider => Err(unsupported_provider(provider)),
        }
    }

    /// Send a system and user message, returning the text of the reply
    pub async fn generate_with_system(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> ProbeResult<String> {
        let start_time = Instant::now();
        let messages = vec![system!(system_prompt), user!(user_message)];

        debug!("Generating response with {} messages", messages.len());

        let response = self
            .client
            .chat(messages)
            .await
            .map_err(|e| self.llm_error(format!("LLM generation failed: {}", e)))?;

        match response.content_text() {
            Some(content) => {
                info!(
                    "Generated response in {:?} ({} chars)",
                    start_time.elapsed(),
                    content.len()
                );
                Ok(content.to_string())
            }
            None => Err(self.llm_error("No text content in LLM response".to_string())),
        }
    }

    fn llm_error(&self, message: String) -> ProbeError {
        ProbeError::Llm {
            message,
            provider: Some(self.config.provider.clone()),
            model: Some(self.config.model.clone()),
            context: ErrorContext::new("llm_client").with_operation("chat"),
        }
    }
}

fn required_key(config: &LlmConfig) -> ProbeResult<&str> {
    config
        .api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ProbeError::Config {
            message: format!("API key not found for provider '{}'", config.provider),
            source: None,
            context: ErrorContext::new("llm_client")
                .with_operation("build_client")
                .with_suggestion("Set the provider API key environment variable")
                .with_suggestion("Or run with --no-llm"),
        })
}

fn build_error(config: &LlmConfig, cause: &str) -> ProbeError {
    ProbeError::Llm {
        message: format!("Failed to build {} client: {}", config.provider, cause),
        provider: Some(config.provider.clone()),
        model: Some(config.model.clone()),
        context: ErrorContext::new("llm_client").with_operation("build_client"),
    }
}

fn unsupported_provider(provider: &str) -> ProbeError {
    ProbeError::Config {
        message: format!("Unsupported LLM provider: {}", provider),
        source: None,
        context: ErrorContext::new("llm_client")
            .with_operation("build_client")
            .with_metadata("provider", provider)
            .with_suggestion("Use one of: openai, anthropic, ollama, groq"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            api_key: api_key.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unsupported_provider_is_a_config_error() {
        let result = ProbeLlmClient::new(config("carrier-pigeon", Some("k"))).await;
        assert!(matches!(result, Err(ProbeError::Config { .. })));
    }

    #[tokio::test]
    async fn test_missing_key_is_a_config_error() {
        for provider in ["openai", "anthropic", "groq"] {
            let result = ProbeLlmClient::new(config(provider, None)).await;
            assert!(matches!(result, Err(ProbeError::Config { .. })), "{}", provider);
        }
        let result = ProbeLlmClient::new(config("openai", Some("   "))).await;
        assert!(matches!(result, Err(ProbeError::Config { .. })));
    }
}
