//! Configuration management
//!
//! Defaults, TOML file loading, and environment overrides

use crate::error::{ErrorContext, ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub repository: RepositoryTarget,
    pub github: GitHubConfig,
    pub llm: LlmConfig,
    pub tree: TreeConfig,
    pub pipeline: PipelineConfig,
}

/// Which repository to analyze
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryTarget {
    pub owner: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    /// Personal access token; never written back to disk
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
            timeout_seconds: 30,
            user_agent: "codeprobe/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.1,
            max_tokens: Some(4096),
        }
    }
}

impl LlmConfig {
    /// Whether enough is configured to build a client
    pub fn is_usable(&self) -> bool {
        self.enabled && (self.api_key.is_some() || self.provider == "ollama")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub recursive: bool,
    pub max_depth: usize,
    /// Directory listings in flight at once
    pub concurrency: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 3,
            concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Timeout applied to every individual collaborator call
    pub call_timeout_secs: u64,
    /// Deadline for the whole run
    pub run_timeout_secs: u64,
    /// Manifest fetches in flight at once
    pub fetch_concurrency: usize,
    /// Whether issues and pull requests are collected
    pub include_issues: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 30,
            run_timeout_secs: 600,
            fetch_concurrency: 8,
            include_issues: true,
        }
    }
}

impl ProbeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ProbeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ProbeError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: ProbeConfig = toml::from_str(&content).map_err(|e| ProbeError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file (secrets are omitted)
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ProbeResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ProbeError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| ProbeError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(owner) = get("REPOSITORY_OWNER") {
            self.repository.owner = Some(owner);
        }
        if let Some(name) = get("REPOSITORY_NAME") {
            self.repository.name = Some(name);
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(url) = get("GITHUB_API_URL") {
            self.github.api_url = url;
        }
        if let Some(provider) = get("CODEPROBE_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(model) = get("CODEPROBE_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(base_url) = get("CODEPROBE_LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }
        if self.llm.api_key.is_none() {
            let key_var = match self.llm.provider.as_str() {
                "anthropic" => Some("ANTHROPIC_API_KEY"),
                "groq" => Some("GROQ_API_KEY"),
                "ollama" => None,
                _ => Some("OPENAI_API_KEY"),
            };
            self.llm.api_key = key_var.and_then(get);
        }
    }

    /// Validate configuration; failures here are initialization errors
    pub fn validate(&self) -> ProbeResult<()> {
        if self.repository.owner.is_none() || self.repository.name.is_none() {
            return Err(ProbeError::Config {
                message: "Repository owner and name are required".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Pass --owner and --repo")
                    .with_suggestion("Or set REPOSITORY_OWNER and REPOSITORY_NAME"),
            });
        }

        if self.github.token.is_none() {
            return Err(ProbeError::Authentication {
                message: "GitHub token is required".to_string(),
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set the GITHUB_TOKEN environment variable"),
            });
        }

        for (field, value) in [
            ("github.api_url", Some(self.github.api_url.as_str())),
            ("llm.base_url", self.llm.base_url.as_deref()),
        ] {
            let Some(value) = value else { continue };
            if let Err(e) = url::Url::parse(value) {
                return Err(ProbeError::Validation {
                    message: format!("Invalid URL '{}': {}", value, e),
                    field: Some(field.to_string()),
                    context: ErrorContext::new("config").with_operation("validate"),
                });
            }
        }

        if self.pipeline.call_timeout_secs == 0 || self.pipeline.run_timeout_secs == 0 {
            return Err(ProbeError::Config {
                message: "Pipeline timeouts must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set pipeline.call_timeout_secs and run_timeout_secs"),
            });
        }

        if self.tree.concurrency == 0 || self.pipeline.fetch_concurrency == 0 {
            return Err(ProbeError::Config {
                message: "Concurrency limits must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set tree.concurrency and pipeline.fetch_concurrency"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("REPOSITORY_OWNER", "octo"),
            ("REPOSITORY_NAME", "hello"),
            ("GITHUB_TOKEN", "ghp_x"),
            ("OPENAI_API_KEY", "sk-x"),
        ]);
        let mut config = ProbeConfig::default();
        config.apply_env_from(|k| vars.get(k).cloned());

        assert_eq!(config.repository.owner.as_deref(), Some("octo"));
        assert_eq!(config.repository.name.as_deref(), Some("hello"));
        assert_eq!(config.github.token.as_deref(), Some("ghp_x"));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-x"));
        assert!(config.llm.is_usable());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let vars = env(&[("GITHUB_TOKEN", "  ")]);
        let mut config = ProbeConfig::default();
        config.apply_env_from(|k| vars.get(k).cloned());
        assert!(config.github.token.is_none());
    }

    #[test]
    fn test_validate_requires_identity_and_token() {
        let mut config = ProbeConfig::default();
        assert!(matches!(config.validate(), Err(ProbeError::Config { .. })));

        config.repository.owner = Some("octo".to_string());
        config.repository.name = Some("hello".to_string());
        assert!(matches!(
            config.validate(),
            Err(ProbeError::Authentication { .. })
        ));

        config.github.token = Some("t".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_urls() {
        let mut config = ProbeConfig::default();
        config.repository.owner = Some("octo".to_string());
        config.repository.name = Some("hello".to_string());
        config.github.token = Some("t".to_string());
        config.github.api_url = "not a url".to_string();

        match config.validate() {
            Err(ProbeError::Validation { field, .. }) => {
                assert_eq!(field.as_deref(), Some("github.api_url"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ProbeConfig = toml::from_str(
            r#"
            [tree]
            max_depth = 1

            [llm]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.tree.max_depth, 1);
        assert!(config.tree.recursive);
        assert!(!config.llm.enabled);
        assert_eq!(config.github.api_url, "https://api.github.com");
    }

    #[test]
    fn test_save_and_load_round_trip_drops_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codeprobe.toml");

        let mut config = ProbeConfig::default();
        config.github.token = Some("secret".to_string());
        config.tree.max_depth = 5;
        config.save_to_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));

        let loaded = ProbeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.tree.max_depth, 5);
        assert!(loaded.github.token.is_none());
    }
}
