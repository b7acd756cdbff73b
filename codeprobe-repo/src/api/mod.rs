//! API clients for accessing remote repositories
//!
//! Direct access to repository content through the hosting provider's REST API,
//! without cloning.

use codeprobe_core::{
    repository_error, ErrorContext, GitHubConfig, ProbeError, ProbeResult, RetryConfig,
};
use std::collections::HashMap;

pub mod github;


pub use github::GitHubApiClient;

/// Configuration for API clients
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Access token for authentication
    pub access_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
    /// Retry policy for recoverable failures
    pub retry: RetryConfig,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            access_token: None,
            timeout_seconds: 30,
            user_agent: "codeprobe/0.1".to_string(),
            headers: HashMap::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl ApiClientConfig {
    /// Create a new configuration for GitHub
    pub fn github(access_token: Option<String>) -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            access_token,
            ..Default::default()
        }
    }

    /// Build from the `[github]` section of the application config
    pub fn from_github_config(config: &GitHubConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            access_token: config.token.clone(),
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
            ..Default::default()
        }
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &ApiClientConfig) -> ProbeResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            repository_error!(format!("Invalid user agent: {}", e), "http_client", e)
        })?,
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            repository_error!(
                format!("Invalid header name '{}': {}", key, e),
                "http_client",
                e
            )
        })?;

        let header_value = reqwest::header::HeaderValue::from_str(value).map_err(|e| {
            repository_error!(
                format!("Invalid header value for '{}': {}", key, e),
                "http_client",
                e
            )
        })?;

        headers.insert(header_name, header_value);
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| {
            repository_error!(format!("Failed to create HTTP client: {}", e), "http_client", e)
        })?;

    Ok(client)
}

/// Map a non-success HTTP response to an error.
///
/// Server errors become recoverable [`ProbeError::Network`] errors, exhausted
/// rate limits become [`ProbeError::RateLimit`], anything else is a
/// [`ProbeError::Repository`] error with a status-specific suggestion.
pub(crate) async fn handle_response_error(response: reqwest::Response, context: &str) -> ProbeError {
    let status = response.status();
    let url = response.url().clone();
    let rate_limited = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "0")
        .unwrap_or(false);
    let retry_after_ms = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|secs| secs * 1000);

    let error_body = response.text().await.unwrap_or_default();
    let message = format!(
        "HTTP {} error for {}: {}",
        status.as_u16(),
        url,
        if error_body.is_empty() {
            status.canonical_reason().unwrap_or("Unknown error")
        } else {
            &error_body
        }
    );

    if status.is_server_error() {
        return ProbeError::Network {
            message,
            source: None,
            context: ErrorContext::new("api_client")
                .with_operation(context)
                .with_suggestion("The API is unavailable, try again later"),
        };
    }

    if status.as_u16() == 429 || (status.as_u16() == 403 && rate_limited) {
        return ProbeError::RateLimit {
            message,
            retry_after_ms,
            context: ErrorContext::new("api_client")
                .with_operation(context)
                .with_suggestion("Wait for the rate limit window to reset"),
        };
    }

    ProbeError::Repository {
        message,
        source: None,
        context: ErrorContext::new("api_client")
            .with_operation(context)
            .with_metadata("status", &status.as_u16().to_string())
            .with_suggestion(match status.as_u16() {
                401 => "Check your access token",
                403 => "Check repository permissions",
                404 => "Repository or path not found or not accessible",
                _ => "Check network connectivity and API status",
            }),
    }
}

/// Percent-encode each segment of a repository path, keeping the slashes
pub(crate) fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
