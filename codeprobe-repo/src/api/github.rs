//! GitHub API client implementation

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use codeprobe_core::{
    retry_async, validation_error, ContentItem, ContentKind, ErrorContext, IssueItem,
    IssuesSnapshot, ProbeError, ProbeResult, RepositoryInfo, RepositorySource,
};
use futures::FutureExt;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

use super::{create_http_client, encode_path, handle_response_error, ApiClientConfig};

/// GitHub API client
pub struct GitHubApiClient {
    client: reqwest::Client,
    config: ApiClientConfig,
}

/// GitHub repository response
#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
    owner: GitHubOwner,
    description: Option<String>,
    default_branch: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    topics: Option<Vec<String>>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubOwner {
    login: String,
}

/// One entry of a contents listing, or the single object returned for a file
#[derive(Debug, Deserialize)]
struct GitHubContentItem {
    #[serde(rename = "type")]
    item_type: String,
    path: String,
    name: String,
    #[serde(default)]
    size: u64,
    sha: Option<String>,
    download_url: Option<String>,
    content: Option<String>,
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GitHubContents {
    Listing(Vec<GitHubContentItem>),
    Single(Box<GitHubContentItem>),
}

/// GitHub README response
#[derive(Debug, Deserialize)]
struct GitHubReadmeResponse {
    content: String,
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct GitHubIssue {
    number: u64,
    title: String,
    state: String,
    created_at: String,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    user: Option<GitHubOwner>,
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GitHubLabel {
    name: String,
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(config: ApiClientConfig) -> ProbeResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created GitHub API client for {}", config.base_url);

        Ok(Self { client, config })
    }

    /// Create authorization headers
    fn create_auth_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Some(ref token) = self.config.access_token {
            if let Ok(auth_value) =
                reqwest::header::HeaderValue::from_str(&format!("token {}", token))
            {
                headers.insert(reqwest::header::AUTHORIZATION, auth_value);
            }
        }

        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        headers
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Make a single GET request to the GitHub API
    async fn get_request(&self, endpoint: &str) -> ProbeResult<reqwest::Response> {
        let url = self.endpoint_url(endpoint);

        debug!("Making GitHub API request to: {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.create_auth_headers())
            .send()
            .await
            .map_err(|e| ProbeError::Network {
                message: format!("Failed to make request to GitHub API: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_api_client")
                    .with_operation("get_request")
                    .with_metadata("url", &url),
            })?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, "github_api_request").await);
        }

        Ok(response)
    }

    /// GET and deserialize, retrying transient failures
    async fn get_json<T>(&self, endpoint: &str, operation: &str) -> ProbeResult<T>
    where
        T: DeserializeOwned + Send,
    {
        retry_async(
            || {
                async move {
                    let response = self.get_request(endpoint).await?;
                    response.json::<T>().await.map_err(|e| ProbeError::Parse {
                        message: format!("Failed to parse GitHub response: {}", e),
                        source: Some(Box::new(e)),
                        context: ErrorContext::new("github_api_client")
                            .with_operation(operation)
                            .with_metadata("endpoint", endpoint),
                    })
                }
                .boxed()
            },
            &self.config.retry,
            operation,
        )
        .await
    }

    /// Decode base64 content from GitHub API
    fn decode_base64_content(&self, content: &str) -> ProbeResult<String> {
        // The API wraps base64 payloads at 60 columns
        let cleaned_content = content.replace(['\n', '\r', ' '], "");

        let decoded_bytes = BASE64
            .decode(&cleaned_content)
            .map_err(|e| ProbeError::Parse {
                message: format!("Failed to decode base64 content: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_api_client")
                    .with_operation("decode_base64_content"),
            })?;

        String::from_utf8(decoded_bytes).map_err(|e| ProbeError::Parse {
            message: format!("Content is not valid UTF-8: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("github_api_client").with_operation("decode_base64_content"),
        })
    }

    /// Fetch raw text from a download URL (used when content is not inlined)
    async fn download_text(&self, url: &str) -> ProbeResult<String> {
        debug!("Downloading raw content from: {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.create_auth_headers())
            .send()
            .await
            .map_err(|e| ProbeError::Network {
                message: format!("Failed to download file content: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_api_client").with_operation("download_text"),
            })?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, "github_download").await);
        }

        response.text().await.map_err(|e| ProbeError::Network {
            message: format!("Failed to read downloaded content: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("github_api_client").with_operation("download_text"),
        })
    }

    /// Language names ordered by byte count, largest first
    async fn get_languages(&self, owner: &str, repo: &str) -> ProbeResult<Vec<String>> {
        let endpoint = format!("repos/{}/{}/languages", owner, repo);
        let languages: HashMap<String, u64> = self.get_json(&endpoint, "get_languages").await?;

        let mut ranked: Vec<(String, u64)> = languages.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(ranked.into_iter().map(|(name, _)| name).collect())
    }
}

fn content_kind(item_type: &str) -> Option<ContentKind> {
    match item_type {
        "file" => Some(ContentKind::File),
        "dir" => Some(ContentKind::Dir),
        "symlink" => Some(ContentKind::Symlink),
        "submodule" => Some(ContentKind::Submodule),
        _ => None,
    }
}

fn into_issue_item(issue: GitHubIssue) -> IssueItem {
    IssueItem {
        number: issue.number,
        title: issue.title,
        state: issue.state,
        created_at: issue.created_at,
        labels: issue.labels.into_iter().map(|l| l.name).collect(),
        user: issue.user.map(|u| u.login),
    }
}

#[async_trait]
impl RepositorySource for GitHubApiClient {
    async fn get_repository_info(&self, owner: &str, repo: &str) -> ProbeResult<RepositoryInfo> {
        info!("Fetching GitHub repository metadata for {}/{}", owner, repo);

        let endpoint = format!("repos/{}/{}", owner, repo);
        let github_repo: GitHubRepository =
            self.get_json(&endpoint, "get_repository_info").await?;

        // The languages breakdown is supplementary
        let languages = match self.get_languages(owner, repo).await {
            Ok(languages) => languages,
            Err(e) => {
                warn!("Failed to fetch languages for {}/{}: {}", owner, repo, e);
                Vec::new()
            }
        };

        Ok(RepositoryInfo {
            name: github_repo.name,
            owner: github_repo.owner.login,
            description: github_repo.description,
            languages,
            default_branch: github_repo
                .default_branch
                .unwrap_or_else(|| "main".to_string()),
            stars: github_repo.stargazers_count,
            forks: github_repo.forks_count,
            open_issues: github_repo.open_issues_count,
            topics: github_repo.topics.unwrap_or_default(),
            created_at: github_repo.created_at,
            updated_at: github_repo.updated_at,
        })
    }

    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> ProbeResult<Vec<ContentItem>> {
        debug!("Listing {}/{} at '{}'", owner, repo, path);

        let endpoint = format!("repos/{}/{}/contents/{}", owner, repo, encode_path(path));
        let contents: GitHubContents = self.get_json(&endpoint, "list_directory").await?;

        let items = match contents {
            GitHubContents::Listing(items) => items,
            GitHubContents::Single(item) => vec![*item],
        };

        Ok(items
            .into_iter()
            .filter_map(|item| {
                let kind = content_kind(&item.item_type)?;
                Some(ContentItem {
                    kind,
                    path: item.path,
                    name: item.name,
                    size: item.size,
                    sha: item.sha,
                    download_url: item.download_url,
                })
            })
            .collect())
    }

    async fn get_file_content(&self, owner: &str, repo: &str, path: &str) -> ProbeResult<String> {
        debug!("Fetching GitHub file content: {}/{}/{}", owner, repo, path);

        let endpoint = format!("repos/{}/{}/contents/{}", owner, repo, encode_path(path));
        let contents: GitHubContents = self.get_json(&endpoint, "get_file_content").await?;

        let item = match contents {
            GitHubContents::Single(item) => *item,
            GitHubContents::Listing(_) => {
                return Err(validation_error!(
                    format!("'{}' is a directory, not a file", path),
                    "path",
                    "github_api_client"
                ));
            }
        };

        match (item.encoding.as_deref(), item.content.as_deref()) {
            (Some("base64"), Some(content)) if !content.is_empty() => {
                self.decode_base64_content(content)
            }
            _ => match item.download_url {
                Some(url) => self.download_text(&url).await,
                None => Ok(item.content.unwrap_or_default()),
            },
        }
    }

    async fn get_readme(&self, owner: &str, repo: &str) -> ProbeResult<Option<String>> {
        info!("Fetching GitHub README for {}/{}", owner, repo);

        let endpoint = format!("repos/{}/{}/readme", owner, repo);
        let readme: GitHubReadmeResponse = match self.get_json(&endpoint, "get_readme").await {
            Ok(readme) => readme,
            Err(ProbeError::Repository { context, .. })
                if context.metadata.get("status").map(String::as_str) == Some("404") =>
            {
                debug!("No README found for {}/{}", owner, repo);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if readme.encoding == "base64" {
            Ok(Some(self.decode_base64_content(&readme.content)?))
        } else {
            Ok(Some(readme.content))
        }
    }

    async fn get_issues_and_prs(&self, owner: &str, repo: &str) -> ProbeResult<IssuesSnapshot> {
        info!("Fetching GitHub issues and pull requests for {}/{}", owner, repo);

        let endpoint = format!("repos/{}/{}/issues?state=all&per_page=100", owner, repo);
        let items: Vec<GitHubIssue> = self.get_json(&endpoint, "get_issues_and_prs").await?;

        let mut snapshot = IssuesSnapshot::default();
        for item in items {
            if item.pull_request.is_some() {
                snapshot.pull_requests.push(into_issue_item(item));
            } else {
                snapshot.issues.push(into_issue_item(item));
            }
        }

        debug!(
            "Found {} issues and {} pull requests",
            snapshot.issues.len(),
            snapshot.pull_requests.len()
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GitHubApiClient {
        GitHubApiClient::new(ApiClientConfig::github(None)).unwrap()
    }

    #[test]
    fn test_decode_base64_content_ignores_line_wrapping() {
        let decoded = client()
            .decode_base64_content("ZXhwcmVz\ncyA9ICJe\r\nNC4xOCI=\n")
            .unwrap();
        assert_eq!(decoded, "express = \"^4.18\"");

        assert!(matches!(
            client().decode_base64_content("***"),
            Err(ProbeError::Parse { .. })
        ));
    }

    #[test]
    fn test_contents_payload_shapes() {
        let listing: GitHubContents = serde_json::from_str(
            r#"[
                {"type": "file", "path": "README.md", "name": "README.md", "size": 12, "sha": "a1", "download_url": "https://raw/README.md"},
                {"type": "dir", "path": "src", "name": "src", "size": 0, "sha": "b2", "download_url": null}
            ]"#,
        )
        .unwrap();
        match listing {
            GitHubContents::Listing(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(content_kind(&items[1].item_type), Some(ContentKind::Dir));
            }
            GitHubContents::Single(_) => panic!("Expected a listing"),
        }

        let single: GitHubContents = serde_json::from_str(
            r#"{"type": "file", "path": "go.mod", "name": "go.mod", "size": 20, "content": "bW9kdWxl", "encoding": "base64"}"#,
        )
        .unwrap();
        assert!(matches!(single, GitHubContents::Single(_)));
        assert_eq!(content_kind("unknown"), None);
    }

    #[test]
    fn test_issue_conversion() {
        let issues: Vec<GitHubIssue> = serde_json::from_str(
            r#"[
                {"number": 1, "title": "Crash", "state": "open", "created_at": "2024-01-01T00:00:00Z",
                 "labels": [{"name": "bug"}], "user": {"login": "octocat"}},
                {"number": 2, "title": "Add feature", "state": "closed", "created_at": "2024-01-02T00:00:00Z",
                 "labels": [], "user": null, "pull_request": {"url": "https://api.github.com/pulls/2"}}
            ]"#,
        )
        .unwrap();

        assert!(issues[0].pull_request.is_none());
        assert!(issues[1].pull_request.is_some());

        let item = into_issue_item(issues.into_iter().next().unwrap());
        assert_eq!(item.labels, vec!["bug".to_string()]);
        assert_eq!(item.user.as_deref(), Some("octocat"));
    }
}
