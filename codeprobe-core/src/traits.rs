//! Capability traits for the collaborators the pipeline talks to

use crate::error::ProbeResult;
use crate::types::*;
use async_trait::async_trait;

/// Read access to a remote source-code repository
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Repository metadata; fails on any non-success response
    async fn get_repository_info(&self, owner: &str, name: &str) -> ProbeResult<RepositoryInfo>;

    /// Immediate children of a directory (`""` is the root)
    async fn list_directory(
        &self,
        owner: &str,
        name: &str,
        path: &str,
    ) -> ProbeResult<Vec<ContentItem>>;

    /// Decoded text content of a file
    async fn get_file_content(&self, owner: &str, name: &str, path: &str) -> ProbeResult<String>;

    /// README content, `None` when the repository has none
    async fn get_readme(&self, owner: &str, name: &str) -> ProbeResult<Option<String>>;

    /// Issues and pull requests, split by kind
    async fn get_issues_and_prs(&self, owner: &str, name: &str) -> ProbeResult<IssuesSnapshot>;
}

/// Discovers the file hierarchy of a repository
#[async_trait]
pub trait TreeFetcher: Send + Sync {
    async fn fetch_tree(
        &self,
        owner: &str,
        name: &str,
        request: &TreeRequest,
    ) -> ProbeResult<FileTree>;
}

/// Optional enrichment step producing a natural-language summary
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        repository: &RepositorySnapshot,
        files: &[FileMetadata],
        readme: Option<&str>,
    ) -> ProbeResult<SummaryResult>;
}
