//! In-memory repository source
//!
//! Serves a fixed snapshot of files without network access. Individual
//! operations can be made to fail, which is how pipeline and traversal
//! behaviour under partial failure is exercised.

use async_trait::async_trait;
use codeprobe_core::{
    not_found_error, ContentItem, ErrorContext, IssuesSnapshot, ProbeError, ProbeResult,
    RepositoryInfo, RepositorySource,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Duration;
use std::sync::Mutex;

/// Repository snapshot held entirely in memory
#[derive(Debug, Default)]
pub struct InMemorySource {
    info: RepositoryInfo,
    /// File path to content, ordered so listings are deterministic
    files: BTreeMap<String, String>,
    readme: Option<String>,
    issues: IssuesSnapshot,
    failing_listings: HashSet<String>,
    rejected_listings: HashSet<String>,
    failing_contents: HashSet<String>,
    slow_contents: HashMap<String, u64>,
    fail_info: bool,
    fail_issues: bool,
    listed: Mutex<Vec<String>>,
}

impl InMemorySource {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            info: RepositoryInfo {
                name: name.to_string(),
                owner: owner.to_string(),
                default_branch: "main".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_info(mut self, info: RepositoryInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files
            .insert(path.trim_matches('/').to_string(), content.to_string());
        self
    }

    pub fn with_readme(mut self, readme: &str) -> Self {
        self.readme = Some(readme.to_string());
        self
    }

    pub fn with_issues(mut self, issues: IssuesSnapshot) -> Self {
        self.issues = issues;
        self
    }

    /// Make listing of `path` fail (`""` is the root)
    pub fn failing_listing(mut self, path: &str) -> Self {
        self.failing_listings.insert(path.to_string());
        self
    }

    /// Make listing of `path` answer with a 404 status, the way the contents
    /// API answers for an empty repository
    pub fn rejected_listing(mut self, path: &str) -> Self {
        self.rejected_listings.insert(path.to_string());
        self
    }

    /// Make content retrieval of `path` fail
    pub fn failing_content(mut self, path: &str) -> Self {
        self.failing_contents.insert(path.to_string());
        self
    }

    /// Delay content retrieval of `path` by `delay_ms`
    pub fn slow_content(mut self, path: &str, delay_ms: u64) -> Self {
        self.slow_contents.insert(path.to_string(), delay_ms);
        self
    }

    pub fn failing_info(mut self) -> Self {
        self.fail_info = true;
        self
    }

    pub fn failing_issues(mut self) -> Self {
        self.fail_issues = true;
        self
    }

    /// Directory paths listed so far, in call order
    pub fn listed_paths(&self) -> Vec<String> {
        self.listed
            .lock()
            .map(|listed| listed.clone())
            .unwrap_or_default()
    }

    fn check_identity(&self, owner: &str, name: &str) -> ProbeResult<()> {
        if owner == self.info.owner && name == self.info.name {
            Ok(())
        } else {
            Err(not_found_error!(
                format!("repos/{}/{}", owner, name),
                "in_memory_source"
            ))
        }
    }

    fn unavailable(operation: &str, target: &str) -> ProbeError {
        ProbeError::Network {
            message: format!("{} unavailable for '{}'", operation, target),
            source: None,
            context: ErrorContext::new("in_memory_source").with_operation(operation),
        }
    }
}

#[async_trait]
impl RepositorySource for InMemorySource {
    async fn get_repository_info(&self, owner: &str, name: &str) -> ProbeResult<RepositoryInfo> {
        self.check_identity(owner, name)?;
        if self.fail_info {
            return Err(Self::unavailable("get_repository_info", name));
        }
        Ok(self.info.clone())
    }

    async fn list_directory(
        &self,
        owner: &str,
        name: &str,
        path: &str,
    ) -> ProbeResult<Vec<ContentItem>> {
        self.check_identity(owner, name)?;
        let dir = path.trim_matches('/');
        if let Ok(mut listed) = self.listed.lock() {
            listed.push(dir.to_string());
        }
        if self.failing_listings.contains(dir) {
            return Err(Self::unavailable("list_directory", dir));
        }
        if self.rejected_listings.contains(dir) {
            return Err(ProbeError::Repository {
                message: format!("HTTP 404 error for contents/{}: Not Found", dir),
                source: None,
                context: ErrorContext::new("in_memory_source")
                    .with_operation("list_directory")
                    .with_metadata("status", "404"),
            });
        }

        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        let mut files = Vec::new();
        let mut subdirs = BTreeSet::new();
        let mut found = dir.is_empty();

        for (file_path, content) in &self.files {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            found = true;
            match rest.split_once('/') {
                Some((child, _)) => {
                    subdirs.insert(format!("{}{}", prefix, child));
                }
                None => files.push(ContentItem::file(file_path, content.len() as u64)),
            }
        }

        if !found {
            return Err(not_found_error!(
                format!("contents/{}", dir),
                "in_memory_source"
            ));
        }

        let mut items: Vec<ContentItem> = subdirs.iter().map(|d| ContentItem::dir(d)).collect();
        items.extend(files);
        Ok(items)
    }

    async fn get_file_content(&self, owner: &str, name: &str, path: &str) -> ProbeResult<String> {
        self.check_identity(owner, name)?;
        if let Some(delay_ms) = self.slow_contents.get(path) {
            tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
        }
        if self.failing_contents.contains(path) {
            return Err(Self::unavailable("get_file_content", path));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found_error!(format!("contents/{}", path), "in_memory_source"))
    }

    async fn get_readme(&self, owner: &str, name: &str) -> ProbeResult<Option<String>> {
        self.check_identity(owner, name)?;
        Ok(self.readme.clone())
    }

    async fn get_issues_and_prs(&self, owner: &str, name: &str) -> ProbeResult<IssuesSnapshot> {
        self.check_identity(owner, name)?;
        if self.fail_issues {
            return Err(Self::unavailable("get_issues_and_prs", name));
        }
        Ok(self.issues.clone())
    }
}
