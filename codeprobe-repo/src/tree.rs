//! Remote file tree discovery
//!
//! Directories are expanded level by level from an explicit worklist, so the
//! traversal depth is bounded by the request rather than by the call stack.

use codeprobe_core::{
    process_in_order, try_with_timeout, ContentItem, ContentKind, FileTree, ProbeResult,
    RepositorySource, TreeConfig, TreeFetcher, TreeRequest,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A directory waiting to be listed
#[derive(Debug, Clone)]
struct PendingDir {
    path: String,
    depth: usize,
}

/// Tree fetcher backed by a [`RepositorySource`]
pub struct RemoteTreeFetcher {
    source: Arc<dyn RepositorySource>,
    concurrency: usize,
    call_timeout_ms: u64,
}

impl RemoteTreeFetcher {
    pub fn new(source: Arc<dyn RepositorySource>) -> Self {
        Self {
            source,
            concurrency: TreeConfig::default().concurrency,
            call_timeout_ms: 30_000,
        }
    }

    /// Maximum number of directory listings in flight within one level
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Timeout applied to each individual listing call
    pub fn with_call_timeout_ms(mut self, call_timeout_ms: u64) -> Self {
        self.call_timeout_ms = call_timeout_ms;
        self
    }

    /// Convenience wrapper over [`TreeFetcher::fetch_tree`]
    pub async fn fetch(
        &self,
        owner: &str,
        name: &str,
        start_path: Option<&str>,
        recursive: bool,
        max_depth: usize,
    ) -> ProbeResult<FileTree> {
        let request = TreeRequest {
            start_path: start_path.map(str::to_string),
            recursive,
            max_depth,
        };
        self.fetch_tree(owner, name, &request).await
    }

    async fn list(&self, owner: &str, name: &str, path: &str) -> ProbeResult<Vec<ContentItem>> {
        try_with_timeout(
            self.source.list_directory(owner, name, path),
            self.call_timeout_ms,
            "list_directory",
        )
        .await
    }
}

#[async_trait]
impl TreeFetcher for RemoteTreeFetcher {
    async fn fetch_tree(
        &self,
        owner: &str,
        name: &str,
        request: &TreeRequest,
    ) -> ProbeResult<FileTree> {
        let root = request.start_path.clone().unwrap_or_default();
        info!(
            owner = owner,
            repo = name,
            root = %root,
            max_depth = request.max_depth,
            recursive = request.recursive,
            "Discovering repository tree"
        );

        let mut tree = FileTree::default();
        let mut level = vec![PendingDir {
            path: root,
            depth: 0,
        }];

        while !level.is_empty() {
            let listings = process_in_order(level, self.concurrency, |dir| async move {
                let result = self.list(owner, name, &dir.path).await;
                (dir, result)
            })
            .await;

            let mut next_level = Vec::new();
            for (dir, result) in listings {
                let items = match result {
                    Ok(items) => items,
                    // Only a transport failure on the starting directory fails the fetch
                    Err(e) if dir.depth == 0 && e.is_recoverable() => return Err(e),
                    Err(e) if dir.depth == 0 => {
                        warn!(
                            path = %dir.path,
                            error = %e,
                            "Starting directory unavailable, tree is empty"
                        );
                        continue;
                    }
                    Err(e) => {
                        warn!(path = %dir.path, error = %e, "Skipping unreadable directory");
                        continue;
                    }
                };

                for item in items {
                    match item.kind {
                        ContentKind::File => tree.files.push(item.into()),
                        ContentKind::Dir => {
                            if request.recursive && dir.depth < request.max_depth {
                                next_level.push(PendingDir {
                                    path: item.path.clone(),
                                    depth: dir.depth + 1,
                                });
                            }
                            tree.directories.push(item.into());
                        }
                        ContentKind::Symlink | ContentKind::Submodule => {
                            debug!(path = %item.path, "Ignoring non-file entry");
                        }
                    }
                }
            }

            level = next_level;
        }

        tree.total_files = tree.files.len();
        tree.total_directories = tree.directories.len();

        info!(
            files = tree.total_files,
            directories = tree.total_directories,
            "Repository tree discovered"
        );

        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySource;

    fn source() -> Arc<InMemorySource> {
        Arc::new(
            InMemorySource::new("octo", "demo")
                .with_file("README.md", "# demo")
                .with_file("src/api/main.py", "print('hi')")
                .with_file("src/api/handlers/users.py", "")
                .with_file("src/api/handlers/deep/nested/x.py", ""),
        )
    }

    #[tokio::test]
    async fn test_max_depth_zero_lists_root_only() {
        let fetcher = RemoteTreeFetcher::new(source());
        let tree = fetcher.fetch("octo", "demo", None, true, 0).await.unwrap();

        assert_eq!(tree.total_files, 1);
        assert_eq!(tree.files[0].path, "README.md");
        assert_eq!(tree.total_directories, 1);
        assert_eq!(tree.directories[0].path, "src");
    }

    #[tokio::test]
    async fn test_directories_beyond_depth_are_recorded_not_expanded() {
        let fetcher = RemoteTreeFetcher::new(source());
        let tree = fetcher.fetch("octo", "demo", None, true, 2).await.unwrap();

        let dirs: Vec<&str> = tree.directories.iter().map(|d| d.path.as_str()).collect();
        assert!(dirs.contains(&"src/api/handlers"));
        assert!(!dirs.contains(&"src/api/handlers/deep"));
        assert!(!tree
            .files
            .iter()
            .any(|f| f.path == "src/api/handlers/users.py"));
    }

    #[tokio::test]
    async fn test_non_recursive_fetch() {
        let fetcher = RemoteTreeFetcher::new(source());
        let tree = fetcher.fetch("octo", "demo", None, false, 5).await.unwrap();
        assert_eq!(tree.total_files, 1);
        assert_eq!(tree.total_directories, 1);
    }
}
