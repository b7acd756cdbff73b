//! Core data type definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Repository information as reported by the hosting API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub owner: String,
    pub description: Option<String>,
    pub languages: Vec<String>,
    pub default_branch: String,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub topics: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Kind of an entry returned by a directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// One child of a remote directory listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub kind: ContentKind,
    /// Path relative to repository root
    pub path: String,
    pub name: String,
    pub size: u64,
    pub sha: Option<String>,
    pub download_url: Option<String>,
}

impl ContentItem {
    pub fn file(path: &str, size: u64) -> Self {
        Self::new(ContentKind::File, path, size)
    }

    pub fn dir(path: &str) -> Self {
        Self::new(ContentKind::Dir, path, 0)
    }

    fn new(kind: ContentKind, path: &str, size: u64) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            kind,
            path: path.to_string(),
            name,
            size,
            sha: None,
            download_url: None,
        }
    }
}

/// A file discovered by the tree fetcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Slash-separated path relative to repository root
    pub path: String,
    pub name: String,
    pub size: u64,
    pub sha: Option<String>,
    pub download_url: Option<String>,
}

impl From<ContentItem> for FileEntry {
    fn from(item: ContentItem) -> Self {
        Self {
            path: item.path,
            name: item.name,
            size: item.size,
            sha: item.sha,
            download_url: item.download_url,
        }
    }
}

/// A directory discovered by the tree fetcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub path: String,
    pub name: String,
}

impl From<ContentItem> for DirectoryEntry {
    fn from(item: ContentItem) -> Self {
        Self {
            path: item.path,
            name: item.name,
        }
    }
}

/// File entry enriched with extension and language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub path: String,
    pub name: String,
    /// Lower-cased extension including the leading dot, empty when absent
    pub extension: String,
    pub size: u64,
    pub language: Option<String>,
}

/// A single dependency declared by a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub version: Option<String>,
    /// Dependency section or ecosystem tag, e.g. `devDependencies` or `pip`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "sourceFile")]
    pub source_file: String,
}

/// Aggregate size and language histograms over the discovered files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeMetrics {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub languages_breakdown: BTreeMap<String, usize>,
    pub file_types: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechCategory {
    Language,
    Framework,
    Library,
    Testing,
    Infrastructure,
    CiCd,
    Database,
}

impl fmt::Display for TechCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TechCategory::Language => "language",
            TechCategory::Framework => "framework",
            TechCategory::Library => "library",
            TechCategory::Testing => "testing",
            TechCategory::Infrastructure => "infrastructure",
            TechCategory::CiCd => "ci_cd",
            TechCategory::Database => "database",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStackItem {
    pub name: String,
    pub category: TechCategory,
    pub version: Option<String>,
}

/// A service inferred from a top-level directory under `src/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub file_extensions: Vec<String>,
    pub key_files: Vec<String>,
    pub dependencies: Vec<String>,
    #[serde(rename = "type")]
    pub service_type: String,
    pub file_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConnection {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub connection_type: String,
    pub via: String,
}

/// Aggregated view over the inferred services
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePatterns {
    pub total_services: usize,
    pub service_types: BTreeMap<String, usize>,
    pub shared_technologies: BTreeMap<String, usize>,
}

/// An issue or pull request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueItem {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub created_at: String,
    pub labels: Vec<String>,
    pub user: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuesSnapshot {
    pub issues: Vec<IssueItem>,
    pub pull_requests: Vec<IssueItem>,
}

/// Repository section of the analysis state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub name: String,
    pub owner: String,
    pub description: Option<String>,
    pub languages: Vec<String>,
    pub default_branch: String,
    pub stars: u64,
    pub topics: Vec<String>,
    pub total_files: usize,
    pub total_directories: usize,
    pub readme: Option<String>,
}

impl RepositorySnapshot {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            default_branch: "main".to_string(),
            ..Default::default()
        }
    }
}

/// Metadata section of the analysis state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataSection {
    pub files: Vec<FileMetadata>,
    pub dependencies: Vec<DependencyRecord>,
    pub code_metrics: CodeMetrics,
    pub tech_stack: Vec<TechStackItem>,
    pub services: Vec<ServiceDescriptor>,
}

/// Result of an enrichment (LLM) summarization call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Analysis section of the analysis state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub summary: String,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// A file selected for content inspection, truncated to a bounded size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFile {
    pub path: String,
    pub name: String,
    pub content: String,
}

/// Parameters of a file tree discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRequest {
    /// Directory to start from; `None` is the repository root
    pub start_path: Option<String>,
    /// Whether subdirectories are expanded at all
    pub recursive: bool,
    /// Deepest level that is still expanded (root is depth 0)
    pub max_depth: usize,
}

impl Default for TreeRequest {
    fn default() -> Self {
        Self {
            start_path: None,
            recursive: true,
            max_depth: 3,
        }
    }
}

/// Files and directories reachable within the requested depth
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileTree {
    pub files: Vec<FileEntry>,
    pub directories: Vec<DirectoryEntry>,
    pub total_files: usize,
    pub total_directories: usize,
}
