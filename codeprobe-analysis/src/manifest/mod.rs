//! Dependency manifest detection and parsing
//!
//! Manifests are recognised by file name only. Each supported format has its
//! own [`DependencyParser`]; [`parser_for`] is the single dispatch point.

use codeprobe_core::{try_with_timeout, DependencyRecord, FileEntry, RepositorySource};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

pub mod gomod;
pub mod msbuild;
pub mod package_json;
pub mod requirements;

pub use gomod::GoModParser;
pub use msbuild::PackageReferenceParser;
pub use package_json::{PackageJsonParser, NPM_SECTIONS};
pub use requirements::{RequirementsParser, MAX_REQUIREMENT_LINE};

/// Ecosystem a manifest file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    Npm,
    Pip,
    Pipenv,
    Poetry,
    Bundler,
    Go,
    Cargo,
    Maven,
    Gradle,
    NuGet,
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ManifestKind::Npm => "npm",
            ManifestKind::Pip => "pip",
            ManifestKind::Pipenv => "pipenv",
            ManifestKind::Poetry => "poetry",
            ManifestKind::Bundler => "bundler",
            ManifestKind::Go => "go",
            ManifestKind::Cargo => "cargo",
            ManifestKind::Maven => "maven",
            ManifestKind::Gradle => "gradle",
            ManifestKind::NuGet => "nuget",
        };
        f.write_str(label)
    }
}

/// Exact manifest file names
const MANIFEST_NAMES: &[(&str, ManifestKind)] = &[
    ("package.json", ManifestKind::Npm),
    ("requirements.txt", ManifestKind::Pip),
    ("Pipfile", ManifestKind::Pipenv),
    ("pyproject.toml", ManifestKind::Poetry),
    ("Gemfile", ManifestKind::Bundler),
    ("go.mod", ManifestKind::Go),
    ("Cargo.toml", ManifestKind::Cargo),
    ("pom.xml", ManifestKind::Maven),
    ("build.gradle", ManifestKind::Gradle),
    ("Directory.Packages.props", ManifestKind::NuGet),
    ("packages.config", ManifestKind::NuGet),
];

/// Manifest file name suffixes
const MANIFEST_SUFFIXES: &[(&str, ManifestKind)] = &[(".csproj", ManifestKind::NuGet)];

impl ManifestKind {
    /// Detect the manifest kind of a file from its name (case-sensitive)
    pub fn detect(file_name: &str) -> Option<Self> {
        MANIFEST_NAMES
            .iter()
            .find(|(name, _)| *name == file_name)
            .or_else(|| {
                MANIFEST_SUFFIXES
                    .iter()
                    .find(|(suffix, _)| file_name.ends_with(suffix))
            })
            .map(|(_, kind)| *kind)
    }
}

/// Parses one manifest format into dependency records.
///
/// Parsers never fail: fragments they cannot understand are skipped and a
/// wholly unparseable payload yields an empty list.
pub trait DependencyParser: Send + Sync {
    fn parse(&self, content: &str, source_file: &str) -> Vec<DependencyRecord>;
}

static NPM_PARSER: PackageJsonParser = PackageJsonParser {
    sections: NPM_SECTIONS,
};
static PIP_PARSER: RequirementsParser = RequirementsParser;
static NUGET_PARSER: PackageReferenceParser = PackageReferenceParser;
static GO_PARSER: GoModParser = GoModParser;

/// Parser for a manifest kind; recognised kinds without one contribute nothing
pub fn parser_for(kind: ManifestKind) -> Option<&'static dyn DependencyParser> {
    match kind {
        ManifestKind::Npm => Some(&NPM_PARSER),
        ManifestKind::Pip => Some(&PIP_PARSER),
        ManifestKind::NuGet => Some(&NUGET_PARSER),
        ManifestKind::Go => Some(&GO_PARSER),
        ManifestKind::Pipenv
        | ManifestKind::Poetry
        | ManifestKind::Bundler
        | ManifestKind::Cargo
        | ManifestKind::Maven
        | ManifestKind::Gradle => None,
    }
}

/// Fetches and parses every supported manifest in a file list
#[derive(Debug, Clone)]
pub struct DependencyExtractor {
    concurrency: usize,
    call_timeout_ms: u64,
}

impl Default for DependencyExtractor {
    fn default() -> Self {
        Self {
            concurrency: 8,
            call_timeout_ms: 30_000,
        }
    }
}

impl DependencyExtractor {
    pub fn new(concurrency: usize, call_timeout_ms: u64) -> Self {
        Self {
            concurrency: concurrency.max(1),
            call_timeout_ms,
        }
    }

    /// Extract dependency records from all manifests in `files`.
    ///
    /// Records are concatenated in file order. A manifest that cannot be
    /// fetched contributes no records.
    pub async fn extract(
        &self,
        source: &dyn RepositorySource,
        owner: &str,
        name: &str,
        files: &[FileEntry],
    ) -> Vec<DependencyRecord> {
        let manifests: Vec<(&FileEntry, &'static dyn DependencyParser)> = files
            .iter()
            .filter_map(|file| {
                let kind = ManifestKind::detect(&file.name)?;
                match parser_for(kind) {
                    Some(parser) => Some((file, parser)),
                    None => {
                        debug!(path = %file.path, kind = %kind, "No parser for manifest kind");
                        None
                    }
                }
            })
            .collect();

        info!(manifests = manifests.len(), "Parsing dependency manifests");

        let pending: Vec<_> = manifests
            .into_iter()
            .map(|(file, parser)| self.fetch_and_parse(source, owner, name, file, parser))
            .collect();
        let parsed: Vec<Vec<DependencyRecord>> = stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await;

        parsed.into_iter().flatten().collect()
    }

    fn fetch_and_parse<'a>(
        &'a self,
        source: &'a dyn RepositorySource,
        owner: &'a str,
        name: &'a str,
        file: &'a FileEntry,
        parser: &'static dyn DependencyParser,
    ) -> BoxFuture<'a, Vec<DependencyRecord>> {
        Box::pin(async move {
            let content = try_with_timeout(
                source.get_file_content(owner, name, &file.path),
                self.call_timeout_ms,
                "get_file_content",
            )
            .await;

            match content {
                Ok(content) => {
                    let records = parser.parse(&content, &file.path);
                    debug!(path = %file.path, records = records.len(), "Parsed manifest");
                    records
                }
                Err(e) => {
                    warn!(path = %file.path, error = %e, "Skipping unreadable manifest");
                    Vec::new()
                }
            }
        })
    }
}
