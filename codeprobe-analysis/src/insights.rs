//! Code analysis: summary, insights and recommendations
//!
//! An optional [`Summarizer`] contributes free text; everything else is
//! derived deterministically from the extracted metadata.

use crate::tech_stack;
use codeprobe_core::{
    try_with_timeout, AnalysisSummary, CodeMetrics, MetadataSection, RepositorySnapshot,
    SummaryResult, Summarizer, TechStackItem,
};
use std::sync::Arc;
use tracing::{info, warn};

const DOC_EXTENSIONS: &[&str] = &[".md", ".rst", ".txt"];
const MIN_DOC_FILES: usize = 5;
const CI_PATH_MARKER: &str = ".github/workflows";
const CI_FILE_NAMES: &[&str] = &[".travis.yml", "azure-pipelines.yml"];

/// Template summary used whenever no summarizer result is available
pub fn fallback_summary(repository: &RepositorySnapshot, metrics: &CodeMetrics) -> String {
    let description = repository
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("No description available");
    let languages = if repository.languages.is_empty() {
        "various languages".to_string()
    } else {
        repository
            .languages
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "{} is a repository owned by {}. {}. The repository contains {} files primarily written in {}.",
        repository.name, repository.owner, description, metrics.total_files, languages
    )
}

/// Observations derived from size, language mix and frameworks
pub fn code_insights(metrics: &CodeMetrics, tech_stack: &[TechStackItem]) -> Vec<String> {
    let mut insights = Vec::new();
    let total = metrics.total_files;

    if total > 1000 {
        insights.push(format!(
            "Large codebase with {} files - consider modularization for maintainability",
            total
        ));
    } else if total > 100 {
        insights.push(format!("Medium-sized codebase with {} files", total));
    } else {
        insights.push(format!("Compact codebase with {} files", total));
    }

    let languages = &metrics.languages_breakdown;
    if languages.len() > 5 {
        insights.push(format!(
            "Multi-language project using {} languages - ensure consistent coding standards across languages",
            languages.len()
        ));
    }

    // BTreeMap iterates by name, so the first maximum is the alphabetical tie-break
    let primary = languages
        .iter()
        .fold(None::<(&String, &usize)>, |best, (name, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((name, count)),
        });
    if let Some((language, count)) = primary {
        insights.push(format!("Primary language is {} ({} files)", language, count));
    }

    let frameworks = tech_stack::frameworks(tech_stack);
    if !frameworks.is_empty() {
        insights.push(format!("Uses frameworks: {}", frameworks.join(", ")));
    }

    insights
}

/// Heuristic recommendations about documentation, tests, versions and CI
pub fn recommendations(metadata: &MetadataSection) -> Vec<String> {
    let mut recommendations = Vec::new();
    let files = &metadata.files;

    let doc_files = files
        .iter()
        .filter(|f| DOC_EXTENSIONS.contains(&f.extension.as_str()))
        .count();
    if doc_files < MIN_DOC_FILES {
        recommendations.push(
            "Consider adding more documentation files to improve project accessibility"
                .to_string(),
        );
    }

    let has_tests = files.iter().any(|f| {
        let path = f.path.to_lowercase();
        path.contains("test") || path.contains("spec")
    });
    if !has_tests {
        recommendations.push("No test files detected - consider adding unit tests".to_string());
    }

    let unstable = metadata
        .dependencies
        .iter()
        .filter(|d| d.version.as_deref().is_some_and(|v| v.contains("^0.")))
        .count();
    if unstable > 0 {
        recommendations.push(format!(
            "Found {} dependencies with 0.x versions - review for stability",
            unstable
        ));
    }

    let has_ci = files
        .iter()
        .any(|f| f.path.contains(CI_PATH_MARKER) || CI_FILE_NAMES.contains(&f.name.as_str()));
    if !has_ci {
        recommendations
            .push("Consider setting up CI/CD pipelines for automated testing".to_string());
    }

    recommendations
}

/// Produces the analysis section of a run
pub struct CodeAnalyzer {
    summarizer: Option<Arc<dyn Summarizer>>,
    call_timeout_ms: u64,
}

impl CodeAnalyzer {
    pub fn new(summarizer: Option<Arc<dyn Summarizer>>, call_timeout_ms: u64) -> Self {
        Self {
            summarizer,
            call_timeout_ms,
        }
    }

    /// Analyzer that relies on the fallback summary alone
    pub fn offline() -> Self {
        Self::new(None, 0)
    }

    /// Combine summarizer output (if any) with metadata-derived findings.
    ///
    /// Summarizer absence, failure or timeout only changes the free text;
    /// this never fails.
    pub async fn analyze(
        &self,
        repository: &RepositorySnapshot,
        metadata: &MetadataSection,
    ) -> AnalysisSummary {
        let enrichment = self.summarize(repository, metadata).await;

        let summary = enrichment
            .as_ref()
            .map(|r| r.summary.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback_summary(repository, &metadata.code_metrics));

        let (mut insights, mut recommendations) = match enrichment {
            Some(result) => (result.insights, result.recommendations),
            None => (Vec::new(), Vec::new()),
        };
        insights.extend(code_insights(&metadata.code_metrics, &metadata.tech_stack));
        recommendations.extend(self::recommendations(metadata));

        AnalysisSummary {
            summary,
            insights,
            recommendations,
        }
    }

    async fn summarize(
        &self,
        repository: &RepositorySnapshot,
        metadata: &MetadataSection,
    ) -> Option<SummaryResult> {
        let summarizer = self.summarizer.as_ref()?;

        info!(repo = %repository.name, "Requesting repository summary");
        let result = try_with_timeout(
            summarizer.summarize(repository, &metadata.files, repository.readme.as_deref()),
            self.call_timeout_ms,
            "summarize_repository",
        )
        .await;

        match result {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, "Summarization failed, using fallback summary");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codeprobe_core::{
        DependencyRecord, ErrorContext, FileMetadata, ProbeError, ProbeResult, TechCategory,
    };
    use std::collections::BTreeMap;

    fn snapshot(description: Option<&str>, languages: &[&str]) -> RepositorySnapshot {
        let mut repo = RepositorySnapshot::new("octo", "hello");
        repo.description = description.map(str::to_string);
        repo.languages = languages.iter().map(|l| l.to_string()).collect();
        repo
    }

    fn metrics(total: usize, languages: &[(&str, usize)]) -> CodeMetrics {
        CodeMetrics {
            total_files: total,
            languages_breakdown: languages
                .iter()
                .map(|(l, c)| (l.to_string(), *c))
                .collect::<BTreeMap<_, _>>(),
            ..Default::default()
        }
    }

    fn file(path: &str, extension: &str) -> FileMetadata {
        FileMetadata {
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            extension: extension.to_string(),
            size: 0,
            language: None,
        }
    }

    #[test]
    fn test_fallback_summary_template() {
        let summary = fallback_summary(
            &snapshot(Some("A demo"), &["Rust", "Go", "Python", "Shell"]),
            &metrics(42, &[]),
        );
        assert_eq!(
            summary,
            "hello is a repository owned by octo. A demo. The repository contains 42 files primarily written in Rust, Go, Python."
        );

        let summary = fallback_summary(&snapshot(None, &[]), &metrics(0, &[]));
        assert_eq!(
            summary,
            "hello is a repository owned by octo. No description available. The repository contains 0 files primarily written in various languages."
        );
    }

    #[test]
    fn test_code_insights() {
        let stack = vec![TechStackItem {
            name: "Django".to_string(),
            category: TechCategory::Framework,
            version: None,
        }];
        let insights = code_insights(&metrics(150, &[("Python", 3), ("Go", 3), ("C", 1)]), &stack);

        assert_eq!(
            insights,
            vec![
                "Medium-sized codebase with 150 files".to_string(),
                "Primary language is Go (3 files)".to_string(),
                "Uses frameworks: Django".to_string(),
            ]
        );

        let many: Vec<(String, usize)> = (0..6).map(|i| (format!("L{}", i), 1)).collect();
        let many: Vec<(&str, usize)> = many.iter().map(|(l, c)| (l.as_str(), *c)).collect();
        let insights = code_insights(&metrics(2000, &many), &[]);
        assert!(insights[0].starts_with("Large codebase with 2000 files"));
        assert!(insights[1].starts_with("Multi-language project using 6 languages"));
    }

    #[test]
    fn test_recommendations() {
        let bare = MetadataSection {
            files: vec![file("main.py", ".py")],
            dependencies: vec![DependencyRecord {
                name: "left-pad".to_string(),
                version: Some("^0.0.3".to_string()),
                kind: "dependencies".to_string(),
                source_file: "package.json".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(recommendations(&bare).len(), 4);

        let healthy = MetadataSection {
            files: (0..5)
                .map(|i| file(&format!("docs/{}.md", i), ".md"))
                .chain([
                    file("tests/test_app.py", ".py"),
                    file(".github/workflows/ci.yml", ".yml"),
                ])
                .collect(),
            ..Default::default()
        };
        assert!(recommendations(&healthy).is_empty());
    }

    struct FixedSummarizer(ProbeResult<SummaryResult>);

    #[async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(
            &self,
            _repository: &RepositorySnapshot,
            _files: &[FileMetadata],
            _readme: Option<&str>,
        ) -> ProbeResult<SummaryResult> {
            match &self.0 {
                Ok(result) => Ok(result.clone()),
                Err(_) => Err(ProbeError::Llm {
                    message: "provider unavailable".to_string(),
                    provider: None,
                    model: None,
                    context: ErrorContext::new("test"),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_summarizer_output_is_prepended() {
        let summarizer = FixedSummarizer(Ok(SummaryResult {
            summary: "An LLM summary".to_string(),
            insights: vec!["LLM insight".to_string()],
            recommendations: vec!["LLM recommendation".to_string()],
        }));
        let analyzer = CodeAnalyzer::new(Some(Arc::new(summarizer)), 1000);

        let analysis = analyzer
            .analyze(&snapshot(None, &[]), &MetadataSection::default())
            .await;

        assert_eq!(analysis.summary, "An LLM summary");
        assert_eq!(analysis.insights[0], "LLM insight");
        assert_eq!(analysis.insights[1], "Compact codebase with 0 files");
        assert_eq!(analysis.recommendations[0], "LLM recommendation");
    }

    #[tokio::test]
    async fn test_summarizer_failure_falls_back() {
        let failing = FixedSummarizer(Err(ProbeError::Internal {
            message: "x".to_string(),
            source: None,
            context: ErrorContext::new("test"),
        }));
        let analyzer = CodeAnalyzer::new(Some(Arc::new(failing)), 1000);
        let repo = snapshot(Some("Demo"), &["Rust"]);

        let with_failure = analyzer.analyze(&repo, &MetadataSection::default()).await;
        let offline = CodeAnalyzer::offline()
            .analyze(&repo, &MetadataSection::default())
            .await;

        assert_eq!(with_failure, offline);
        assert!(offline.summary.starts_with("hello is a repository owned by octo. Demo."));
    }
}
