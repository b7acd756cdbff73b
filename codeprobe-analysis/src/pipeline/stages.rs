//! The four pipeline stages
//!
//! Each stage reads what earlier stages left in the [`AnalysisState`] and
//! writes only its own section. A stage that returns an error leaves its
//! section as it found it.

use super::state::{AnalysisState, Stage};
use crate::insights::CodeAnalyzer;
use crate::manifest::DependencyExtractor;
use crate::output::ReportFormatter;
use crate::{classifier, metrics, services, tech_stack};
use async_trait::async_trait;
use codeprobe_core::{
    try_with_timeout, IssuesSnapshot, MetadataSection, ProbeResult, RepositorySnapshot,
    RepositorySource, TreeFetcher, TreeRequest,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Collaborators and settings shared by every stage of a run
pub struct StageContext {
    pub source: Arc<dyn RepositorySource>,
    pub tree_fetcher: Arc<dyn TreeFetcher>,
    pub extractor: DependencyExtractor,
    pub analyzer: CodeAnalyzer,
    pub formatter: ReportFormatter,
    pub tree_request: TreeRequest,
    pub call_timeout_ms: u64,
    pub include_issues: bool,
}

/// One step of the analysis pipeline
#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn stage(&self) -> Stage;

    async fn run(&self, ctx: &StageContext, state: &mut AnalysisState) -> ProbeResult<()>;
}

/// Repository metadata, file tree, README and issues
pub struct RepositoryAnalysisStage;

#[async_trait]
impl PipelineStage for RepositoryAnalysisStage {
    fn stage(&self) -> Stage {
        Stage::RepositoryAnalysis
    }

    async fn run(&self, ctx: &StageContext, state: &mut AnalysisState) -> ProbeResult<()> {
        let owner = state.owner.as_str();
        let name = state.name.as_str();

        let info = try_with_timeout(
            ctx.source.get_repository_info(owner, name),
            ctx.call_timeout_ms,
            "get_repository_info",
        )
        .await?;

        let tree = ctx
            .tree_fetcher
            .fetch_tree(owner, name, &ctx.tree_request)
            .await?;

        let readme = match try_with_timeout(
            ctx.source.get_readme(owner, name),
            ctx.call_timeout_ms,
            "get_readme",
        )
        .await
        {
            Ok(readme) => readme,
            Err(e) => {
                warn!(error = %e, "README unavailable, continuing without it");
                None
            }
        };

        let issues = if ctx.include_issues {
            match try_with_timeout(
                ctx.source.get_issues_and_prs(owner, name),
                ctx.call_timeout_ms,
                "get_issues_and_prs",
            )
            .await
            {
                Ok(issues) => Some(issues),
                Err(e) => {
                    warn!(error = %e, "Issues unavailable, continuing with none");
                    Some(IssuesSnapshot::default())
                }
            }
        } else {
            None
        };

        info!(
            files = tree.total_files,
            directories = tree.total_directories,
            has_readme = readme.is_some(),
            "Repository contents collected"
        );

        let mut repository = RepositorySnapshot::new(owner, name);
        if !info.name.is_empty() {
            repository.name = info.name;
        }
        if !info.owner.is_empty() {
            repository.owner = info.owner;
        }
        if !info.default_branch.is_empty() {
            repository.default_branch = info.default_branch;
        }
        repository.description = info.description;
        repository.languages = info.languages;
        repository.stars = info.stars;
        repository.topics = info.topics;
        repository.total_files = tree.total_files;
        repository.total_directories = tree.total_directories;
        repository.readme = readme;

        state.repository = repository;
        state.raw_files = tree.files;
        state.directories = tree.directories;
        state.issues = issues;
        Ok(())
    }
}

/// File classification, dependencies, metrics, tech stack and services
pub struct MetadataExtractionStage;

#[async_trait]
impl PipelineStage for MetadataExtractionStage {
    fn stage(&self) -> Stage {
        Stage::MetadataExtraction
    }

    async fn run(&self, ctx: &StageContext, state: &mut AnalysisState) -> ProbeResult<()> {
        let files = classifier::classify_all(&state.raw_files);
        let dependencies = ctx
            .extractor
            .extract(
                ctx.source.as_ref(),
                &state.owner,
                &state.name,
                &state.raw_files,
            )
            .await;
        let code_metrics = metrics::calculate(&files);
        let tech_stack = tech_stack::identify(&files, &dependencies);
        let service_list = services::extract(&state.raw_files, &dependencies);

        info!(
            files = files.len(),
            dependencies = dependencies.len(),
            technologies = tech_stack.len(),
            services = service_list.len(),
            "Metadata extracted"
        );

        state.metadata = MetadataSection {
            files,
            dependencies,
            code_metrics,
            tech_stack,
            services: service_list,
        };
        Ok(())
    }
}

/// Summary, insights and recommendations
pub struct DataFormattingStage;

#[async_trait]
impl PipelineStage for DataFormattingStage {
    fn stage(&self) -> Stage {
        Stage::DataFormatting
    }

    async fn run(&self, ctx: &StageContext, state: &mut AnalysisState) -> ProbeResult<()> {
        state.analysis = ctx
            .analyzer
            .analyze(&state.repository, &state.metadata)
            .await;
        debug!(
            insights = state.analysis.insights.len(),
            recommendations = state.analysis.recommendations.len(),
            "Analysis produced"
        );
        Ok(())
    }
}

/// Renders the final report and marks the run complete
pub struct JsonGenerationStage;

#[async_trait]
impl PipelineStage for JsonGenerationStage {
    fn stage(&self) -> Stage {
        Stage::JsonGeneration
    }

    async fn run(&self, ctx: &StageContext, state: &mut AnalysisState) -> ProbeResult<()> {
        let report = ctx.formatter.format(state)?;
        if !ReportFormatter::validate(&report) {
            warn!("Generated report is missing required sections");
        }
        info!(bytes = report.len(), "Report generated");

        state.report = Some(report);
        state.is_complete = true;
        Ok(())
    }
}

/// The fixed stage order
pub fn default_stages() -> Vec<Box<dyn PipelineStage>> {
    vec![
        Box::new(RepositoryAnalysisStage),
        Box::new(MetadataExtractionStage),
        Box::new(DataFormattingStage),
        Box::new(JsonGenerationStage),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeprobe_core::{IssueItem, RepositoryInfo};
    use codeprobe_repo::{InMemorySource, RemoteTreeFetcher};

    fn context(source: InMemorySource, include_issues: bool) -> StageContext {
        let source: Arc<dyn RepositorySource> = Arc::new(source);
        StageContext {
            tree_fetcher: Arc::new(RemoteTreeFetcher::new(source.clone())),
            source,
            extractor: DependencyExtractor::default(),
            analyzer: CodeAnalyzer::offline(),
            formatter: ReportFormatter::new(),
            tree_request: TreeRequest::default(),
            call_timeout_ms: 1000,
            include_issues,
        }
    }

    fn repo() -> InMemorySource {
        InMemorySource::new("octo", "shop")
            .with_info(RepositoryInfo {
                name: "shop".to_string(),
                owner: "octo".to_string(),
                description: Some("Online shop".to_string()),
                languages: vec!["TypeScript".to_string()],
                default_branch: "trunk".to_string(),
                stars: 3,
                ..Default::default()
            })
            .with_readme("# Shop")
            .with_file("src/web/package.json", r#"{"dependencies":{"react":"18.2.0"}}"#)
            .with_file("src/web/index.tsx", "render()")
            .with_file("Dockerfile", "FROM node")
    }

    #[tokio::test]
    async fn test_repository_stage_fills_repository_section() {
        let ctx = context(repo(), false);
        let mut state = AnalysisState::new("octo", "shop");

        RepositoryAnalysisStage.run(&ctx, &mut state).await.unwrap();

        assert_eq!(state.repository.default_branch, "trunk");
        assert_eq!(state.repository.readme.as_deref(), Some("# Shop"));
        assert_eq!(state.repository.total_files, 3);
        assert_eq!(state.raw_files.len(), 3);
        assert!(state.issues.is_none());
    }

    #[tokio::test]
    async fn test_issue_failure_is_absorbed() {
        let ctx = context(repo().failing_issues(), true);
        let mut state = AnalysisState::new("octo", "shop");

        RepositoryAnalysisStage.run(&ctx, &mut state).await.unwrap();
        assert_eq!(state.issues, Some(IssuesSnapshot::default()));
    }

    #[tokio::test]
    async fn test_issues_are_collected_when_enabled() {
        let snapshot = IssuesSnapshot {
            issues: vec![IssueItem {
                number: 1,
                title: "Broken".to_string(),
                state: "open".to_string(),
                ..Default::default()
            }],
            pull_requests: Vec::new(),
        };
        let ctx = context(repo().with_issues(snapshot.clone()), true);
        let mut state = AnalysisState::new("octo", "shop");

        RepositoryAnalysisStage.run(&ctx, &mut state).await.unwrap();
        assert_eq!(state.issues, Some(snapshot));
    }

    #[tokio::test]
    async fn test_failed_info_leaves_state_untouched() {
        let ctx = context(repo().failing_info(), false);
        let mut state = AnalysisState::new("octo", "shop");
        let before = state.repository.clone();

        assert!(RepositoryAnalysisStage.run(&ctx, &mut state).await.is_err());
        assert_eq!(state.repository, before);
        assert!(state.raw_files.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_stage() {
        let ctx = context(repo(), false);
        let mut state = AnalysisState::new("octo", "shop");
        RepositoryAnalysisStage.run(&ctx, &mut state).await.unwrap();

        MetadataExtractionStage.run(&ctx, &mut state).await.unwrap();

        assert_eq!(state.metadata.files.len(), 3);
        assert_eq!(state.metadata.dependencies.len(), 1);
        assert_eq!(state.metadata.dependencies[0].name, "react");
        assert_eq!(state.metadata.code_metrics.total_files, 3);
        assert_eq!(state.metadata.services.len(), 1);
        assert_eq!(state.metadata.services[0].name, "web");
        assert!(state.metadata.tech_stack.iter().any(|t| t.name == "React"));
    }

    #[tokio::test]
    async fn test_json_stage_marks_completion() {
        let ctx = context(repo(), false);
        let mut state = AnalysisState::new("octo", "shop");
        for stage in default_stages() {
            stage.run(&ctx, &mut state).await.unwrap();
        }

        assert!(state.is_complete);
        let report = state.report.as_deref().unwrap();
        assert!(ReportFormatter::validate(report));
    }
}
