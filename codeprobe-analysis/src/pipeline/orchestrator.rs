//! Fail-fast pipeline orchestration

use super::stages::{default_stages, PipelineStage, StageContext};
use super::state::{AnalysisState, Stage};
use crate::insights::CodeAnalyzer;
use crate::manifest::DependencyExtractor;
use crate::output::ReportFormatter;
use codeprobe_core::{
    performance, try_with_timeout, validation_error, AnalysisSummary, IssuesSnapshot,
    MetadataSection, ProbeConfig, ProbeResult, RepositorySnapshot, RepositorySource, Summarizer,
    TreeFetcher, TreeRequest,
};
use codeprobe_repo::RemoteTreeFetcher;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Runs the four analysis stages in order against one repository source.
///
/// Each call to [`CodeProbe::analyze`] owns its own state, so one instance
/// can serve concurrent runs.
pub struct CodeProbe {
    context: StageContext,
    stages: Vec<Box<dyn PipelineStage>>,
    run_timeout_ms: u64,
}

impl CodeProbe {
    pub fn new(source: Arc<dyn RepositorySource>, config: &ProbeConfig) -> Self {
        let call_timeout_ms = config.pipeline.call_timeout_secs.saturating_mul(1000);
        let tree_fetcher = RemoteTreeFetcher::new(source.clone())
            .with_concurrency(config.tree.concurrency)
            .with_call_timeout_ms(call_timeout_ms);

        let context = StageContext {
            source,
            tree_fetcher: Arc::new(tree_fetcher),
            extractor: DependencyExtractor::new(config.pipeline.fetch_concurrency, call_timeout_ms),
            analyzer: CodeAnalyzer::offline(),
            formatter: ReportFormatter::new(),
            tree_request: TreeRequest {
                start_path: None,
                recursive: config.tree.recursive,
                max_depth: config.tree.max_depth,
            },
            call_timeout_ms,
            include_issues: config.pipeline.include_issues,
        };

        Self {
            context,
            stages: default_stages(),
            run_timeout_ms: config.pipeline.run_timeout_secs.saturating_mul(1000),
        }
    }

    /// Enrich the analysis with a summarizer
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.context.analyzer = CodeAnalyzer::new(Some(summarizer), self.context.call_timeout_ms);
        self
    }

    /// Replace the default tree fetcher
    pub fn with_tree_fetcher(mut self, tree_fetcher: Arc<dyn TreeFetcher>) -> Self {
        self.context.tree_fetcher = tree_fetcher;
        self
    }

    pub fn with_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.context.formatter = formatter;
        self
    }

    /// Analyze `owner/name`.
    ///
    /// Never fails: stage errors are recorded on the outcome and stop the
    /// run, leaving earlier sections intact.
    pub async fn analyze(&self, owner: &str, name: &str) -> AnalysisOutcome {
        info!(owner = owner, repo = name, "Starting repository analysis");
        let started = Instant::now();
        let mut state = AnalysisState::new(owner, name);

        for stage in &self.stages {
            let current = stage.stage();
            state.stage = current;
            info!("Stage: {}", current);

            let remaining_ms = self
                .run_timeout_ms
                .saturating_sub(started.elapsed().as_millis() as u64);
            let result = performance::measure_async(
                current.as_str(),
                try_with_timeout(
                    stage.run(&self.context, &mut state),
                    remaining_ms,
                    current.as_str(),
                ),
            )
            .await;

            if let Err(e) = result {
                error!(stage = %current, error = %e, "Stage failed");
                state.record_failure(current, &e);
            }

            if !state.should_continue || state.is_complete {
                break;
            }
        }

        if state.is_complete {
            state.stage = Stage::Done;
            info!(
                owner = owner,
                repo = name,
                duration_ms = started.elapsed().as_millis() as u64,
                "Repository analysis complete"
            );
        }

        AnalysisOutcome { state }
    }
}

/// Final state of one run
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    state: AnalysisState,
}

impl AnalysisOutcome {
    pub fn is_complete(&self) -> bool {
        self.state.is_complete
    }

    pub fn has_errors(&self) -> bool {
        !self.state.errors().is_empty()
    }

    pub fn errors(&self) -> &[String] {
        self.state.errors()
    }

    /// Stage the run ended in; `Done` when complete
    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn repository(&self) -> &RepositorySnapshot {
        &self.state.repository
    }

    pub fn metadata(&self) -> &MetadataSection {
        &self.state.metadata
    }

    pub fn analysis(&self) -> &AnalysisSummary {
        &self.state.analysis
    }

    pub fn issues(&self) -> Option<&IssuesSnapshot> {
        self.state.issues.as_ref()
    }

    /// Rendered report; only present on complete runs
    pub fn report(&self) -> Option<&str> {
        self.state.report.as_deref()
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    /// The report as a JSON value, or the partial sections of an
    /// incomplete run together with its errors
    pub fn to_value(&self) -> ProbeResult<serde_json::Value> {
        if let Some(report) = &self.state.report {
            return Ok(serde_json::from_str(report)?);
        }

        Ok(json!({
            "repository": self.state.repository,
            "metadata": self.state.metadata,
            "analysis": self.state.analysis,
            "errors": self.state.errors(),
            "stage": self.state.stage,
            "is_complete": false,
        }))
    }

    pub fn to_json(&self, pretty: bool) -> ProbeResult<String> {
        let value = self.to_value()?;
        let json = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(json)
    }

    /// Write the report to `path`; incomplete runs have nothing to write
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ProbeResult<()> {
        let Some(report) = &self.state.report else {
            return Err(validation_error!(
                "Analysis did not complete; no report to write",
                "report",
                "analysis_outcome"
            ));
        };
        std::fs::write(path.as_ref(), report)?;
        info!(path = %path.as_ref().display(), "Report written");
        Ok(())
    }
}
