//! Analysis state threaded through the pipeline stages

use codeprobe_core::{
    AnalysisSummary, DirectoryEntry, FileEntry, IssuesSnapshot, MetadataSection, ProbeError,
    RepositorySnapshot,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a run in the fixed stage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    RepositoryAnalysis,
    MetadataExtraction,
    DataFormatting,
    JsonGeneration,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::RepositoryAnalysis => "repository_analysis",
            Stage::MetadataExtraction => "metadata_extraction",
            Stage::DataFormatting => "data_formatting",
            Stage::JsonGeneration => "json_generation",
            Stage::Done => "done",
        }
    }

    /// Human-readable prefix of error messages recorded for this stage
    pub fn failure_label(&self) -> &'static str {
        match self {
            Stage::Init => "Initialization",
            Stage::RepositoryAnalysis => "Repository analysis",
            Stage::MetadataExtraction => "Metadata extraction",
            Stage::DataFormatting => "Data formatting",
            Stage::JsonGeneration => "JSON generation",
            Stage::Done => "Finalization",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a single run knows; owned by that run alone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisState {
    pub owner: String,
    pub name: String,
    pub stage: Stage,
    pub raw_files: Vec<FileEntry>,
    pub directories: Vec<DirectoryEntry>,
    pub repository: RepositorySnapshot,
    /// `None` when issue collection is disabled
    pub issues: Option<IssuesSnapshot>,
    pub metadata: MetadataSection,
    pub analysis: AnalysisSummary,
    /// Rendered JSON report, set by the last stage
    pub report: Option<String>,
    errors: Vec<String>,
    pub should_continue: bool,
    pub is_complete: bool,
}

impl AnalysisState {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            stage: Stage::Init,
            raw_files: Vec::new(),
            directories: Vec::new(),
            repository: RepositorySnapshot::new(owner, name),
            issues: None,
            metadata: MetadataSection::default(),
            analysis: AnalysisSummary::default(),
            report: None,
            errors: Vec::new(),
            should_continue: true,
            is_complete: false,
        }
    }

    /// Errors recorded so far, oldest first
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Record a stage failure and stop the run
    pub fn record_failure(&mut self, stage: Stage, error: &ProbeError) {
        self.errors
            .push(format!("{} failed: {}", stage.failure_label(), error));
        self.should_continue = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeprobe_core::ErrorContext;

    #[test]
    fn test_initial_state() {
        let state = AnalysisState::new("octo", "hello");
        assert_eq!(state.stage, Stage::Init);
        assert!(state.should_continue);
        assert!(!state.is_complete);
        assert!(state.errors().is_empty());
        assert_eq!(state.repository.default_branch, "main");
        assert_eq!(state.repository.owner, "octo");
    }

    #[test]
    fn test_record_failure_appends_and_stops() {
        let mut state = AnalysisState::new("octo", "hello");
        let error = ProbeError::NotFound {
            resource: "repos/octo/hello".to_string(),
            context: ErrorContext::new("test"),
        };

        state.record_failure(Stage::RepositoryAnalysis, &error);

        assert!(!state.should_continue);
        assert_eq!(
            state.errors(),
            &["Repository analysis failed: Resource not found: repos/octo/hello".to_string()]
        );
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::MetadataExtraction.to_string(), "metadata_extraction");
        assert_eq!(
            serde_json::to_string(&Stage::JsonGeneration).unwrap(),
            "\"json_generation\""
        );
        assert_eq!(Stage::JsonGeneration.failure_label(), "JSON generation");
    }
}
