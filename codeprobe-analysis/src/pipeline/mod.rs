//! Four-stage analysis pipeline
//!
//! `repository_analysis -> metadata_extraction -> data_formatting ->
//! json_generation`, stopping at the first stage that fails.

pub mod orchestrator;
pub mod stages;
pub mod state;

pub use orchestrator::{AnalysisOutcome, CodeProbe};
pub use stages::{
    default_stages, DataFormattingStage, JsonGenerationStage, MetadataExtractionStage,
    PipelineStage, RepositoryAnalysisStage, StageContext,
};
pub use state::{AnalysisState, Stage};
