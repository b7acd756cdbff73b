//! codeprobe analysis - turns a repository listing into a structured report
//!
//! Classification, dependency parsing, metrics, tech stack and service graph
//! inference, plus the pipeline that runs them in order.

pub mod classifier;
pub mod insights;
pub mod manifest;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod services;
pub mod tech_stack;

pub use insights::CodeAnalyzer;
pub use manifest::{DependencyExtractor, DependencyParser, ManifestKind};
pub use output::{ReportFormatter, ANALYZER_VERSION, MAX_FILES_IN_OUTPUT};
pub use pipeline::{AnalysisOutcome, AnalysisState, CodeProbe, Stage};
