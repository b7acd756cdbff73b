//! codeprobe LLM enrichment
//!
//! Builds a provider client through siumai and turns repository facts into a
//! free-text summary with insights and recommendations.

pub mod client;
pub mod prompts;
pub mod summarizer;

pub use client::ProbeLlmClient;
pub use summarizer::{parse_summary_response, LlmSummarizer};
