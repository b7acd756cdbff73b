//! [`Summarizer`] backed by an LLM

use crate::client::ProbeLlmClient;
use crate::prompts::{self, SUMMARIZATION_SYSTEM_PROMPT};
use async_trait::async_trait;
use codeprobe_core::{
    FileMetadata, LlmConfig, ProbeResult, RepositorySnapshot, SummaryResult, Summarizer,
};
use tracing::{debug, info};

/// Characters of the raw reply used as summary when it has no summary lines
pub const RAW_SUMMARY_CHARS: usize = 500;

const DEFAULT_INSIGHT: &str = "Repository analysis completed";
const DEFAULT_RECOMMENDATION: &str = "Review generated metadata for accuracy";
const BULLETS: &[char] = &['-', '*', '•'];

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Summary,
    Insights,
    Recommendations,
}

/// Split a free-text reply into summary, insights and recommendations.
///
/// A line mentioning "insight" or "recommendation" starts that section and
/// is itself dropped. Summary lines are joined with spaces; only bulleted
/// lines count in the other sections. Markdown headings never become
/// summary text.
pub fn parse_summary_response(response: &str) -> SummaryResult {
    let mut summary_lines: Vec<&str> = Vec::new();
    let mut insights = Vec::new();
    let mut recommendations = Vec::new();
    let mut section = Section::Summary;

    for line in response.lines() {
        let lower = line.to_lowercase();
        if lower.contains("insight") {
            section = Section::Insights;
            continue;
        }
        if lower.contains("recommendation") {
            section = Section::Recommendations;
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match section {
            Section::Summary => {
                if !trimmed.starts_with('#') {
                    summary_lines.push(trimmed);
                }
            }
            Section::Insights | Section::Recommendations => {
                let Some(item) = trimmed.strip_prefix(BULLETS) else {
                    continue;
                };
                let item = item.trim().to_string();
                if section == Section::Insights {
                    insights.push(item);
                } else {
                    recommendations.push(item);
                }
            }
        }
    }

    let summary = if summary_lines.is_empty() {
        prompts::truncate_chars(response, RAW_SUMMARY_CHARS).trim().to_string()
    } else {
        summary_lines.join(" ")
    };

    if insights.is_empty() {
        insights.push(DEFAULT_INSIGHT.to_string());
    }
    if recommendations.is_empty() {
        recommendations.push(DEFAULT_RECOMMENDATION.to_string());
    }

    SummaryResult {
        summary,
        insights,
        recommendations,
    }
}

/// Summarizes repositories with a chat model
pub struct LlmSummarizer {
    client: ProbeLlmClient,
}

impl LlmSummarizer {
    pub async fn new(config: LlmConfig) -> ProbeResult<Self> {
        Ok(Self {
            client: ProbeLlmClient::new(config).await?,
        })
    }

    pub fn from_client(client: ProbeLlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        repository: &RepositorySnapshot,
        files: &[FileMetadata],
        readme: Option<&str>,
    ) -> ProbeResult<SummaryResult> {
        info!(
            provider = self.client.provider(),
            model = self.client.model(),
            repo = %repository.name,
            "Summarizing repository"
        );

        let prompt = prompts::summarization_prompt(repository, files, readme);
        let response = self
            .client
            .generate_with_system(SUMMARIZATION_SYSTEM_PROMPT, &prompt)
            .await?;

        let result = parse_summary_response(&response);
        debug!(
            insights = result.insights.len(),
            recommendations = result.recommendations.len(),
            "Parsed summary response"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_reply() {
        let reply = "## Summary\n\
                     A payments platform.\n\
                     Split into three services.\n\
                     \n\
                     ## Insights\n\
                     - Event driven\n\
                     * Uses PostgreSQL\n\
                     not a bullet\n\
                     ## Recommendations\n\
                     • Add contract tests\n";

        let result = parse_summary_response(reply);

        assert_eq!(result.summary, "A payments platform. Split into three services.");
        assert_eq!(result.insights, vec!["Event driven", "Uses PostgreSQL"]);
        assert_eq!(result.recommendations, vec!["Add contract tests"]);
    }

    #[test]
    fn test_unstructured_reply_gets_defaults() {
        let reply = "## Overview\n".to_string() + &"x".repeat(800);
        let result = parse_summary_response(&reply);

        assert_eq!(result.summary.chars().count(), 800);
        assert_eq!(result.insights, vec![DEFAULT_INSIGHT]);
        assert_eq!(result.recommendations, vec![DEFAULT_RECOMMENDATION]);
    }

    #[test]
    fn test_heading_only_reply_falls_back_to_raw_prefix() {
        let reply = format!("# {}", "y".repeat(700));
        let result = parse_summary_response(&reply);
        assert_eq!(result.summary.chars().count(), RAW_SUMMARY_CHARS);
    }
}
