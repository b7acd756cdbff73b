//! Prompt templates for repository summarization

use codeprobe_core::{FileMetadata, RepositorySnapshot};

/// File paths included in the prompt
pub const MAX_PROMPT_FILES: usize = 100;
/// README bytes included in the prompt
pub const MAX_README_CHARS: usize = 3000;

pub const SUMMARIZATION_SYSTEM_PROMPT: &str = "You are a software architecture analyst. Your task is to provide
a comprehensive summary of a code repository.

Structure your response as follows:

## Summary
A brief overview of the repository's purpose and architecture.

## Insights
Key observations about the codebase:
- Architecture patterns
- Technology choices
- Code organization
- Notable features

## Recommendations
Actionable suggestions for improvement:
- Best practices to adopt
- Potential refactoring opportunities
- Documentation improvements
- Testing suggestions

Be specific and base every point on the repository structure and content.";

/// User message describing one repository
pub fn summarization_prompt(
    repository: &RepositorySnapshot,
    files: &[FileMetadata],
    readme: Option<&str>,
) -> String {
    let file_overview = files
        .iter()
        .take(MAX_PROMPT_FILES)
        .map(|f| f.path.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let readme = match readme {
        Some(text) if !text.trim().is_empty() => truncate_chars(text, MAX_README_CHARS),
        _ => "No README available",
    };

    format!(
        "Repository: {}\nOwner: {}\nDescription: {}\nLanguages: {}\n\n\
         File Structure (up to {} files):\n{}\n\n\
         README Content:\n{}\n\n\
         Please provide a comprehensive summary with insights and recommendations.\n",
        repository.name,
        repository.owner,
        repository.description.as_deref().unwrap_or("N/A"),
        repository.languages.join(", "),
        MAX_PROMPT_FILES,
        file_overview,
        readme,
    )
}

/// At most `max` characters of `text`
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
