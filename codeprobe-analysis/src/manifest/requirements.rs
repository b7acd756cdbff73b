//! `requirements.txt` pinned lists

use super::DependencyParser;
use codeprobe_core::DependencyRecord;
use regex::Regex;
use std::sync::LazyLock;

/// Lines longer than this many characters are skipped unparsed
pub const MAX_REQUIREMENT_LINE: usize = 500;

// Bounded repetitions keep matching linear on hostile input
static REQUIREMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9][a-zA-Z0-9_-]{0,100})(?:\s*([<>=!~]{1,3})\s*([^\s#]{1,100}))?")
        .expect("requirement pattern is valid")
});

#[derive(Default)]
pub struct RequirementsParser;

impl DependencyParser for RequirementsParser {
    fn parse(&self, content: &str, source_file: &str) -> Vec<DependencyRecord> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter(|line| line.chars().count() <= MAX_REQUIREMENT_LINE)
            .filter_map(|line| REQUIREMENT_LINE.captures(line))
            .map(|caps| DependencyRecord {
                name: caps[1].to_string(),
                // A version only counts when a comparator precedes it
                version: caps
                    .get(2)
                    .and(caps.get(3))
                    .map(|m| m.as_str().to_string()),
                kind: "pip".to_string(),
                source_file: source_file.to_string(),
            })
            .collect()
    }
}
