//! `go.mod` require directives

use super::DependencyParser;
use codeprobe_core::DependencyRecord;
use regex::Regex;
use std::sync::LazyLock;

static REQUIRE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:require\s+)?(\S+)\s+(.+)$").expect("require pattern is valid")
});

#[derive(Default)]
pub struct GoModParser;

impl GoModParser {
    fn record(line: &str, source_file: &str) -> Option<DependencyRecord> {
        // `// indirect` and other trailing comments are not part of the version
        let line = match line.find("//") {
            Some(idx) => line[..idx].trim_end(),
            None => line,
        };
        let caps = REQUIRE_LINE.captures(line)?;
        Some(DependencyRecord {
            name: caps[1].to_string(),
            version: Some(caps[2].trim().to_string()),
            kind: "go".to_string(),
            source_file: source_file.to_string(),
        })
    }
}

impl DependencyParser for GoModParser {
    fn parse(&self, content: &str, source_file: &str) -> Vec<DependencyRecord> {
        let mut records = Vec::new();
        let mut in_require_block = false;

        for line in content.lines().map(str::trim) {
            if line == "require (" {
                in_require_block = true;
                continue;
            }
            if line == ")" {
                in_require_block = false;
                continue;
            }

            if in_require_block || line.starts_with("require ") {
                records.extend(Self::record(line, source_file));
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GO_MOD: &str = r#"module github.com/acme/billing

go 1.22

require github.com/google/uuid v1.6.0

require (
	github.com/gin-gonic/gin v1.9.1
	github.com/redis/go-redis/v9 v9.5.1 // indirect

	// tooling
)

replace github.com/acme/ledger => ../ledger
"#;

    #[test]
    fn test_single_line_and_block_requires() {
        let records = GoModParser.parse(GO_MOD, "src/billing/go.mod");
        let pairs: Vec<(&str, Option<&str>)> = records
            .iter()
            .map(|r| (r.name.as_str(), r.version.as_deref()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("github.com/google/uuid", Some("v1.6.0")),
                ("github.com/gin-gonic/gin", Some("v1.9.1")),
                ("github.com/redis/go-redis/v9", Some("v9.5.1")),
            ]
        );
        assert!(records.iter().all(|r| r.kind == "go"));
    }

    #[test]
    fn test_module_without_requires() {
        assert!(GoModParser
            .parse("module example.com/x\n\ngo 1.21\n", "go.mod")
            .is_empty());
    }
}
