//! `package.json` dependency maps

use super::DependencyParser;
use codeprobe_core::DependencyRecord;

/// Sections read from `package.json`; the section name becomes the record kind
pub const NPM_SECTIONS: &[&str] = &["dependencies", "devDependencies", "peerDependencies"];

pub struct PackageJsonParser {
    pub sections: &'static [&'static str],
}

impl Default for PackageJsonParser {
    fn default() -> Self {
        Self {
            sections: NPM_SECTIONS,
        }
    }
}

impl DependencyParser for PackageJsonParser {
    fn parse(&self, content: &str, source_file: &str) -> Vec<DependencyRecord> {
        let parsed: serde_json::Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };

        let mut records = Vec::new();
        for section in self.sections {
            let Some(deps) = parsed.get(section).and_then(|v| v.as_object()) else {
                continue;
            };
            for (name, version) in deps {
                if name.is_empty() {
                    continue;
                }
                records.push(DependencyRecord {
                    name: name.clone(),
                    version: version.as_str().map(str::to_string),
                    kind: section.to_string(),
                    source_file: source_file.to_string(),
                });
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_become_kinds() {
        let content = r#"{
            "name": "web",
            "dependencies": {"express": "^4.18.0"},
            "devDependencies": {"jest": "^29.0.0"},
            "peerDependencies": {"react": ">=18"}
        }"#;

        let records = PackageJsonParser::default().parse(content, "web/package.json");
        let summary: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.name.as_str(), r.kind.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("express", "dependencies"),
                ("jest", "devDependencies"),
                ("react", "peerDependencies")
            ]
        );
        assert!(records.iter().all(|r| r.source_file == "web/package.json"));
    }

    #[test]
    fn test_non_string_versions_and_malformed_input() {
        let records = PackageJsonParser::default()
            .parse(r#"{"dependencies": {"local": {"path": "../x"}}}"#, "package.json");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].version, None);

        assert!(PackageJsonParser::default()
            .parse("{ not json", "package.json")
            .is_empty());
        assert!(PackageJsonParser::default()
            .parse(r#"{"dependencies": []}"#, "package.json")
            .is_empty());
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let records = PackageJsonParser::default().parse(
            r#"{"dependencies": {"zod": "3.0.0", "express": "4.0.0", "axios": "1.6.0"}}"#,
            "package.json",
        );
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zod", "express", "axios"]);
    }
}
