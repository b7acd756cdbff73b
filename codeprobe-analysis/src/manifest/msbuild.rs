//! MSBuild `<PackageReference>` declarations (`*.csproj`, `Directory.Packages.props`)

use super::DependencyParser;
use codeprobe_core::DependencyRecord;
use regex::Regex;
use std::sync::LazyLock;

static PACKAGE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<PackageReference\s+Include="([^"]+)"(?:\s+Version="([^"]+)")?"#)
        .expect("package reference pattern is valid")
});

#[derive(Default)]
pub struct PackageReferenceParser;

impl DependencyParser for PackageReferenceParser {
    fn parse(&self, content: &str, source_file: &str) -> Vec<DependencyRecord> {
        PACKAGE_REFERENCE
            .captures_iter(content)
            .map(|caps| DependencyRecord {
                name: caps[1].to_string(),
                version: caps.get(2).map(|m| m.as_str().to_string()),
                kind: "nuget".to_string(),
                source_file: source_file.to_string(),
            })
            .collect()
    }
}
