//! Manifest parsing through the public dispatch point

use codeprobe_analysis::manifest::{parser_for, ManifestKind, MAX_REQUIREMENT_LINE};
use codeprobe_analysis::tech_stack;
use codeprobe_core::{DependencyRecord, TechCategory};

fn parse(file_name: &str, content: &str) -> Vec<DependencyRecord> {
    let kind = ManifestKind::detect(file_name).expect("recognised manifest");
    let parser = parser_for(kind).expect("parser available");
    parser.parse(content, file_name)
}

#[test]
fn test_package_map_sections() {
    let records = parse(
        "package.json",
        r#"{"dependencies":{"express":"^4.18.0"},"devDependencies":{"jest":"^29.0.0"}}"#,
    );

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "express");
    assert_eq!(records[0].kind, "dependencies");
    assert_eq!(records[1].name, "jest");
    assert_eq!(records[1].kind, "devDependencies");
}

#[test]
fn test_pinned_list_skips_comments() {
    let records = parse("requirements.txt", "langchain>=0.3.0\n# comment\naiohttp==3.9.0\n");

    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["langchain", "aiohttp"]);
}

#[test]
fn test_oversized_requirement_line_is_skipped() {
    let long_line = format!("{}==1.0", "a".repeat(MAX_REQUIREMENT_LINE + 1));
    let content = format!("{}\nrequests==2.31.0\n", long_line);

    let records = parse("requirements.txt", &content);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "requests");
}

#[test]
fn test_package_reference_tags() {
    let content = r#"<Project Sdk="Microsoft.NET.Sdk">
  <ItemGroup>
    <PackageReference Include="Serilog" Version="3.1.1" />
    <PackageReference Include="xunit" Version="2.6.2" />
  </ItemGroup>
</Project>"#;

    let records = parse("Api.csproj", content);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "Serilog");
    assert_eq!(records[0].version.as_deref(), Some("3.1.1"));
    assert_eq!(records[1].name, "xunit");
    assert_eq!(records[1].version.as_deref(), Some("2.6.2"));
}

#[test]
fn test_empty_manifests_yield_nothing() {
    assert!(parse("package.json", "{}").is_empty());
    assert!(parse("package.json", "not json at all").is_empty());
    assert!(parse("requirements.txt", "\n# only comments\n").is_empty());
    assert!(parse("go.mod", "module example.com/x\n\ngo 1.22\n").is_empty());
}

#[test]
fn test_matching_dependencies_collapse_to_one_item() {
    let dependencies = parse(
        "package.json",
        r#"{"dependencies":{"react":"^18.2.0","react-dom":"^18.2.0"}}"#,
    );
    let stack = tech_stack::identify(&[], &dependencies);

    let react: Vec<_> = stack.iter().filter(|t| t.name == "React").collect();
    assert_eq!(react.len(), 1);
    assert_eq!(react[0].category, TechCategory::Framework);
}
