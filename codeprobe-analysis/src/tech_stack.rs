//! Technology stack inventory

use codeprobe_core::{DependencyRecord, FileMetadata, TechCategory, TechStackItem};
use std::collections::HashSet;

/// Ordered substring table matched against lower-cased dependency names
const DEPENDENCY_PATTERNS: &[(&str, &str, TechCategory)] = &[
    ("react", "React", TechCategory::Framework),
    ("vue", "Vue.js", TechCategory::Framework),
    ("angular", "Angular", TechCategory::Framework),
    ("express", "Express.js", TechCategory::Framework),
    ("fastapi", "FastAPI", TechCategory::Framework),
    ("django", "Django", TechCategory::Framework),
    ("flask", "Flask", TechCategory::Framework),
    ("spring", "Spring", TechCategory::Framework),
    ("aspnet", "ASP.NET", TechCategory::Framework),
    ("microsoft.aspnetcore", "ASP.NET Core", TechCategory::Framework),
    ("entity", "Entity Framework", TechCategory::Library),
    ("pytest", "pytest", TechCategory::Testing),
    ("jest", "Jest", TechCategory::Testing),
    ("xunit", "xUnit", TechCategory::Testing),
    ("docker", "Docker", TechCategory::Infrastructure),
    ("kubernetes", "Kubernetes", TechCategory::Infrastructure),
    ("redis", "Redis", TechCategory::Database),
    ("postgres", "PostgreSQL", TechCategory::Database),
    ("mongodb", "MongoDB", TechCategory::Database),
];

const CONTAINER_FILES: &[&str] = &["dockerfile", "docker-compose.yml"];
const CI_DIRECTORY: &str = ".github";

/// Accumulates items, keeping only the first occurrence of each name
#[derive(Default)]
struct Inventory {
    items: Vec<TechStackItem>,
    seen: HashSet<String>,
}

impl Inventory {
    fn add(&mut self, name: &str, category: TechCategory, version: Option<String>) {
        if self.seen.insert(name.to_string()) {
            self.items.push(TechStackItem {
                name: name.to_string(),
                category,
                version,
            });
        }
    }
}

/// First table entry whose pattern occurs in the dependency name
pub fn match_dependency(dependency_name: &str) -> Option<(&'static str, TechCategory)> {
    let lower = dependency_name.to_lowercase();
    DEPENDENCY_PATTERNS
        .iter()
        .find(|(pattern, _, _)| lower.contains(pattern))
        .map(|(_, name, category)| (*name, *category))
}

/// Build the technology inventory.
///
/// Languages come first in order of first appearance, then technologies
/// implied by dependencies, then marker files (container definitions and a
/// top-level `.github` directory). Names are unique across the result.
pub fn identify(files: &[FileMetadata], dependencies: &[DependencyRecord]) -> Vec<TechStackItem> {
    let mut inventory = Inventory::default();

    for language in files.iter().filter_map(|f| f.language.as_deref()) {
        inventory.add(language, TechCategory::Language, None);
    }

    for dependency in dependencies {
        if let Some((name, category)) = match_dependency(&dependency.name) {
            inventory.add(name, category, dependency.version.clone());
        }
    }

    let has_container_file = files
        .iter()
        .any(|f| CONTAINER_FILES.contains(&f.name.to_lowercase().as_str()));
    if has_container_file {
        inventory.add("Docker", TechCategory::Infrastructure, None);
    }

    let has_ci_directory = files
        .iter()
        .any(|f| f.path.split('/').next() == Some(CI_DIRECTORY));
    if has_ci_directory {
        inventory.add("GitHub Actions", TechCategory::CiCd, None);
    }

    inventory.items
}

/// Framework display names in inventory order
pub fn frameworks(items: &[TechStackItem]) -> Vec<&str> {
    items
        .iter()
        .filter(|item| item.category == TechCategory::Framework)
        .map(|item| item.name.as_str())
        .collect()
}
