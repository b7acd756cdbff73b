//! File classification by name and extension

use codeprobe_core::{FileEntry, FileMetadata};

/// Extension to language table; extensions are lower-case and dotted
const LANGUAGE_TABLE: &[(&str, &str)] = &[
    (".py", "Python"),
    (".js", "JavaScript"),
    (".ts", "TypeScript"),
    (".jsx", "JavaScript"),
    (".tsx", "TypeScript"),
    (".cs", "C#"),
    (".java", "Java"),
    (".go", "Go"),
    (".rb", "Ruby"),
    (".rs", "Rust"),
    (".cpp", "C++"),
    (".c", "C"),
    (".h", "C/C++"),
    (".php", "PHP"),
    (".swift", "Swift"),
    (".kt", "Kotlin"),
    (".scala", "Scala"),
    (".r", "R"),
    (".sql", "SQL"),
    (".html", "HTML"),
    (".css", "CSS"),
    (".scss", "SCSS"),
    (".sass", "SASS"),
    (".less", "LESS"),
    (".json", "JSON"),
    (".xml", "XML"),
    (".yaml", "YAML"),
    (".yml", "YAML"),
    (".md", "Markdown"),
    (".txt", "Text"),
    (".sh", "Shell"),
    (".bash", "Bash"),
    (".ps1", "PowerShell"),
    (".dockerfile", "Docker"),
    (".tf", "Terraform"),
];

/// Lower-cased extension of `name` including the dot, or `""`.
///
/// Leading dots are not extension separators: `.env` and `..` have none,
/// while `.eslintrc.json` has `.json`.
pub fn extension_of(name: &str) -> String {
    let lower = name.to_lowercase();
    let stem_start = lower.len() - lower.trim_start_matches('.').len();
    match lower[stem_start..].rfind('.') {
        Some(idx) => lower[stem_start + idx..].to_string(),
        None => String::new(),
    }
}

/// Language of a file, `None` when unrecognised
pub fn language_for(name: &str, extension: &str) -> Option<&'static str> {
    match name.to_lowercase().as_str() {
        "dockerfile" => return Some("Docker"),
        "makefile" | "gnumakefile" => return Some("Make"),
        _ => {}
    }

    LANGUAGE_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, language)| *language)
}

/// Derive the metadata of a single discovered file
pub fn classify(entry: &FileEntry) -> FileMetadata {
    let extension = extension_of(&entry.name);
    let language = language_for(&entry.name, &extension).map(str::to_string);

    FileMetadata {
        path: entry.path.clone(),
        name: entry.name.clone(),
        extension,
        size: entry.size,
        language,
    }
}

/// Classify every entry, preserving order
pub fn classify_all(entries: &[FileEntry]) -> Vec<FileMetadata> {
    entries.iter().map(classify).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            size: 10,
            sha: None,
            download_url: None,
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("main.PY"), ".py");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".env"), "");
        assert_eq!(extension_of(".eslintrc.json"), ".json");
        assert_eq!(extension_of("trailing."), ".");
    }

    #[test]
    fn test_special_names() {
        assert_eq!(language_for("Dockerfile", ""), Some("Docker"));
        assert_eq!(language_for("GNUmakefile", ""), Some("Make"));
        assert_eq!(language_for("makefile", ""), Some("Make"));
        assert_eq!(language_for("api.dockerfile", ".dockerfile"), Some("Docker"));
    }

    #[test]
    fn test_unknown_extension_has_no_language() {
        assert_eq!(language_for("logo.png", ".png"), None);
        assert_eq!(language_for("LICENSE", ""), None);
    }

    #[test]
    fn test_classify_is_pure() {
        let file = entry("src/web/App.TSX");
        let first = classify(&file);
        let second = classify(&file);

        assert_eq!(first, second);
        assert_eq!(first.extension, ".tsx");
        assert_eq!(first.language.as_deref(), Some("TypeScript"));
        assert_eq!(first.size, 10);
    }

    #[test]
    fn test_classify_all_is_one_to_one() {
        let entries = vec![entry("a.rs"), entry("b.unknown"), entry("Dockerfile")];
        let metadata = classify_all(&entries);

        assert_eq!(metadata.len(), entries.len());
        let paths: Vec<&str> = metadata.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["a.rs", "b.unknown", "Dockerfile"]);
        assert_eq!(metadata[1].language, None);
    }
}
