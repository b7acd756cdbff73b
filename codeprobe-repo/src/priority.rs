//! Priority file selection
//!
//! Picks the most informative files of a single directory and fetches a
//! bounded prefix of each.

use codeprobe_core::{try_with_timeout, ContentKind, KeyFile, RepositorySource};
use tracing::{debug, warn};

/// Upper bound on the bytes kept from each selected file
pub const MAX_KEY_FILE_BYTES: usize = 5000;

const ENTRY_POINT_NAMES: &[&str] = &[
    "main",
    "index",
    "app",
    "server",
    "program",
    "startup",
    "application",
];

const CONFIG_NAMES: &[&str] = &[
    "dockerfile",
    "docker-compose.yml",
    ".env",
    "config.json",
    "config.yaml",
    "appsettings.json",
    "application.properties",
    "application.yml",
];

const MANIFEST_EXTENSIONS: &[&str] = &[".json", ".toml", ".xml", ".lock", ".mod"];

const SOURCE_EXTENSIONS: &[&str] = &[
    ".cs", ".js", ".ts", ".py", ".java", ".go", ".rs", ".rb", ".php", ".cpp", ".c",
];

const DOC_EXTENSIONS: &[&str] = &[".md", ".txt", ".rst"];

/// Importance of a file judged by its name alone; higher is more important.
///
/// | score | rule |
/// |-------|------|
/// | 100 | name without extension is an entry point (`main`, `index`, ...) |
/// | 90  | name contains `main`, `app` or `server` |
/// | 80  | well-known configuration file |
/// | 70  | manifest or lock file |
/// | 60  | source code |
/// | 50  | documentation |
/// | 40  | anything else |
pub fn priority_score(name: &str) -> u32 {
    let lower = name.to_lowercase();
    let (stem, extension) = split_extension(&lower);

    if ENTRY_POINT_NAMES.contains(&stem) {
        100
    } else if lower.contains("main") || lower.contains("app") || lower.contains("server") {
        90
    } else if CONFIG_NAMES.contains(&lower.as_str()) {
        80
    } else if MANIFEST_EXTENSIONS.contains(&extension) || lower == "gemfile" || lower == "pipfile"
    {
        70
    } else if SOURCE_EXTENSIONS.contains(&extension) {
        60
    } else if DOC_EXTENSIONS.contains(&extension) {
        50
    } else {
        40
    }
}

/// Split a lower-cased file name into stem and dotted extension.
///
/// A leading dot does not start an extension, so `.env` has none.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Truncate to at most `max_bytes` without splitting a character
pub fn truncate_on_char_boundary(content: &str, max_bytes: usize) -> &str {
    if content.len() <= max_bytes {
        return content;
    }
    let mut end = max_bytes;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

/// Select and fetch the `max_files` most important files directly inside
/// `dir_path`.
///
/// Each call is bounded by `call_timeout_ms`. A failed listing yields no
/// files. Files whose content cannot be read in time, or is empty, are
/// skipped without affecting the rest of the batch.
pub async fn select_priority_files(
    source: &dyn RepositorySource,
    owner: &str,
    name: &str,
    dir_path: &str,
    max_files: usize,
    call_timeout_ms: u64,
) -> Vec<KeyFile> {
    let listing = try_with_timeout(
        source.list_directory(owner, name, dir_path),
        call_timeout_ms,
        "list_directory",
    )
    .await;
    let items = match listing {
        Ok(items) => items,
        Err(e) => {
            warn!(path = dir_path, error = %e, "Could not list directory for key files");
            return Vec::new();
        }
    };

    let mut candidates: Vec<(u32, _)> = items
        .into_iter()
        .filter(|item| item.kind == ContentKind::File)
        .map(|item| (priority_score(&item.name), item))
        .collect();
    // Stable, so equal scores keep listing order
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    let mut key_files = Vec::new();
    for (score, item) in candidates.into_iter().take(max_files) {
        let content = try_with_timeout(
            source.get_file_content(owner, name, &item.path),
            call_timeout_ms,
            "get_file_content",
        )
        .await;
        match content {
            Ok(content) if !content.is_empty() => {
                debug!(path = %item.path, score, "Selected key file");
                key_files.push(KeyFile {
                    path: item.path,
                    name: item.name,
                    content: truncate_on_char_boundary(&content, MAX_KEY_FILE_BYTES).to_string(),
                });
            }
            Ok(_) => debug!(path = %item.path, "Skipping empty key file"),
            Err(e) => warn!(path = %item.path, error = %e, "Skipping unreadable key file"),
        }
    }

    key_files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySource;

    #[test]
    fn test_priority_table() {
        assert_eq!(priority_score("main.py"), 100);
        assert_eq!(priority_score("Program.cs"), 100);
        assert_eq!(priority_score("index"), 100);
        assert_eq!(priority_score("mainframe.go"), 90);
        assert_eq!(priority_score("webapp.js"), 90);
        assert_eq!(priority_score("Dockerfile"), 80);
        assert_eq!(priority_score(".env"), 80);
        assert_eq!(priority_score("package.json"), 70);
        assert_eq!(priority_score("go.mod"), 70);
        assert_eq!(priority_score("Gemfile"), 70);
        assert_eq!(priority_score("utils.rs"), 60);
        assert_eq!(priority_score("CHANGELOG.md"), 50);
        assert_eq!(priority_score("logo.png"), 40);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_on_char_boundary("short", 10), "short");
        // 'é' is two bytes; cutting at 2 would split it
        assert_eq!(truncate_on_char_boundary("aé", 2), "a");
        assert_eq!(truncate_on_char_boundary("abcdef", 3), "abc");
    }

    #[tokio::test]
    async fn test_selects_top_files_and_skips_unreadable() {
        let big = "x".repeat(MAX_KEY_FILE_BYTES + 100);
        let source = InMemorySource::new("o", "r")
            .with_file("svc/README.md", "docs")
            .with_file("svc/main.py", &big)
            .with_file("svc/Dockerfile", "FROM python")
            .with_file("svc/empty.py", "")
            .with_file("svc/utils.py", "def f(): pass")
            .with_file("svc/nested/deep.py", "ignored")
            .failing_content("svc/Dockerfile");

        let files = select_priority_files(&source, "o", "r", "svc", 3, 1000).await;

        // Top three by score: main.py, Dockerfile (unreadable), then a 60 tie
        // between empty.py and utils.py resolved by listing order
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["main.py"]);
        assert_eq!(files[0].content.len(), MAX_KEY_FILE_BYTES);

        let files = select_priority_files(&source, "o", "r", "svc", 10, 1000).await;
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["main.py", "utils.py", "README.md"]);
    }

    #[tokio::test]
    async fn test_failed_listing_yields_nothing() {
        let source = InMemorySource::new("o", "r")
            .with_file("svc/main.py", "x")
            .failing_listing("svc");
        assert!(select_priority_files(&source, "o", "r", "svc", 5, 1000)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_slow_files_are_skipped_after_timeout() {
        let source = InMemorySource::new("o", "r")
            .with_file("svc/main.py", "print('hi')")
            .with_file("svc/utils.py", "def f(): pass")
            .slow_content("svc/main.py", 500);

        let files = select_priority_files(&source, "o", "r", "svc", 5, 50).await;

        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["utils.py"]);
    }
}
