//! Size and language histograms

use codeprobe_core::{CodeMetrics, FileMetadata};

/// Aggregate metrics over classified files.
///
/// Files without a language are left out of `languages_breakdown`, files
/// without an extension out of `file_types`.
pub fn calculate(files: &[FileMetadata]) -> CodeMetrics {
    let mut metrics = CodeMetrics {
        total_files: files.len(),
        ..Default::default()
    };

    for file in files {
        metrics.total_size_bytes += file.size;
        if let Some(language) = &file.language {
            *metrics
                .languages_breakdown
                .entry(language.clone())
                .or_default() += 1;
        }
        if !file.extension.is_empty() {
            *metrics
                .file_types
                .entry(file.extension.clone())
                .or_default() += 1;
        }
    }

    metrics
}
