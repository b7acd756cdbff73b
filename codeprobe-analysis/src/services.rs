//! Service inference and the service dependency graph
//!
//! A service is a directory directly below the `src/` source root. Edges are
//! inferred by looking for other services' names inside a service's
//! dependency names.

use crate::classifier::extension_of;
use codeprobe_core::{
    DependencyRecord, FileEntry, ServiceConnection, ServiceDescriptor, ServicePatterns,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Top-level directory whose children are treated as services
pub const SOURCE_ROOT: &str = "src";
/// Maximum file names listed per service
pub const MAX_SERVICE_KEY_FILES: usize = 20;
/// Maximum dependency names attributed per service
pub const MAX_SERVICE_DEPENDENCIES: usize = 15;

const SERVICE_TYPE: &str = "service";
const CONNECTION_TYPE: &str = "dependency";

/// Group files under `src/<service>/` into service descriptors.
///
/// Services appear in order of their first file. Files placed directly in
/// `src/` belong to no service.
pub fn extract(files: &[FileEntry], dependencies: &[DependencyRecord]) -> Vec<ServiceDescriptor> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: BTreeMap<&str, Vec<&FileEntry>> = BTreeMap::new();

    for file in files {
        let mut segments = file.path.split('/');
        if segments.next() != Some(SOURCE_ROOT) {
            continue;
        }
        let (Some(service), Some(_)) = (segments.next(), segments.next()) else {
            continue;
        };
        if service.is_empty() {
            continue;
        }
        grouped
            .entry(service)
            .or_insert_with(|| {
                order.push(service);
                Vec::new()
            })
            .push(file);
    }

    order
        .into_iter()
        .map(|service| {
            let service_files = grouped.remove(service).unwrap_or_default();
            describe(service, &service_files, dependencies)
        })
        .collect()
}

fn describe(
    service: &str,
    files: &[&FileEntry],
    dependencies: &[DependencyRecord],
) -> ServiceDescriptor {
    let file_extensions: BTreeSet<String> = files
        .iter()
        .map(|f| extension_of(&f.name))
        .filter(|ext| !ext.is_empty())
        .collect();

    let prefix = format!("{}/{}/", SOURCE_ROOT, service);
    let dependencies = dependencies
        .iter()
        .filter(|d| d.source_file.starts_with(&prefix))
        .take(MAX_SERVICE_DEPENDENCIES)
        .map(|d| d.name.clone())
        .collect();

    ServiceDescriptor {
        name: service.to_string(),
        file_extensions: file_extensions.into_iter().collect(),
        key_files: files
            .iter()
            .take(MAX_SERVICE_KEY_FILES)
            .map(|f| f.name.clone())
            .collect(),
        dependencies,
        service_type: SERVICE_TYPE.to_string(),
        file_count: files.len(),
    }
}

/// Lower-case and strip `.`, `-` and `_`
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '.' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Infer `from -> to` edges where `to`'s normalised name occurs inside one
/// of `from`'s normalised dependency names. Self-edges are never produced.
pub fn connections(services: &[ServiceDescriptor]) -> Vec<ServiceConnection> {
    let normalized: Vec<(&str, String)> = services
        .iter()
        .map(|s| (s.name.as_str(), normalize(&s.name)))
        .collect();

    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for service in services {
        for dependency in &service.dependencies {
            let dependency_norm = normalize(dependency);
            for (other, other_norm) in &normalized {
                if *other == service.name || other_norm.is_empty() {
                    continue;
                }
                if !dependency_norm.contains(other_norm.as_str()) {
                    continue;
                }
                let key = (service.name.clone(), other.to_string(), dependency.clone());
                if seen.insert(key) {
                    edges.push(ServiceConnection {
                        from: service.name.clone(),
                        to: other.to_string(),
                        connection_type: CONNECTION_TYPE.to_string(),
                        via: dependency.clone(),
                    });
                }
            }
        }
    }

    edges
}

/// Summary statistics over the services
pub fn patterns(services: &[ServiceDescriptor]) -> ServicePatterns {
    let mut patterns = ServicePatterns {
        total_services: services.len(),
        ..Default::default()
    };

    let mut extension_usage: BTreeMap<String, usize> = BTreeMap::new();
    for service in services {
        *patterns
            .service_types
            .entry(service.service_type.clone())
            .or_default() += 1;
        for ext in &service.file_extensions {
            *extension_usage.entry(ext.clone()).or_default() += 1;
        }
    }

    patterns.shared_technologies = extension_usage
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect();

    patterns
}
