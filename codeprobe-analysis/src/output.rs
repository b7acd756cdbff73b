//! JSON report assembly and validation
//!
//! The report layout is fixed:
//!
//! ```text
//! analysis_metadata  when, what and with which analyzer version
//! repository         identity, overview, services, connections, patterns
//! metadata           files, dependencies, code_metrics, tech_stack
//! analysis           summary, insights, recommendations
//! issues             present only when issues were collected
//! ```
//!
//! Truncated lists say so in the report itself.

use crate::pipeline::AnalysisState;
use crate::services;
use chrono::{DateTime, SecondsFormat, Utc};
use codeprobe_core::{
    CodeMetrics, DependencyRecord, FileMetadata, IssueItem, IssuesSnapshot, ProbeResult,
    ServiceConnection, ServiceDescriptor, ServicePatterns, TechStackItem,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Version stamped into every report
pub const ANALYZER_VERSION: &str = "1.0.0";
/// Files listed in `metadata.files`; the rest are counted but not listed
pub const MAX_FILES_IN_OUTPUT: usize = 500;
/// Entries in each `issues.recent_activity` list
pub const MAX_RECENT_ACTIVITY: usize = 10;
/// Entries in `issues.metadata.active_contributors`
pub const MAX_CONTRIBUTORS: usize = 10;

/// Issue title keywords reported as technologies
const ISSUE_TECHNOLOGIES: &[&str] = &[
    ".NET",
    "Blazor",
    "Bootstrap",
    "jQuery",
    "Duende IdentityServer",
    "playwright",
    "javascript",
];

#[derive(Serialize)]
struct Report<'a> {
    analysis_metadata: AnalysisMetadata<'a>,
    repository: RepositoryView<'a>,
    metadata: MetadataView<'a>,
    analysis: AnalysisView<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issues: Option<IssuesView<'a>>,
}

#[derive(Serialize)]
struct AnalysisMetadata<'a> {
    analyzed_at: String,
    repository: Identity<'a>,
    analyzer_version: &'static str,
}

#[derive(Serialize)]
struct Identity<'a> {
    owner: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct RepositoryView<'a> {
    name: &'a str,
    owner: &'a str,
    description: Option<&'a str>,
    stars: u64,
    url: String,
    overview: &'a str,
    services: &'a [ServiceDescriptor],
    connections: Vec<ServiceConnection>,
    patterns: PatternsView,
}

/// Serialises as `{}` when there are no services
#[derive(Serialize)]
#[serde(untagged)]
enum PatternsView {
    Empty {},
    Present(ServicePatterns),
}

#[derive(Serialize)]
struct MetadataView<'a> {
    files: &'a [FileMetadata],
    files_truncated: bool,
    total_files_listed: usize,
    dependencies: &'a [DependencyRecord],
    code_metrics: &'a CodeMetrics,
    tech_stack: &'a [TechStackItem],
}

#[derive(Serialize)]
struct AnalysisView<'a> {
    summary: &'a str,
    insights: &'a [String],
    recommendations: &'a [String],
}

#[derive(Serialize)]
struct IssuesView<'a> {
    summary: IssueCounts,
    categorized_issues: CategorizedIssues<'a>,
    metadata: IssueMetadata<'a>,
    patterns: IssuePatterns,
    recent_activity: RecentActivity<'a>,
}

#[derive(Serialize)]
struct IssueCounts {
    total_open_issues: usize,
    total_closed_issues: usize,
    total_prs: usize,
}

#[derive(Serialize, Default)]
struct CategorizedIssues<'a> {
    bugs: Vec<IssueView<'a>>,
    features: Vec<IssueView<'a>>,
    documentation: Vec<IssueView<'a>>,
    questions: Vec<IssueView<'a>>,
    other: Vec<IssueView<'a>>,
}

#[derive(Serialize)]
struct IssueView<'a> {
    number: u64,
    title: &'a str,
    state: &'a str,
    created_at: &'a str,
    labels: &'a [String],
}

impl<'a> From<&'a IssueItem> for IssueView<'a> {
    fn from(issue: &'a IssueItem) -> Self {
        Self {
            number: issue.number,
            title: &issue.title,
            state: &issue.state,
            created_at: &issue.created_at,
            labels: &issue.labels,
        }
    }
}

#[derive(Serialize)]
struct PullRequestView<'a> {
    number: u64,
    title: &'a str,
    created_at: &'a str,
}

#[derive(Serialize)]
struct IssueMetadata<'a> {
    active_contributors: Vec<&'a str>,
    common_technologies: Vec<&'static str>,
    issue_labels: BTreeMap<&'a str, usize>,
}

#[derive(Serialize)]
struct IssuePatterns {
    pain_points: Vec<&'static str>,
    improvement_opportunities: Vec<&'static str>,
}

#[derive(Serialize)]
struct RecentActivity<'a> {
    recent_issues: Vec<IssueView<'a>>,
    recent_prs: Vec<PullRequestView<'a>>,
}

/// Renders an [`AnalysisState`] into the JSON report
#[derive(Debug, Clone)]
pub struct ReportFormatter {
    max_files: usize,
    pretty: bool,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self {
            max_files: MAX_FILES_IN_OUTPUT,
            pretty: true,
        }
    }
}

impl ReportFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Render the report stamped with the current time
    pub fn format(&self, state: &AnalysisState) -> ProbeResult<String> {
        self.format_at(state, Utc::now())
    }

    /// Render the report stamped with `analyzed_at`
    pub fn format_at(&self, state: &AnalysisState, analyzed_at: DateTime<Utc>) -> ProbeResult<String> {
        let repository = &state.repository;
        let metadata = &state.metadata;
        let service_list = &metadata.services;

        let listed = metadata.files.len().min(self.max_files);

        let report = Report {
            analysis_metadata: AnalysisMetadata {
                analyzed_at: analyzed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                repository: Identity {
                    owner: &repository.owner,
                    name: &repository.name,
                },
                analyzer_version: ANALYZER_VERSION,
            },
            repository: RepositoryView {
                name: &repository.name,
                owner: &repository.owner,
                description: repository.description.as_deref(),
                stars: repository.stars,
                url: format!("https://github.com/{}/{}", repository.owner, repository.name),
                overview: &state.analysis.summary,
                services: service_list,
                connections: services::connections(service_list),
                patterns: if service_list.is_empty() {
                    PatternsView::Empty {}
                } else {
                    PatternsView::Present(services::patterns(service_list))
                },
            },
            metadata: MetadataView {
                files: &metadata.files[..listed],
                files_truncated: listed < metadata.files.len(),
                total_files_listed: listed,
                dependencies: &metadata.dependencies,
                code_metrics: &metadata.code_metrics,
                tech_stack: &metadata.tech_stack,
            },
            analysis: AnalysisView {
                summary: &state.analysis.summary,
                insights: &state.analysis.insights,
                recommendations: &state.analysis.recommendations,
            },
            issues: state.issues.as_ref().map(format_issues),
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        Ok(json)
    }

    /// Check that a rendered report carries every required section.
    ///
    /// Never fails; malformed input is simply invalid.
    pub fn validate(json: &str) -> bool {
        let Ok(data) = serde_json::from_str::<serde_json::Value>(json) else {
            return false;
        };

        let has_keys = |section: &str, keys: &[&str]| {
            data.get(section)
                .and_then(|v| v.as_object())
                .is_some_and(|obj| keys.iter().all(|k| obj.contains_key(*k)))
        };

        has_keys("repository", &["name", "owner"])
            && has_keys(
                "metadata",
                &["files", "dependencies", "code_metrics", "tech_stack"],
            )
            && has_keys("analysis", &["summary", "insights", "recommendations"])
    }
}

fn label_matches(issue: &IssueItem, needles: &[&str]) -> bool {
    issue.labels.iter().any(|label| {
        let label = label.to_lowercase();
        needles.iter().any(|needle| label.contains(needle))
    })
}

fn format_issues(snapshot: &IssuesSnapshot) -> IssuesView<'_> {
    let issues = &snapshot.issues;
    let prs = &snapshot.pull_requests;

    let mut categorized = CategorizedIssues::default();
    for issue in issues {
        let bucket = if label_matches(issue, &["bug"]) {
            &mut categorized.bugs
        } else if label_matches(issue, &["feature", "enhancement"]) {
            &mut categorized.features
        } else if label_matches(issue, &["doc"]) {
            &mut categorized.documentation
        } else if label_matches(issue, &["question"]) {
            &mut categorized.questions
        } else {
            &mut categorized.other
        };
        bucket.push(issue.into());
    }

    let mut issue_labels: BTreeMap<&str, usize> = BTreeMap::new();
    let mut contributors: Vec<&str> = Vec::new();
    let mut seen_contributors = HashSet::new();
    let mut technologies: Vec<&'static str> = Vec::new();

    for item in issues.iter().chain(prs.iter()) {
        for label in &item.labels {
            *issue_labels.entry(label.as_str()).or_default() += 1;
        }
        if let Some(user) = item.user.as_deref() {
            if seen_contributors.insert(user) && contributors.len() < MAX_CONTRIBUTORS {
                contributors.push(user);
            }
        }
        let title = item.title.to_lowercase();
        for &tech in ISSUE_TECHNOLOGIES {
            if title.contains(&tech.to_lowercase()) && !technologies.contains(&tech) {
                technologies.push(tech);
            }
        }
    }

    let count_state = |state: &str| issues.iter().filter(|i| i.state == state).count();

    IssuesView {
        summary: IssueCounts {
            total_open_issues: count_state("open"),
            total_closed_issues: count_state("closed"),
            total_prs: prs.len(),
        },
        categorized_issues: categorized,
        metadata: IssueMetadata {
            active_contributors: contributors,
            common_technologies: technologies,
            issue_labels,
        },
        patterns: issue_patterns(issues.is_empty()),
        recent_activity: RecentActivity {
            recent_issues: issues
                .iter()
                .take(MAX_RECENT_ACTIVITY)
                .map(IssueView::from)
                .collect(),
            recent_prs: prs
                .iter()
                .take(MAX_RECENT_ACTIVITY)
                .map(|pr| PullRequestView {
                    number: pr.number,
                    title: &pr.title,
                    created_at: &pr.created_at,
                })
                .collect(),
        },
    }
}

fn issue_patterns(no_issues: bool) -> IssuePatterns {
    if !no_issues {
        return IssuePatterns {
            pain_points: Vec::new(),
            improvement_opportunities: Vec::new(),
        };
    }

    IssuePatterns {
        pain_points: vec![
            "No issues have been reported, indicating either low engagement or a lack of active issue tracking.",
        ],
        improvement_opportunities: vec![
            "Encourage contributors to report and categorize issues to better identify areas for improvement.",
            "Increase usage of issue labels to facilitate pattern analysis and prioritization.",
        ],
    }
}
