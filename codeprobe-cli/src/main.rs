//! codeprobe CLI - analyze a GitHub repository into a JSON report

use anyhow::Context;
use clap::Parser;
use codeprobe_analysis::CodeProbe;
use codeprobe_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success, LoggingConfig,
    ProbeConfig, ProbeResult,
};
use codeprobe_llm::LlmSummarizer;
use codeprobe_repo::{ApiClientConfig, GitHubApiClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "codeprobe")]
#[command(about = "Analyze a GitHub repository and write a structured JSON report")]
#[command(version)]
struct Cli {
    /// Repository owner (defaults to REPOSITORY_OWNER)
    #[arg(long)]
    owner: Option<String>,

    /// Repository name (defaults to REPOSITORY_NAME)
    #[arg(long)]
    repo: Option<String>,

    /// Where to write the report
    #[arg(short, long, default_value = "output.json")]
    output: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Deepest directory level to expand
    #[arg(long)]
    max_depth: Option<usize>,

    /// Skip LLM summarization
    #[arg(long)]
    no_llm: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut ProbeConfig) {
        if let Some(owner) = &self.owner {
            config.repository.owner = Some(owner.clone());
        }
        if let Some(repo) = &self.repo {
            config.repository.name = Some(repo.clone());
        }
        if let Some(max_depth) = self.max_depth {
            config.tree.max_depth = max_depth;
        }
        if self.no_llm {
            config.llm.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting codeprobe v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(cli.config.as_deref())?;
    config.apply_env();
    cli.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    let owner = config
        .repository
        .owner
        .clone()
        .context("Repository owner is required")?;
    let name = config
        .repository
        .name
        .clone()
        .context("Repository name is required")?;

    let client = GitHubApiClient::new(ApiClientConfig::from_github_config(&config.github))
        .context("Failed to create GitHub client")?;
    let mut probe = CodeProbe::new(Arc::new(client), &config);

    if config.llm.is_usable() {
        match LlmSummarizer::new(config.llm.clone()).await {
            Ok(summarizer) => probe = probe.with_summarizer(Arc::new(summarizer)),
            Err(e) => warn!(error = %e, "LLM unavailable, using template summaries"),
        }
    } else {
        info!("LLM summarization disabled");
    }

    log_operation_start!("analyze_repository", owner = %owner, repo = %name);
    let outcome = probe.analyze(&owner, &name).await;

    for message in outcome.errors() {
        error!("{}", message);
    }

    if !outcome.is_complete() {
        warn!(
            stage = %outcome.stage(),
            "Analysis stopped early; no report written"
        );
        return Ok(());
    }

    if let Err(e) = outcome.save_to_file(&cli.output) {
        log_operation_error!("write_report", e, path = %cli.output.display());
        return Err(e).with_context(|| format!("Failed to write {}", cli.output.display()));
    }
    log_operation_success!("analyze_repository", path = %cli.output.display());

    let metadata = outcome.metadata();
    println!("Report written to {}", cli.output.display());
    println!(
        "  {} files, {} dependencies, {} technologies, {} services",
        metadata.code_metrics.total_files,
        metadata.dependencies.len(),
        metadata.tech_stack.len(),
        metadata.services.len()
    );

    Ok(())
}

fn load_config(config_path: Option<&Path>) -> ProbeResult<ProbeConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return ProbeConfig::from_file(path);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("codeprobe").join("config.toml")),
        Some(PathBuf::from("codeprobe.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return ProbeConfig::from_file(path);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(ProbeConfig::default())
}
