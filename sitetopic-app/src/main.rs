use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sitetopic_common::observability::init_logging;
use sitetopic_config::{SiteTopicConfig, SiteTopicConfigLoader};
use sitetopic_runtime::SiteTopicRuntime;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod server;
mod wiring;

const DEFAULT_CONFIG_FILE: &str = "sitetopic.yaml";

#[derive(Debug, Parser)]
#[command(name = "sitetopic", version, about = "Classify what a website is about")]
struct Cli {
    /// YAML configuration file (defaults to ./sitetopic.yaml when present)
    #[arg(long, global = true, env = "SITETOPIC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve,
    /// Classify a single URL and print the JSON result
    Classify {
        url: String,
        /// Skip the AI step even when it is configured
        #[arg(long)]
        no_ai: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let loader = SiteTopicConfigLoader::new();
    let loader = match &cli.config {
        Some(path) => loader.with_file(path),
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: SiteTopicConfig = loader.load()?;

    let log_path = init_logging(wiring::log_config(&cfg))?;
    tracing::debug!(log_path = %log_path.display(), "logging ready");
    wiring::log_boot(&cfg);

    let runtime = SiteTopicRuntime::build("sitetopic-worker", None)?;
    let outcome = match cli.command {
        Command::Serve => runtime.block_on(run_server(&cfg, &runtime)),
        Command::Classify { url, no_ai } => runtime.block_on(classify_once(&cfg, &url, !no_ai)),
    };
    runtime.shutdown(Duration::from_secs(5));
    outcome
}

async fn run_server(cfg: &SiteTopicConfig, runtime: &SiteTopicRuntime) -> Result<()> {
    let classifier = wiring::build_classifier(cfg)?;
    let state = server::AppState {
        use_ai: classifier.has_ai(),
        classifier: Arc::new(classifier),
    };
    server::serve(&cfg.server.bind, state, runtime.handle()).await
}

async fn classify_once(cfg: &SiteTopicConfig, raw: &str, use_ai: bool) -> Result<()> {
    let url = server::parse_target_url(raw).with_context(|| format!("cannot classify {raw}"))?;
    let classifier = wiring::build_classifier(cfg)?;
    let result = classifier.classify(&url, use_ai).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
