/*
briefing - main.rs
One digest run per invocation: fetch sources, ask the LLM for a digest, push it to the
chat webhook, exit. Scheduling is left to cron or a similar external scheduler.
*/

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use briefing::ingestion::build_http_client;
use briefing::llm::remote::RemoteLlmProvider;
use briefing::notify::Notifier;
use briefing::pipeline::Pipeline;
use briefing::sources::default_sources;

#[derive(Parser, Debug)]
#[command(name = "briefing", about = "Fetch, rank and push the daily intelligence digest")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Compose the digest and log the payload instead of posting it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets usually live in .env next to the binary; absence is fine
    dotenv::dotenv().ok();

    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let mut config = match Config::load_with_defaults(Some(&default_path), override_path.as_deref()).await {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to load configuration");
            return Err(e);
        }
    };
    config.apply_env();
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    let missing = config.missing_required();
    if !missing.is_empty() {
        warn!(missing = ?missing, "required configuration missing, this run will probably push nothing");
    }

    let client = build_http_client(&config.http)?;
    let sources = default_sources(&config.sources, client.clone());
    let llm = RemoteLlmProvider::from_config(&config.llm);
    info!(model = llm.model(), endpoint = %config.llm.api_url, "LLM provider initialized");
    let notifier = Notifier::new(client, &config).with_dry_run(args.dry_run);

    let pipeline = Pipeline::new(config, sources, Arc::new(llm), notifier);
    let report = pipeline.run(Utc::now()).await;

    info!(
        gathered = report.gathered,
        failed_sources = report.failed_sources.len(),
        outcome = report.conclusion(),
        "run finished"
    );
    Ok(())
}
