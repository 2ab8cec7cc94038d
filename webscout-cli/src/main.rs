//! webscout command-line entry point.
//!
//! One-shot mode runs a single research query and prints the report;
//! without a query argument an interactive prompt loop starts instead.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use webscout_core::browser::ContentFetcher;
use webscout_core::{load_config, providers, ResearchOrchestrator, WebscoutConfig};

#[derive(Parser, Debug)]
#[command(name = "webscout", version, about = "Layered web research agent")]
struct Cli {
    /// Research query. Omit to start an interactive session.
    query: Option<String>,

    /// Path to a TOML config file, layered over defaults and the user
    /// config directory.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Run the browser with a visible window.
    #[arg(long)]
    no_headless: bool,
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(verbose)));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

#[cfg(feature = "browser")]
fn make_fetcher(config: &WebscoutConfig) -> Result<Arc<dyn ContentFetcher>> {
    Ok(Arc::new(webscout_core::browser::ChromiumFetcher::new(
        config.browser.clone(),
        config.research.clone(),
    )))
}

#[cfg(not(feature = "browser"))]
fn make_fetcher(_config: &WebscoutConfig) -> Result<Arc<dyn ContentFetcher>> {
    anyhow::bail!("this build has no browser support; rebuild with the 'browser' feature")
}

async fn interactive_loop(orchestrator: &ResearchOrchestrator) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("Research query> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let query = line?.trim().to_string();

        if query.is_empty() {
            continue;
        }
        if matches!(query.as_str(), "quit" | "exit" | "q") {
            break;
        }

        let report = orchestrator.run(&query).await;
        println!("\n{report}\n");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to load configuration")?;
    if cli.no_headless {
        config.browser.headless = false;
    }
    for warning in config.validate() {
        warn!("{warning}");
    }

    let llm = providers::create_client(&config.llm).context("failed to create LLM client")?;
    let fetcher = make_fetcher(&config)?;
    let orchestrator = ResearchOrchestrator::new(fetcher, llm, config.research.clone());

    match cli.query {
        Some(query) => {
            let report = orchestrator.run(&query).await;
            println!("{report}");
        }
        None => interactive_loop(&orchestrator).await?,
    }

    Ok(())
}
