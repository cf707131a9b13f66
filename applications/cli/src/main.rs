/// Cadence - queue-driven playback from the command line
use anyhow::Context;
use cadence_cli::{session, CliConfig, Output};
use cadence_playback::QueueItem;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Queue-driven playback controller demo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a queue of locators on the simulated primitive
    Play {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Queue position to start at
        #[arg(short, long, default_value_t = 0)]
        start: usize,

        /// Print notifications as JSON lines instead of logging them
        #[arg(long)]
        json: bool,

        /// Locators to queue (defaults to queue.items from the configuration)
        urls: Vec<String>,
    },
    /// Print the effective configuration
    Config {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for --json output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence_cli=info,cadence_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config,
            start,
            json,
            urls,
        } => {
            let config =
                CliConfig::load(config.as_deref()).context("Failed to load configuration")?;

            let urls = if urls.is_empty() {
                config.queue.items.clone()
            } else {
                urls
            };
            let items: Vec<QueueItem> = urls.into_iter().map(QueueItem::new).collect();
            let output = if json { Output::Json } else { Output::Log };

            tokio::select! {
                result = session::run(&config, items, start, output) => {
                    let summary = result?;
                    tracing::info!(
                        "Started {} track(s), {} error(s), {} refused, {} notification(s)",
                        summary.started.len(),
                        summary.errors,
                        summary.rejected,
                        summary.notifications
                    );
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                }
            }
        }
        Commands::Config { config } => {
            let config =
                CliConfig::load(config.as_deref()).context("Failed to load configuration")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
