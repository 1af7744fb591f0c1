use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use feedmerge::app::App;
use feedmerge::client::{Poller, PollerSettings};
use feedmerge::{server, ui, Config};

#[derive(Parser, Debug)]
#[command(
    name = "feedmerge",
    version,
    about = "Merge news feeds into one RSS feed and follow it from the terminal"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the merged feed over HTTP
    Serve {
        /// Config file (default: ~/.config/feedmerge/config.toml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Port to listen on (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Follow the merged feed in the terminal
    Watch {
        /// Config file (default: ~/.config/feedmerge/config.toml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Feed endpoint to poll (overrides config and FEEDMERGE_API_URL)
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },
}

/// File → environment → CLI flags, then validation.
fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let mut config = match path.or_else(Config::default_path) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Serve { config, port } => {
            tracing_subscriber::registry()
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
                .with(tracing_subscriber::fmt::layer())
                .init();

            let mut config = load_config(config)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            server::serve(config).await
        }
        Command::Watch { config, api_url } => {
            // stderr only, errors unless RUST_LOG says otherwise: stdout belongs to the TUI.
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
                )
                .init();

            let mut config = load_config(config)?;
            if let Some(api_url) = api_url {
                config.client.api_url = api_url;
            }
            config.validate()?;

            watch(config).await
        }
    }
}

async fn watch(config: Config) -> Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(config.fetch.user_agent.as_str())
        .build()
        .context("Failed to build HTTP client")?;

    let (update_tx, update_rx) = mpsc::channel(16);
    let poller = Poller::spawn(client, PollerSettings::from(&config.client), update_tx);

    let mut app = App::new(config.client.max_items, config.client.api_url.clone());
    let result = ui::run(&mut app, &poller, update_rx).await;

    poller.shutdown();
    result
}
