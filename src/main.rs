//! HTTP Redirect Gateway
//!
//! Maps an incoming request's host and path to a configured target URL and
//! answers with a 301 or 302.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                REDIRECT GATEWAY               │
//!                        │                                               │
//!   Client Request       │  ┌─────────┐    ┌──────────┐    ┌──────────┐  │
//!   ─────────────────────┼─▶│  http   │───▶│ routing  │───▶│ response │──┼──▶ 301/302/400
//!                        │  │ server  │    │ resolver │    │  render  │  │
//!                        │  └────┬────┘    └────┬─────┘    └──────────┘  │
//!                        │       │              │ load                   │
//!                        │       ▼              ▼                        │
//!                        │  ┌─────────┐    ┌──────────┐    ┌──────────┐  │
//!                        │  │   geo   │    │  config  │◀───│ watcher  │◀─┼─── routing file
//!                        │  │annotator│    │  store   │swap│ reloader │  │
//!                        │  └─────────┘    └──────────┘    └──────────┘  │
//!                        └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use redirect_gateway::config::{load_settings, GatewayConfig};
use redirect_gateway::lifecycle::startup;
use redirect_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "redirect-gateway")]
#[command(about = "Host and path based HTTP redirect gateway", long_about = None)]
struct Cli {
    /// Gateway settings file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Routing file (JSON), overrides `routes.path`.
    #[arg(short, long)]
    routes: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match load_settings(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load settings from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => GatewayConfig::default(),
    };
    if let Some(routes) = cli.routes {
        config.routes.path = routes.display().to_string();
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        routes = %config.routes.path,
        "redirect-gateway starting"
    );

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}
