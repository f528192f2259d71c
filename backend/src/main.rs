//! Main entry point for the registration backend.
//!
//! Parses the command line, initializes logging, loads and validates the
//! configuration, then hands over to [`backend::serve`].

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backend::config::AppConfig;

#[derive(Parser)]
#[command(name = "hackportald")]
#[command(about = "Hackathon registration backend", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HACKPORTAL_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides `server.listen_addr`
    #[arg(short, long, env = "HACKPORTAL_LISTEN_ADDR")]
    listen: Option<SocketAddr>,

    /// Log level, overrides `logging.level`
    #[arg(long, env = "HACKPORTAL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "HACKPORTAL_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    backend::serve(config).await?;
    Ok(())
}
