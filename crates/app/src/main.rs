//! Steward admin console - command-line entry point
//!
//! Loads configuration, wires the console over the reqwest transport and the
//! file store, restores any stored session and runs one command.

mod cli;
mod commands;

use std::sync::Arc;

use clap::Parser;
use steward_application::{Console, TokenStore};
use steward_infrastructure::{ConsoleConfig, FileKeyValueStore, ReqwestTransport, SystemClock};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    debug!(base_url = %config.base_url, "configuration loaded");

    let store = Arc::new(FileKeyValueStore::open(config.storage_path()?).await?);
    let transport = Arc::new(ReqwestTransport::new(&config.base_url, config.request_timeout())?);
    let console = Console::new(
        transport,
        store.clone(),
        Arc::new(SystemClock::new()),
        config.session(),
    );
    let watcher = store.spawn_watcher(config.storage_poll_interval());
    let tokens = TokenStore::new(store);

    console.start().await?;
    let result = commands::run(&console, &tokens, cli.command).await;
    console.shutdown();
    watcher.abort();
    result
}
