use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;

use tracing::info;

use relay::{AppConfig, EdgeApplicationServer, Logger};

// long running listener, the invocation handler is only reachable as a library
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Arc::new(AppConfig::parse());

    // guards are held so buffered logs flush and sentry stays connected
    let _guards = Logger::init(config.cargo_env, config.sentry_dsn.clone());

    info!(
        "logger and env prepped, relay on port {} ({:?} targets)",
        config.port, config.target_mode
    );

    EdgeApplicationServer::serve(config)
        .await
        .context("relay server failed to start")?;

    Ok(())
}
