mod bootstrap;
mod health;
mod scoreboard;
mod slash;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pikabot_core::config::{AppConfig, LoadOptions};
use tokio::sync::Notify;

fn init_logging(config: &AppConfig) {
    use pikabot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = app.listener.local_addr()?;
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);

    let routes = slash::router(slash::SlashState::new(&app.config, Arc::clone(&app.score_file)))
        .merge(health::router(Arc::clone(&app.score_file)));

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        score_file = %app.score_file.path().display(),
        "pikabot-server listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(app.listener, routes).with_graceful_shutdown({
        let shutdown = Arc::clone(&shutdown);
        async move { shutdown.notified().await }
    });
    let mut server_task = tokio::spawn(async move { server.await });

    tokio::select! {
        finished = &mut server_task => {
            finished??;
            return Ok(());
        }
        signal = wait_for_shutdown() => signal?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        grace_secs = grace.as_secs(),
        "pikabot-server stopping"
    );
    shutdown.notify_one();

    match tokio::time::timeout(grace, server_task).await {
        Ok(finished) => finished??,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            grace_secs = grace.as_secs(),
            "in-flight requests did not finish before the grace period"
        ),
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
