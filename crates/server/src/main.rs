mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use todobot_core::config::{AppConfig, LoadOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn log_filter(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.trim().to_ascii_lowercase()))
}

fn init_logging(config: &AppConfig) {
    use todobot_core::config::LogFormat::*;

    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(log_filter(config));
    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging depends on the loaded config, so nothing is logged before this.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.store.clone(),
    )
    .await?;

    let registered = app.runner.register_commands().await?;
    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        registered_commands = registered,
        scope = ?app.runner.scope(),
        "todobot-server started"
    );

    tokio::select! {
        result = app.runner.start() => {
            result?;
            info!(
                correlation_id = "shutdown",
                "gateway loop finished; waiting for shutdown signal"
            );
            wait_for_shutdown().await?;
        }
        signal = wait_for_shutdown() => signal?,
    }

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "todobot-server stopping"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, app.runner.remove_commands()).await {
        Ok(Ok(removed)) => {
            info!(
                correlation_id = "shutdown",
                removed_commands = removed,
                "slash commands removed"
            );
        }
        Ok(Err(error)) => {
            warn!(correlation_id = "shutdown", error = %error, "slash command cleanup incomplete");
        }
        Err(_) => {
            warn!(
                correlation_id = "shutdown",
                timeout_secs = app.config.server.graceful_shutdown_secs,
                "slash command cleanup timed out"
            );
        }
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
