mod bootstrap;
mod driver;
mod http;
mod metrics;

use anyhow::{anyhow, Result};
use stockcast_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use stockcast_core::config::LogFormat::*;
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
    let config = AppConfig::load(LoadOptions::from_env())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    http::spawn(&app.config.server.bind_address, app.config.server.port, app.http_state()).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        tick_interval_secs = app.config.simulation.tick_interval_secs,
        seed = app.run.seed(),
        "stockcast-server started"
    );
    let driver = tokio::spawn(app.into_driver().run());

    tokio::select! {
        signal = wait_for_shutdown() => {
            signal?;
            tracing::info!(
                event_name = "system.server.stopping",
                correlation_id = "shutdown",
                "stockcast-server stopping"
            );
            Ok(())
        }
        outcome = driver => match outcome {
            Ok(Ok(())) => Err(anyhow!("tick driver exited unexpectedly")),
            Ok(Err(failure)) => Err(failure.into()),
            Err(join_error) => Err(anyhow!("tick driver task failed: {join_error}")),
        },
    }
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
