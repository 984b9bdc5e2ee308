use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use stockcast_core::config::{AppConfig, ConfigError};
use stockcast_core::domain::Catalog;
use stockcast_core::event_log::JsonlEventLog;
use stockcast_core::simulation::{EngineSettings, SimulationRun, SystemClock};
use thiserror::Error;
use tracing::info;

use crate::driver::{Heartbeat, TickDriver};
use crate::http::HttpState;
use crate::metrics::InventoryMetrics;

pub struct Application {
    pub config: AppConfig,
    pub metrics: Arc<InventoryMetrics>,
    pub event_log: Arc<JsonlEventLog>,
    pub heartbeat: Arc<Heartbeat>,
    pub run: SimulationRun,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not open event log in `{path}`: {source}")]
    EventLog { path: PathBuf, source: std::io::Error },
    #[error("metrics registration failed: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let metrics = Arc::new(InventoryMetrics::new()?);

    let event_log = JsonlEventLog::open_in(&config.events.log_dir).map_err(|source| {
        BootstrapError::EventLog { path: config.events.log_dir.clone(), source }
    })?;
    info!(
        event_name = "system.bootstrap.event_log_opened",
        correlation_id = "bootstrap",
        path = %event_log.path().display(),
        "event log opened"
    );

    let seed = config.simulation.seed.unwrap_or_else(rand::random);
    let run = SimulationRun::new(
        Catalog::standard(),
        EngineSettings::from(&config.simulation),
        seed,
    );
    info!(
        event_name = "system.bootstrap.simulation_seeded",
        correlation_id = "bootstrap",
        seed,
        seed_source = if config.simulation.seed.is_some() { "config" } else { "random" },
        products = run.state().catalog().products().len(),
        warehouses = run.state().catalog().warehouse_count(),
        "simulation state seeded"
    );

    Ok(Application {
        config,
        metrics,
        event_log: Arc::new(event_log),
        heartbeat: Arc::new(Heartbeat::new(Utc::now())),
        run,
    })
}

impl Application {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.config.simulation.tick_interval_secs)
    }

    pub fn http_state(&self) -> HttpState {
        HttpState {
            metrics: self.metrics.clone(),
            heartbeat: self.heartbeat.clone(),
            log_path: self.event_log.path().display().to_string(),
            tick_interval: self.tick_interval(),
        }
    }

    /// Hands the simulation to a driver that ticks against the wall clock.
    pub fn into_driver(self) -> TickDriver {
        let tick_interval = self.tick_interval();
        TickDriver::new(
            self.run,
            Arc::new(SystemClock),
            self.metrics,
            self.event_log,
            self.heartbeat,
            tick_interval,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use stockcast_core::config::AppConfig;
    use tempfile::TempDir;

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    fn config_in(dir: &TempDir, seed: Option<u64>) -> AppConfig {
        let mut config = AppConfig::default();
        config.events.log_dir = dir.path().join("logs");
        config.simulation.seed = seed;
        config
    }

    #[test]
    fn bootstrap_opens_event_log_and_seeds_from_config() {
        let dir = TempDir::new().expect("tempdir");

        let app = bootstrap_with_config(config_in(&dir, Some(99)))
            .expect("bootstrap should succeed with a writable log dir");

        assert!(dir.path().join("logs").join("events.jsonl").exists());
        assert_eq!(app.run.seed(), 99);
        assert_eq!(app.heartbeat.ticks(), 0);
        assert!(app.http_state().log_path.ends_with("events.jsonl"));
    }

    #[test]
    fn same_configured_seed_yields_same_initial_inventory() {
        let dir = TempDir::new().expect("tempdir");

        let first = bootstrap_with_config(config_in(&dir, Some(5))).expect("first bootstrap");
        let second = bootstrap_with_config(config_in(&dir, Some(5))).expect("second bootstrap");

        let levels = |app: &crate::bootstrap::Application| -> Vec<u64> {
            app.run.state().products().iter().map(|product| product.total_units()).collect()
        };
        assert_eq!(levels(&first), levels(&second));
    }

    #[test]
    fn bootstrap_fails_fast_when_log_dir_is_unusable() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("logs");
        fs::write(&blocker, b"not a directory").expect("write blocker");

        let result = bootstrap_with_config(config_in(&dir, None));

        assert!(matches!(result, Err(BootstrapError::EventLog { .. })));
    }

    #[test]
    fn driver_built_from_application_ticks_into_the_log() {
        let dir = TempDir::new().expect("tempdir");
        let app = bootstrap_with_config(config_in(&dir, Some(3))).expect("bootstrap");
        let heartbeat = app.heartbeat.clone();

        let mut driver = app.into_driver();
        driver.tick_once().expect("tick should succeed");

        assert_eq!(heartbeat.ticks(), 1);
        let contents = fs::read_to_string(dir.path().join("logs").join("events.jsonl"))
            .expect("event log readable");
        assert!(contents.lines().count() >= 15);
    }
}
