use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alerting::{DEFAULT_REORDER_THRESHOLD_HOURS, DEFAULT_RESTOCK_PROBABILITY};

pub const EVENTS_FILE_NAME: &str = "events.jsonl";
pub const CONFIG_PATH_ENV: &str = "STOCKCAST_CONFIG";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub events: EventsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub tick_interval_secs: u64,
    /// Fixed seed for reproducible runs; drawn at startup when unset.
    pub seed: Option<u64>,
    pub reorder_threshold_hours: f64,
    pub restock_probability: f64,
}

#[derive(Clone, Debug)]
pub struct EventsConfig {
    pub log_dir: PathBuf,
}

impl EventsConfig {
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(EVENTS_FILE_NAME)
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub tick_interval_secs: Option<u64>,
    pub seed: Option<u64>,
    pub log_dir: Option<PathBuf>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

impl LoadOptions {
    /// A file named by `STOCKCAST_CONFIG` must exist; otherwise the default locations are probed.
    pub fn from_env() -> Self {
        match read_env(CONFIG_PATH_ENV) {
            Some(path) => Self {
                config_path: Some(PathBuf::from(path.trim())),
                require_file: true,
                ..Self::default()
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig {
                tick_interval_secs: 5,
                seed: None,
                reorder_threshold_hours: DEFAULT_REORDER_THRESHOLD_HOURS,
                restock_probability: DEFAULT_RESTOCK_PROBABILITY,
            },
            events: EventsConfig { log_dir: PathBuf::from("/var/log/app") },
            server: ServerConfig { bind_address: "0.0.0.0".to_string(), port: 8000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("stockcast.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(simulation) = patch.simulation {
            if let Some(tick_interval_secs) = simulation.tick_interval_secs {
                self.simulation.tick_interval_secs = tick_interval_secs;
            }
            if let Some(seed) = simulation.seed {
                self.simulation.seed = Some(seed);
            }
            if let Some(reorder_threshold_hours) = simulation.reorder_threshold_hours {
                self.simulation.reorder_threshold_hours = reorder_threshold_hours;
            }
            if let Some(restock_probability) = simulation.restock_probability {
                self.simulation.restock_probability = restock_probability;
            }
        }

        if let Some(events) = patch.events {
            if let Some(log_dir) = events.log_dir {
                self.events.log_dir = log_dir;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STOCKCAST_SIMULATION_TICK_INTERVAL_SECS") {
            self.simulation.tick_interval_secs =
                parse_env("STOCKCAST_SIMULATION_TICK_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = read_env("STOCKCAST_SIMULATION_SEED") {
            self.simulation.seed = Some(parse_env("STOCKCAST_SIMULATION_SEED", &value)?);
        }
        if let Some(value) = read_env("STOCKCAST_SIMULATION_REORDER_THRESHOLD_HOURS") {
            self.simulation.reorder_threshold_hours =
                parse_env("STOCKCAST_SIMULATION_REORDER_THRESHOLD_HOURS", &value)?;
        }
        if let Some(value) = read_env("STOCKCAST_SIMULATION_RESTOCK_PROBABILITY") {
            self.simulation.restock_probability =
                parse_env("STOCKCAST_SIMULATION_RESTOCK_PROBABILITY", &value)?;
        }

        let log_dir = read_env("STOCKCAST_EVENTS_LOG_DIR").or_else(|| read_env("LOG_DIR"));
        if let Some(value) = log_dir {
            self.events.log_dir = PathBuf::from(value);
        }

        if let Some(value) = read_env("STOCKCAST_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("STOCKCAST_SERVER_PORT") {
            self.server.port = parse_env("STOCKCAST_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("METRICS_PORT") {
            self.server.port = parse_env("METRICS_PORT", &value)?;
        }

        let log_level =
            read_env("STOCKCAST_LOGGING_LEVEL").or_else(|| read_env("STOCKCAST_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOCKCAST_LOGGING_FORMAT").or_else(|| read_env("STOCKCAST_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(tick_interval_secs) = overrides.tick_interval_secs {
            self.simulation.tick_interval_secs = tick_interval_secs;
        }
        if let Some(seed) = overrides.seed {
            self.simulation.seed = Some(seed);
        }
        if let Some(log_dir) = overrides.log_dir {
            self.events.log_dir = log_dir;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_simulation(&self.simulation)?;
        validate_events(&self.events)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("stockcast.toml"), PathBuf::from("config/stockcast.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Expands `${VAR}` references in the raw TOML before it is parsed.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let end = after_open.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &after_open[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &after_open[end + 1..];
    }
    output.push_str(rest);

    Ok(output)
}

fn validate_simulation(simulation: &SimulationConfig) -> Result<(), ConfigError> {
    if simulation.tick_interval_secs == 0 || simulation.tick_interval_secs > 3600 {
        return Err(ConfigError::Validation(
            "simulation.tick_interval_secs must be in range 1..=3600".to_string(),
        ));
    }

    let threshold = simulation.reorder_threshold_hours;
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(ConfigError::Validation(
            "simulation.reorder_threshold_hours must be a positive number of hours".to_string(),
        ));
    }

    let probability = simulation.restock_probability;
    if !(0.0..=1.0).contains(&probability) {
        return Err(ConfigError::Validation(
            "simulation.restock_probability must be in range 0.0..=1.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_events(events: &EventsConfig) -> Result<(), ConfigError> {
    if events.log_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("events.log_dir must not be empty".to_string()));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    simulation: Option<SimulationPatch>,
    events: Option<EventsPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SimulationPatch {
    tick_interval_secs: Option<u64>,
    seed: Option<u64>,
    reorder_threshold_hours: Option<f64>,
    restock_probability: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct EventsPatch {
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
