use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use stockcast_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::from_env()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: 2,
                output: format!("config validation failed: {error}"),
            }
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let seed = config.simulation.seed.map(|seed| seed.to_string());
    let fields: [(&str, String, &[&str]); 10] = [
        (
            "simulation.tick_interval_secs",
            config.simulation.tick_interval_secs.to_string(),
            &["STOCKCAST_SIMULATION_TICK_INTERVAL_SECS"],
        ),
        (
            "simulation.seed",
            seed.unwrap_or_else(|| "<random at startup>".to_string()),
            &["STOCKCAST_SIMULATION_SEED"],
        ),
        (
            "simulation.reorder_threshold_hours",
            config.simulation.reorder_threshold_hours.to_string(),
            &["STOCKCAST_SIMULATION_REORDER_THRESHOLD_HOURS"],
        ),
        (
            "simulation.restock_probability",
            config.simulation.restock_probability.to_string(),
            &["STOCKCAST_SIMULATION_RESTOCK_PROBABILITY"],
        ),
        (
            "events.log_dir",
            config.events.log_dir.display().to_string(),
            &["STOCKCAST_EVENTS_LOG_DIR", "LOG_DIR"],
        ),
        ("events.log_path", config.events.log_path().display().to_string(), &[]),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["STOCKCAST_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["STOCKCAST_SERVER_PORT", "METRICS_PORT"]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["STOCKCAST_LOGGING_LEVEL", "STOCKCAST_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["STOCKCAST_LOGGING_FORMAT", "STOCKCAST_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in &fields {
        let source = if *key == "events.log_path" {
            "derived (events.log_dir)".to_string()
        } else {
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
        };
        lines.push(render_line(key, value, source));
    }

    CommandResult::text(lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    if let Some(path) = LoadOptions::from_env().config_path {
        return Some(path);
    }
    [PathBuf::from("stockcast.toml"), PathBuf::from("config/stockcast.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_env = env_keys
        .iter()
        .find(|env_key| env::var(env_key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = set_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
