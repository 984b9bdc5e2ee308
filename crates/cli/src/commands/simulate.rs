use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use stockcast_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use stockcast_core::domain::Catalog;
use stockcast_core::event_log::JsonlEventLog;
use stockcast_core::events::{EventSink, EventType};
use stockcast_core::simulation::{EngineSettings, SimulationRun, SteppingClock, TickSummary};

use crate::commands::CommandResult;

const COMMAND: &str = "simulate";

#[derive(Clone, Debug, Default)]
pub struct SimulateArgs {
    pub ticks: u64,
    pub seed: Option<u64>,
    /// RFC 3339 timestamp of the first tick; defaults to now.
    pub start: Option<String>,
    pub events: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SimulationOutcome {
    command: &'static str,
    status: &'static str,
    ticks: u64,
    seed: u64,
    start: String,
    events_path: Option<String>,
    events_by_type: BTreeMap<&'static str, usize>,
    units_fulfilled: u64,
    units_restocked: u64,
    reorder_alerts: usize,
    final_inventory: Vec<InventoryLine>,
    forecasts: Vec<ForecastLine>,
}

#[derive(Debug, Serialize)]
struct InventoryLine {
    product_id: String,
    warehouse_id: String,
    units: u32,
}

#[derive(Debug, Serialize)]
struct ForecastLine {
    product_id: String,
    daily_units: f64,
}

pub fn run(args: SimulateArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        overrides: ConfigOverrides { seed: args.seed, ..ConfigOverrides::default() },
        ..LoadOptions::from_env()
    }) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure(COMMAND, "config", error.to_string(), 2),
    };

    let start = match parse_start(args.start.as_deref()) {
        Ok(start) => start,
        Err(message) => return CommandResult::failure(COMMAND, "invalid_argument", message, 2),
    };

    let sink = match args.events.as_ref().map(|path| open_sink(path.clone())).transpose() {
        Ok(sink) => sink,
        Err(message) => return CommandResult::failure(COMMAND, "event_sink", message, 1),
    };

    let seed = config.simulation.seed.unwrap_or_else(rand::random);
    let clock = SteppingClock::new(start, config.simulation.tick_interval_secs);
    let mut simulation =
        SimulationRun::new(Catalog::standard(), EngineSettings::from(&config.simulation), seed);

    let mut totals = TickSummary::default();
    for _ in 0..args.ticks {
        let report = simulation.step(&clock);
        if let Some(sink) = &sink {
            for event in &report.events {
                if let Err(error) = sink.append(event) {
                    let message = format!("tick {} could not be logged: {error}", report.tick);
                    return CommandResult::failure(COMMAND, "event_sink", message, 1);
                }
            }
        }
        totals.merge(&report.summary());
    }

    let outcome = SimulationOutcome {
        command: COMMAND,
        status: "ok",
        ticks: args.ticks,
        seed,
        start: start.to_rfc3339(),
        events_path: sink.as_ref().map(|sink| sink.path().display().to_string()),
        events_by_type: totals
            .events_by_type
            .iter()
            .map(|(event_type, count)| (event_type.as_str(), *count))
            .collect(),
        units_fulfilled: totals.units_fulfilled,
        units_restocked: totals.units_restocked,
        reorder_alerts: totals.count(EventType::ReorderAlert),
        final_inventory: final_inventory(&simulation),
        forecasts: forecasts(&simulation),
    };

    CommandResult::report(COMMAND, &outcome)
}

fn parse_start(raw: Option<&str>) -> Result<DateTime<Utc>, String> {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|start| start.with_timezone(&Utc))
            .map_err(|error| format!("--start must be an RFC 3339 timestamp: {error}")),
        None => Ok(Utc::now().trunc_subsecs(0)),
    }
}

fn open_sink(path: PathBuf) -> Result<JsonlEventLog, String> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|error| format!("could not create `{}`: {error}", parent.display()))?;
    }
    let display = path.display().to_string();
    JsonlEventLog::open(path).map_err(|error| format!("could not open `{display}`: {error}"))
}

fn final_inventory(simulation: &SimulationRun) -> Vec<InventoryLine> {
    let state = simulation.state();
    let catalog = state.catalog();

    catalog
        .products()
        .iter()
        .flat_map(|product| {
            catalog.warehouses().iter().map(move |warehouse| (product, warehouse))
        })
        .map(|(product, warehouse)| InventoryLine {
            product_id: product.id.to_string(),
            warehouse_id: warehouse.id.to_string(),
            units: state.inventory(&product.id, &warehouse.id).unwrap_or(0),
        })
        .collect()
}

fn forecasts(simulation: &SimulationRun) -> Vec<ForecastLine> {
    let state = simulation.state();
    state
        .catalog()
        .products()
        .iter()
        .map(|product| ForecastLine {
            product_id: product.id.to_string(),
            daily_units: state.forecast(&product.id).unwrap_or(0.0),
        })
        .collect()
}
