pub mod alerting;
pub mod config;
pub mod domain;
pub mod errors;
pub mod event_log;
pub mod events;
pub mod forecast;
pub mod simulation;
pub mod telemetry;

pub use alerting::{ReorderPolicy, RestockPolicy};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::{Catalog, Product, ProductId, Warehouse, WarehouseId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use event_log::JsonlEventLog;
pub use events::{EventKind, EventSink, EventType, InMemoryEventSink, InventoryEvent, SinkError};
pub use forecast::{estimate_stockout, forecast_demand, predict_linear, StockoutEstimate};
pub use simulation::{
    ClockReading, EngineSettings, SimulationRun, SimulationState, SteppingClock, SystemClock,
    TickEngine, TickReport, TickSummary, TimeSource,
};
pub use telemetry::MetricUpdate;
