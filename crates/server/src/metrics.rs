use prometheus::{
    Counter, CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};
use stockcast_core::errors::ApplicationError;
use stockcast_core::telemetry::MetricUpdate;

/// Prometheus registry for everything the tick driver publishes.
pub struct InventoryMetrics {
    registry: Registry,

    pub inventory_level: GaugeVec,
    pub orders_per_minute: GaugeVec,
    pub predicted_stockout_hours: GaugeVec,
    pub demand_forecast: GaugeVec,
    pub orders_total: CounterVec,
    pub reorder_events: CounterVec,
    pub processing_latency: Histogram,
    pub ticks_total: Counter,
}

impl InventoryMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let inventory_level = GaugeVec::new(
            Opts::new("inventory_level_units", "Current inventory level per product and warehouse"),
            &["product_id", "warehouse_id"],
        )?;
        let orders_per_minute = GaugeVec::new(
            Opts::new("orders_per_minute", "Average orders per minute over recent ticks"),
            &["product_id"],
        )?;
        let predicted_stockout_hours = GaugeVec::new(
            Opts::new("predicted_stockout_hours", "Predicted hours until stockout"),
            &["product_id", "warehouse_id"],
        )?;
        let demand_forecast = GaugeVec::new(
            Opts::new("demand_forecast_units", "Forecasted daily demand in units"),
            &["product_id"],
        )?;
        let orders_total = CounterVec::new(
            Opts::new("orders_total", "Total units fulfilled"),
            &["product_id"],
        )?;
        let reorder_events = CounterVec::new(
            Opts::new("reorder_events_total", "Total reorder alerts raised"),
            &["product_id", "warehouse_id"],
        )?;
        let processing_latency = Histogram::with_opts(HistogramOpts::new(
            "processing_latency_seconds",
            "Time spent processing one simulation tick",
        ))?;
        let ticks_total = Counter::new("simulation_ticks_total", "Total simulation ticks run")?;

        registry.register(Box::new(inventory_level.clone()))?;
        registry.register(Box::new(orders_per_minute.clone()))?;
        registry.register(Box::new(predicted_stockout_hours.clone()))?;
        registry.register(Box::new(demand_forecast.clone()))?;
        registry.register(Box::new(orders_total.clone()))?;
        registry.register(Box::new(reorder_events.clone()))?;
        registry.register(Box::new(processing_latency.clone()))?;
        registry.register(Box::new(ticks_total.clone()))?;

        Ok(Self {
            registry,
            inventory_level,
            orders_per_minute,
            predicted_stockout_hours,
            demand_forecast,
            orders_total,
            reorder_events,
            processing_latency,
            ticks_total,
        })
    }

    pub fn apply(&self, update: &MetricUpdate) {
        match update {
            MetricUpdate::InventoryLevel { product_id, warehouse_id, units } => self
                .inventory_level
                .with_label_values(&[product_id.as_str(), warehouse_id.as_str()])
                .set(f64::from(*units)),
            MetricUpdate::OrdersPerMinute { product_id, value } => {
                self.orders_per_minute.with_label_values(&[product_id.as_str()]).set(*value)
            }
            MetricUpdate::PredictedStockoutHours { product_id, warehouse_id, hours } => self
                .predicted_stockout_hours
                .with_label_values(&[product_id.as_str(), warehouse_id.as_str()])
                .set(*hours),
            MetricUpdate::DemandForecast { product_id, units } => {
                self.demand_forecast.with_label_values(&[product_id.as_str()]).set(*units)
            }
            MetricUpdate::OrdersFulfilled { product_id, quantity } => self
                .orders_total
                .with_label_values(&[product_id.as_str()])
                .inc_by(f64::from(*quantity)),
            MetricUpdate::ReorderTriggered { product_id, warehouse_id } => self
                .reorder_events
                .with_label_values(&[product_id.as_str(), warehouse_id.as_str()])
                .inc(),
        }
    }

    pub fn record_tick(&self, latency_secs: f64) {
        self.ticks_total.inc();
        self.processing_latency.observe(latency_secs);
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn gather_text(&self) -> Result<String, ApplicationError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|error| ApplicationError::Metrics(error.to_string()))?;
        String::from_utf8(buffer).map_err(|error| ApplicationError::Metrics(error.to_string()))
    }
}
