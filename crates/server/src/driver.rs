use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use stockcast_core::errors::ApplicationError;
use stockcast_core::events::{EventKind, EventSink, EventType};
use stockcast_core::simulation::{SimulationRun, TickReport, TimeSource};
use tracing::{debug, error, info};

use crate::metrics::InventoryMetrics;

const STALL_MULTIPLIER: u32 = 3;

/// Last-tick bookkeeping shared with the health endpoint without locking.
#[derive(Debug)]
pub struct Heartbeat {
    started_at_ms: i64,
    last_tick_ms: AtomicI64,
    ticks: AtomicU64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Liveness {
    Healthy,
    Stalled,
}

impl Heartbeat {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at_ms: started_at.timestamp_millis(),
            last_tick_ms: AtomicI64::new(i64::MIN),
            ticks: AtomicU64::new(0),
        }
    }

    pub fn record(&self, at: DateTime<Utc>) {
        self.last_tick_ms.store(at.timestamp_millis(), Ordering::Release);
        self.ticks.fetch_add(1, Ordering::AcqRel);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn last_tick_at(&self) -> Option<DateTime<Utc>> {
        match self.last_tick_ms.load(Ordering::Acquire) {
            i64::MIN => None,
            millis => Utc.timestamp_millis_opt(millis).single(),
        }
    }

    /// Healthy while the last tick, or startup before the first one, is within three intervals.
    pub fn liveness(&self, now: DateTime<Utc>, tick_interval: Duration) -> Liveness {
        let reference_ms = match self.last_tick_ms.load(Ordering::Acquire) {
            i64::MIN => self.started_at_ms,
            millis => millis,
        };
        let allowance_ms =
            i64::try_from((tick_interval * STALL_MULTIPLIER).as_millis()).unwrap_or(i64::MAX);

        if now.timestamp_millis().saturating_sub(reference_ms) <= allowance_ms {
            Liveness::Healthy
        } else {
            Liveness::Stalled
        }
    }
}

/// Pushes one tick's metric updates and appends its events in emission order.
///
/// Stops at the first sink failure; metrics already applied for the tick stay applied.
pub fn publish(
    report: &TickReport,
    metrics: &InventoryMetrics,
    sink: &dyn EventSink,
) -> Result<(), ApplicationError> {
    for update in &report.metrics {
        metrics.apply(update);
    }

    let correlation_id = format!("tick-{}", report.tick);
    for event in &report.events {
        sink.append(event)?;
        log_notable_event(&event.kind, &correlation_id);
    }

    Ok(())
}

fn log_notable_event(kind: &EventKind, correlation_id: &str) {
    match kind {
        EventKind::ReorderAlert {
            product_id,
            warehouse_id,
            current_inventory,
            predicted_stockout_hours,
            recommended_reorder_quantity,
        } => info!(
            event_name = "engine.reorder.triggered",
            correlation_id = %correlation_id,
            product_id = %product_id,
            warehouse_id = %warehouse_id,
            current_inventory,
            predicted_stockout_hours,
            recommended_reorder_quantity,
            "reorder alert raised"
        ),
        EventKind::Restock { product_id, warehouse_id, restocked_quantity, new_inventory } => {
            info!(
                event_name = "engine.restock.applied",
                correlation_id = %correlation_id,
                product_id = %product_id,
                warehouse_id = %warehouse_id,
                restocked_quantity,
                new_inventory,
                "restock applied"
            )
        }
        EventKind::Order { .. } | EventKind::Inventory { .. } => {}
    }
}

/// Owns the simulation and steps it on a fixed delay for the life of the process.
pub struct TickDriver {
    run: SimulationRun,
    clock: Arc<dyn TimeSource>,
    metrics: Arc<InventoryMetrics>,
    sink: Arc<dyn EventSink>,
    heartbeat: Arc<Heartbeat>,
    tick_interval: Duration,
}

impl TickDriver {
    pub fn new(
        run: SimulationRun,
        clock: Arc<dyn TimeSource>,
        metrics: Arc<InventoryMetrics>,
        sink: Arc<dyn EventSink>,
        heartbeat: Arc<Heartbeat>,
        tick_interval: Duration,
    ) -> Self {
        Self { run, clock, metrics, sink, heartbeat, tick_interval }
    }

    pub fn tick_once(&mut self) -> Result<TickReport, ApplicationError> {
        let started = Instant::now();
        let report = self.run.step(self.clock.as_ref());
        publish(&report, &self.metrics, self.sink.as_ref())?;

        let latency = started.elapsed();
        self.metrics.record_tick(latency.as_secs_f64());
        self.heartbeat.record(Utc::now());

        let summary = report.summary();
        debug!(
            event_name = "engine.tick.completed",
            correlation_id = %format!("tick-{}", report.tick),
            minute_bucket = report.minute_bucket,
            orders = summary.count(EventType::Order),
            reorder_alerts = summary.count(EventType::ReorderAlert),
            restocks = summary.count(EventType::Restock),
            units_fulfilled = summary.units_fulfilled,
            latency_ms = latency.as_secs_f64() * 1_000.0,
            "simulation tick completed"
        );

        Ok(report)
    }

    /// Returns only when publishing a tick fails.
    pub async fn run(mut self) -> Result<(), ApplicationError> {
        loop {
            if let Err(failure) = self.tick_once() {
                error!(
                    event_name = "system.driver.failed",
                    correlation_id = %format!("tick-{}", self.run.state().ticks()),
                    error = %failure,
                    "tick driver stopped"
                );
                return Err(failure);
            }
            tokio::time::sleep(self.tick_interval).await;
        }
    }
}
