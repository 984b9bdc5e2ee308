use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REORDER_THRESHOLD_HOURS: f64 = 24.0;
pub const DEFAULT_FALLBACK_REORDER_QUANTITY: u32 = 100;
pub const DEFAULT_RESTOCK_PROBABILITY: f64 = 0.01;
pub const DEFAULT_LOW_STOCK_UNITS: u32 = 50;

/// Decides when a predicted stockout warrants a replenishment recommendation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReorderPolicy {
    pub threshold_hours: f64,
    pub fallback_quantity: u32,
}

impl Default for ReorderPolicy {
    fn default() -> Self {
        Self {
            threshold_hours: DEFAULT_REORDER_THRESHOLD_HOURS,
            fallback_quantity: DEFAULT_FALLBACK_REORDER_QUANTITY,
        }
    }
}

impl ReorderPolicy {
    pub fn should_reorder(&self, stockout_hours: f64, current_units: u32) -> bool {
        stockout_hours > 0.0 && stockout_hours < self.threshold_hours && current_units > 0
    }

    /// The warehouse's share of the product forecast, or the flat fallback without one.
    pub fn recommended_quantity(&self, forecast_units: f64, warehouse_count: usize) -> u32 {
        if forecast_units > 0.0 && warehouse_count > 0 {
            (forecast_units / warehouse_count as f64) as u32
        } else {
            self.fallback_quantity
        }
    }

    /// Quantity to reorder, or `None` when no alert should be raised.
    pub fn evaluate(
        &self,
        stockout_hours: f64,
        current_units: u32,
        forecast_units: f64,
        warehouse_count: usize,
    ) -> Option<u32> {
        if !self.should_reorder(stockout_hours, current_units) {
            return None;
        }
        let quantity = self.recommended_quantity(forecast_units, warehouse_count);
        (quantity > 0).then_some(quantity)
    }
}

/// Random replenishment, independent of alerting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestockPolicy {
    pub probability: f64,
    pub min_units: u32,
    /// Exclusive upper bound.
    pub max_units: u32,
}

impl Default for RestockPolicy {
    fn default() -> Self {
        Self { probability: DEFAULT_RESTOCK_PROBABILITY, min_units: 50, max_units: 200 }
    }
}

impl RestockPolicy {
    /// Always draws the trigger; draws the amount only when the restock fires.
    pub fn roll<R: Rng>(&self, rng: &mut R) -> Option<u32> {
        let trigger: f64 = rng.gen();
        if trigger >= self.probability {
            return None;
        }
        if self.max_units <= self.min_units {
            return Some(self.min_units);
        }
        Some(rng.gen_range(self.min_units..self.max_units))
    }
}
