use serde::{Deserialize, Serialize};

use crate::simulation::window::RollingWindow;

/// Returned when inventory is flat or growing.
pub const NO_DEPLETION_HOURS: f64 = 999.0;
/// Returned by the ratio estimate when nothing is being consumed.
pub const NO_CONSUMPTION_HOURS: f64 = 9999.0;
pub const MIN_TREND_POINTS: usize = 5;
pub const TREND_WINDOW: usize = 20;
pub const RECENT_ORDER_SAMPLES: usize = 12;
const EMPTY_HISTORY_ORDERS_PER_HOUR: f64 = 0.1;
const TICKS_PER_HOUR: f64 = 12.0;
const MIN_DEPLETION_PER_HOUR: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockoutMethod {
    /// Depletion slope over recent inventory readings.
    Trend,
    /// Inventory divided by recent consumption, used while history is short.
    Ratio,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockoutEstimate {
    pub hours: f64,
    pub method: StockoutMethod,
}

/// Hourly order rate extrapolated from the recent per-tick order counts.
pub fn orders_per_hour<I>(recent_orders: I) -> f64
where
    I: IntoIterator<Item = u32>,
{
    let mut seen = false;
    let total = recent_orders.into_iter().fold(0.0, |total, count| {
        seen = true;
        total + f64::from(count)
    });

    if seen {
        total * 60.0
    } else {
        EMPTY_HISTORY_ORDERS_PER_HOUR
    }
}

/// `inventory / consumption`, never negative.
pub fn ratio_stockout_hours(inventory: f64, consumption_per_hour: f64) -> f64 {
    if consumption_per_hour <= 0.0 {
        return NO_CONSUMPTION_HOURS;
    }
    if inventory <= 0.0 {
        return 0.0;
    }
    (inventory / consumption_per_hour).max(0.0)
}

/// Hours until `current` units run out for one warehouse.
///
/// `history` must already include the current reading.
pub fn estimate_stockout(
    current: u32,
    history: &RollingWindow<u32>,
    orders_per_hour: f64,
) -> StockoutEstimate {
    if history.len() < MIN_TREND_POINTS {
        return StockoutEstimate {
            hours: ratio_stockout_hours(f64::from(current), orders_per_hour),
            method: StockoutMethod::Ratio,
        };
    }

    let series: Vec<f64> = history.latest(TREND_WINDOW).map(|units| f64::from(*units)).collect();
    let (first, last) = (series[0], series[series.len() - 1]);

    let hours = if last <= 0.0 {
        0.0
    } else {
        let slope = (last - first) / (series.len().saturating_sub(1).max(1) as f64);
        if slope < 0.0 {
            let depletion_per_hour = (slope.abs() * TICKS_PER_HOUR).max(MIN_DEPLETION_PER_HOUR);
            (f64::from(current) / depletion_per_hour).abs()
        } else {
            NO_DEPLETION_HOURS
        }
    };

    StockoutEstimate { hours, method: StockoutMethod::Trend }
}
