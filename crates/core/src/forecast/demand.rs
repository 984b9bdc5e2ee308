use crate::forecast::regression::predict_linear;
use crate::simulation::state::OrderSample;
use crate::simulation::window::RollingWindow;

pub const MIN_HISTORY_FOR_FORECAST: usize = 7;
pub const TICKS_PER_DAY_BUCKET: usize = 24;
pub const MAX_DAILY_BUCKETS: usize = 7;
pub const MIN_DAILY_BUCKETS: usize = 3;
const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Groups order counts, oldest first, into consecutive 24-tick buckets.
///
/// Produces `min(7, len / 24 + 1)` buckets; the trailing bucket may be partial, or empty
/// (zero) when the history length is an exact multiple of 24.
pub fn daily_buckets(orders: &[u32]) -> Vec<f64> {
    let bucket_count = MAX_DAILY_BUCKETS.min(orders.len() / TICKS_PER_DAY_BUCKET + 1);

    (0..bucket_count)
        .map(|index| {
            let start = index * TICKS_PER_DAY_BUCKET;
            if start >= orders.len() {
                return 0.0;
            }
            let end = (start + TICKS_PER_DAY_BUCKET).min(orders.len());
            orders[start..end].iter().map(|count| f64::from(*count)).sum()
        })
        .collect()
}

/// Seven-day-ahead demand in units, or `None` while history is too short to fit a trend.
///
/// The next bucket is predicted from the daily totals and scaled from a per-tick rate to a
/// per-day figure. Negative trends are clamped to zero.
pub fn forecast_demand(history: &RollingWindow<OrderSample>) -> Option<f64> {
    if history.len() < MIN_HISTORY_FOR_FORECAST {
        return None;
    }

    let orders: Vec<u32> = history.iter().map(|sample| sample.orders).collect();
    let buckets = daily_buckets(&orders);
    if buckets.len() < MIN_DAILY_BUCKETS {
        return None;
    }

    let days: Vec<f64> = (0..buckets.len()).map(|day| day as f64).collect();
    let next_day = buckets.len() as f64;
    let units = predict_linear(&days, &buckets, next_day) * MINUTES_PER_DAY;

    Some(units.max(0.0))
}
