use rand::Rng;
use rand_distr::{Distribution, Poisson};

use crate::simulation::state::ProductState;

pub const RECENT_RATE_SAMPLES: usize = 12;

/// Draws this tick's order count from a Poisson process with mean `rate`.
///
/// Non-positive or non-finite rates produce no orders and consume no randomness.
pub fn draw_orders<R: Rng>(rate: f64, rng: &mut R) -> u32 {
    if !rate.is_finite() || rate <= 0.0 {
        return 0;
    }
    match Poisson::new(rate) {
        Ok(poisson) => {
            let sample: f64 = poisson.sample(rng);
            sample.max(0.0) as u32
        }
        Err(_) => 0,
    }
}

/// Mean order count over the last twelve samples, or `rate` when no history exists.
pub fn average_orders_per_minute(product: &ProductState, rate: f64) -> f64 {
    let recent: Vec<u32> = product.recent_orders(RECENT_RATE_SAMPLES).collect();
    if recent.is_empty() {
        return rate;
    }
    recent.iter().map(|count| f64::from(*count)).sum::<f64>() / recent.len() as f64
}

/// Splits `orders` across warehouses in proportion to their share of total stock.
///
/// Each stocked warehouse ships `max(1, floor(orders * share))` units, capped at what it
/// holds, so no level ever goes negative. Returns one quantity per warehouse, in input order.
pub fn allocate_fulfillment(levels: &[u32], orders: u32) -> Vec<u32> {
    let total: u64 = levels.iter().map(|units| u64::from(*units)).sum();
    if total == 0 || orders == 0 {
        return vec![0; levels.len()];
    }

    levels
        .iter()
        .map(|units| {
            let share = f64::from(*units) / total as f64;
            let proportional = (f64::from(orders) * share) as u32;
            (*units).min(proportional.max(1))
        })
        .collect()
}
