//! Trend fitting over rolling histories: daily demand forecasts and time-to-stockout.

pub mod demand;
pub mod regression;
pub mod stockout;

pub use demand::forecast_demand;
pub use regression::predict_linear;
pub use stockout::{estimate_stockout, orders_per_hour, StockoutEstimate, StockoutMethod};
