use serde::{Deserialize, Serialize};

use crate::domain::catalog::{ProductId, WarehouseId};

/// A metric write produced by a tick. Applying these to a registry is left to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum MetricUpdate {
    InventoryLevel { product_id: ProductId, warehouse_id: WarehouseId, units: u32 },
    OrdersPerMinute { product_id: ProductId, value: f64 },
    PredictedStockoutHours { product_id: ProductId, warehouse_id: WarehouseId, hours: f64 },
    DemandForecast { product_id: ProductId, units: f64 },
    OrdersFulfilled { product_id: ProductId, quantity: u32 },
    ReorderTriggered { product_id: ProductId, warehouse_id: WarehouseId },
}
