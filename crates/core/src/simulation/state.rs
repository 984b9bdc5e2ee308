use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{Catalog, ProductId, WarehouseId};
use crate::simulation::window::RollingWindow;

pub const ORDER_HISTORY_CAPACITY: usize = 168;
pub const INVENTORY_HISTORY_CAPACITY: usize = 60;
pub const TIME_BUCKET_CAPACITY: usize = 60;
const INITIAL_STOCK_MIN: u32 = 50;
const INITIAL_STOCK_MAX: u32 = 500;

/// Orders observed for one product during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSample {
    pub minute: i64,
    pub orders: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WarehouseStock {
    pub units: u32,
    pub history: RollingWindow<u32>,
}

impl WarehouseStock {
    fn new(units: u32) -> Self {
        Self { units, history: RollingWindow::new(INVENTORY_HISTORY_CAPACITY) }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductState {
    pub order_history: RollingWindow<OrderSample>,
    /// Last 7-day demand forecast; zero until enough daily buckets exist.
    pub forecast_units: f64,
    /// Indexed like `Catalog::warehouses`.
    pub stock: Vec<WarehouseStock>,
}

impl ProductState {
    pub fn total_units(&self) -> u64 {
        self.stock.iter().map(|stock| u64::from(stock.units)).sum()
    }

    /// Order counts of the most recent `count` samples, oldest first.
    pub fn recent_orders(&self, count: usize) -> impl Iterator<Item = u32> + '_ {
        self.order_history.latest(count).map(|sample| sample.orders)
    }
}

/// Everything the tick engine reads and writes. Owned by the caller and passed in explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    catalog: Catalog,
    products: Vec<ProductState>,
    time_buckets: RollingWindow<i64>,
    ticks: u64,
}

impl SimulationState {
    /// Builds the initial state with one uniform draw in [50, 500) per (product, warehouse),
    /// visiting pairs product-major in catalog order.
    pub fn seeded<R: Rng>(catalog: Catalog, rng: &mut R) -> Self {
        let warehouse_count = catalog.warehouse_count();
        let products = catalog
            .products()
            .iter()
            .map(|_| ProductState {
                order_history: RollingWindow::new(ORDER_HISTORY_CAPACITY),
                forecast_units: 0.0,
                stock: (0..warehouse_count)
                    .map(|_| {
                        WarehouseStock::new(rng.gen_range(INITIAL_STOCK_MIN..INITIAL_STOCK_MAX))
                    })
                    .collect(),
            })
            .collect();

        Self { catalog, products, time_buckets: RollingWindow::new(TIME_BUCKET_CAPACITY), ticks: 0 }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn time_buckets(&self) -> &RollingWindow<i64> {
        &self.time_buckets
    }

    pub fn product(&self, index: usize) -> &ProductState {
        &self.products[index]
    }

    pub fn product_mut(&mut self, index: usize) -> &mut ProductState {
        &mut self.products[index]
    }

    pub fn products(&self) -> &[ProductState] {
        &self.products
    }

    pub fn inventory(&self, product_id: &ProductId, warehouse_id: &WarehouseId) -> Option<u32> {
        let product = self.catalog.product_index(product_id)?;
        let warehouse = self.catalog.warehouse_index(warehouse_id)?;
        Some(self.products[product].stock[warehouse].units)
    }

    pub fn set_inventory(
        &mut self,
        product_id: &ProductId,
        warehouse_id: &WarehouseId,
        units: u32,
    ) -> bool {
        let (Some(product), Some(warehouse)) =
            (self.catalog.product_index(product_id), self.catalog.warehouse_index(warehouse_id))
        else {
            return false;
        };
        self.products[product].stock[warehouse].units = units;
        true
    }

    pub fn forecast(&self, product_id: &ProductId) -> Option<f64> {
        let product = self.catalog.product_index(product_id)?;
        Some(self.products[product].forecast_units)
    }

    /// Advances the tick counter and the rolling minute-bucket window.
    pub(crate) fn begin_tick(&mut self, minute_bucket: i64) -> u64 {
        self.ticks += 1;
        self.time_buckets.push(minute_bucket);
        self.ticks
    }
}
