pub mod catalog;

pub use catalog::{Catalog, Product, ProductId, Warehouse, WarehouseId};
