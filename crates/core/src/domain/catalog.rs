use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WarehouseId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl WarehouseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for WarehouseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sellable item with its baseline demand in orders per minute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub base_demand: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
}

/// The fixed set of products and warehouses a simulation runs over.
///
/// Ordering is significant: products and warehouses are always visited in
/// declaration order, which keeps random draws reproducible for a given seed.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
    warehouses: Vec<Warehouse>,
}

impl Catalog {
    pub fn new(products: Vec<Product>, warehouses: Vec<Warehouse>) -> Result<Self, DomainError> {
        if products.is_empty() {
            return Err(DomainError::InvalidCatalog("catalog needs at least one product".into()));
        }
        if warehouses.is_empty() {
            return Err(DomainError::InvalidCatalog("catalog needs at least one warehouse".into()));
        }

        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(product.id.as_str()) {
                return Err(DomainError::InvalidCatalog(format!(
                    "duplicate product id `{}`",
                    product.id
                )));
            }
            if !product.base_demand.is_finite() || product.base_demand < 0.0 {
                return Err(DomainError::InvalidDemandRate {
                    product_id: product.id.0.clone(),
                    rate: product.base_demand,
                });
            }
        }

        let mut seen = HashSet::new();
        for warehouse in &warehouses {
            if !seen.insert(warehouse.id.as_str()) {
                return Err(DomainError::InvalidCatalog(format!(
                    "duplicate warehouse id `{}`",
                    warehouse.id
                )));
            }
        }

        Ok(Self { products, warehouses })
    }

    /// Five products across three warehouses, the default storefront.
    pub fn standard() -> Self {
        let products = [
            ("LAPTOP-001", 0.8),
            ("PHONE-002", 1.2),
            ("HEADPHONES-003", 0.6),
            ("MOUSE-004", 0.4),
            ("KEYBOARD-005", 0.3),
        ]
        .into_iter()
        .map(|(id, base_demand)| Product { id: ProductId(id.to_string()), base_demand })
        .collect();

        let warehouses = ["WH-NYC", "WH-LDN", "WH-TYO"]
            .into_iter()
            .map(|id| Warehouse { id: WarehouseId(id.to_string()) })
            .collect();

        Self { products, warehouses }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn warehouses(&self) -> &[Warehouse] {
        &self.warehouses
    }

    pub fn warehouse_count(&self) -> usize {
        self.warehouses.len()
    }

    pub fn product_index(&self, product_id: &ProductId) -> Option<usize> {
        self.products.iter().position(|product| &product.id == product_id)
    }

    pub fn warehouse_index(&self, warehouse_id: &WarehouseId) -> Option<usize> {
        self.warehouses.iter().position(|warehouse| &warehouse.id == warehouse_id)
    }
}
