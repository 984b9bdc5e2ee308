use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::catalog::{ProductId, WarehouseId};

/// One append-only fact about a single tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryEvent {
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Order {
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: u32,
        remaining_inventory: u32,
    },
    ReorderAlert {
        product_id: ProductId,
        warehouse_id: WarehouseId,
        current_inventory: u32,
        predicted_stockout_hours: f64,
        recommended_reorder_quantity: u32,
    },
    Restock {
        product_id: ProductId,
        warehouse_id: WarehouseId,
        restocked_quantity: u32,
        new_inventory: u32,
    },
    Inventory {
        product_id: ProductId,
        warehouse_id: WarehouseId,
        inventory_units: u32,
        orders_per_hour: f64,
        predicted_stockout_hours: f64,
        low_stock_warning: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Order,
    ReorderAlert,
    Restock,
    Inventory,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::ReorderAlert => "reorder_alert",
            Self::Restock => "restock",
            Self::Inventory => "inventory",
        }
    }
}

impl InventoryEvent {
    pub fn new(ts: DateTime<Utc>, kind: EventKind) -> Self {
        Self { ts, kind }
    }

    pub fn event_type(&self) -> EventType {
        match self.kind {
            EventKind::Order { .. } => EventType::Order,
            EventKind::ReorderAlert { .. } => EventType::ReorderAlert,
            EventKind::Restock { .. } => EventType::Restock,
            EventKind::Inventory { .. } => EventType::Inventory,
        }
    }

    pub fn product_id(&self) -> &ProductId {
        match &self.kind {
            EventKind::Order { product_id, .. }
            | EventKind::ReorderAlert { product_id, .. }
            | EventKind::Restock { product_id, .. }
            | EventKind::Inventory { product_id, .. } => product_id,
        }
    }

    pub fn warehouse_id(&self) -> Option<&WarehouseId> {
        match &self.kind {
            EventKind::Order { warehouse_id, .. }
            | EventKind::ReorderAlert { warehouse_id, .. }
            | EventKind::Restock { warehouse_id, .. }
            | EventKind::Inventory { warehouse_id, .. } => Some(warehouse_id),
        }
    }
}

/// Rounds to two decimal places for event payloads.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("event log write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait EventSink: Send + Sync {
    fn append(&self, event: &InventoryEvent) -> Result<(), SinkError>;
}

#[derive(Clone, Default)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<Vec<InventoryEvent>>>,
}

impl InMemoryEventSink {
    pub fn events(&self) -> Vec<InventoryEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for InMemoryEventSink {
    fn append(&self, event: &InventoryEvent) -> Result<(), SinkError> {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
        Ok(())
    }
}
