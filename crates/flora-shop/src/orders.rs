//! Orders placed from this client and their status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flora_core::{CartLineItem, CustomerDetails, Money, OrderId};
use flora_storage::{KeyValueStore, StorageError};

/// Storage key for the persisted order log.
pub const ORDERS_KEY: &str = "orders";

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// One line of a placed order, frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub quantity: u32,
    pub price: Money,
    pub total: Money,
}

impl From<&CartLineItem> for OrderLine {
    fn from(line: &CartLineItem) -> Self {
        OrderLine {
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.price,
            total: line.subtotal(),
        }
    }
}

/// An order the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub customer: CustomerDetails,
    pub items: Vec<OrderLine>,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl PlacedOrder {
    pub fn from_cart_lines(
        id: OrderId,
        customer: CustomerDetails,
        lines: &[CartLineItem],
        placed_at: DateTime<Utc>,
    ) -> Self {
        let items: Vec<OrderLine> = lines.iter().map(OrderLine::from).collect();
        let total = items.iter().map(|line| line.total).sum();
        PlacedOrder {
            id,
            customer,
            items,
            total,
            placed_at,
            status: OrderStatus::Pending,
        }
    }

    /// Number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

/// Orders placed from this client, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderLog {
    orders: Vec<PlacedOrder>,
}

impl OrderLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the log stored under [`ORDERS_KEY`], empty if absent.
    pub fn load<S: KeyValueStore>(medium: &S) -> Result<Self, StorageError> {
        Ok(medium.load_json::<OrderLog>(ORDERS_KEY)?.unwrap_or_default())
    }

    pub fn save<S: KeyValueStore>(&self, medium: &mut S) -> Result<(), StorageError> {
        medium.save_json(ORDERS_KEY, self)
    }

    pub fn record(&mut self, order: PlacedOrder) {
        self.orders.insert(0, order);
    }

    /// Sets the status of `id`. Returns false if no such order is logged.
    pub fn update_status(&mut self, id: &OrderId, status: OrderStatus) -> bool {
        match self.orders.iter_mut().find(|order| &order.id == id) {
            Some(order) => {
                order.status = status;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &OrderId) -> Option<&PlacedOrder> {
        self.orders.iter().find(|order| &order.id == id)
    }

    pub fn orders(&self) -> &[PlacedOrder] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
