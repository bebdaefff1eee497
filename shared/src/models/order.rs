//! Order Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::menu_item::MenuItem;
use super::table::PaymentTiming;

/// Order lifecycle
///
/// `pending → accepted → preparing → ready → delivered`, with `cancelled`
/// reachable from any non-terminal state. Kitchens may send a ready order
/// back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_cancelled(self) -> bool {
        self == OrderStatus::Cancelled
    }

    /// Still in front of the kitchen or waiting to be served
    pub fn is_open(self) -> bool {
        !matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Shown in the kitchen's incoming column
    pub fn is_incoming(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Accepted | OrderStatus::Preparing
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One order line; `unit_price` is captured when the order is placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub menu_item_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Catalog row embedded by the store for display, may be stale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_item: Option<MenuItem>,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn display_name(&self) -> &str {
        self.menu_item
            .as_ref()
            .map(|m| m.name.as_str())
            .unwrap_or(self.menu_item_id.as_str())
    }
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Bound to the table's number, not its id
    pub table_number: i32,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub total: Decimal,
    /// Table's payment timing when the order was created
    #[serde(default)]
    pub payment_timing: PaymentTiming,
    #[serde(default)]
    pub paid: bool,
}

impl Order {
    /// Sum of `quantity × unit_price` over the lines
    pub fn computed_total(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Repairs store output: fills `menu_item_id` from the embedded menu item
    /// and recomputes `total` from the captured unit prices.
    pub fn normalized(mut self) -> Self {
        for item in &mut self.items {
            if item.menu_item_id.is_empty()
                && let Some(menu_item) = &item.menu_item
            {
                item.menu_item_id = menu_item.id.clone();
            }
        }
        self.total = self.computed_total();
        self
    }

    /// Counts toward the table's outstanding balance
    pub fn is_outstanding(&self) -> bool {
        !self.status.is_cancelled() && !self.paid
    }
}

/// Line of a new order. Prices are never sent; the store captures them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub menu_item_id: String,
    pub quantity: u32,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub table_number: i32,
    pub items: Vec<OrderItemInput>,
}

/// `PATCH /orders/:id/status` payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// `PATCH /orders/:id/paid` payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderPaidUpdate {
    pub paid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn line(id: &str, quantity: u32, unit_price: Decimal) -> OrderItem {
        OrderItem {
            menu_item_id: id.to_string(),
            quantity,
            unit_price,
            menu_item: None,
        }
    }

    #[test]
    fn test_normalized_recomputes_total() {
        let order = Order {
            id: "o1".into(),
            table_number: 7,
            items: vec![line("m1", 2, dec!(8.5)), line("m2", 1, dec!(3))],
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            total: dec!(999),
            payment_timing: PaymentTiming::End,
            paid: false,
        }
        .normalized();

        assert_eq!(order.total, dec!(20));
    }

    #[test]
    fn test_normalized_fills_menu_item_id_from_embedded_item() {
        let json = r#"{
            "id": "o2",
            "tableNumber": 3,
            "status": "ready",
            "createdAt": "2026-01-10T12:00:00Z",
            "total": "17.00",
            "paid": false,
            "items": [{
                "quantity": 2,
                "unitPrice": "8.50",
                "menuItem": {"id": "m1", "name": "Bruschetta", "category": "Starters", "price": 9}
            }]
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        let order = order.normalized();

        assert_eq!(order.items[0].menu_item_id, "m1");
        assert_eq!(order.items[0].display_name(), "Bruschetta");
        assert_eq!(order.total, dec!(17));
        assert_eq!(order.status, OrderStatus::Ready);
    }

    #[test]
    fn test_status_predicates() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::Ready.is_open());
        assert!(!OrderStatus::Delivered.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
        assert!(OrderStatus::Preparing.is_incoming());
        assert!(!OrderStatus::Ready.is_incoming());
        assert_eq!(OrderStatus::Delivered.to_string(), "delivered");
    }
}
