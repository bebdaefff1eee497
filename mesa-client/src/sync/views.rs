//! Read-only views over a snapshot

use shared::models::{MenuItem, Order, OrderStatus, Table};

use super::Snapshot;
use super::derive;

/// Kitchen display split
#[derive(Debug, Default, PartialEq)]
pub struct KitchenQueue<'a> {
    /// Pending, accepted or preparing; oldest first
    pub incoming: Vec<&'a Order>,
    /// Ready for pickup; oldest first
    pub ready: Vec<&'a Order>,
}

impl Snapshot {
    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    pub fn table_by_number(&self, number: i32) -> Option<&Table> {
        self.tables.iter().find(|t| t.number == number)
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub fn menu_item(&self, menu_item_id: &str) -> Option<&MenuItem> {
        self.menu_items.iter().find(|m| m.id == menu_item_id)
    }

    /// Tables sorted by number
    pub fn tables_by_number(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self.tables.iter().collect();
        tables.sort_by_key(|t| t.number);
        tables
    }

    pub fn kitchen_queue(&self) -> KitchenQueue<'_> {
        let mut queue = KitchenQueue::default();
        for order in &self.orders {
            if order.status.is_incoming() {
                queue.incoming.push(order);
            } else if order.status == OrderStatus::Ready {
                queue.ready.push(order);
            }
        }
        queue.incoming.sort_by_key(|o| o.created_at);
        queue.ready.sort_by_key(|o| o.created_at);
        queue
    }

    /// Orders of the table that are neither cancelled nor delivered
    pub fn open_orders_for_table(&self, table_number: i32) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| o.table_number == table_number && o.status.is_open())
            .collect()
    }

    /// Order referenced by the table's current-order pointer
    pub fn current_order_for_table(&self, table_id: &str) -> Option<&Order> {
        let order_id = self.table(table_id)?.current_order_id.as_deref()?;
        self.order(order_id)
    }

    /// Non-cancelled, unpaid orders of the table
    pub fn unpaid_order_count(&self, table_number: i32) -> usize {
        derive::unpaid_order_ids(&self.orders, table_number).len()
    }

    /// Order history, newest first, optionally for one table
    pub fn order_history(&self, table_number: Option<i32>) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self
            .orders
            .iter()
            .filter(|o| table_number.is_none_or(|n| o.table_number == n))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Menu categories in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for item in &self.menu_items {
            if !categories.contains(&item.category.as_str()) {
                categories.push(&item.category);
            }
        }
        categories
    }

    /// Orderable items, optionally limited to one category
    pub fn available_menu_items(&self, category: Option<&str>) -> Vec<&MenuItem> {
        self.menu_items
            .iter()
            .filter(|m| m.is_available)
            .filter(|m| category.is_none_or(|c| m.category == c))
            .collect()
    }

    pub fn can_release_table(&self, table_number: i32) -> bool {
        derive::can_release_table(&self.orders, table_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn order(id: &str, table_number: i32, status: OrderStatus, minute: i64) -> Order {
        Order {
            id: id.to_string(),
            table_number,
            items: Vec::new(),
            status,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap()
                + Duration::minutes(minute),
            total: Decimal::ZERO,
            payment_timing: Default::default(),
            paid: false,
        }
    }

    fn menu_item(id: &str, category: &str, is_available: bool) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: id.to_uppercase(),
            category: category.to_string(),
            price: Decimal::ONE,
            is_available,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            orders: vec![
                order("o5", 2, OrderStatus::Ready, 5),
                order("o4", 1, OrderStatus::Cancelled, 4),
                order("o3", 1, OrderStatus::Preparing, 3),
                order("o2", 1, OrderStatus::Delivered, 2),
                order("o1", 2, OrderStatus::Pending, 1),
            ],
            menu_items: vec![
                menu_item("m1", "Starters", true),
                menu_item("m2", "Drinks", false),
                menu_item("m3", "Starters", true),
            ],
            ..Snapshot::default()
        }
    }

    fn ids(orders: &[&Order]) -> Vec<String> {
        orders.iter().map(|o| o.id.clone()).collect()
    }

    #[test]
    fn test_kitchen_queue_split() {
        let snap = snapshot();
        let queue = snap.kitchen_queue();
        assert_eq!(ids(&queue.incoming), vec!["o1", "o3"]);
        assert_eq!(ids(&queue.ready), vec!["o5"]);
    }

    #[test]
    fn test_open_orders_exclude_cancelled_and_delivered() {
        let snap = snapshot();
        assert_eq!(ids(&snap.open_orders_for_table(1)), vec!["o3"]);
        assert_eq!(snap.unpaid_order_count(1), 2);
    }

    #[test]
    fn test_history_filter() {
        let snap = snapshot();
        assert_eq!(ids(&snap.order_history(Some(2))), vec!["o5", "o1"]);
        assert_eq!(snap.order_history(None).len(), 5);
    }

    #[test]
    fn test_categories_and_menu() {
        let snap = snapshot();
        assert_eq!(snap.categories(), vec!["Starters", "Drinks"]);
        assert_eq!(snap.available_menu_items(None).len(), 2);
        assert!(snap.available_menu_items(Some("Drinks")).is_empty());
    }
}
