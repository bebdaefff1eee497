use rust_decimal::Decimal;
use shared::models::{MenuItem, OrderCreate, OrderItemInput};

/// Line of an order being composed
#[derive(Debug, Clone, PartialEq)]
pub struct DraftLine {
    pub menu_item_id: String,
    pub name: String,
    pub quantity: u32,
    /// Catalog price when the line was added; display only, the store recaptures it
    pub unit_price: Decimal,
}

/// Order composed at the table before submission
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    table_number: i32,
    lines: Vec<DraftLine>,
}

impl OrderDraft {
    pub fn new(table_number: i32) -> Self {
        Self {
            table_number,
            lines: Vec::new(),
        }
    }

    pub fn table_number(&self) -> i32 {
        self.table_number
    }

    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of `item`; unavailable items are refused
    pub fn add(&mut self, item: &MenuItem) -> bool {
        if !item.is_available {
            return false;
        }
        match self.lines.iter_mut().find(|l| l.menu_item_id == item.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(DraftLine {
                menu_item_id: item.id.clone(),
                name: item.name.clone(),
                quantity: 1,
                unit_price: item.price,
            }),
        }
        true
    }

    /// Change a line's quantity by `delta`; lines reaching zero are dropped
    pub fn adjust(&mut self, menu_item_id: &str, delta: i32) {
        if let Some(index) = self.lines.iter().position(|l| l.menu_item_id == menu_item_id) {
            let quantity = i64::from(self.lines[index].quantity) + i64::from(delta);
            if quantity <= 0 {
                self.lines.remove(index);
            } else {
                self.lines[index].quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            }
        }
    }

    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn items(&self) -> Vec<OrderItemInput> {
        self.lines
            .iter()
            .map(|l| OrderItemInput {
                menu_item_id: l.menu_item_id.clone(),
                quantity: l.quantity,
            })
            .collect()
    }

    pub fn to_create(&self) -> OrderCreate {
        OrderCreate {
            table_number: self.table_number,
            items: self.items(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn item(id: &str, price: Decimal, is_available: bool) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: id.to_string(),
            category: "Mains".to_string(),
            price,
            is_available,
        }
    }

    #[test]
    fn test_add_increments_and_totals() {
        let mut draft = OrderDraft::new(3);
        let pasta = item("pasta", dec!(12.5), true);
        assert!(draft.add(&pasta));
        assert!(draft.add(&pasta));
        assert!(draft.add(&item("wine", dec!(6), true)));
        assert!(!draft.add(&item("soup", dec!(4), false)));

        assert_eq!(draft.lines().len(), 2);
        assert_eq!(draft.lines()[0].quantity, 2);
        assert_eq!(draft.total(), dec!(31));
    }

    #[test]
    fn test_adjust_drops_empty_lines() {
        let mut draft = OrderDraft::new(3);
        draft.add(&item("pasta", dec!(12.5), true));
        draft.adjust("pasta", 2);
        assert_eq!(draft.lines()[0].quantity, 3);
        draft.adjust("pasta", -3);
        assert!(draft.is_empty());
        draft.adjust("missing", 1);
        assert!(draft.is_empty());
    }
}
