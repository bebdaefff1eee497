use shared::TenantId;
use shared::models::{FloorPlan, MenuItem, Order, Table};

/// Cached state of one tenant
///
/// Only the sync engine writes it; everything else reads a clone or a
/// `watch` borrow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Tenant the data belongs to; `None` while no restaurant is active
    pub tenant_id: Option<TenantId>,
    pub tables: Vec<Table>,
    pub menu_items: Vec<MenuItem>,
    /// Newest first, as returned by the store
    pub orders: Vec<Order>,
    pub floor_plan: FloorPlan,
}

impl Snapshot {
    /// Empty defaults for `tenant`
    pub fn empty(tenant_id: Option<TenantId>) -> Self {
        Self {
            tenant_id,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.menu_items.is_empty() && self.orders.is_empty()
    }

    pub(crate) fn replace_table(&mut self, table: Table) {
        match self.tables.iter_mut().find(|t| t.id == table.id) {
            Some(slot) => *slot = table,
            None => self.tables.push(table),
        }
    }

    pub(crate) fn replace_order(&mut self, order: Order) {
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(slot) => *slot = order,
            None => self.orders.insert(0, order),
        }
    }

    pub(crate) fn replace_menu_item(&mut self, item: MenuItem) {
        match self.menu_items.iter_mut().find(|m| m.id == item.id) {
            Some(slot) => *slot = item,
            None => self.menu_items.push(item),
        }
    }
}
