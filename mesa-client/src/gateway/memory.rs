//! In-process remote store
//!
//! Behaves like the REST service for a single process: ids are assigned
//! here, unit prices are captured from the catalog at order creation and the
//! same PATCH side effects are applied. Used by tests and demos.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::models::{
    FloorPlan, MenuItem, MenuItemCreate, MenuItemUpdate, Order, OrderCreate, OrderItem,
    OrderStatus, PaymentStatus, Restaurant, RestaurantCreate, RestaurantUpdate, Table,
    TableCreate, TableStatus, TableUpdate,
};
use shared::{DeleteResult, ResourceKind, TenantId};
use uuid::Uuid;

use super::{FloorPlanGateway, MenuItemsGateway, OrdersGateway, RestaurantsGateway, TablesGateway};
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
struct TenantData {
    tables: Vec<Table>,
    menu_items: Vec<MenuItem>,
    orders: Vec<Order>,
    floor_plan: Option<FloorPlan>,
}

#[derive(Debug, Default)]
struct StoreState {
    tenants: HashMap<TenantId, TenantData>,
    restaurants: Vec<Restaurant>,
    unavailable: bool,
    keep_positions_on_delete: bool,
    failing_reads: HashMap<ResourceKind, usize>,
    list_calls: HashMap<(TenantId, ResourceKind), usize>,
    write_calls: usize,
}

impl StoreState {
    fn check_available(&self) -> ClientResult<()> {
        if self.unavailable {
            Err(ClientError::RemoteUnavailable(
                "memory store is offline".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// In-memory implementation of every gateway
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreState>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<R>(
        &self,
        tenant: &TenantId,
        kind: ResourceKind,
        f: impl FnOnce(&TenantData) -> ClientResult<R>,
    ) -> ClientResult<R> {
        let mut state = self.state();
        state.check_available()?;
        *state
            .list_calls
            .entry((tenant.clone(), kind))
            .or_default() += 1;
        if let Some(remaining) = state.failing_reads.get_mut(&kind)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(ClientError::RemoteUnavailable(format!(
                "memory store dropped read of {kind}"
            )));
        }
        let data = state.tenants.entry(tenant.clone()).or_default();
        f(data)
    }

    fn write<R>(
        &self,
        tenant: &TenantId,
        f: impl FnOnce(&mut TenantData) -> ClientResult<R>,
    ) -> ClientResult<R> {
        let mut state = self.state();
        state.check_available()?;
        state.write_calls += 1;
        f(state.tenants.entry(tenant.clone()).or_default())
    }

    // ========== Test controls ==========

    /// Every following call fails with `RemoteUnavailable` while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// The next `times` reads of `kind` fail with `RemoteUnavailable`
    pub fn fail_reads(&self, kind: ResourceKind, times: usize) {
        self.state().failing_reads.insert(kind, times);
    }

    /// While set, deleting a table leaves its floor-plan position behind
    pub fn keep_positions_on_delete(&self, keep: bool) {
        self.state().keep_positions_on_delete = keep;
    }

    /// Number of reads of `kind` across all tenants
    pub fn list_calls(&self, kind: ResourceKind) -> usize {
        self.state()
            .list_calls
            .iter()
            .filter(|((_, k), _)| *k == kind)
            .map(|(_, n)| *n)
            .sum()
    }

    /// Number of reads of `kind` issued for `tenant`
    pub fn list_calls_for(&self, tenant: &TenantId, kind: ResourceKind) -> usize {
        self.state()
            .list_calls
            .get(&(tenant.clone(), kind))
            .copied()
            .unwrap_or(0)
    }

    /// Number of mutating calls that reached the store
    pub fn write_calls(&self) -> usize {
        self.state().write_calls
    }

    // ========== Seeding ==========

    pub fn seed_table(&self, tenant: &TenantId, number: i32) -> Table {
        let table = Table {
            id: new_id(),
            number,
            status: TableStatus::Free,
            payment_status: PaymentStatus::Unpaid,
            payment_timing: Default::default(),
            current_order_id: None,
        };
        let mut state = self.state();
        let data = state.tenants.entry(tenant.clone()).or_default();
        data.tables.push(table.clone());
        table
    }

    pub fn seed_menu_item(
        &self,
        tenant: &TenantId,
        name: &str,
        category: &str,
        price: Decimal,
    ) -> MenuItem {
        let item = MenuItem {
            id: new_id(),
            name: name.to_string(),
            category: category.to_string(),
            price,
            is_available: true,
        };
        let mut state = self.state();
        let data = state.tenants.entry(tenant.clone()).or_default();
        data.menu_items.push(item.clone());
        item
    }

    /// Inserts an order as-is, bypassing price capture and table side effects
    pub fn seed_order(&self, tenant: &TenantId, order: Order) -> Order {
        let mut state = self.state();
        let data = state.tenants.entry(tenant.clone()).or_default();
        data.orders.push(order.clone());
        order
    }

    pub fn seed_floor_plan(&self, tenant: &TenantId, plan: FloorPlan) {
        let mut state = self.state();
        state.tenants.entry(tenant.clone()).or_default().floor_plan = Some(plan);
    }

    /// Changes a catalog price behind the client's back
    pub fn set_menu_price(&self, tenant: &TenantId, id: &str, price: Decimal) {
        let mut state = self.state();
        let data = state.tenants.entry(tenant.clone()).or_default();
        if let Some(item) = data.menu_items.iter_mut().find(|m| m.id == id) {
            item.price = price;
        }
    }

    pub fn tables(&self, tenant: &TenantId) -> Vec<Table> {
        self.state()
            .tenants
            .get(tenant)
            .map(|d| d.tables.clone())
            .unwrap_or_default()
    }

    pub fn orders(&self, tenant: &TenantId) -> Vec<Order> {
        self.state()
            .tenants
            .get(tenant)
            .map(|d| d.orders.clone())
            .unwrap_or_default()
    }

    pub fn floor_plan(&self, tenant: &TenantId) -> Option<FloorPlan> {
        self.state()
            .tenants
            .get(tenant)
            .and_then(|d| d.floor_plan.clone())
    }
}

// ========== Tables ==========

#[async_trait]
impl TablesGateway for MemoryStore {
    async fn list_tables(&self, tenant: &TenantId) -> ClientResult<Vec<Table>> {
        self.read(tenant, ResourceKind::Tables, |data| Ok(data.tables.clone()))
    }

    async fn create_table(&self, tenant: &TenantId, payload: &TableCreate) -> ClientResult<Table> {
        self.write(tenant, |data| {
            if payload.number < 1 {
                return Err(ClientError::validation("number must be a positive integer"));
            }
            if data.tables.iter().any(|t| t.number == payload.number) {
                return Err(ClientError::validation(format!(
                    "table number {} already exists",
                    payload.number
                )));
            }
            let table = Table {
                id: new_id(),
                number: payload.number,
                status: payload.status.unwrap_or_default(),
                payment_status: PaymentStatus::Unpaid,
                payment_timing: payload.payment_timing.unwrap_or_default(),
                current_order_id: None,
            };
            data.tables.push(table.clone());
            Ok(table)
        })
    }

    async fn update_table(
        &self,
        tenant: &TenantId,
        id: &str,
        patch: &TableUpdate,
    ) -> ClientResult<Table> {
        self.write(tenant, |data| {
            let previous = data
                .tables
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.number)
                .ok_or_else(|| ClientError::not_found(format!("table {id}")))?;

            if let Some(number) = patch.number {
                if number < 1 {
                    return Err(ClientError::validation("number must be a positive integer"));
                }
                if data.tables.iter().any(|t| t.number == number && t.id != id) {
                    return Err(ClientError::validation(format!(
                        "table number {number} already exists"
                    )));
                }
                if number != previous {
                    for order in data
                        .orders
                        .iter_mut()
                        .filter(|o| o.table_number == previous)
                    {
                        order.table_number = number;
                    }
                }
            }

            let table = data
                .tables
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| ClientError::not_found(format!("table {id}")))?;
            patch.apply_to(table);
            Ok(table.clone())
        })
    }

    async fn delete_table(&self, tenant: &TenantId, id: &str) -> ClientResult<DeleteResult> {
        let cascade = !self.state().keep_positions_on_delete;
        self.write(tenant, |data| {
            let before = data.tables.len();
            data.tables.retain(|t| t.id != id);
            let deleted = data.tables.len() != before;
            if deleted
                && cascade
                && let Some(plan) = data.floor_plan.as_mut()
            {
                plan.remove_table(id);
            }
            Ok(DeleteResult { deleted })
        })
    }
}

// ========== Menu Items ==========

#[async_trait]
impl MenuItemsGateway for MemoryStore {
    async fn list_menu_items(&self, tenant: &TenantId) -> ClientResult<Vec<MenuItem>> {
        self.read(tenant, ResourceKind::MenuItems, |data| {
            Ok(data.menu_items.clone())
        })
    }

    async fn create_menu_item(
        &self,
        tenant: &TenantId,
        payload: &MenuItemCreate,
    ) -> ClientResult<MenuItem> {
        self.write(tenant, |data| {
            if payload.name.trim().is_empty() {
                return Err(ClientError::validation("name must not be empty"));
            }
            if payload.price.is_sign_negative() {
                return Err(ClientError::validation("price must not be negative"));
            }
            let item = MenuItem {
                id: new_id(),
                name: payload.name.clone(),
                category: payload.category.clone(),
                price: payload.price,
                is_available: true,
            };
            data.menu_items.push(item.clone());
            Ok(item)
        })
    }

    async fn update_menu_item(
        &self,
        tenant: &TenantId,
        id: &str,
        patch: &MenuItemUpdate,
    ) -> ClientResult<MenuItem> {
        self.write(tenant, |data| {
            if patch.price.is_some_and(|p| p.is_sign_negative()) {
                return Err(ClientError::validation("price must not be negative"));
            }
            let item = data
                .menu_items
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| ClientError::not_found(format!("menu item {id}")))?;
            patch.apply_to(item);
            Ok(item.clone())
        })
    }

    async fn delete_menu_item(&self, tenant: &TenantId, id: &str) -> ClientResult<DeleteResult> {
        self.write(tenant, |data| {
            let before = data.menu_items.len();
            data.menu_items.retain(|m| m.id != id);
            Ok(DeleteResult {
                deleted: data.menu_items.len() != before,
            })
        })
    }
}

// ========== Orders ==========

#[async_trait]
impl OrdersGateway for MemoryStore {
    async fn list_orders(&self, tenant: &TenantId) -> ClientResult<Vec<Order>> {
        self.read(tenant, ResourceKind::Orders, |data| Ok(data.orders.clone()))
    }

    async fn create_order(&self, tenant: &TenantId, payload: &OrderCreate) -> ClientResult<Order> {
        self.write(tenant, |data| {
            if payload.items.is_empty() {
                return Err(ClientError::validation("order must contain items"));
            }
            let table_index = data
                .tables
                .iter()
                .position(|t| t.number == payload.table_number)
                .ok_or_else(|| {
                    ClientError::validation(format!(
                        "table number {} does not exist",
                        payload.table_number
                    ))
                })?;

            let mut items = Vec::with_capacity(payload.items.len());
            for input in &payload.items {
                if input.quantity < 1 {
                    return Err(ClientError::validation("quantity must be at least 1"));
                }
                let menu_item = data
                    .menu_items
                    .iter()
                    .find(|m| m.id == input.menu_item_id)
                    .ok_or_else(|| {
                        ClientError::validation(format!(
                            "menu item {} does not exist",
                            input.menu_item_id
                        ))
                    })?;
                items.push(OrderItem {
                    menu_item_id: menu_item.id.clone(),
                    quantity: input.quantity,
                    unit_price: menu_item.price,
                    menu_item: Some(menu_item.clone()),
                });
            }

            let table = &mut data.tables[table_index];
            let order = Order {
                id: new_id(),
                table_number: payload.table_number,
                items,
                status: OrderStatus::Pending,
                created_at: Utc::now(),
                total: Decimal::ZERO,
                payment_timing: table.payment_timing,
                paid: false,
            }
            .normalized();

            table.status = TableStatus::Ordered;
            table.current_order_id = Some(order.id.clone());
            table.payment_status = PaymentStatus::Unpaid;

            data.orders.insert(0, order.clone());
            Ok(order)
        })
    }

    async fn update_order_status(
        &self,
        tenant: &TenantId,
        id: &str,
        status: OrderStatus,
    ) -> ClientResult<Order> {
        self.write(tenant, |data| {
            let order = data
                .orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| ClientError::not_found(format!("order {id}")))?;
            order.status = status;
            Ok(order.clone())
        })
    }

    async fn set_order_paid(
        &self,
        tenant: &TenantId,
        id: &str,
        paid: bool,
    ) -> ClientResult<Order> {
        self.write(tenant, |data| {
            let order = data
                .orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| ClientError::not_found(format!("order {id}")))?;
            order.paid = paid;
            Ok(order.clone())
        })
    }
}

// ========== Floor Plan ==========

#[async_trait]
impl FloorPlanGateway for MemoryStore {
    async fn get_floor_plan(&self, tenant: &TenantId) -> ClientResult<FloorPlan> {
        self.read(tenant, ResourceKind::FloorPlan, |data| {
            data.floor_plan
                .clone()
                .ok_or_else(|| ClientError::not_found("floor plan"))
        })
    }

    async fn put_floor_plan(
        &self,
        tenant: &TenantId,
        plan: &FloorPlan,
    ) -> ClientResult<FloorPlan> {
        self.write(tenant, |data| {
            data.floor_plan = Some(plan.clone());
            Ok(plan.clone())
        })
    }
}

// ========== Restaurants ==========

impl MemoryStore {
    fn restaurants<R>(
        &self,
        f: impl FnOnce(&mut Vec<Restaurant>) -> ClientResult<R>,
    ) -> ClientResult<R> {
        let mut state = self.state();
        state.check_available()?;
        f(&mut state.restaurants)
    }
}

#[async_trait]
impl RestaurantsGateway for MemoryStore {
    async fn list_restaurants(&self) -> ClientResult<Vec<Restaurant>> {
        self.restaurants(|all| Ok(all.clone()))
    }

    async fn find_restaurant(&self, id: &str) -> ClientResult<Restaurant> {
        self.restaurants(|all| {
            all.iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| ClientError::not_found(format!("restaurant {id}")))
        })
    }

    async fn find_restaurant_by_slug(&self, slug: &str) -> ClientResult<Restaurant> {
        self.restaurants(|all| {
            all.iter()
                .find(|r| r.slug == slug)
                .cloned()
                .ok_or_else(|| ClientError::not_found(format!("restaurant slug {slug}")))
        })
    }

    async fn create_restaurant(&self, payload: &RestaurantCreate) -> ClientResult<Restaurant> {
        self.restaurants(|all| {
            if all.iter().any(|r| r.slug == payload.slug) {
                return Err(ClientError::validation(format!(
                    "slug {} already taken",
                    payload.slug
                )));
            }
            let restaurant = Restaurant {
                id: new_id(),
                name: payload.name.clone(),
                slug: payload.slug.clone(),
                is_active: true,
            };
            all.push(restaurant.clone());
            Ok(restaurant)
        })
    }

    async fn update_restaurant(
        &self,
        id: &str,
        patch: &RestaurantUpdate,
    ) -> ClientResult<Restaurant> {
        self.restaurants(|all| {
            if let Some(slug) = &patch.slug
                && all.iter().any(|r| &r.slug == slug && r.id != id)
            {
                return Err(ClientError::validation(format!("slug {slug} already taken")));
            }
            let restaurant = all
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| ClientError::not_found(format!("restaurant {id}")))?;
            if let Some(name) = &patch.name {
                restaurant.name = name.clone();
            }
            if let Some(slug) = &patch.slug {
                restaurant.slug = slug.clone();
            }
            if let Some(is_active) = patch.is_active {
                restaurant.is_active = is_active;
            }
            Ok(restaurant.clone())
        })
    }

    async fn delete_restaurant(&self, id: &str) -> ClientResult<DeleteResult> {
        self.restaurants(|all| {
            let before = all.len();
            all.retain(|r| r.id != id);
            Ok(DeleteResult {
                deleted: all.len() != before,
            })
        })
    }
}
