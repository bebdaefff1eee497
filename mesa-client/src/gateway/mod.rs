//! Remote gateways
//!
//! One trait per resource of the remote store. Gateways are stateless
//! request/response adapters: the tenant is passed on every call and
//! nothing is cached here.

mod http;
mod memory;

pub use http::HttpGateway;
pub use memory::MemoryStore;

use async_trait::async_trait;
use shared::models::{
    FloorPlan, MenuItem, MenuItemCreate, MenuItemUpdate, Order, OrderCreate, OrderStatus,
    Restaurant, RestaurantCreate, RestaurantUpdate, Table, TableCreate, TableUpdate,
};
use shared::{DeleteResult, TenantId};

use crate::ClientResult;

/// `/tables`
#[async_trait]
pub trait TablesGateway: Send + Sync {
    async fn list_tables(&self, tenant: &TenantId) -> ClientResult<Vec<Table>>;
    async fn create_table(&self, tenant: &TenantId, payload: &TableCreate) -> ClientResult<Table>;
    async fn update_table(
        &self,
        tenant: &TenantId,
        id: &str,
        patch: &TableUpdate,
    ) -> ClientResult<Table>;
    async fn delete_table(&self, tenant: &TenantId, id: &str) -> ClientResult<DeleteResult>;
}

/// `/menu-items`
#[async_trait]
pub trait MenuItemsGateway: Send + Sync {
    async fn list_menu_items(&self, tenant: &TenantId) -> ClientResult<Vec<MenuItem>>;
    async fn create_menu_item(
        &self,
        tenant: &TenantId,
        payload: &MenuItemCreate,
    ) -> ClientResult<MenuItem>;
    async fn update_menu_item(
        &self,
        tenant: &TenantId,
        id: &str,
        patch: &MenuItemUpdate,
    ) -> ClientResult<MenuItem>;
    async fn delete_menu_item(&self, tenant: &TenantId, id: &str) -> ClientResult<DeleteResult>;
}

/// `/orders`; orders are never deleted, only transitioned
#[async_trait]
pub trait OrdersGateway: Send + Sync {
    async fn list_orders(&self, tenant: &TenantId) -> ClientResult<Vec<Order>>;
    async fn create_order(&self, tenant: &TenantId, payload: &OrderCreate) -> ClientResult<Order>;
    async fn update_order_status(
        &self,
        tenant: &TenantId,
        id: &str,
        status: OrderStatus,
    ) -> ClientResult<Order>;
    async fn set_order_paid(&self, tenant: &TenantId, id: &str, paid: bool)
    -> ClientResult<Order>;
}

/// `/floor-plan`, a per-tenant singleton replaced as a whole
#[async_trait]
pub trait FloorPlanGateway: Send + Sync {
    async fn get_floor_plan(&self, tenant: &TenantId) -> ClientResult<FloorPlan>;
    async fn put_floor_plan(&self, tenant: &TenantId, plan: &FloorPlan)
    -> ClientResult<FloorPlan>;
}

/// `/restaurants`, the tenant directory (not tenant scoped)
#[async_trait]
pub trait RestaurantsGateway: Send + Sync {
    async fn list_restaurants(&self) -> ClientResult<Vec<Restaurant>>;
    async fn find_restaurant(&self, id: &str) -> ClientResult<Restaurant>;
    async fn find_restaurant_by_slug(&self, slug: &str) -> ClientResult<Restaurant>;
    async fn create_restaurant(&self, payload: &RestaurantCreate) -> ClientResult<Restaurant>;
    async fn update_restaurant(
        &self,
        id: &str,
        patch: &RestaurantUpdate,
    ) -> ClientResult<Restaurant>;
    async fn delete_restaurant(&self, id: &str) -> ClientResult<DeleteResult>;
}

/// Everything the synchronization core talks to
pub trait RemoteStore:
    TablesGateway + MenuItemsGateway + OrdersGateway + FloorPlanGateway + RestaurantsGateway
{
}

impl<T> RemoteStore for T where
    T: TablesGateway + MenuItemsGateway + OrdersGateway + FloorPlanGateway + RestaurantsGateway
{
}
