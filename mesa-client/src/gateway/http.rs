//! Gateways over the REST API

use async_trait::async_trait;
use shared::models::{
    FloorPlan, MenuItem, MenuItemCreate, MenuItemUpdate, Order, OrderCreate, OrderPaidUpdate,
    OrderStatus, OrderStatusUpdate, Restaurant, RestaurantCreate, RestaurantUpdate, Table,
    TableCreate, TableUpdate,
};
use shared::{DeleteResult, TenantId};

use super::{FloorPlanGateway, MenuItemsGateway, OrdersGateway, RestaurantsGateway, TablesGateway};
use crate::{ClientConfig, ClientResult, HttpClient};

/// Network implementation of every gateway
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: HttpClient,
}

impl HttpGateway {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self::new(config.build_http_client()?))
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

// ========== Tables ==========

#[async_trait]
impl TablesGateway for HttpGateway {
    async fn list_tables(&self, tenant: &TenantId) -> ClientResult<Vec<Table>> {
        self.http.get("tables", Some(tenant)).await
    }

    async fn create_table(&self, tenant: &TenantId, payload: &TableCreate) -> ClientResult<Table> {
        self.http.post("tables", Some(tenant), payload).await
    }

    async fn update_table(
        &self,
        tenant: &TenantId,
        id: &str,
        patch: &TableUpdate,
    ) -> ClientResult<Table> {
        self.http
            .patch(&format!("tables/{id}"), Some(tenant), patch)
            .await
    }

    async fn delete_table(&self, tenant: &TenantId, id: &str) -> ClientResult<DeleteResult> {
        self.http.delete(&format!("tables/{id}"), Some(tenant)).await
    }
}

// ========== Menu Items ==========

#[async_trait]
impl MenuItemsGateway for HttpGateway {
    async fn list_menu_items(&self, tenant: &TenantId) -> ClientResult<Vec<MenuItem>> {
        self.http.get("menu-items", Some(tenant)).await
    }

    async fn create_menu_item(
        &self,
        tenant: &TenantId,
        payload: &MenuItemCreate,
    ) -> ClientResult<MenuItem> {
        self.http.post("menu-items", Some(tenant), payload).await
    }

    async fn update_menu_item(
        &self,
        tenant: &TenantId,
        id: &str,
        patch: &MenuItemUpdate,
    ) -> ClientResult<MenuItem> {
        self.http
            .patch(&format!("menu-items/{id}"), Some(tenant), patch)
            .await
    }

    async fn delete_menu_item(&self, tenant: &TenantId, id: &str) -> ClientResult<DeleteResult> {
        self.http
            .delete(&format!("menu-items/{id}"), Some(tenant))
            .await
    }
}

// ========== Orders ==========

#[async_trait]
impl OrdersGateway for HttpGateway {
    async fn list_orders(&self, tenant: &TenantId) -> ClientResult<Vec<Order>> {
        self.http.get("orders", Some(tenant)).await
    }

    async fn create_order(&self, tenant: &TenantId, payload: &OrderCreate) -> ClientResult<Order> {
        self.http.post("orders", Some(tenant), payload).await
    }

    async fn update_order_status(
        &self,
        tenant: &TenantId,
        id: &str,
        status: OrderStatus,
    ) -> ClientResult<Order> {
        self.http
            .patch(
                &format!("orders/{id}/status"),
                Some(tenant),
                &OrderStatusUpdate { status },
            )
            .await
    }

    async fn set_order_paid(
        &self,
        tenant: &TenantId,
        id: &str,
        paid: bool,
    ) -> ClientResult<Order> {
        self.http
            .patch(
                &format!("orders/{id}/paid"),
                Some(tenant),
                &OrderPaidUpdate { paid },
            )
            .await
    }
}

// ========== Floor Plan ==========

#[async_trait]
impl FloorPlanGateway for HttpGateway {
    async fn get_floor_plan(&self, tenant: &TenantId) -> ClientResult<FloorPlan> {
        self.http.get("floor-plan", Some(tenant)).await
    }

    async fn put_floor_plan(
        &self,
        tenant: &TenantId,
        plan: &FloorPlan,
    ) -> ClientResult<FloorPlan> {
        self.http.put("floor-plan", Some(tenant), plan).await
    }
}

// ========== Restaurants ==========

#[async_trait]
impl RestaurantsGateway for HttpGateway {
    async fn list_restaurants(&self) -> ClientResult<Vec<Restaurant>> {
        self.http.get("restaurants", None).await
    }

    async fn find_restaurant(&self, id: &str) -> ClientResult<Restaurant> {
        self.http.get(&format!("restaurants/{id}"), None).await
    }

    async fn find_restaurant_by_slug(&self, slug: &str) -> ClientResult<Restaurant> {
        self.http
            .get(&format!("restaurants/slug/{slug}"), None)
            .await
    }

    async fn create_restaurant(&self, payload: &RestaurantCreate) -> ClientResult<Restaurant> {
        self.http.post("restaurants", None, payload).await
    }

    async fn update_restaurant(
        &self,
        id: &str,
        patch: &RestaurantUpdate,
    ) -> ClientResult<Restaurant> {
        self.http
            .patch(&format!("restaurants/{id}"), None, patch)
            .await
    }

    async fn delete_restaurant(&self, id: &str) -> ClientResult<DeleteResult> {
        self.http.delete(&format!("restaurants/{id}"), None).await
    }
}
