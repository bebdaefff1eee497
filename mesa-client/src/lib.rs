//! Mesa Client - restaurant floor state sync
//!
//! Keeps a tenant-scoped snapshot of tables, menu items, orders and the floor
//! plan in step with the remote store, using the push channel when it is up
//! and a poll timer when it is not.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod layout;
pub mod push;
pub mod sync;
pub mod tenant;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use tenant::{LocalState, TenantContext};

// Gateways
pub use gateway::{
    FloorPlanGateway, HttpGateway, MemoryStore, MenuItemsGateway, OrdersGateway, RemoteStore,
    RestaurantsGateway, TablesGateway,
};

// Push channel
pub use push::{
    MemoryPushTransport, PushChannel, PushHub, PushSignal, PushTransport, WsPushTransport,
};

// Sync core
pub use sync::{
    DraftLine, KitchenQueue, OrderDraft, Snapshot, SyncDriver, SyncEngine, SyncHandle, SyncMode,
};

// Layout
pub use layout::{FloorPlanDraft, LayoutError, LayoutTemplate, sanitize_plan};

// Re-export shared types for convenience
pub use shared;
