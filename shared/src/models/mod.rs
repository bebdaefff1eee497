//! Data models
//!
//! Mirrors the remote store's JSON (camelCase field names). Every resource
//! comes with its create/update payloads next to it.

pub mod floor_plan;
pub mod menu_item;
pub mod order;
pub mod restaurant;
pub mod table;

// Re-exports
pub use floor_plan::*;
pub use menu_item::*;
pub use order::*;
pub use restaurant::*;
pub use table::*;
