//! Synchronization core

pub mod derive;
mod driver;
mod engine;
mod order_draft;
mod snapshot;
mod views;

pub use driver::{SyncDriver, SyncHandle, SyncMode};
pub use engine::SyncEngine;
pub use order_draft::{DraftLine, OrderDraft};
pub use snapshot::Snapshot;
pub use views::KitchenQueue;
