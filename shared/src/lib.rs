//! Shared types for the Mesa floor service
//!
//! Domain models, request payloads, response bodies and push event names
//! used by the client crate and by anything speaking the remote store's API.

pub mod message;
pub mod models;
pub mod response;
pub mod types;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use message::{PushEvent, RawPushEvent, ResourceKind};
pub use response::{DeleteResult, ErrorBody};
pub use types::TenantId;
