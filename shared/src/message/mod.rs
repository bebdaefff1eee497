//! Push channel event types
//!
//! The realtime service sends `{"event": "<name>", "data": <payload>}`.
//! Only the name is trusted; the payload is kept opaque.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource category of the snapshot that an event invalidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Tables,
    MenuItems,
    Orders,
    FloorPlan,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Tables => write!(f, "tables"),
            ResourceKind::MenuItems => write!(f, "menu-items"),
            ResourceKind::Orders => write!(f, "orders"),
            ResourceKind::FloorPlan => write!(f, "floor-plan"),
        }
    }
}

/// Named domain event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushEvent {
    OrderCreated,
    OrderUpdated,
    OrderDeleted,
    MenuItemCreated,
    MenuItemUpdated,
    MenuItemDeleted,
    TableCreated,
    TableUpdated,
    TableDeleted,
    FloorPlanUpdated,
}

impl PushEvent {
    pub const ALL: [PushEvent; 10] = [
        PushEvent::OrderCreated,
        PushEvent::OrderUpdated,
        PushEvent::OrderDeleted,
        PushEvent::MenuItemCreated,
        PushEvent::MenuItemUpdated,
        PushEvent::MenuItemDeleted,
        PushEvent::TableCreated,
        PushEvent::TableUpdated,
        PushEvent::TableDeleted,
        PushEvent::FloorPlanUpdated,
    ];

    /// Parse a wire name; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            PushEvent::OrderCreated => "order.created",
            PushEvent::OrderUpdated => "order.updated",
            PushEvent::OrderDeleted => "order.deleted",
            PushEvent::MenuItemCreated => "menu-item.created",
            PushEvent::MenuItemUpdated => "menu-item.updated",
            PushEvent::MenuItemDeleted => "menu-item.deleted",
            PushEvent::TableCreated => "table.created",
            PushEvent::TableUpdated => "table.updated",
            PushEvent::TableDeleted => "table.deleted",
            PushEvent::FloorPlanUpdated => "floor-plan.updated",
        }
    }

    /// Snapshot categories to reload when this event arrives.
    ///
    /// Order events also reload tables: the store flips table status and
    /// current order as a side effect of order writes. Table deletion also
    /// reloads the floor plan since it may orphan positions.
    pub fn resources(self) -> &'static [ResourceKind] {
        match self {
            PushEvent::OrderCreated | PushEvent::OrderUpdated | PushEvent::OrderDeleted => {
                &[ResourceKind::Orders, ResourceKind::Tables]
            }
            PushEvent::MenuItemCreated
            | PushEvent::MenuItemUpdated
            | PushEvent::MenuItemDeleted => &[ResourceKind::MenuItems],
            PushEvent::TableCreated | PushEvent::TableUpdated => &[ResourceKind::Tables],
            PushEvent::TableDeleted => &[ResourceKind::Tables, ResourceKind::FloorPlan],
            PushEvent::FloorPlanUpdated => &[ResourceKind::FloorPlan],
        }
    }
}

impl fmt::Display for PushEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Frame as received from the realtime service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPushEvent {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RawPushEvent {
    pub fn new(event: PushEvent) -> Self {
        Self {
            event: event.name().to_string(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(event: PushEvent, data: serde_json::Value) -> Self {
        Self {
            event: event.name().to_string(),
            data,
        }
    }

    pub fn kind(&self) -> Option<PushEvent> {
        PushEvent::from_name(&self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for event in PushEvent::ALL {
            assert_eq!(PushEvent::from_name(event.name()), Some(event));
        }
        assert_eq!(PushEvent::from_name("order.exploded"), None);
        assert_eq!(PushEvent::from_name(""), None);
    }

    #[test]
    fn test_table_deleted_reloads_floor_plan() {
        assert_eq!(
            PushEvent::TableDeleted.resources(),
            &[ResourceKind::Tables, ResourceKind::FloorPlan]
        );
        assert_eq!(
            PushEvent::TableUpdated.resources(),
            &[ResourceKind::Tables]
        );
        assert!(
            !PushEvent::MenuItemUpdated
                .resources()
                .contains(&ResourceKind::Orders)
        );
    }

    #[test]
    fn test_raw_frame_tolerates_missing_data() {
        let raw: RawPushEvent = serde_json::from_str(r#"{"event":"floor-plan.updated"}"#).unwrap();
        assert_eq!(raw.kind(), Some(PushEvent::FloorPlanUpdated));
        assert!(raw.data.is_null());
    }
}
