//! Restaurant Table Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Occupancy state of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    #[default]
    Free,
    Seated,
    Ordered,
    Served,
}

impl TableStatus {
    /// Statuses that must not keep a current-order reference
    pub fn clears_current_order(self) -> bool {
        matches!(self, TableStatus::Free | TableStatus::Served)
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableStatus::Free => write!(f, "free"),
            TableStatus::Seated => write!(f, "seated"),
            TableStatus::Ordered => write!(f, "ordered"),
            TableStatus::Served => write!(f, "served"),
        }
    }
}

/// Derived settlement flag of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

/// When the table settles: before ordering or at the end of service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentTiming {
    Start,
    #[default]
    End,
}

/// Physical table on the floor (mesa)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    /// Display number, unique within a tenant. Orders bind to this, not to `id`.
    pub number: i32,
    #[serde(default)]
    pub status: TableStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_timing: PaymentTiming,
    #[serde(default)]
    pub current_order_id: Option<String>,
}

impl Table {
    pub fn is_free(&self) -> bool {
        self.status == TableStatus::Free
    }
}

/// Create table payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCreate {
    pub number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_timing: Option<PaymentTiming>,
}

/// Update table payload
///
/// `current_order_id` is doubly optional: `None` leaves the field alone,
/// `Some(None)` sends `null` and clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_timing: Option<PaymentTiming>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_some"
    )]
    pub current_order_id: Option<Option<String>>,
}

impl TableUpdate {
    /// Apply the patch to a table row (used by in-process stores)
    pub fn apply_to(&self, table: &mut Table) {
        if let Some(number) = self.number {
            table.number = number;
        }
        if let Some(status) = self.status {
            table.status = status;
        }
        if let Some(payment_status) = self.payment_status {
            table.payment_status = payment_status;
        }
        if let Some(payment_timing) = self.payment_timing {
            table.payment_timing = payment_timing;
        }
        if let Some(current_order_id) = &self.current_order_id {
            table.current_order_id = current_order_id.clone();
        }
    }
}

/// Keeps an explicit `null` distinguishable from an absent field
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_defaults_for_sparse_rows() {
        let table: Table = serde_json::from_str(r#"{"id":"t1","number":4}"#).unwrap();
        assert_eq!(table.status, TableStatus::Free);
        assert_eq!(table.payment_status, PaymentStatus::Unpaid);
        assert_eq!(table.payment_timing, PaymentTiming::End);
        assert!(table.current_order_id.is_none());
    }

    #[test]
    fn test_update_serializes_null_to_clear_order() {
        let update = TableUpdate {
            status: Some(TableStatus::Free),
            current_order_id: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "free", "currentOrderId": null })
        );
    }

    #[test]
    fn test_update_omits_untouched_fields() {
        let update = TableUpdate {
            payment_timing: Some(PaymentTiming::Start),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "paymentTiming": "start" }));
    }

    #[test]
    fn test_update_deserialize_distinguishes_null() {
        let cleared: TableUpdate = serde_json::from_str(r#"{"currentOrderId":null}"#).unwrap();
        assert_eq!(cleared.current_order_id, Some(None));

        let absent: TableUpdate = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(absent.current_order_id, None);
    }

    #[test]
    fn test_apply_patch() {
        let mut table = Table {
            id: "t1".into(),
            number: 2,
            status: TableStatus::Ordered,
            payment_status: PaymentStatus::Paid,
            payment_timing: PaymentTiming::Start,
            current_order_id: Some("o1".into()),
        };
        TableUpdate {
            status: Some(TableStatus::Free),
            payment_status: Some(PaymentStatus::Unpaid),
            current_order_id: Some(None),
            ..Default::default()
        }
        .apply_to(&mut table);

        assert!(table.is_free());
        assert_eq!(table.payment_status, PaymentStatus::Unpaid);
        assert_eq!(table.payment_timing, PaymentTiming::Start);
        assert!(table.current_order_id.is_none());
    }
}
