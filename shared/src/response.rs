//! Response bodies returned by the remote store
//!
//! Resource endpoints answer with the bare resource JSON; only deletions and
//! failures have a dedicated shape.

use serde::{Deserialize, Serialize};

/// Body of `DELETE /tables/:id` and `DELETE /menu-items/:id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted: bool,
}

/// Error body sent alongside a non-2xx status
///
/// ```json
/// { "statusCode": 400, "message": "Table number already in use", "error": "Bad Request" }
/// ```
///
/// `message` is either a string or a list of validation messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Flatten the message into a single human readable line
    pub fn summary(&self) -> Option<String> {
        match self.message.as_ref() {
            None | Some(serde_json::Value::Null) => self.error.clone(),
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Array(items)) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                Some(parts.join("; "))
            }
            Some(other) => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_string_message() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"statusCode":404,"message":"Table not found","error":"Not Found"}"#,
        )
        .unwrap();
        assert_eq!(body.status_code, Some(404));
        assert_eq!(body.summary().as_deref(), Some("Table not found"));
    }

    #[test]
    fn test_error_body_list_message() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"statusCode":400,"message":["number must be positive","status is invalid"]}"#,
        )
        .unwrap();
        assert_eq!(
            body.summary().as_deref(),
            Some("number must be positive; status is invalid")
        );
    }

    #[test]
    fn test_error_body_falls_back_to_error_field() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":null,"error":"Forbidden"}"#).unwrap();
        assert_eq!(body.summary().as_deref(), Some("Forbidden"));
    }
}
