//! Common types for the shared crate

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one restaurant business (the tenant partition key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Build a tenant id, rejecting blank input.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == raw.len() {
            Some(Self(raw))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_blank() {
        assert!(TenantId::parse("").is_none());
        assert!(TenantId::parse("   ").is_none());
    }

    #[test]
    fn test_parse_trims() {
        let id = TenantId::parse("  rest-1 ").unwrap();
        assert_eq!(id.as_str(), "rest-1");
        assert_eq!(id.to_string(), "rest-1");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = TenantId::parse("rest-9").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"rest-9\"");
    }
}
