//! Verified token claims.

use common::jwt::claim_string_set;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Name of the claim holding group memberships.
pub const GROUPS_CLAIM: &str = "groups";

/// The decoded payload of a verified token.
///
/// Only produced by a successful verification. The payload must be a JSON
/// object; any claim names are accepted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// The `sub` claim, when it is a string.
    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// The `iat` claim in seconds since the epoch, when it is numeric.
    ///
    /// Fractional timestamps are truncated; other shapes read as absent.
    pub fn issued_at(&self) -> Option<i64> {
        let iat = self.0.get("iat")?;
        iat.as_i64().or_else(|| iat.as_f64().map(|f| f as i64))
    }

    /// Group memberships from the `groups` claim.
    ///
    /// A missing, `null` or non-array claim is an empty set; non-string items
    /// are skipped.
    pub fn groups(&self) -> BTreeSet<String> {
        claim_string_set(self.0.get(GROUPS_CLAIM))
    }

    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups().contains(group)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> Claims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_groups_from_string_array() {
        let c = claims(json!({"sub": "alice", "groups": ["admin", "ops"]}));
        assert!(c.is_member_of("admin"));
        assert!(c.is_member_of("ops"));
        assert!(!c.is_member_of("billing"));
        assert_eq!(c.subject(), Some("alice"));
    }

    #[test]
    fn test_groups_wrong_shapes_are_empty() {
        for groups in [json!("admin"), json!(null), json!({"admin": true}), json!(7)] {
            let c = claims(json!({ "groups": groups }));
            assert!(c.groups().is_empty(), "groups = {groups}");
            assert!(!c.is_member_of("admin"));
        }
    }

    #[test]
    fn test_groups_absent_is_empty() {
        let c = claims(json!({"sub": "alice"}));
        assert!(c.groups().is_empty());
    }

    #[test]
    fn test_non_string_items_skipped() {
        let c = claims(json!({"groups": [1, "admin", {"x": 1}, null]}));
        assert_eq!(c.groups().into_iter().collect::<Vec<_>>(), vec!["admin"]);
    }

    #[test]
    fn test_issued_at_shapes() {
        assert_eq!(claims(json!({"iat": 1700000000})).issued_at(), Some(1_700_000_000));
        assert_eq!(claims(json!({"iat": 1700000000.75})).issued_at(), Some(1_700_000_000));
        assert_eq!(claims(json!({"iat": "yesterday"})).issued_at(), None);
        assert_eq!(claims(json!({})).issued_at(), None);
    }

    #[test]
    fn test_non_object_payload_rejected() {
        assert!(serde_json::from_value::<Claims>(json!(["not", "an", "object"])).is_err());
    }
}
