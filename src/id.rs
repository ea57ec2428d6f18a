//! Typed identifiers for servers and users.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique server identifier.
///
/// Generated ids are UUIDv7, so their string form sorts lexicographically
/// in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    /// Generate a fresh time-ordered id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// View as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ServerId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for ServerId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Unique user identifier.
///
/// Issued by the identity system; this crate treats it as an opaque
/// stable string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// View as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::{NoContext, Timestamp};

    #[test]
    fn generated_ids_are_unique() {
        let a = ServerId::generate();
        let b = ServerId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn id_strings_sort_in_creation_order() {
        // UUIDv7 leads with the unix timestamp, so string order tracks time.
        let early = Uuid::new_v7(Timestamp::from_unix(NoContext, 1_700_000_000, 0));
        let late = Uuid::new_v7(Timestamp::from_unix(NoContext, 1_700_000_060, 0));
        assert!(early.to_string() < late.to_string());

        let early_id = ServerId::from(early.to_string());
        let late_id = ServerId::from(late.to_string());
        assert!(early_id < late_id);
    }

    #[test]
    fn display_matches_inner_string() {
        let id = UserId::from("user-42");
        assert_eq!(id.to_string(), "user-42");
        assert_eq!(id.as_str(), "user-42");
    }
}
