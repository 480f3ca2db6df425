//! Strongly-typed identifiers used across the workflows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operator name recorded when nobody is logged in.
pub const ANONYMOUS_OPERATOR: &str = "Anonyme";

/// Stock-keeping unit: the unique key into the catalog.
///
/// SKUs come straight from scanned labels (e.g. `1.1/2 GALVA`), so they are kept
/// verbatim apart from surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Sku(String);

/// Identifier of a customer order to pick (e.g. `CMD-8024`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

/// Name of the floor operative performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OperatorName(String);

macro_rules! impl_string_newtype {
    ($t:ty) => {
        impl $t {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into().trim().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                String::deserialize(deserializer).map(Self::new)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_newtype!(Sku);
impl_string_newtype!(OrderId);
impl_string_newtype!(OperatorName);

impl OperatorName {
    /// Name to write into ledgers: blank operators are recorded as anonymous.
    pub fn or_anonymous(&self) -> OperatorName {
        if self.is_empty() {
            OperatorName(ANONYMOUS_OPERATOR.to_string())
        } else {
            self.clone()
        }
    }
}

/// Identifier of one picking session (the holder of an order lease).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_ids_are_trimmed() {
        assert_eq!(Sku::new("  ABC-123 ").as_str(), "ABC-123");
        assert_eq!(OrderId::from("CMD-8024\n").to_string(), "CMD-8024");
    }

    #[test]
    fn sku_keeps_inner_spaces() {
        assert_eq!(Sku::from("1.1/2 GALVA").as_str(), "1.1/2 GALVA");
    }

    #[test]
    fn blank_operator_is_recorded_as_anonymous() {
        assert_eq!(OperatorName::new("  ").or_anonymous().as_str(), ANONYMOUS_OPERATOR);
        assert_eq!(OperatorName::new("Alice").or_anonymous().as_str(), "Alice");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&Sku::new("X1")).unwrap();
        assert_eq!(json, "\"X1\"");
        let back: Sku = serde_json::from_str("\" X1 \"").unwrap();
        assert_eq!(back, Sku::new("X1"));
    }
}
