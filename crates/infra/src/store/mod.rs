//! Key-value persistence shared by all engines.
//!
//! Engines never know the storage medium; they receive a [`KeyValueStore`] and
//! read/write JSON documents under the well-known [`keys`].

pub mod json;
pub mod kv_store;

pub use json::{load_json, save_json};
pub use kv_store::{InMemoryStore, KeyValueStore};

/// Well-known store keys.
pub mod keys {
    /// Serialized list of orders to pick.
    pub const ORDERS: &str = "orders";
    /// Serialized list of operator names.
    pub const USERS: &str = "users";
    /// Serialized receipt ledger, newest first.
    pub const STOCK_IN_HISTORY: &str = "stockInHistory";
    /// Serialized audit entries, newest first.
    pub const AUDIT_LOG: &str = "auditLog";
    /// Operator of the resumed session.
    pub const CURRENT_USER: &str = "currentUser";
    /// Screen of the resumed session.
    pub const CURRENT_VIEW: &str = "currentView";
}
