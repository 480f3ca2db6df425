//! Infrastructure layer: the persisted key-value store and the records kept in
//! it outside of any single workflow (audit trail, operator roster, session).

pub mod audit;
pub mod roster;
pub mod session;
pub mod store;

pub use audit::{AuditAction, AuditConfig, AuditEntry, AuditLog, DEFAULT_AUDIT_CAPACITY};
pub use roster::OperatorRoster;
pub use session::{SessionState, View};
pub use store::{InMemoryStore, KeyValueStore, keys, load_json, save_json};
