//! Append-only audit trail of operator actions.
//!
//! Entries are kept newest first and capped; the oldest are dropped once the
//! cap is reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use stockscan_core::OperatorName;

use crate::store::{KeyValueStore, keys, load_json, save_json};

pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

/// Action tag of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditAction {
    /// Goods received into stock.
    StockIn,
    /// Quantity of a receipt corrected.
    ReceiptCorrection,
    /// Receipt deleted.
    ReceiptRemoval,
    /// Product consulted through the stock check screen.
    Lookup,
    /// Pick order closed.
    PickCompleted,
    /// Stale pick lease cleared by hand.
    PickLockOverride,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::StockIn => "stock-in",
            AuditAction::ReceiptCorrection => "receipt-correction",
            AuditAction::ReceiptRemoval => "receipt-removal",
            AuditAction::Lookup => "lookup",
            AuditAction::PickCompleted => "pick-completed",
            AuditAction::PickLockOverride => "pick-lock-override",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub operator: OperatorName,
    pub action: AuditAction,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditConfig {
    /// Maximum number of entries retained.
    pub capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}

impl AuditConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Audit log persisted under [`keys::AUDIT_LOG`].
#[derive(Debug, Clone)]
pub struct AuditLog<S> {
    store: S,
    config: AuditConfig,
}

impl<S: KeyValueStore> AuditLog<S> {
    pub fn new(store: S, config: AuditConfig) -> Self {
        Self { store, config }
    }

    /// Record one action at `at`; returns the stored entry.
    pub fn record(
        &self,
        at: DateTime<Utc>,
        operator: &OperatorName,
        action: AuditAction,
        detail: impl Into<String>,
    ) -> AuditEntry {
        let entry = AuditEntry {
            id: Uuid::now_v7(),
            timestamp: at,
            operator: operator.or_anonymous(),
            action,
            detail: detail.into(),
        };
        debug!(action = %action, operator = %entry.operator, detail = %entry.detail, "audit");

        let mut entries = self.entries();
        entries.insert(0, entry.clone());
        entries.truncate(self.config.capacity);
        save_json(&self.store, keys::AUDIT_LOG, &entries);

        entry
    }

    /// All retained entries, newest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        load_json(&self.store, keys::AUDIT_LOG).unwrap_or_default()
    }
}
