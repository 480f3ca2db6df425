use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use stockscan_catalog::{Catalog, CatalogItem};
use stockscan_core::{Clock, OperatorName, Sku, WorkflowError, WorkflowResult, parse_positive};
use stockscan_infra::{AuditAction, AuditLog, KeyValueStore, keys, load_json, save_json};

/// One booked receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptEntry {
    pub sku: Sku,
    pub name: String,
    /// Always at least one.
    pub qty: u32,
    pub recorded_at: DateTime<Utc>,
    pub operator: OperatorName,
}

/// Receipt ledger persisted under [`keys::STOCK_IN_HISTORY`], newest first.
///
/// `index` arguments address the current display order, not a stable id: after
/// any mutation the caller must re-read [`ReceiptLedger::entries`] before using
/// another index.
#[derive(Debug)]
pub struct ReceiptLedger<S, C> {
    catalog: Arc<Catalog>,
    store: S,
    audit: AuditLog<S>,
    clock: C,
    entries: Vec<ReceiptEntry>,
}

impl<S, C> ReceiptLedger<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Open the ledger, reloading previously booked entries from `store`.
    pub fn open(catalog: Arc<Catalog>, store: S, audit: AuditLog<S>, clock: C) -> Self {
        let entries: Vec<ReceiptEntry> =
            load_json(&store, keys::STOCK_IN_HISTORY).unwrap_or_default();
        Self {
            catalog,
            store,
            audit,
            clock,
            entries,
        }
    }

    /// Resolve a scanned SKU into the item to book.
    pub fn on_scan(&self, sku: &Sku) -> WorkflowResult<CatalogItem> {
        self.catalog.require(sku).cloned()
    }

    /// Book `qty_input` units of `sku` at the head of the ledger.
    pub fn commit(
        &mut self,
        sku: &Sku,
        qty_input: &str,
        operator: &OperatorName,
    ) -> WorkflowResult<ReceiptEntry> {
        let item = self.catalog.require(sku)?;
        let qty = parse_positive(qty_input)?;

        let now = self.clock.now();
        let entry = ReceiptEntry {
            sku: item.sku.clone(),
            name: item.name.clone(),
            qty,
            recorded_at: now,
            operator: operator.or_anonymous(),
        };
        self.entries.insert(0, entry.clone());
        self.persist();

        info!(sku = %entry.sku, qty, operator = %entry.operator, "stock received");
        self.audit.record(
            now,
            operator,
            AuditAction::StockIn,
            format!("added {qty} x {} ({})", entry.name, entry.sku),
        );

        Ok(entry)
    }

    /// Correct the quantity of the entry at `index`; identity and timestamp stay.
    pub fn edit(
        &mut self,
        index: usize,
        new_qty_input: &str,
        operator: &OperatorName,
    ) -> WorkflowResult<ReceiptEntry> {
        self.check_index(index)?;
        let qty = parse_positive(new_qty_input)?;

        let entry = &mut self.entries[index];
        let old_qty = entry.qty;
        entry.qty = qty;
        let updated = entry.clone();
        self.persist();

        info!(sku = %updated.sku, old_qty, new_qty = qty, "receipt corrected");
        self.audit.record(
            self.clock.now(),
            operator,
            AuditAction::ReceiptCorrection,
            format!("{}: {old_qty} -> {qty}", updated.sku),
        );

        Ok(updated)
    }

    /// Delete the entry at `index`.
    ///
    /// Asking the operator for confirmation is up to the caller.
    pub fn remove(&mut self, index: usize, operator: &OperatorName) -> WorkflowResult<ReceiptEntry> {
        self.check_index(index)?;

        let removed = self.entries.remove(index);
        self.persist();

        info!(sku = %removed.sku, qty = removed.qty, "receipt removed");
        self.audit.record(
            self.clock.now(),
            operator,
            AuditAction::ReceiptRemoval,
            format!("removed {} x {} ({})", removed.qty, removed.name, removed.sku),
        );

        Ok(removed)
    }

    /// Entries in display order (newest first).
    pub fn entries(&self) -> &[ReceiptEntry] {
        &self.entries
    }

    /// Total units booked for `sku` in this ledger.
    pub fn total_for(&self, sku: &Sku) -> u64 {
        self.entries
            .iter()
            .filter(|e| &e.sku == sku)
            .map(|e| u64::from(e.qty))
            .sum()
    }

    pub fn audit(&self) -> &AuditLog<S> {
        &self.audit
    }

    fn check_index(&self, index: usize) -> WorkflowResult<()> {
        if index >= self.entries.len() {
            return Err(WorkflowError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    fn persist(&self) {
        save_json(&self.store, keys::STOCK_IN_HISTORY, &self.entries);
    }
}
