use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use stockscan_catalog::{Catalog, CatalogItem};
use stockscan_core::{Clock, KeypadBuffer, OperatorName, Sku, WorkflowResult, parse_count};

/// Counted quantity for one SKU in the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRecord {
    pub sku: Sku,
    pub name: String,
    pub theoretical_qty: u32,
    pub counted_qty: u32,
    /// `counted_qty - theoretical_qty`; negative means missing stock.
    pub gap: i64,
    pub recorded_at: DateTime<Utc>,
    pub operator: OperatorName,
}

/// Whether a scan opens a fresh count or re-opens an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    New,
    Edit { prefill: u32 },
}

/// What the quantity screen needs after a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountPrompt {
    pub item: CatalogItem,
    pub mode: CountMode,
}

impl CountPrompt {
    /// Keypad initialised for this prompt (prefilled in edit mode).
    pub fn keypad(&self) -> KeypadBuffer {
        match self.mode {
            CountMode::New => KeypadBuffer::new(),
            CountMode::Edit { prefill } => KeypadBuffer::prefilled(prefill),
        }
    }
}

/// Counting session engine.
#[derive(Debug)]
pub struct CountReconciler<C> {
    catalog: Arc<Catalog>,
    clock: C,
    /// Newest first; at most one record per SKU.
    records: Vec<CountRecord>,
}

impl<C: Clock> CountReconciler<C> {
    pub fn new(catalog: Arc<Catalog>, clock: C) -> Self {
        Self {
            catalog,
            clock,
            records: Vec::new(),
        }
    }

    /// Resolve a scanned SKU into a count prompt.
    pub fn on_scan(&self, sku: &Sku) -> WorkflowResult<CountPrompt> {
        let item = self.catalog.require(sku)?.clone();
        let mode = match self.record(sku) {
            Some(existing) => CountMode::Edit {
                prefill: existing.counted_qty,
            },
            None => CountMode::New,
        };
        Ok(CountPrompt { item, mode })
    }

    /// Create or replace the count for `sku`.
    pub fn commit(
        &mut self,
        sku: &Sku,
        counted_qty_input: &str,
        operator: &OperatorName,
    ) -> WorkflowResult<CountRecord> {
        let item = self.catalog.require(sku)?;
        let counted_qty = parse_count(counted_qty_input)?;

        let record = CountRecord {
            sku: item.sku.clone(),
            name: item.name.clone(),
            theoretical_qty: item.theoretical_qty,
            counted_qty,
            gap: i64::from(counted_qty) - i64::from(item.theoretical_qty),
            recorded_at: self.clock.now(),
            operator: operator.or_anonymous(),
        };

        match self.records.iter_mut().find(|r| r.sku == record.sku) {
            Some(existing) => {
                info!(sku = %record.sku, old = existing.counted_qty, new = counted_qty, gap = record.gap, "count updated");
                *existing = record.clone();
            }
            None => {
                info!(sku = %record.sku, counted = counted_qty, gap = record.gap, "count recorded");
                self.records.insert(0, record.clone());
            }
        }

        Ok(record)
    }

    pub fn record(&self, sku: &Sku) -> Option<&CountRecord> {
        self.records.iter().find(|r| &r.sku == sku)
    }

    /// Records, newest first.
    pub fn records(&self) -> &[CountRecord] {
        &self.records
    }

    /// Share of the catalog counted, in percent rounded to the nearest integer.
    ///
    /// An empty catalog reports 0.
    pub fn progress(&self) -> u8 {
        let total = self.catalog.len();
        if total == 0 {
            return 0;
        }
        let counted = self.records.len().min(total);
        // Round half up without going through floats.
        ((counted * 200 + total) / (total * 2)) as u8
    }

    /// Catalog items not yet counted, ordered by location for the walking route.
    pub fn remaining_items(&self) -> Vec<&CatalogItem> {
        let mut remaining: Vec<&CatalogItem> = self
            .catalog
            .items()
            .iter()
            .filter(|item| self.record(&item.sku).is_none())
            .collect();
        remaining.sort_by(|a, b| a.location.cmp(&b.location));
        remaining
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stockscan_core::{ManualClock, WorkflowError};

    fn reconciler(items: Vec<CatalogItem>) -> CountReconciler<ManualClock> {
        let catalog = Arc::new(Catalog::from_items(items).unwrap());
        CountReconciler::new(catalog, ManualClock::default())
    }

    fn alice() -> OperatorName {
        OperatorName::new("Alice")
    }

    #[test]
    fn single_item_scenario() {
        let mut counting = reconciler(vec![CatalogItem::new("A1", "Tube", "L1", 10)]);

        let record = counting.commit(&Sku::new("A1"), "7", &alice()).unwrap();
        assert_eq!(record.counted_qty, 7);
        assert_eq!(record.gap, -3);
        assert_eq!(counting.progress(), 100);
        assert!(counting.remaining_items().is_empty());
    }

    #[test]
    fn recommit_replaces_existing_record() {
        let mut counting = reconciler(vec![CatalogItem::new("X1", "Coude", "L1", 6)]);
        let sku = Sku::new("X1");

        counting.commit(&sku, "5", &alice()).unwrap();
        counting.commit(&sku, "8", &alice()).unwrap();

        assert_eq!(counting.records().len(), 1);
        let record = counting.record(&sku).unwrap();
        assert_eq!(record.counted_qty, 8);
        assert_eq!(record.gap, 2);
    }

    #[test]
    fn scan_switches_to_edit_mode_once_counted() {
        let mut counting = reconciler(vec![CatalogItem::new("X1", "Coude", "L1", 6)]);
        let sku = Sku::new("X1");

        assert_eq!(counting.on_scan(&sku).unwrap().mode, CountMode::New);
        counting.commit(&sku, "4", &alice()).unwrap();

        let prompt = counting.on_scan(&sku).unwrap();
        assert_eq!(prompt.mode, CountMode::Edit { prefill: 4 });
        assert_eq!(prompt.keypad().as_str(), "4");
    }

    #[test]
    fn unknown_sku_is_rejected_without_state_change() {
        let mut counting = reconciler(vec![CatalogItem::new("A1", "Tube", "L1", 10)]);
        let ghost = Sku::new("GHOST");

        assert_eq!(counting.on_scan(&ghost).unwrap_err(), WorkflowError::UnknownSku(ghost.clone()));
        assert!(counting.commit(&ghost, "1", &alice()).is_err());
        assert!(counting.records().is_empty());
    }

    #[test]
    fn invalid_quantity_leaves_existing_record_untouched() {
        let mut counting = reconciler(vec![CatalogItem::new("A1", "Tube", "L1", 10)]);
        let sku = Sku::new("A1");
        counting.commit(&sku, "3", &alice()).unwrap();

        let err = counting.commit(&sku, "abc", &alice()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidQuantity { .. }));
        assert_eq!(counting.record(&sku).unwrap().counted_qty, 3);
    }

    #[test]
    fn zero_count_is_valid() {
        let mut counting = reconciler(vec![CatalogItem::new("A1", "Tube", "L1", 2)]);
        let record = counting.commit(&Sku::new("A1"), "0", &alice()).unwrap();
        assert_eq!(record.gap, -2);
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        let mut counting = reconciler(vec![
            CatalogItem::new("A", "a", "L1", 1),
            CatalogItem::new("B", "b", "L2", 1),
            CatalogItem::new("C", "c", "L3", 1),
        ]);
        assert_eq!(counting.progress(), 0);
        counting.commit(&Sku::new("A"), "1", &alice()).unwrap();
        assert_eq!(counting.progress(), 33);
        counting.commit(&Sku::new("B"), "1", &alice()).unwrap();
        assert_eq!(counting.progress(), 67);
    }

    #[test]
    fn empty_catalog_reports_zero_progress() {
        assert_eq!(reconciler(Vec::new()).progress(), 0);
    }

    #[test]
    fn remaining_items_follow_location_order() {
        let mut counting = reconciler(vec![
            CatalogItem::new("A", "a", "C-02", 1),
            CatalogItem::new("B", "b", "A-10", 1),
            CatalogItem::new("C", "c", "B-01", 1),
            CatalogItem::new("D", "d", "A-02", 1),
        ]);
        counting.commit(&Sku::new("C"), "1", &alice()).unwrap();

        let route: Vec<&str> = counting
            .remaining_items()
            .into_iter()
            .map(|item| item.sku.as_str())
            .collect();
        assert_eq!(route, vec!["D", "B", "A"]);
    }

    #[test]
    fn new_records_are_listed_first() {
        let mut counting = reconciler(vec![
            CatalogItem::new("A", "a", "L1", 1),
            CatalogItem::new("B", "b", "L2", 1),
        ]);
        counting.commit(&Sku::new("A"), "1", &alice()).unwrap();
        counting.commit(&Sku::new("B"), "1", &alice()).unwrap();
        counting.commit(&Sku::new("A"), "2", &alice()).unwrap();

        let order: Vec<&str> = counting.records().iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: however many times SKUs are recounted, there is exactly
        /// one record per distinct SKU and it holds the last committed value.
        #[test]
        fn one_record_per_sku_holding_last_value(
            commits in prop::collection::vec((0usize..4, 0u32..500), 1..40)
        ) {
            let skus = ["S0", "S1", "S2", "S3"];
            let mut counting = reconciler(
                skus.iter().map(|s| CatalogItem::new(*s, *s, "L", 100)).collect(),
            );

            let mut last = std::collections::HashMap::new();
            for (idx, qty) in &commits {
                counting.commit(&Sku::new(skus[*idx]), &qty.to_string(), &alice()).unwrap();
                last.insert(*idx, *qty);
            }

            prop_assert_eq!(counting.records().len(), last.len());
            for (idx, qty) in last {
                let record = counting.record(&Sku::new(skus[idx])).unwrap();
                prop_assert_eq!(record.counted_qty, qty);
                prop_assert_eq!(record.gap, i64::from(qty) - 100);
            }
        }
    }
}
