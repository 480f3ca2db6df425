use tracing::{info, warn};

use stockscan_core::{
    Clock, OperatorName, OrderId, SessionId, Sku, WorkflowError, WorkflowResult, position_of,
};
use stockscan_infra::{AuditAction, AuditLog, KeyValueStore, keys, load_json, save_json};

use crate::order::{LineStatus, Order, OrderStatus};

/// Handle on an open order. Only the session that opened an order can scan
/// into it or complete it; once the lease is released the handle goes stale.
#[derive(Debug, PartialEq, Eq)]
pub struct PickSession {
    session_id: SessionId,
    order_id: OrderId,
}

impl PickSession {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }
}

/// Result of a successful scan inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOutcome {
    pub sku: Sku,
    pub qty_picked: u32,
    /// Every line of the order is now done; the caller may offer completion.
    pub order_complete: bool,
}

/// Picking engine over the order list persisted under [`keys::ORDERS`].
#[derive(Debug)]
pub struct PickOrchestrator<S, C> {
    store: S,
    audit: AuditLog<S>,
    clock: C,
    orders: Vec<Order>,
}

impl<S, C> PickOrchestrator<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Open the orchestrator, reloading orders (with their progress) from `store`.
    pub fn open(store: S, audit: AuditLog<S>, clock: C) -> Self {
        let orders: Vec<Order> = load_json(&store, keys::ORDERS).unwrap_or_default();
        Self {
            store,
            audit,
            clock,
            orders,
        }
    }

    /// Add orders whose id is not known yet. Malformed orders are skipped.
    ///
    /// Returns how many orders were added.
    pub fn import_orders(&mut self, orders: impl IntoIterator<Item = Order>) -> usize {
        let mut added = 0;
        for order in orders {
            if let Err(reason) = order.validate() {
                warn!(order_id = %order.id, %reason, "order rejected");
                continue;
            }
            if self.position(&order.id).is_some() {
                continue;
            }
            self.orders.push(order);
            added += 1;
        }
        if added > 0 {
            self.persist();
            info!(added, "orders imported");
        }
        added
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        self.position(order_id).map(|idx| &self.orders[idx])
    }

    /// Open `order_id` and take its lease.
    pub fn select_order(&mut self, order_id: &OrderId) -> WorkflowResult<PickSession> {
        let idx = self
            .position(order_id)
            .ok_or_else(|| WorkflowError::UnknownOrder(order_id.clone()))?;

        let now = self.clock.now();
        let order = &mut self.orders[idx];
        if order.is_done() {
            return Err(WorkflowError::AlreadyCompleted(order_id.clone()));
        }
        if order.lock.held {
            return Err(WorkflowError::Locked(order_id.clone()));
        }

        let session_id = SessionId::new();
        order.lock.acquire(session_id, now);
        self.persist();

        info!(order_id = %order_id, session_id = %session_id, "order opened");
        Ok(PickSession {
            session_id,
            order_id: order_id.clone(),
        })
    }

    /// Mark the first pending line matching `sku` as fully picked.
    pub fn scan_within_session(
        &mut self,
        session: &PickSession,
        sku: &Sku,
    ) -> WorkflowResult<PickOutcome> {
        let idx = self.held_position(session)?;
        let order = &mut self.orders[idx];

        let Some(line) = order
            .items
            .iter_mut()
            .find(|item| &item.sku == sku && item.status != LineStatus::Done)
        else {
            if order.items.iter().any(|item| &item.sku == sku) {
                return Err(WorkflowError::AlreadyPicked(sku.clone()));
            }
            return Err(WorkflowError::SkuNotInOrder {
                order_id: order.id.clone(),
                sku: sku.clone(),
            });
        };

        line.fulfil();
        let qty_picked = line.qty_picked;
        let order_complete = order.is_fully_picked();
        self.persist();

        info!(
            order_id = %session.order_id,
            sku = %sku,
            qty_picked,
            order_complete,
            "line picked"
        );
        Ok(PickOutcome {
            sku: sku.clone(),
            qty_picked,
            order_complete,
        })
    }

    /// Leave the order without completing it. Picked lines are kept.
    pub fn exit_session(&mut self, session: &PickSession) -> WorkflowResult<()> {
        let idx = self.held_position(session)?;
        self.orders[idx].lock.release();
        self.persist();

        info!(order_id = %session.order_id, "order left");
        Ok(())
    }

    /// Close the order once every line is done, releasing its lease.
    ///
    /// On `OrderIncomplete` the session stays open and can keep scanning.
    pub fn complete_session(
        &mut self,
        session: &PickSession,
        operator: &OperatorName,
    ) -> WorkflowResult<()> {
        let idx = self.held_position(session)?;
        let order = &mut self.orders[idx];

        let remaining = order.pending_lines();
        if remaining > 0 {
            return Err(WorkflowError::OrderIncomplete {
                order_id: order.id.clone(),
                remaining,
            });
        }

        order.status = OrderStatus::Done;
        order.lock.release();
        let detail = format!(
            "order {} for {}: {} line(s)",
            order.id,
            order.client,
            order.items.len()
        );
        self.persist();

        info!(order_id = %session.order_id, "order completed");
        self.audit
            .record(self.clock.now(), operator, AuditAction::PickCompleted, detail);
        Ok(())
    }

    /// Clear a lease left behind by a session that can no longer release it,
    /// e.g. after a restart. No-op when the order is not locked.
    pub fn force_release(&mut self, order_id: &OrderId, operator: &OperatorName) -> WorkflowResult<()> {
        let idx = self
            .position(order_id)
            .ok_or_else(|| WorkflowError::UnknownOrder(order_id.clone()))?;

        let lock = &mut self.orders[idx].lock;
        if !lock.held {
            return Ok(());
        }
        let acquired_at = lock.acquired_at;
        lock.release();
        self.persist();

        warn!(order_id = %order_id, operator = %operator, ?acquired_at, "order lease overridden");
        self.audit.record(
            self.clock.now(),
            operator,
            AuditAction::PickLockOverride,
            format!("order {order_id} unlocked"),
        );
        Ok(())
    }

    pub fn audit(&self) -> &AuditLog<S> {
        &self.audit
    }

    fn position(&self, order_id: &OrderId) -> Option<usize> {
        position_of(&self.orders, order_id)
    }

    fn held_position(&self, session: &PickSession) -> WorkflowResult<usize> {
        self.position(&session.order_id)
            .filter(|&idx| self.orders[idx].lock.is_held_by(session.session_id))
            .ok_or_else(|| WorkflowError::StaleSession(session.order_id.clone()))
    }

    fn persist(&self) {
        save_json(&self.store, keys::ORDERS, &self.orders);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderItem;
    use proptest::prelude::*;
    use std::sync::Arc;
    use stockscan_core::ManualClock;
    use stockscan_infra::{AuditConfig, InMemoryStore};

    type Orchestrator = PickOrchestrator<Arc<InMemoryStore>, ManualClock>;

    fn open(store: &Arc<InMemoryStore>) -> Orchestrator {
        let audit = AuditLog::new(Arc::clone(store), AuditConfig::default());
        PickOrchestrator::open(Arc::clone(store), audit, ManualClock::default())
    }

    fn seeded(store: &Arc<InMemoryStore>) -> Orchestrator {
        let mut picking = open(store);
        picking.import_orders([
            Order::new(
                "O1",
                "SARL DUPONT",
                vec![OrderItem::new("A1", 20), OrderItem::new("B2", 10)],
            ),
            Order::new("O2", "M. MARTIN", vec![OrderItem::new("C3", 5)]),
        ]);
        picking
    }

    fn alice() -> OperatorName {
        OperatorName::new("Alice")
    }

    #[test]
    fn full_pick_then_complete() {
        let store = Arc::new(InMemoryStore::new());
        let mut picking = seeded(&store);
        let o1 = OrderId::new("O1");

        let session = picking.select_order(&o1).unwrap();
        let first = picking.scan_within_session(&session, &Sku::new("A1")).unwrap();
        assert_eq!(first.qty_picked, 20);
        assert!(!first.order_complete);

        let second = picking.scan_within_session(&session, &Sku::new("B2")).unwrap();
        assert!(second.order_complete);

        picking.complete_session(&session, &alice()).unwrap();
        let order = picking.order(&o1).unwrap();
        assert_eq!(order.status, OrderStatus::Done);
        assert!(!order.lock.held);
        assert_eq!(picking.audit().entries()[0].action, AuditAction::PickCompleted);

        assert_eq!(
            picking.select_order(&o1).unwrap_err(),
            WorkflowError::AlreadyCompleted(o1.clone())
        );
    }

    #[test]
    fn second_session_is_locked_out() {
        let store = Arc::new(InMemoryStore::new());
        let mut picking = seeded(&store);
        let o1 = OrderId::new("O1");

        let _session = picking.select_order(&o1).unwrap();
        assert_eq!(picking.select_order(&o1).unwrap_err(), WorkflowError::Locked(o1));
    }

    #[test]
    fn foreign_and_repeated_scans_change_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let mut picking = seeded(&store);
        let session = picking.select_order(&OrderId::new("O1")).unwrap();

        let err = picking.scan_within_session(&session, &Sku::new("C3")).unwrap_err();
        assert!(matches!(err, WorkflowError::SkuNotInOrder { .. }));
        assert_eq!(err.haptic(), Some(stockscan_core::Haptic::Pattern([200, 100, 200])));

        picking.scan_within_session(&session, &Sku::new("A1")).unwrap();
        let before = picking.order(&OrderId::new("O1")).unwrap().clone();

        let err = picking.scan_within_session(&session, &Sku::new("A1")).unwrap_err();
        assert_eq!(err, WorkflowError::AlreadyPicked(Sku::new("A1")));
        assert!(err.is_informational());
        assert_eq!(picking.order(&OrderId::new("O1")).unwrap(), &before);
    }

    #[test]
    fn incomplete_order_cannot_be_completed() {
        let store = Arc::new(InMemoryStore::new());
        let mut picking = seeded(&store);
        let session = picking.select_order(&OrderId::new("O1")).unwrap();
        picking.scan_within_session(&session, &Sku::new("A1")).unwrap();

        let err = picking.complete_session(&session, &alice()).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::OrderIncomplete {
                order_id: OrderId::new("O1"),
                remaining: 1
            }
        );
        // The session is still usable.
        picking.scan_within_session(&session, &Sku::new("B2")).unwrap();
        picking.complete_session(&session, &alice()).unwrap();
    }

    #[test]
    fn exit_keeps_progress_and_releases_lease() {
        let store = Arc::new(InMemoryStore::new());
        let mut picking = seeded(&store);
        let o1 = OrderId::new("O1");

        let session = picking.select_order(&o1).unwrap();
        picking.scan_within_session(&session, &Sku::new("A1")).unwrap();
        picking.exit_session(&session).unwrap();

        let order = picking.order(&o1).unwrap();
        assert!(!order.lock.held);
        assert_eq!(order.progress(), 50);

        // The old handle is stale once the lease is gone.
        assert_eq!(
            picking.scan_within_session(&session, &Sku::new("B2")).unwrap_err(),
            WorkflowError::StaleSession(o1.clone())
        );

        let resumed = picking.select_order(&o1).unwrap();
        assert_ne!(resumed.session_id(), session.session_id());
        assert!(picking.scan_within_session(&resumed, &Sku::new("B2")).unwrap().order_complete);
    }

    #[test]
    fn unknown_order_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let mut picking = seeded(&store);
        let ghost = OrderId::new("NOPE");
        assert_eq!(
            picking.select_order(&ghost).unwrap_err(),
            WorkflowError::UnknownOrder(ghost.clone())
        );
        assert!(picking.force_release(&ghost, &alice()).is_err());
    }

    #[test]
    fn lease_left_by_restart_needs_force_release() {
        let store = Arc::new(InMemoryStore::new());
        let o1 = OrderId::new("O1");
        {
            let mut picking = seeded(&store);
            let _abandoned = picking.select_order(&o1).unwrap();
        }

        let mut picking = open(&store);
        assert_eq!(picking.select_order(&o1).unwrap_err(), WorkflowError::Locked(o1.clone()));

        picking.force_release(&o1, &alice()).unwrap();
        assert_eq!(picking.audit().entries()[0].action, AuditAction::PickLockOverride);
        assert!(picking.select_order(&o1).is_ok());
    }

    #[test]
    fn force_release_of_free_order_is_silent() {
        let store = Arc::new(InMemoryStore::new());
        let mut picking = seeded(&store);
        picking.force_release(&OrderId::new("O2"), &alice()).unwrap();
        assert!(picking.audit().entries().is_empty());
    }

    #[test]
    fn import_skips_duplicates_and_malformed_orders() {
        let store = Arc::new(InMemoryStore::new());
        let mut picking = seeded(&store);

        let added = picking.import_orders([
            Order::new("O1", "dup", vec![OrderItem::new("Z", 1)]),
            Order::new("O3", "empty", vec![]),
            Order::new("O4", "ok", vec![OrderItem::new("D4", 2)]),
        ]);
        assert_eq!(added, 1);
        assert_eq!(picking.orders().len(), 3);
        assert_eq!(picking.order(&OrderId::new("O1")).unwrap().client, "SARL DUPONT");
    }

    #[test]
    fn progress_survives_reopen() {
        let store = Arc::new(InMemoryStore::new());
        let o2 = OrderId::new("O2");
        {
            let mut picking = seeded(&store);
            let session = picking.select_order(&o2).unwrap();
            picking.scan_within_session(&session, &Sku::new("C3")).unwrap();
            picking.complete_session(&session, &alice()).unwrap();
        }

        let picking = open(&store);
        assert!(picking.order(&o2).unwrap().is_done());
        assert_eq!(picking.orders().len(), 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: whatever is scanned, each line is either untouched or fully
        /// picked, and completion succeeds exactly when every line was scanned.
        #[test]
        fn lines_are_all_or_nothing(scans in prop::collection::vec(0usize..5, 0..20)) {
            let skus = ["A1", "B2", "C3", "X9", "Y8"];
            let store = Arc::new(InMemoryStore::new());
            let mut picking = open(&store);
            picking.import_orders([Order::new(
                "P1",
                "client",
                vec![OrderItem::new("A1", 4), OrderItem::new("B2", 1), OrderItem::new("C3", 9)],
            )]);
            let order_id = OrderId::new("P1");
            let session = picking.select_order(&order_id).unwrap();

            for idx in &scans {
                let _ = picking.scan_within_session(&session, &Sku::new(skus[*idx]));
            }

            let order = picking.order(&order_id).unwrap().clone();
            for item in &order.items {
                let scanned = scans.iter().any(|idx| skus[*idx] == item.sku.as_str());
                prop_assert_eq!(item.is_done(), scanned);
                prop_assert_eq!(item.qty_picked, if scanned { item.qty_asked } else { 0 });
            }

            let all_scanned = (0..3).all(|i| scans.contains(&i));
            prop_assert_eq!(picking.complete_session(&session, &alice()).is_ok(), all_scanned);
        }
    }
}
