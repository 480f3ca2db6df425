use std::sync::{Arc, mpsc};

use tracing::{info, warn};

use stockscan_catalog::{Catalog, CatalogItem, StockCheck};
use stockscan_core::{
    ANONYMOUS_OPERATOR, Clock, OperatorName, OrderId, Sku, WorkflowError, WorkflowResult,
};
use stockscan_counting::{CountPrompt, CountReconciler, CountRecord};
use stockscan_export::{
    COUNT_HEADERS, ExportError, RECEIPT_HEADERS, count_file_name, count_rows, receipt_file_name,
    receipt_rows, write_csv,
};
use stockscan_infra::{AuditAction, AuditLog, KeyValueStore, OperatorRoster, SessionState, View};
use stockscan_picking::{Order, PickOrchestrator, PickOutcome, PickSession};
use stockscan_receiving::{ReceiptEntry, ReceiptLedger};
use stockscan_scanner::{ConsumerGuard, HostKeyEvent, KeyDisposition, ScanSource};

use crate::config::TerminalConfig;

/// What the open screen made of a decoded scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResponse {
    /// Counting: prompt for the shelf quantity.
    Count(WorkflowResult<CountPrompt>),
    /// Stock check: item details, logged as a lookup.
    Check(WorkflowResult<StockCheck>),
    /// Receiving: prompt for the received quantity.
    Receive(WorkflowResult<CatalogItem>),
    /// Picking: line fulfilled (or why not).
    Pick(WorkflowResult<PickOutcome>),
    /// Picking screen with no order open.
    Ignored(Sku),
}

impl ScanResponse {
    pub fn error(&self) -> Option<&WorkflowError> {
        match self {
            ScanResponse::Count(Err(err))
            | ScanResponse::Check(Err(err))
            | ScanResponse::Receive(Err(err))
            | ScanResponse::Pick(Err(err)) => Some(err),
            _ => None,
        }
    }
}

/// Result of one host key event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    pub disposition: KeyDisposition,
    pub response: Option<ScanResponse>,
}

/// Rendered export ready to be saved or shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

struct ActiveScreen {
    scans: mpsc::Receiver<Sku>,
    _registration: ConsumerGuard,
}

/// One handheld terminal.
pub struct Terminal<S, C> {
    config: TerminalConfig,
    catalog: Arc<Catalog>,
    clock: C,
    source: ScanSource<C>,
    counting: CountReconciler<C>,
    receiving: ReceiptLedger<S, C>,
    picking: PickOrchestrator<S, C>,
    roster: OperatorRoster<S>,
    session: SessionState<S>,
    audit: AuditLog<S>,
    view: View,
    screen: Option<ActiveScreen>,
    order: Option<PickSession>,
}

impl<S, C> Terminal<S, C>
where
    S: KeyValueStore + Clone,
    C: Clock + Clone,
{
    /// Build every engine over `store` and resume the last screen if an
    /// operator is still logged in.
    pub fn open(catalog: Catalog, store: S, clock: C, config: TerminalConfig) -> Self {
        let catalog = Arc::new(catalog);
        let audit = AuditLog::new(store.clone(), config.audit);

        let mut terminal = Self {
            config,
            source: ScanSource::new(config.decoder, clock.clone()),
            counting: CountReconciler::new(Arc::clone(&catalog), clock.clone()),
            receiving: ReceiptLedger::open(
                Arc::clone(&catalog),
                store.clone(),
                audit.clone(),
                clock.clone(),
            ),
            picking: PickOrchestrator::open(store.clone(), audit.clone(), clock.clone()),
            roster: OperatorRoster::new(store.clone()),
            session: SessionState::new(store),
            audit,
            catalog,
            clock,
            view: View::Menu,
            screen: None,
            order: None,
        };

        let resume = match terminal.session.current_user() {
            Some(_) => terminal.session.current_view(),
            None => View::Menu,
        };
        terminal.navigate(resume);
        terminal
    }

    /// Switch screens. The previous screen stops receiving scans before the
    /// new one is registered; leaving picking releases the open order.
    pub fn navigate(&mut self, view: View) {
        if self.view == View::Picking && view != View::Picking {
            self.release_order();
        }

        self.screen = None;
        if view.consumes_scans() {
            let (tx, scans) = mpsc::channel();
            let registration = self.source.register_consumer(move |sku: &Sku| {
                let _ = tx.send(sku.clone());
            });
            self.screen = Some(ActiveScreen {
                scans,
                _registration: registration,
            });
        }

        self.view = view;
        self.session.set_view(view);
        info!(view = %view, "screen opened");
    }

    /// Feed one host key event. Keys are ignored while no screen consumes scans.
    pub fn key(&mut self, event: HostKeyEvent) -> KeyOutcome {
        if self.screen.is_none() {
            return KeyOutcome::default();
        }

        let disposition = self.source.handle(event);
        let scanned = self
            .screen
            .as_ref()
            .and_then(|screen| screen.scans.try_recv().ok());
        let response = scanned.map(|sku| self.dispatch(&sku));

        if let Some(err) = response.as_ref().and_then(ScanResponse::error) {
            if err.is_informational() {
                info!(view = %self.view, %err, "scan ignored");
            } else {
                warn!(view = %self.view, %err, haptic = ?err.haptic(), "scan rejected");
            }
        }

        KeyOutcome {
            disposition,
            response,
        }
    }

    fn dispatch(&mut self, sku: &Sku) -> ScanResponse {
        match self.view {
            View::Counting => ScanResponse::Count(self.counting.on_scan(sku)),
            View::Check => {
                let result = self.catalog.check(sku, &self.config.check);
                if let Ok(check) = &result {
                    self.audit.record(
                        self.clock.now(),
                        &self.operator(),
                        AuditAction::Lookup,
                        format!(
                            "{} at {}: {} in stock",
                            check.item.sku, check.item.location, check.item.theoretical_qty
                        ),
                    );
                }
                ScanResponse::Check(result)
            }
            View::Receiving => ScanResponse::Receive(self.receiving.on_scan(sku)),
            View::Picking => match &self.order {
                Some(session) => ScanResponse::Pick(self.picking.scan_within_session(session, sku)),
                None => ScanResponse::Ignored(sku.clone()),
            },
            View::Menu => ScanResponse::Ignored(sku.clone()),
        }
    }

    pub fn login(&mut self, name: &str) -> WorkflowResult<OperatorName> {
        self.session.login(&self.roster, name)
    }

    /// Log out and return to the menu.
    pub fn logout(&mut self) {
        self.navigate(View::Menu);
        self.session.logout();
    }

    /// Logged-in operator, or the anonymous operator.
    pub fn operator(&self) -> OperatorName {
        self.session
            .current_user()
            .unwrap_or_else(|| OperatorName::new(ANONYMOUS_OPERATOR))
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn roster(&self) -> &OperatorRoster<S> {
        &self.roster
    }

    pub fn audit(&self) -> &AuditLog<S> {
        &self.audit
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn counting(&self) -> &CountReconciler<C> {
        &self.counting
    }

    pub fn receiving(&self) -> &ReceiptLedger<S, C> {
        &self.receiving
    }

    pub fn picking(&self) -> &PickOrchestrator<S, C> {
        &self.picking
    }

    pub fn picking_mut(&mut self) -> &mut PickOrchestrator<S, C> {
        &mut self.picking
    }

    pub fn commit_count(&mut self, sku: &Sku, input: &str) -> WorkflowResult<CountRecord> {
        let operator = self.operator();
        self.counting.commit(sku, input, &operator)
    }

    pub fn commit_receipt(&mut self, sku: &Sku, input: &str) -> WorkflowResult<ReceiptEntry> {
        let operator = self.operator();
        self.receiving.commit(sku, input, &operator)
    }

    pub fn edit_receipt(&mut self, index: usize, input: &str) -> WorkflowResult<ReceiptEntry> {
        let operator = self.operator();
        self.receiving.edit(index, input, &operator)
    }

    pub fn remove_receipt(&mut self, index: usize) -> WorkflowResult<ReceiptEntry> {
        let operator = self.operator();
        self.receiving.remove(index, &operator)
    }

    /// Open `order_id` for picking, leaving any order already open.
    pub fn open_order(&mut self, order_id: &OrderId) -> WorkflowResult<()> {
        self.release_order();
        self.order = Some(self.picking.select_order(order_id)?);
        Ok(())
    }

    pub fn current_order(&self) -> Option<&Order> {
        self.order
            .as_ref()
            .and_then(|session| self.picking.order(session.order_id()))
    }

    /// Leave the open order without completing it.
    pub fn leave_order(&mut self) -> WorkflowResult<()> {
        match self.order.take() {
            Some(session) => self.picking.exit_session(&session),
            None => Ok(()),
        }
    }

    /// Complete the open order. Returns `None` when no order is open.
    pub fn complete_order(&mut self) -> WorkflowResult<Option<OrderId>> {
        let Some(session) = &self.order else {
            return Ok(None);
        };
        let operator = self.operator();
        self.picking.complete_session(session, &operator)?;

        let order_id = session.order_id().clone();
        self.order = None;
        Ok(Some(order_id))
    }

    /// Clear the lease left on `order_id` by a session that is gone, e.g.
    /// before a restart. Recorded under the logged-in operator.
    pub fn force_release_order(&mut self, order_id: &OrderId) -> WorkflowResult<()> {
        if self
            .order
            .as_ref()
            .is_some_and(|session| session.order_id() == order_id)
        {
            self.order = None;
        }
        let operator = self.operator();
        self.picking.force_release(order_id, &operator)
    }

    pub fn export_counts(&self) -> Result<Export, ExportError> {
        let rows = count_rows(self.counting.records(), &self.config.export);
        Ok(Export {
            file_name: count_file_name(self.clock.now()),
            bytes: write_csv(&COUNT_HEADERS, &rows)?,
        })
    }

    pub fn export_receipts(&self) -> Result<Export, ExportError> {
        let rows = receipt_rows(self.receiving.entries(), &self.config.export);
        Ok(Export {
            file_name: receipt_file_name(&self.operator(), self.clock.now()),
            bytes: write_csv(&RECEIPT_HEADERS, &rows)?,
        })
    }

    fn release_order(&mut self) {
        if let Err(err) = self.leave_order() {
            warn!(%err, "open order could not be released");
        }
    }
}
