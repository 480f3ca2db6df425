//! Logged-in operator and last screen, persisted so a restarted terminal
//! resumes where it was.

use tracing::{info, warn};

use stockscan_core::{OperatorName, WorkflowError, WorkflowResult};

use crate::roster::OperatorRoster;
use crate::store::{KeyValueStore, keys};

/// Terminal screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Menu,
    /// Physical count.
    Counting,
    /// Read-only stock check.
    Check,
    /// Goods receipt.
    Receiving,
    /// Order picking.
    Picking,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Menu => "menu",
            View::Counting => "inventory",
            View::Check => "check",
            View::Receiving => "stock_in",
            View::Picking => "picking",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "menu" => Some(View::Menu),
            "inventory" => Some(View::Counting),
            "check" => Some(View::Check),
            "stock_in" => Some(View::Receiving),
            "picking" => Some(View::Picking),
            _ => None,
        }
    }

    /// Whether the screen consumes scans.
    pub fn consumes_scans(&self) -> bool {
        !matches!(self, View::Menu)
    }
}

impl core::fmt::Display for View {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session keys ([`keys::CURRENT_USER`], [`keys::CURRENT_VIEW`]) stored as plain
/// strings.
#[derive(Debug, Clone)]
pub struct SessionState<S> {
    store: S,
}

impl<S: KeyValueStore> SessionState<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Log `name` in; it must be on the roster.
    pub fn login<R: KeyValueStore>(
        &self,
        roster: &OperatorRoster<R>,
        name: &str,
    ) -> WorkflowResult<OperatorName> {
        let operator = OperatorName::new(name);
        if operator.is_empty() || !roster.contains(&operator) {
            return Err(WorkflowError::invalid_operator(format!(
                "{operator:?} is not on the roster"
            )));
        }
        self.store.set(keys::CURRENT_USER, operator.to_string());
        info!(operator = %operator, "operator logged in");
        Ok(operator)
    }

    pub fn logout(&self) {
        if let Some(operator) = self.current_user() {
            info!(operator = %operator, "operator logged out");
        }
        self.store.remove(keys::CURRENT_USER);
        self.store.remove(keys::CURRENT_VIEW);
    }

    pub fn current_user(&self) -> Option<OperatorName> {
        self.store
            .get(keys::CURRENT_USER)
            .map(OperatorName::new)
            .filter(|op| !op.is_empty())
    }

    pub fn set_view(&self, view: View) {
        self.store.set(keys::CURRENT_VIEW, view.as_str().to_string());
    }

    /// Last persisted screen; unknown values fall back to the menu.
    pub fn current_view(&self) -> View {
        match self.store.get(keys::CURRENT_VIEW) {
            None => View::Menu,
            Some(raw) => View::parse(&raw).unwrap_or_else(|| {
                warn!(view = %raw, "unknown stored view; resuming at menu");
                View::Menu
            }),
        }
    }
}
