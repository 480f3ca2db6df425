//! Operators allowed to log in on this terminal.

use tracing::info;

use stockscan_core::{OperatorName, WorkflowError, WorkflowResult};

use crate::store::{KeyValueStore, keys, load_json, save_json};

/// Roster persisted under [`keys::USERS`], in insertion order.
#[derive(Debug, Clone)]
pub struct OperatorRoster<S> {
    store: S,
}

impl<S: KeyValueStore> OperatorRoster<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Seed the roster when nothing has been stored yet.
    pub fn seed_if_empty<I, N>(&self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<OperatorName>,
    {
        if self.store.get(keys::USERS).is_some() {
            return;
        }
        let mut seeded: Vec<OperatorName> = Vec::new();
        for name in names {
            let name: OperatorName = name.into();
            if !name.is_empty() && !seeded.contains(&name) {
                seeded.push(name);
            }
        }
        save_json(&self.store, keys::USERS, &seeded);
    }

    pub fn list(&self) -> Vec<OperatorName> {
        load_json(&self.store, keys::USERS).unwrap_or_default()
    }

    pub fn contains(&self, name: &OperatorName) -> bool {
        self.list().contains(name)
    }

    /// Add an operator; the name is trimmed and must be new and non-blank.
    pub fn add(&self, name: &str) -> WorkflowResult<OperatorName> {
        let name = OperatorName::new(name);
        if name.is_empty() {
            return Err(WorkflowError::invalid_operator("name cannot be empty"));
        }

        let mut operators = self.list();
        if operators.contains(&name) {
            return Err(WorkflowError::invalid_operator(format!("{name} already exists")));
        }
        operators.push(name.clone());
        save_json(&self.store, keys::USERS, &operators);

        info!(operator = %name, "operator added");
        Ok(name)
    }

    /// Remove an operator. Returns `false` when the name was not on the roster.
    pub fn remove(&self, name: &OperatorName) -> bool {
        let mut operators = self.list();
        let before = operators.len();
        operators.retain(|op| op != name);
        if operators.len() == before {
            return false;
        }
        save_json(&self.store, keys::USERS, &operators);

        info!(operator = %name, "operator removed");
        true
    }
}
