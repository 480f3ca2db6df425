use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use stockscan_core::{Entity, Sku, WorkflowError, WorkflowResult};

/// One product of the reference data.
///
/// Accepts the field names of the legacy stock export (`nom`, `emplacement`,
/// `stock_theorique`) as well as the English ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub sku: Sku,
    #[serde(alias = "nom")]
    pub name: String,
    #[serde(alias = "emplacement", default)]
    pub location: String,
    #[serde(alias = "stock_theorique", alias = "qty", default)]
    pub theoretical_qty: u32,
}

impl CatalogItem {
    pub fn new(
        sku: impl Into<Sku>,
        name: impl Into<String>,
        location: impl Into<String>,
        theoretical_qty: u32,
    ) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            location: location.into(),
            theoretical_qty,
        }
    }
}

impl Entity for CatalogItem {
    type Id = Sku;

    fn id(&self) -> &Self::Id {
        &self.sku
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate SKU in catalog: {0}")]
    DuplicateSku(Sku),

    #[error("empty SKU at catalog position {0}")]
    EmptySku(usize),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// SKU → item lookup over an ordered, immutable item list.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<Sku, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting blank or duplicate SKUs.
    pub fn from_items(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            let sku = item.id();
            if sku.is_empty() {
                return Err(CatalogError::EmptySku(pos));
            }
            if index.insert(sku.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateSku(sku.clone()));
            }
        }
        info!(items = items.len(), "catalog loaded");
        Ok(Self { items, index })
    }

    /// Parse a JSON array of items.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<CatalogItem> = serde_json::from_str(json)?;
        Self::from_items(items)
    }

    pub fn get(&self, sku: &Sku) -> Option<&CatalogItem> {
        self.index.get(sku).map(|&pos| &self.items[pos])
    }

    /// Like [`Catalog::get`], with the miss reported as `UnknownSku`.
    pub fn require(&self, sku: &Sku) -> WorkflowResult<&CatalogItem> {
        self.get(sku)
            .ok_or_else(|| WorkflowError::UnknownSku(sku.clone()))
    }

    pub fn contains(&self, sku: &Sku) -> bool {
        self.index.contains_key(sku)
    }

    /// Items in load order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
