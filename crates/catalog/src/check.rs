//! Quick stock check: scan a product to see where it lives and how many are
//! expected on the shelf. Read-only.

use stockscan_core::{Sku, WorkflowResult};

use crate::catalog::{Catalog, CatalogItem};

pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckConfig {
    /// Items with fewer units than this are flagged for replenishment.
    pub low_stock_threshold: u32,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl CheckConfig {
    pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}

/// Result of a stock check scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCheck {
    pub item: CatalogItem,
    pub low_stock: bool,
}

impl Catalog {
    pub fn check(&self, sku: &Sku, config: &CheckConfig) -> WorkflowResult<StockCheck> {
        let item = self.require(sku)?.clone();
        let low_stock = item.theoretical_qty < config.low_stock_threshold;
        Ok(StockCheck { item, low_stock })
    }
}
