//! Read-only product catalog (the CatalogLookup collaborator).
//!
//! Loaded once at start-up; every workflow resolves scanned SKUs against it.

pub mod catalog;
pub mod check;

pub use catalog::{Catalog, CatalogError, CatalogItem};
pub use check::{CheckConfig, DEFAULT_LOW_STOCK_THRESHOLD, StockCheck};
