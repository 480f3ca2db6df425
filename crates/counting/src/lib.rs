//! Physical stock count.
//!
//! Operators walk the aisles, scan each product and key in what is actually on
//! the shelf. One record per SKU is kept and compared with the catalog's
//! theoretical quantity.

pub mod reconciler;

pub use reconciler::{CountMode, CountPrompt, CountReconciler, CountRecord};
