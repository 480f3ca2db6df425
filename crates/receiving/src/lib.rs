//! Goods receipt.
//!
//! Each scanned carton is booked as a quantity-in entry. Entries can be
//! corrected or removed afterwards; every change lands in the audit log.

pub mod ledger;

pub use ledger::{ReceiptEntry, ReceiptLedger};
