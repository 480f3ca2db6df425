//! Handheld terminal: one scanner, one operator, one screen at a time.
//!
//! [`Terminal`] owns the workflow engines and hands the scanner to whichever
//! screen is open. Host key events go in through [`Terminal::key`]; operator
//! commands (quantities, order selection, exports) go through the screen's
//! command methods.

pub mod config;
pub mod terminal;

pub use config::TerminalConfig;
pub use terminal::{Export, KeyOutcome, ScanResponse, Terminal};
