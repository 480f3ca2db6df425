//! Keyboard-wedge scanner input.
//!
//! A handheld scanner types its label into the focused window like a very fast
//! keyboard. [`ScanDecoder`] rebuilds SKUs from that keystroke stream and
//! [`ScanSource`] filters host events and hands decoded SKUs to the one screen
//! currently listening.

pub mod decoder;
pub mod key;
pub mod source;

pub use decoder::{DEFAULT_DEBOUNCE_MS, DecoderConfig, ScanDecoder, extract_sku};
pub use key::{HostKeyEvent, Key, KeyEvent, KeyOrigin};
pub use source::{ConsumerGuard, KeyDisposition, ScanSource};
