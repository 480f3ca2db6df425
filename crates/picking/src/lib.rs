//! Order picking.
//!
//! An operator opens one order at a time, scans each line's product off the
//! shelf and closes the order once every line is done. Opening an order takes a
//! lease on it so a second session on this terminal cannot open it too.
//!
//! The lease is local to this process: two terminals sharing nothing but the
//! order list can still pick the same order concurrently.

pub mod order;
pub mod orchestrator;

pub use order::{Lease, LineStatus, Order, OrderItem, OrderStatus};
pub use orchestrator::{PickOrchestrator, PickOutcome, PickSession};
