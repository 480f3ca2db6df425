//! Shared building blocks for the floor terminal workflows.
//!
//! This crate contains **pure domain** primitives (no storage, no host events).

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod quantity;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::{Entity, position_of};
pub use error::{Haptic, WorkflowError, WorkflowResult};
pub use id::{ANONYMOUS_OPERATOR, OperatorName, OrderId, SessionId, Sku};
pub use quantity::{KeypadBuffer, MAX_QUANTITY, MAX_QUANTITY_DIGITS, parse_count, parse_positive};
