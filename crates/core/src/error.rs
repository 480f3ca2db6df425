//! Workflow error model.

use thiserror::Error;

use crate::id::{OrderId, Sku};

/// Result type returned by every workflow engine operation.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Recoverable workflow failure.
///
/// Every engine operation returns one of these instead of panicking. None of them
/// is fatal: the caller shows a message and the engine state is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Scanned or typed identifier is absent from the catalog.
    #[error("unknown SKU: {0}")]
    UnknownSku(Sku),

    /// Quantity input is non-numeric or out of range.
    #[error("invalid quantity {input:?}: {reason}")]
    InvalidQuantity { input: String, reason: String },

    /// Scan does not match any line of the active pick order.
    #[error("{sku} is not part of order {order_id}")]
    SkuNotInOrder { order_id: OrderId, sku: Sku },

    /// The matching order line was already fulfilled.
    #[error("{0} already picked")]
    AlreadyPicked(Sku),

    /// The order is done and can no longer be opened.
    #[error("order {0} already completed")]
    AlreadyCompleted(OrderId),

    /// Another session in this process holds the order lease.
    #[error("order {0} is locked by another session")]
    Locked(OrderId),

    /// No order with this id is known.
    #[error("unknown order: {0}")]
    UnknownOrder(OrderId),

    /// Completion requested while some lines are still pending.
    #[error("order {order_id} still has {remaining} pending line(s)")]
    OrderIncomplete { order_id: OrderId, remaining: usize },

    /// The session handle no longer holds the order lease.
    #[error("session no longer holds order {0}")]
    StaleSession(OrderId),

    /// Display index does not address an existing row.
    #[error("index {index} out of range (len: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Operator name rejected by the roster or session.
    #[error("invalid operator: {0}")]
    InvalidOperator(String),
}

/// Hardware feedback the caller should trigger for an error, where supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haptic {
    /// One vibration of the given length in milliseconds.
    Pulse(u32),
    /// Vibrate / pause / vibrate, in milliseconds.
    Pattern([u32; 3]),
}

impl WorkflowError {
    pub fn invalid_quantity(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuantity {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_operator(msg: impl Into<String>) -> Self {
        Self::InvalidOperator(msg.into())
    }

    /// True for conditions that are reported to the operator but are not mistakes.
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::AlreadyPicked(_))
    }

    pub fn haptic(&self) -> Option<Haptic> {
        match self {
            Self::UnknownSku(_) => Some(Haptic::Pulse(200)),
            Self::SkuNotInOrder { .. } => Some(Haptic::Pattern([200, 100, 200])),
            _ => None,
        }
    }
}
