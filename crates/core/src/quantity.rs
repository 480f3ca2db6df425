//! Quantity input: strict parsing and the on-screen keypad buffer.

use crate::error::{WorkflowError, WorkflowResult};

/// Longest number the keypad accepts.
pub const MAX_QUANTITY_DIGITS: usize = 5;

/// Largest quantity a single count or receipt can carry.
pub const MAX_QUANTITY: u32 = 99_999;

/// Parse a counted quantity (zero allowed).
pub fn parse_count(input: &str) -> WorkflowResult<u32> {
    parse_digits(input)
}

/// Parse a received or corrected quantity (must be at least one).
pub fn parse_positive(input: &str) -> WorkflowResult<u32> {
    let qty = parse_digits(input)?;
    if qty == 0 {
        return Err(WorkflowError::invalid_quantity(input, "quantity must be positive"));
    }
    Ok(qty)
}

fn parse_digits(input: &str) -> WorkflowResult<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::invalid_quantity(input, "quantity is empty"));
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WorkflowError::invalid_quantity(input, "not a whole number"));
    }

    match trimmed.parse::<u32>() {
        Ok(qty) if qty <= MAX_QUANTITY => Ok(qty),
        _ => Err(WorkflowError::invalid_quantity(
            input,
            format!("quantity exceeds {MAX_QUANTITY}"),
        )),
    }
}

/// Digits typed on the numeric keypad, capped at [`MAX_QUANTITY_DIGITS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeypadBuffer {
    digits: String,
}

impl KeypadBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing quantity (edit mode).
    pub fn prefilled(qty: u32) -> Self {
        let mut digits = qty.to_string();
        digits.truncate(MAX_QUANTITY_DIGITS);
        Self { digits }
    }

    /// Append one digit. Returns `false` when the key was ignored.
    pub fn push(&mut self, digit: char) -> bool {
        if !digit.is_ascii_digit() || self.digits.len() >= MAX_QUANTITY_DIGITS {
            return false;
        }
        self.digits.push(digit);
        true
    }

    pub fn backspace(&mut self) {
        self.digits.pop();
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }
}
