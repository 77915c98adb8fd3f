//! Utility functions and helpers

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Round half-up to `dp` decimal places
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a configured float into a decimal using its shortest textual form,
/// so `0.7` becomes exactly `0.7` rather than the nearest binary fraction.
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

/// Normalize an IATA-style location or currency code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// True when `code` is exactly three ASCII letters
pub fn is_three_letter_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
