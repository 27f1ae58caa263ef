//! Fixed-point money amounts
//!
//! The ledger keeps all funds as `i128` grosz (hundredths of a PLN) and
//! only ever uses checked arithmetic. Floating point exists solely at the
//! edge: [`Amount::from_pln`] validates and converts caller input, and
//! [`Amount::to_pln`] renders snapshots for display.

use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places carried by an [`Amount`]
pub const DECIMALS: u32 = 2;

/// Grosz per PLN (the fixed-point multiplier)
pub const MINOR_PER_MAJOR: i128 = 100;

/// Largest PLN value accepted from caller input.
///
/// Bounds the f64 -> i128 conversion well inside the range where every
/// grosz is exactly representable in an f64.
pub const MAX_INPUT_PLN: f64 = 1_000_000_000_000.0;

/// A money amount in grosz (hundredths of a PLN)
///
/// Supports negative values so arithmetic intermediates (edit deltas) can
/// be represented, but every ledger operation validates positivity before
/// touching state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(i128);

impl Amount {
    /// Create an amount from raw grosz
    pub const fn from_grosz(grosz: i128) -> Self {
        Self(grosz)
    }

    /// Create a zero amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Convert caller input (PLN as a float) into an exact amount.
    ///
    /// Fails with `InvalidAmount` for non-finite or out-of-range input;
    /// this is the only place float input enters the ledger.
    pub fn from_pln(pln: f64) -> Result<Self> {
        if !pln.is_finite() {
            return Err(LedgerError::invalid_amount("amount must be a finite number"));
        }
        if pln.abs() > MAX_INPUT_PLN {
            return Err(LedgerError::invalid_amount(format!(
                "amount {pln} exceeds the maximum of {MAX_INPUT_PLN} PLN"
            )));
        }
        Ok(Self((pln * MINOR_PER_MAJOR as f64).round() as i128))
    }

    /// Raw value in grosz
    pub const fn grosz(&self) -> i128 {
        self.0
    }

    /// Human-readable value in PLN
    pub fn to_pln(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }

    /// Check if the amount is zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if the amount is strictly positive
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Check if the amount is negative
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| LedgerError::invalid_amount("amount overflow"))
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or_else(|| LedgerError::invalid_amount("amount underflow"))
    }

    /// Subtraction clamped at zero, for derived read-only views
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).max(0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:02} PLN",
            sign,
            abs / MINOR_PER_MAJOR as u128,
            abs % MINOR_PER_MAJOR as u128
        )
    }
}
