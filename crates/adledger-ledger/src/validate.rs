//! Admissibility checks for reservation changes
//!
//! The single gate for every reservation change; the scattered per-form
//! min/max checks of the old panel collapse into this one predicate. It is
//! pure: callers pass in the account numbers read under the owner lock.

use adledger_types::{Amount, LedgerError, Result};

/// Stateless admissibility predicate for reservation changes
pub struct ConsistencyValidator;

impl ConsistencyValidator {
    /// A new reservation is admissible iff the amount is positive and
    /// does not exceed the available balance.
    pub fn admissible_create(amount: Amount, available: Amount) -> Result<()> {
        if !amount.is_positive() {
            return Err(LedgerError::invalid_amount(format!(
                "campaign fund must be positive, got {amount}"
            )));
        }
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                max_allowed: available,
            });
        }
        Ok(())
    }

    /// An updated reservation is admissible iff the target is
    /// non-negative and does not exceed `available + current_reserved`:
    /// a campaign's own reservation is always available to itself.
    pub fn admissible_update(
        new_amount: Amount,
        available: Amount,
        current_reserved: Amount,
    ) -> Result<()> {
        if new_amount.is_negative() {
            return Err(LedgerError::invalid_amount(format!(
                "campaign fund cannot be negative, got {new_amount}"
            )));
        }
        let ceiling = available.checked_add(current_reserved)?;
        if new_amount > ceiling {
            return Err(LedgerError::InsufficientFunds {
                requested: new_amount,
                max_allowed: ceiling,
            });
        }
        Ok(())
    }
}
