//! Per-owner balance accounts
//!
//! A [`BalanceAccount`] is the unit of truth for "can this reservation
//! happen". It tracks total deposited funds and the aggregate reserved
//! against live campaign budgets; availability is always derived, never
//! stored.
//!
//! # Invariants
//!
//! 1. `available_balance() >= 0` at all times
//! 2. `reserved_total` equals the sum of live campaign reservations
//! 3. Mutations happen only through the ledger service, under the owner lock

use crate::{Amount, LedgerError, OwnerId, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-owner record of total and reserved funds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAccount {
    /// The seller this account belongs to
    pub owner: OwnerId,
    /// All funds ever deposited
    pub total_balance: Amount,
    /// Sum of reservations across the owner's live campaign budgets
    pub reserved_total: Amount,
    /// Monotonic counter for optimistic concurrency
    pub version: u64,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// When the account was last mutated
    pub updated_at: DateTime<Utc>,
}

impl BalanceAccount {
    /// Create an empty account for an owner
    pub fn new(owner: OwnerId) -> Self {
        let now = Utc::now();
        Self {
            owner,
            total_balance: Amount::zero(),
            reserved_total: Amount::zero(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Funds not committed to any campaign (derived)
    pub fn available_balance(&self) -> Amount {
        self.total_balance.saturating_sub(self.reserved_total)
    }

    /// Move `amount` from available to reserved.
    ///
    /// Fails with `InsufficientFunds` (carrying the admissible maximum)
    /// if the amount exceeds the available balance.
    pub fn reserve(&mut self, amount: Amount) -> Result<()> {
        require_positive(amount)?;
        let available = self.available_balance();
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                max_allowed: available,
            });
        }
        self.reserved_total = self.reserved_total.checked_add(amount)?;
        Ok(())
    }

    /// Move `amount` from reserved back to available.
    ///
    /// Releasing more than is currently reserved means the aggregate has
    /// drifted from the campaign records; that is a prior bug, surfaced
    /// as `Inconsistent` rather than silently clamped.
    pub fn release(&mut self, amount: Amount) -> Result<()> {
        require_positive(amount)?;
        if amount > self.reserved_total {
            return Err(LedgerError::inconsistent(format!(
                "release of {} exceeds reserved total {} for {}",
                amount, self.reserved_total, self.owner
            )));
        }
        self.reserved_total = self.reserved_total.checked_sub(amount)?;
        Ok(())
    }

    /// Increase the total balance by `amount`
    pub fn deposit(&mut self, amount: Amount) -> Result<()> {
        require_positive(amount)?;
        self.total_balance = self.total_balance.checked_add(amount)?;
        Ok(())
    }

    /// Bump the version and timestamp ahead of a version-guarded write
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// Reject non-positive amounts before any state is touched
pub fn require_positive(amount: Amount) -> Result<()> {
    if !amount.is_positive() {
        return Err(LedgerError::invalid_amount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}
