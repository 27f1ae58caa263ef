//! Campaign budget escrow records
//!
//! A [`CampaignBudget`] ties one reserved fund amount to one campaign.
//! It is mutated only through the ledger service; direct field writes
//! elsewhere bypass the owner lock and are forbidden.

use crate::{Amount, CampaignId, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a campaign budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetState {
    /// Requested, reservation not yet committed
    Proposed,
    /// Reservation succeeded, fund locked
    Committed,
    /// Terminal: fund returned to the available balance
    Released,
}

impl BudgetState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released)
    }

    /// Check if the reservation counts against the owner's balance
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Escrow record binding a reserved fund amount to one campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignBudget {
    /// The campaign this reservation belongs to
    pub campaign_id: CampaignId,
    /// The seller whose balance backs the reservation
    pub owner: OwnerId,
    /// The committed fund amount
    pub reserved_amount: Amount,
    /// Current lifecycle state
    pub state: BudgetState,
    /// Monotonic counter for optimistic concurrency
    pub version: u64,
    /// When the budget was created
    pub created_at: DateTime<Utc>,
    /// When the budget was last mutated
    pub updated_at: DateTime<Utc>,
}

impl CampaignBudget {
    /// Create a proposed budget for a new campaign
    pub fn proposed(campaign_id: CampaignId, owner: OwnerId, amount: Amount) -> Self {
        let now = Utc::now();
        Self {
            campaign_id,
            owner,
            reserved_amount: amount,
            state: BudgetState::Proposed,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the reservation as committed (fund locked)
    pub fn commit(&mut self) {
        self.state = BudgetState::Committed;
    }

    /// Replace the reserved amount (edit delta applied by the ledger)
    pub fn set_reserved(&mut self, amount: Amount) {
        self.reserved_amount = amount;
    }

    /// Pin the budget to its terminal state; the released amount is
    /// returned so the caller can credit it back to the account.
    pub fn release(&mut self) -> Amount {
        self.state = BudgetState::Released;
        std::mem::take(&mut self.reserved_amount)
    }

    /// Check if the reservation still counts against the owner's balance
    pub fn is_live(&self) -> bool {
        self.state.is_live()
    }

    /// Bump the version and timestamp ahead of a version-guarded write
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
