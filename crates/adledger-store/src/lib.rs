//! AdLedger Store - persistence seams for the budget ledger
//!
//! The ledger consumes, not implements, persistence: an [`AccountStore`]
//! keyed by owner and a [`CampaignStore`] keyed by campaign. Both expose a
//! version-guarded write (compare-and-set) so the ledger's optimistic
//! concurrency works against backends without native locking.
//!
//! The in-memory implementation in [`memory`] is the reference backend,
//! used by tests and embeddable as-is.

pub mod memory;

pub use memory::{MemoryAccountStore, MemoryCampaignStore};

use adledger_types::{BalanceAccount, CampaignBudget, CampaignId, OwnerId, Result};

/// Store of per-owner balance accounts
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch the account for an owner, if one exists
    async fn get(&self, owner: &OwnerId) -> Result<Option<BalanceAccount>>;

    /// Write an account if the stored version still matches
    /// `expected_version` (`None` asserts the account does not exist yet).
    /// Fails with `Conflict` when the guard does not hold.
    async fn compare_and_set(
        &self,
        account: BalanceAccount,
        expected_version: Option<u64>,
    ) -> Result<()>;
}

/// Store of per-campaign budget records
#[async_trait::async_trait]
pub trait CampaignStore: Send + Sync {
    /// Fetch the budget for a campaign, if one exists
    async fn get(&self, campaign_id: &CampaignId) -> Result<Option<CampaignBudget>>;

    /// Write a budget if the stored version still matches
    /// `expected_version` (`None` asserts the budget does not exist yet).
    /// Fails with `Conflict` when the guard does not hold.
    async fn compare_and_set(
        &self,
        budget: CampaignBudget,
        expected_version: Option<u64>,
    ) -> Result<()>;

    /// All budgets belonging to an owner, in no particular order
    async fn for_owner(&self, owner: &OwnerId) -> Result<Vec<CampaignBudget>>;
}
