//! The ledger service
//!
//! [`LedgerService`] orchestrates every balance/escrow mutation: it locks
//! the owner, validates admissibility against fresh state, and commits the
//! account and budget records as one unit through version-guarded writes.
//!
//! Commit protocol: the account record is written first (it is the
//! contended one); if the subsequent budget write loses its version guard,
//! the account delta is compensated before the bounded retry, so no
//! partially-applied operation is ever observable.

use std::time::Duration;

use adledger_store::{AccountStore, CampaignStore};
use adledger_types::{
    account::require_positive, Amount, BalanceAccount, CampaignBudget, CampaignId, LedgerError,
    OwnerId, Result,
};
use tracing::{debug, info, warn};

use crate::lock::OwnerLocks;
use crate::validate::ConsistencyValidator;

/// How many times a version-guarded commit is retried from validation
/// before surfacing `Conflict`
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Inverse account delta applied when a budget write fails after the
/// account write already committed
enum Undo {
    Release(Amount),
    Reserve(Amount),
}

/// The authoritative balance/escrow service
///
/// All mutations for one owner are linearized through [`OwnerLocks`];
/// reads (`get_available_balance`, `get_campaign_budget`) run lock-free
/// and may be stale, which is acceptable for display but never used to
/// gate a commit.
pub struct LedgerService<A, C> {
    accounts: A,
    campaigns: C,
    locks: OwnerLocks,
}

impl<A: AccountStore, C: CampaignStore> LedgerService<A, C> {
    /// Create a service over the given stores
    pub fn new(accounts: A, campaigns: C) -> Self {
        Self {
            accounts,
            campaigns,
            locks: OwnerLocks::new(),
        }
    }

    /// Create a service with a custom owner-lock wait budget
    pub fn with_lock_wait(accounts: A, campaigns: C, wait_budget: Duration) -> Self {
        Self {
            accounts,
            campaigns,
            locks: OwnerLocks::with_wait_budget(wait_budget),
        }
    }

    /// Increase an owner's total balance, creating the account on first
    /// deposit. Returns the new available balance.
    pub async fn deposit(&self, owner: OwnerId, amount: Amount) -> Result<Amount> {
        require_positive(amount)?;
        let _guard = self.locks.acquire(owner).await?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let stored = self.accounts.get(&owner).await?;
            let expected = stored.as_ref().map(|a| a.version);
            let mut account = stored.unwrap_or_else(|| BalanceAccount::new(owner));
            account.deposit(amount)?;
            account.touch();
            let available = account.available_balance();

            match self.accounts.compare_and_set(account, expected).await {
                Ok(()) => {
                    debug!(%owner, %amount, %available, "deposit committed");
                    return Ok(available);
                }
                Err(LedgerError::Conflict { .. }) if attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(%owner, attempt, "deposit lost version race, retrying");
                }
                Err(LedgerError::Conflict { .. }) => break,
                Err(e) => return Err(e),
            }
        }
        Err(LedgerError::Conflict {
            attempts: MAX_COMMIT_ATTEMPTS,
        })
    }

    /// Reserve `amount` against the owner's balance and create the
    /// campaign budget in `Committed` state.
    pub async fn create_campaign_budget(
        &self,
        owner: OwnerId,
        amount: Amount,
    ) -> Result<CampaignBudget> {
        require_positive(amount)?;
        let _guard = self.locks.acquire(owner).await?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let stored = self.accounts.get(&owner).await?;
            let expected = stored.as_ref().map(|a| a.version);
            let mut account = stored.unwrap_or_else(|| BalanceAccount::new(owner));

            ConsistencyValidator::admissible_create(amount, account.available_balance())?;
            account.reserve(amount)?;
            account.touch();

            let mut budget = CampaignBudget::proposed(CampaignId::new(), owner, amount);
            budget.commit();
            budget.touch();

            match self.accounts.compare_and_set(account, expected).await {
                Ok(()) => {}
                Err(LedgerError::Conflict { .. }) if attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(%owner, attempt, "create lost version race, retrying");
                    continue;
                }
                Err(LedgerError::Conflict { .. }) => break,
                Err(e) => return Err(e),
            }

            match self.campaigns.compare_and_set(budget.clone(), None).await {
                Ok(()) => {
                    info!(%owner, campaign = %budget.campaign_id, %amount, "campaign budget created");
                    return Ok(budget);
                }
                Err(LedgerError::Conflict { .. }) => {
                    self.compensate(owner, Undo::Release(amount)).await?;
                    if attempt < MAX_COMMIT_ATTEMPTS {
                        warn!(%owner, attempt, "budget insert lost version race, retrying");
                        continue;
                    }
                    break;
                }
                Err(e) => {
                    self.compensate(owner, Undo::Release(amount)).await?;
                    return Err(e);
                }
            }
        }
        Err(LedgerError::Conflict {
            attempts: MAX_COMMIT_ATTEMPTS,
        })
    }

    /// Change a campaign's reserved fund to `new_amount`.
    ///
    /// The admissible ceiling is `available + current reservation`: the
    /// campaign's own escrow is always available to itself. A target equal
    /// to the current reservation is a no-op success with no version bump;
    /// a target of zero keeps the record committed at a zero reservation.
    pub async fn update_campaign_budget(
        &self,
        campaign_id: CampaignId,
        new_amount: Amount,
    ) -> Result<CampaignBudget> {
        if new_amount.is_negative() {
            return Err(LedgerError::invalid_amount(format!(
                "campaign fund cannot be negative, got {new_amount}"
            )));
        }
        let owner = self.live_budget(&campaign_id).await?.owner;
        let _guard = self.locks.acquire(owner).await?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let budget = self.live_budget(&campaign_id).await?;
            let current = budget.reserved_amount;
            if new_amount == current {
                debug!(campaign = %campaign_id, %new_amount, "no-delta update, nothing to commit");
                return Ok(budget);
            }

            let mut account = self.backing_account(&budget).await?;
            let account_expected = Some(account.version);

            ConsistencyValidator::admissible_update(
                new_amount,
                account.available_balance(),
                current,
            )?;
            let undo = if new_amount > current {
                let delta = new_amount.checked_sub(current)?;
                account.reserve(delta)?;
                Undo::Release(delta)
            } else {
                let delta = current.checked_sub(new_amount)?;
                account.release(delta)?;
                Undo::Reserve(delta)
            };
            account.touch();

            let budget_expected = Some(budget.version);
            let mut updated = budget;
            updated.set_reserved(new_amount);
            updated.touch();

            match self.accounts.compare_and_set(account, account_expected).await {
                Ok(()) => {}
                Err(LedgerError::Conflict { .. }) if attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(%owner, attempt, "update lost version race, retrying");
                    continue;
                }
                Err(LedgerError::Conflict { .. }) => break,
                Err(e) => return Err(e),
            }

            match self
                .campaigns
                .compare_and_set(updated.clone(), budget_expected)
                .await
            {
                Ok(()) => {
                    info!(
                        %owner, campaign = %campaign_id, %current, %new_amount,
                        "campaign budget updated"
                    );
                    return Ok(updated);
                }
                Err(LedgerError::Conflict { .. }) => {
                    self.compensate(owner, undo).await?;
                    if attempt < MAX_COMMIT_ATTEMPTS {
                        warn!(%owner, attempt, "budget update lost version race, retrying");
                        continue;
                    }
                    break;
                }
                Err(e) => {
                    self.compensate(owner, undo).await?;
                    return Err(e);
                }
            }
        }
        Err(LedgerError::Conflict {
            attempts: MAX_COMMIT_ATTEMPTS,
        })
    }

    /// Release a campaign's full reservation and pin the budget to its
    /// terminal `Released` state. Returns the released record.
    pub async fn delete_campaign_budget(&self, campaign_id: CampaignId) -> Result<CampaignBudget> {
        let owner = self.live_budget(&campaign_id).await?.owner;
        let _guard = self.locks.acquire(owner).await?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let budget = self.live_budget(&campaign_id).await?;
            let amount = budget.reserved_amount;

            let budget_expected = Some(budget.version);
            let mut released = budget;
            released.release();
            released.touch();

            if !amount.is_positive() {
                // A budget already edited down to zero has nothing to
                // return; only the budget record changes.
                match self
                    .campaigns
                    .compare_and_set(released.clone(), budget_expected)
                    .await
                {
                    Ok(()) => {
                        info!(%owner, campaign = %campaign_id, %amount, "campaign budget released");
                        return Ok(released);
                    }
                    Err(LedgerError::Conflict { .. }) if attempt < MAX_COMMIT_ATTEMPTS => {
                        warn!(%owner, attempt, "budget release lost version race, retrying");
                        continue;
                    }
                    Err(LedgerError::Conflict { .. }) => break,
                    Err(e) => return Err(e),
                }
            } else {
                let mut account = self.backing_account(&released).await?;
                let account_expected = Some(account.version);
                account.release(amount)?;
                account.touch();

                match self.accounts.compare_and_set(account, account_expected).await {
                    Ok(()) => {}
                    Err(LedgerError::Conflict { .. }) if attempt < MAX_COMMIT_ATTEMPTS => {
                        warn!(%owner, attempt, "delete lost version race, retrying");
                        continue;
                    }
                    Err(LedgerError::Conflict { .. }) => break,
                    Err(e) => return Err(e),
                }

                match self
                    .campaigns
                    .compare_and_set(released.clone(), budget_expected)
                    .await
                {
                    Ok(()) => {
                        info!(%owner, campaign = %campaign_id, %amount, "campaign budget released");
                        return Ok(released);
                    }
                    Err(LedgerError::Conflict { .. }) => {
                        self.compensate(owner, Undo::Reserve(amount)).await?;
                        if attempt < MAX_COMMIT_ATTEMPTS {
                            warn!(%owner, attempt, "budget release lost version race, retrying");
                            continue;
                        }
                        break;
                    }
                    Err(e) => {
                        self.compensate(owner, Undo::Reserve(amount)).await?;
                        return Err(e);
                    }
                }
            }
        }
        Err(LedgerError::Conflict {
            attempts: MAX_COMMIT_ATTEMPTS,
        })
    }

    /// Lock-free snapshot of an owner's available balance.
    ///
    /// May be stale by the time a subsequent write is attempted; commits
    /// always re-validate under the owner lock.
    pub async fn get_available_balance(&self, owner: &OwnerId) -> Result<Amount> {
        Ok(self
            .accounts
            .get(owner)
            .await?
            .map(|a| a.available_balance())
            .unwrap_or(Amount::zero()))
    }

    /// Lock-free snapshot of a campaign budget (any state)
    pub async fn get_campaign_budget(&self, campaign_id: &CampaignId) -> Result<CampaignBudget> {
        self.campaigns
            .get(campaign_id)
            .await?
            .ok_or(LedgerError::NotFound {
                campaign_id: *campaign_id,
            })
    }

    /// Verify the owner's materialized aggregate against the budget
    /// records: `reserved_total` must equal the sum of live reservations.
    pub async fn audit_owner(&self, owner: &OwnerId) -> Result<()> {
        let _guard = self.locks.acquire(*owner).await?;
        let reserved_total = self
            .accounts
            .get(owner)
            .await?
            .map(|a| a.reserved_total)
            .unwrap_or(Amount::zero());
        let live_sum = self
            .campaigns
            .for_owner(owner)
            .await?
            .iter()
            .filter(|b| b.is_live())
            .try_fold(Amount::zero(), |acc, b| acc.checked_add(b.reserved_amount))?;
        if reserved_total != live_sum {
            return Err(LedgerError::inconsistent(format!(
                "reserved total {reserved_total} does not match live reservations {live_sum} for {owner}"
            )));
        }
        Ok(())
    }

    /// Fetch a budget that is still mutable; missing or `Released`
    /// records both surface as `NotFound`.
    async fn live_budget(&self, campaign_id: &CampaignId) -> Result<CampaignBudget> {
        let budget = self
            .campaigns
            .get(campaign_id)
            .await?
            .ok_or(LedgerError::NotFound {
                campaign_id: *campaign_id,
            })?;
        if budget.state.is_terminal() {
            return Err(LedgerError::NotFound {
                campaign_id: *campaign_id,
            });
        }
        Ok(budget)
    }

    /// Fetch the account backing a budget; a committed budget with no
    /// account means the stores have drifted.
    async fn backing_account(&self, budget: &CampaignBudget) -> Result<BalanceAccount> {
        self.accounts.get(&budget.owner).await?.ok_or_else(|| {
            LedgerError::inconsistent(format!(
                "campaign {} has no backing account for {}",
                budget.campaign_id, budget.owner
            ))
        })
    }

    /// Re-apply the inverse account delta after a budget write lost its
    /// version guard. The owner lock is still held by the caller.
    async fn compensate(&self, owner: OwnerId, undo: Undo) -> Result<()> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let account = self.accounts.get(&owner).await?;
            let Some(mut account) = account else {
                return Err(LedgerError::inconsistent(format!(
                    "account for {owner} vanished during rollback"
                )));
            };
            let expected = Some(account.version);
            match &undo {
                Undo::Release(amount) => account.release(*amount)?,
                Undo::Reserve(amount) => account.reserve(*amount)?,
            }
            account.touch();

            match self.accounts.compare_and_set(account, expected).await {
                Ok(()) => {
                    warn!(%owner, "rolled back account delta after budget commit conflict");
                    return Ok(());
                }
                Err(LedgerError::Conflict { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(LedgerError::inconsistent(format!(
            "unable to roll back account delta for {owner}"
        )))
    }
}
