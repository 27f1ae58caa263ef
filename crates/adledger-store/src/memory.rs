//! In-memory reference stores
//!
//! `RwLock<HashMap>` maps with the same compare-and-set contract a real
//! backend would honor. The version check and the insert happen under one
//! write guard, so a lost race always surfaces as `Conflict` and never as
//! a silent overwrite.

use std::collections::HashMap;
use std::sync::Arc;

use adledger_types::{
    BalanceAccount, CampaignBudget, CampaignId, LedgerError, OwnerId, Result,
};
use tokio::sync::RwLock;

use crate::{AccountStore, CampaignStore};

/// In-memory account store
#[derive(Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<RwLock<HashMap<OwnerId, BalanceAccount>>>,
}

impl MemoryAccountStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get(&self, owner: &OwnerId) -> Result<Option<BalanceAccount>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(owner).cloned())
    }

    async fn compare_and_set(
        &self,
        account: BalanceAccount,
        expected_version: Option<u64>,
    ) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts.get(&account.owner).map(|a| a.version);
        if stored != expected_version {
            return Err(LedgerError::Conflict { attempts: 1 });
        }
        accounts.insert(account.owner, account);
        Ok(())
    }
}

/// In-memory campaign budget store
#[derive(Clone, Default)]
pub struct MemoryCampaignStore {
    budgets: Arc<RwLock<HashMap<CampaignId, CampaignBudget>>>,
}

impl MemoryCampaignStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn get(&self, campaign_id: &CampaignId) -> Result<Option<CampaignBudget>> {
        let budgets = self.budgets.read().await;
        Ok(budgets.get(campaign_id).cloned())
    }

    async fn compare_and_set(
        &self,
        budget: CampaignBudget,
        expected_version: Option<u64>,
    ) -> Result<()> {
        let mut budgets = self.budgets.write().await;
        let stored = budgets.get(&budget.campaign_id).map(|b| b.version);
        if stored != expected_version {
            return Err(LedgerError::Conflict { attempts: 1 });
        }
        budgets.insert(budget.campaign_id, budget);
        Ok(())
    }

    async fn for_owner(&self, owner: &OwnerId) -> Result<Vec<CampaignBudget>> {
        let budgets = self.budgets.read().await;
        Ok(budgets
            .values()
            .filter(|b| &b.owner == owner)
            .cloned()
            .collect())
    }
}
