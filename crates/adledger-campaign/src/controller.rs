//! Campaign lifecycle orchestration
//!
//! Thin mapping from external campaign actions onto the ledger: the fund
//! amount goes through [`LedgerService`], everything else is a metadata
//! write. The ledger call always happens first, so a rejected reservation
//! never leaves half-applied metadata behind.

use std::collections::HashMap;

use adledger_ledger::LedgerService;
use adledger_store::{AccountStore, CampaignStore};
use adledger_types::{Amount, CampaignId, LedgerError, OwnerId};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use crate::{Campaign, CampaignDraft, CampaignSummary, Result};

/// Maps campaign-level actions onto ledger calls and metadata writes
pub struct CampaignLifecycleController<A, C> {
    ledger: LedgerService<A, C>,
    registry: RwLock<HashMap<CampaignId, Campaign>>,
}

impl<A: AccountStore, C: CampaignStore> CampaignLifecycleController<A, C> {
    /// Create a controller over a ledger service
    pub fn new(ledger: LedgerService<A, C>) -> Self {
        Self {
            ledger,
            registry: RwLock::new(HashMap::new()),
        }
    }

    /// The underlying ledger, for account-level operations
    pub fn ledger(&self) -> &LedgerService<A, C> {
        &self.ledger
    }

    /// Add funds to a seller's account
    pub async fn deposit(&self, owner: OwnerId, amount: Amount) -> Result<Amount> {
        Ok(self.ledger.deposit(owner, amount).await?)
    }

    /// Snapshot of a seller's spendable balance
    pub async fn available_balance(&self, owner: &OwnerId) -> Result<Amount> {
        Ok(self.ledger.get_available_balance(owner).await?)
    }

    /// Create a campaign: validate the draft, escrow the fund, then
    /// persist the metadata under the ledger-issued campaign id.
    pub async fn create_campaign(
        &self,
        owner: OwnerId,
        draft: CampaignDraft,
    ) -> Result<CampaignSummary> {
        draft.validate()?;

        let budget = self.ledger.create_campaign_budget(owner, draft.fund).await?;
        let now = Utc::now();
        let campaign = Campaign {
            id: budget.campaign_id,
            owner,
            product_id: draft.product_id,
            name: draft.name,
            keywords: draft.keywords,
            bid_amount: draft.bid_amount,
            radius_km: draft.radius_km,
            town: draft.town,
            active: draft.active,
            created_at: now,
            updated_at: now,
        };
        let summary = CampaignSummary::new(&campaign, budget.reserved_amount);

        self.registry.write().await.insert(campaign.id, campaign);
        info!(campaign = %summary.id, %owner, fund = %summary.fund, "campaign created");
        Ok(summary)
    }

    /// Edit a campaign: the fund change goes to the ledger (a no-delta
    /// fund is a no-op there), then the metadata fields are replaced.
    pub async fn edit_campaign(
        &self,
        campaign_id: CampaignId,
        draft: CampaignDraft,
    ) -> Result<CampaignSummary> {
        draft.validate()?;
        if !self.registry.read().await.contains_key(&campaign_id) {
            return Err(LedgerError::NotFound { campaign_id }.into());
        }

        let budget = self
            .ledger
            .update_campaign_budget(campaign_id, draft.fund)
            .await?;

        let mut registry = self.registry.write().await;
        let campaign = registry
            .get_mut(&campaign_id)
            .ok_or(LedgerError::NotFound { campaign_id })?;
        campaign.name = draft.name;
        campaign.keywords = draft.keywords;
        campaign.bid_amount = draft.bid_amount;
        campaign.radius_km = draft.radius_km;
        campaign.town = draft.town;
        campaign.product_id = draft.product_id;
        campaign.active = draft.active;
        campaign.updated_at = Utc::now();

        Ok(CampaignSummary::new(campaign, budget.reserved_amount))
    }

    /// Delete a campaign: release its escrow, then drop the metadata
    pub async fn delete_campaign(&self, campaign_id: CampaignId) -> Result<()> {
        let released = self.ledger.delete_campaign_budget(campaign_id).await?;
        self.registry.write().await.remove(&campaign_id);
        info!(campaign = %campaign_id, owner = %released.owner, "campaign deleted");
        Ok(())
    }

    /// Toggle a campaign's active flag. Pure metadata: the escrow stays
    /// committed while a campaign is inactive.
    pub async fn set_active(&self, campaign_id: CampaignId, active: bool) -> Result<CampaignSummary> {
        if !self.registry.read().await.contains_key(&campaign_id) {
            return Err(LedgerError::NotFound { campaign_id }.into());
        }
        // Fetch the fund before touching the flag, so a failed lookup
        // leaves the metadata exactly as it was
        let budget = self.ledger.get_campaign_budget(&campaign_id).await?;

        let mut registry = self.registry.write().await;
        let campaign = registry
            .get_mut(&campaign_id)
            .ok_or(LedgerError::NotFound { campaign_id })?;
        campaign.active = active;
        campaign.updated_at = Utc::now();
        Ok(CampaignSummary::new(campaign, budget.reserved_amount))
    }

    /// Fetch one campaign with its current fund
    pub async fn get_campaign(&self, campaign_id: &CampaignId) -> Result<CampaignSummary> {
        let campaign = self
            .registry
            .read()
            .await
            .get(campaign_id)
            .cloned()
            .ok_or(LedgerError::NotFound {
                campaign_id: *campaign_id,
            })?;
        let budget = self.ledger.get_campaign_budget(campaign_id).await?;
        Ok(CampaignSummary::new(&campaign, budget.reserved_amount))
    }

    /// All of an owner's campaigns with their current funds
    pub async fn list_campaigns(&self, owner: &OwnerId) -> Result<Vec<CampaignSummary>> {
        let campaigns: Vec<Campaign> = self
            .registry
            .read()
            .await
            .values()
            .filter(|c| &c.owner == owner)
            .cloned()
            .collect();

        let mut summaries = Vec::with_capacity(campaigns.len());
        for campaign in &campaigns {
            let budget = self.ledger.get_campaign_budget(&campaign.id).await?;
            summaries.push(CampaignSummary::new(campaign, budget.reserved_amount));
        }
        Ok(summaries)
    }
}
