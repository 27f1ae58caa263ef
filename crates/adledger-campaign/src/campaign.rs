//! Campaign metadata
//!
//! Everything about a campaign that is not money: name, keywords, bid,
//! targeting, and the active flag. The fund amount itself lives in the
//! ledger's budget record; metadata here never gates a reservation.

use adledger_types::{Amount, CampaignId, OwnerId, ProductId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CampaignError, Result, Town};

/// Minimum bid per click
pub const MIN_BID: Amount = Amount::from_grosz(1);

/// Stored campaign metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Campaign ID (shared with the ledger's budget record)
    pub id: CampaignId,
    /// The seller who owns the campaign
    pub owner: OwnerId,
    /// The advertised product
    pub product_id: ProductId,
    /// Campaign name
    pub name: String,
    /// Search keywords the campaign bids on
    pub keywords: Vec<String>,
    /// Bid per click
    pub bid_amount: Amount,
    /// Targeting radius in kilometers
    pub radius_km: u32,
    /// Town the campaign targets, if any
    pub town: Option<Town>,
    /// Whether the campaign is serving. Toggling this never touches the
    /// ledger: an inactive campaign keeps its escrow committed.
    pub active: bool,
    /// When the campaign was created
    pub created_at: DateTime<Utc>,
    /// When the metadata was last edited
    pub updated_at: DateTime<Utc>,
}

/// Caller-submitted campaign fields, validated before any ledger call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignDraft {
    pub name: String,
    pub keywords: Vec<String>,
    pub bid_amount: Amount,
    pub radius_km: u32,
    pub town: Option<Town>,
    pub product_id: ProductId,
    /// The fund to escrow for this campaign
    pub fund: Amount,
    /// Whether the campaign starts active
    pub active: bool,
}

impl CampaignDraft {
    /// Validate the metadata fields. Fund admissibility is the ledger's
    /// job; this only enforces the form-level floors.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CampaignError::invalid("campaign name is required"));
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(CampaignError::invalid("at least one keyword is required"));
        }
        if self.bid_amount < MIN_BID {
            return Err(CampaignError::invalid(format!(
                "bid amount must be at least {MIN_BID}"
            )));
        }
        if self.radius_km < 1 {
            return Err(CampaignError::invalid("radius must be at least 1 kilometer"));
        }
        Ok(())
    }
}

/// A campaign with its current escrowed fund, as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub id: CampaignId,
    pub owner: OwnerId,
    pub product_id: ProductId,
    pub name: String,
    pub keywords: Vec<String>,
    pub bid_amount: Amount,
    pub radius_km: u32,
    pub town: Option<Town>,
    pub active: bool,
    /// The fund currently escrowed for this campaign
    pub fund: Amount,
}

impl CampaignSummary {
    pub(crate) fn new(campaign: &Campaign, fund: Amount) -> Self {
        Self {
            id: campaign.id,
            owner: campaign.owner,
            product_id: campaign.product_id,
            name: campaign.name.clone(),
            keywords: campaign.keywords.clone(),
            bid_amount: campaign.bid_amount,
            radius_km: campaign.radius_km,
            town: campaign.town,
            active: campaign.active,
            fund,
        }
    }
}
