//! AdLedger Campaign - lifecycle orchestration over the budget ledger
//!
//! Campaign actions (create, edit, delete, activate/deactivate) map onto
//! ledger calls through [`CampaignLifecycleController`]. Only the fund
//! amount ever reaches the ledger; names, keywords, bids, and targeting
//! are metadata, and the active flag in particular never moves money.

pub mod campaign;
pub mod controller;
pub mod error;
pub mod town;

pub use campaign::{Campaign, CampaignDraft, CampaignSummary, MIN_BID};
pub use controller::CampaignLifecycleController;
pub use error::{CampaignError, Result};
pub use town::Town;
