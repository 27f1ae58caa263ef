//! Error types for AdLedger
//!
//! All ledger failures are explicit typed values; the caller always gets
//! enough numeric context to render an exact user-facing message.

use crate::{Amount, CampaignId, OwnerId};
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Ledger error types
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Non-positive, non-finite, or malformed fund amount.
    /// Rejected before any lock is taken; never retried.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Requested reservation exceeds the admissible ceiling.
    /// Never retried automatically: the same amount cannot succeed.
    #[error("Insufficient funds: requested {requested}, maximum allowed {max_allowed}")]
    InsufficientFunds {
        requested: Amount,
        max_allowed: Amount,
    },

    /// Version-guarded commit lost the race even after bounded retries
    #[error("Commit conflict after {attempts} attempts")]
    Conflict { attempts: u32 },

    /// The owner lock could not be acquired within the wait bound
    #[error("Account {owner} is busy, try again")]
    Busy { owner: OwnerId },

    /// Campaign budget does not exist or is already released
    #[error("Campaign budget {campaign_id} not found")]
    NotFound { campaign_id: CampaignId },

    /// Internal invariant violation (e.g. releasing more than reserved).
    /// Indicates a prior bug, never retried.
    #[error("Ledger inconsistency: {message}")]
    Inconsistent { message: String },
}

impl LedgerError {
    /// Create an invalid-amount error
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            reason: reason.into(),
        }
    }

    /// Create an inconsistency error
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent {
            message: message.into(),
        }
    }

    /// The exact shortfall for an insufficient-funds failure
    pub fn shortfall(&self) -> Option<Amount> {
        match self {
            Self::InsufficientFunds {
                requested,
                max_allowed,
            } => Some(requested.saturating_sub(*max_allowed)),
            _ => None,
        }
    }

    /// Check if this is a transient error the caller may retry
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Busy { .. })
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Conflict { .. } => "CONFLICT",
            Self::Busy { .. } => "BUSY",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Inconsistent { .. } => "INCONSISTENT",
        }
    }
}
