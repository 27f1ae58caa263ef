//! Caller-facing error taxonomy for campaign actions
//!
//! Ledger failures pass through verbatim; metadata validation gets its
//! own kind so the caller can render field-level messages.

use adledger_types::LedgerError;
use thiserror::Error;

/// Result type for campaign operations
pub type Result<T> = std::result::Result<T, CampaignError>;

/// Campaign error types
#[derive(Debug, Clone, Error)]
pub enum CampaignError {
    /// Campaign metadata failed validation (blank name, no keywords,
    /// bid below the floor, zero radius)
    #[error("Invalid campaign: {reason}")]
    InvalidCampaign { reason: String },

    /// A ledger failure, surfaced verbatim
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl CampaignError {
    /// Create a metadata validation error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidCampaign {
            reason: reason.into(),
        }
    }

    /// Check if this is a transient error the caller may retry
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::InvalidCampaign { .. } => false,
            Self::Ledger(err) => err.is_retriable(),
        }
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCampaign { .. } => "INVALID_CAMPAIGN",
            Self::Ledger(err) => err.error_code(),
        }
    }
}
