//! AdLedger Types - Canonical domain types for the budget ledger
//!
//! This crate contains all foundational types for AdLedger with zero
//! dependencies on other adledger crates:
//!
//! - Identity types (OwnerId, CampaignId, ProductId)
//! - Fixed-point money amounts (grosz-denominated, checked arithmetic)
//! - The per-owner [`BalanceAccount`] aggregate
//! - The per-campaign [`CampaignBudget`] escrow record
//! - The typed error taxonomy for all ledger failures
//!
//! # Architectural Invariants
//!
//! 1. Committed funds never exceed the account balance
//! 2. Availability is derived, never stored
//! 3. Accounts and budgets are mutated only through the ledger service
//! 4. Failure is explicit: typed values, never control-flow panics

pub mod account;
pub mod amount;
pub mod campaign;
pub mod error;
pub mod identity;

pub use account::*;
pub use amount::*;
pub use campaign::*;
pub use error::*;
pub use identity::*;
