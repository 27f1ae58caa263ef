//! AdLedger Ledger - the budget/escrow reconciliation core
//!
//! The ledger keeps a seller's spendable balance consistent with the funds
//! committed to advertising campaigns across creation, editing, deletion,
//! and release.
//!
//! # Invariants
//!
//! 1. `available = total - reserved` never goes negative
//! 2. The per-owner reserved aggregate always equals the sum of live
//!    campaign reservations
//! 3. Account and budget records change together or not at all
//! 4. All mutations for one owner are serialized; different owners never
//!    contend
//!
//! The classic hazard this crate exists to close: two concurrent writers
//! both reading a stale available balance, both passing validation, and
//! collectively overspending the account. Every mutation therefore
//! re-reads and re-validates inside the owner's critical section.

pub mod lock;
pub mod service;
pub mod validate;

pub use lock::{OwnerLocks, DEFAULT_LOCK_WAIT};
pub use service::{LedgerService, MAX_COMMIT_ATTEMPTS};
pub use validate::ConsistencyValidator;
