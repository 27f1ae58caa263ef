//! End-to-end ledger behavior over the in-memory stores

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use adledger_ledger::{LedgerService, MAX_COMMIT_ATTEMPTS};
use adledger_store::{AccountStore, CampaignStore, MemoryAccountStore, MemoryCampaignStore};
use adledger_types::{Amount, BudgetState, CampaignBudget, CampaignId, LedgerError, OwnerId};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn service() -> LedgerService<MemoryAccountStore, MemoryCampaignStore> {
    init_tracing();
    LedgerService::new(MemoryAccountStore::new(), MemoryCampaignStore::new())
}

fn pln(v: f64) -> Amount {
    Amount::from_pln(v).unwrap()
}

#[tokio::test]
async fn create_reserves_funds() -> anyhow::Result<()> {
    let ledger = service();
    let owner = OwnerId::new();

    ledger.deposit(owner, pln(1000.0)).await?;
    let budget = ledger.create_campaign_budget(owner, pln(400.0)).await?;

    assert_eq!(budget.state, BudgetState::Committed);
    assert_eq!(budget.reserved_amount, pln(400.0));
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(600.0));
    ledger.audit_owner(&owner).await?;
    Ok(())
}

#[tokio::test]
async fn create_beyond_available_fails_with_exact_shortfall() -> anyhow::Result<()> {
    let ledger = service();
    let owner = OwnerId::new();

    ledger.deposit(owner, pln(1000.0)).await?;
    ledger.create_campaign_budget(owner, pln(400.0)).await?;

    let err = ledger
        .create_campaign_budget(owner, pln(700.0))
        .await
        .unwrap_err();
    assert_eq!(err.shortfall(), Some(pln(100.0)));

    // Balance untouched by the failed reservation
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(600.0));
    ledger.audit_owner(&owner).await?;
    Ok(())
}

#[tokio::test]
async fn update_ceiling_is_available_plus_own_reservation() -> anyhow::Result<()> {
    let ledger = service();
    let owner = OwnerId::new();

    ledger.deposit(owner, pln(1000.0)).await?;
    let budget = ledger.create_campaign_budget(owner, pln(400.0)).await?;

    // available 600 + own 400 = ceiling 1000
    let updated = ledger
        .update_campaign_budget(budget.campaign_id, pln(900.0))
        .await?;
    assert_eq!(updated.reserved_amount, pln(900.0));
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(100.0));

    let err = ledger
        .update_campaign_budget(budget.campaign_id, pln(1000.01))
        .await
        .unwrap_err();
    assert_eq!(err.shortfall(), Some(pln(0.01)));

    ledger.audit_owner(&owner).await?;
    Ok(())
}

#[tokio::test]
async fn delete_returns_full_reservation() -> anyhow::Result<()> {
    let ledger = service();
    let owner = OwnerId::new();

    ledger.deposit(owner, pln(1000.0)).await?;
    let budget = ledger.create_campaign_budget(owner, pln(400.0)).await?;
    ledger
        .update_campaign_budget(budget.campaign_id, pln(900.0))
        .await?;

    let released = ledger.delete_campaign_budget(budget.campaign_id).await?;
    assert_eq!(released.state, BudgetState::Released);
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(1000.0));
    ledger.audit_owner(&owner).await?;
    Ok(())
}

#[tokio::test]
async fn released_budget_is_gone_for_all_operations() -> anyhow::Result<()> {
    let ledger = service();
    let owner = OwnerId::new();

    ledger.deposit(owner, pln(100.0)).await?;
    let budget = ledger.create_campaign_budget(owner, pln(50.0)).await?;
    ledger.delete_campaign_budget(budget.campaign_id).await?;

    assert!(matches!(
        ledger
            .update_campaign_budget(budget.campaign_id, pln(10.0))
            .await,
        Err(LedgerError::NotFound { .. })
    ));
    assert!(matches!(
        ledger.delete_campaign_budget(budget.campaign_id).await,
        Err(LedgerError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn unknown_campaign_is_not_found() {
    let ledger = service();
    let result = ledger
        .update_campaign_budget(CampaignId::new(), pln(10.0))
        .await;
    assert!(matches!(result, Err(LedgerError::NotFound { .. })));
}

#[tokio::test]
async fn no_delta_update_is_a_no_op_without_version_bump() -> anyhow::Result<()> {
    let ledger = service();
    let owner = OwnerId::new();

    ledger.deposit(owner, pln(1000.0)).await?;
    let budget = ledger.create_campaign_budget(owner, pln(400.0)).await?;

    let unchanged = ledger
        .update_campaign_budget(budget.campaign_id, pln(400.0))
        .await?;
    assert_eq!(unchanged.version, budget.version);
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(600.0));
    Ok(())
}

#[tokio::test]
async fn update_to_zero_keeps_the_record_committed() -> anyhow::Result<()> {
    let ledger = service();
    let owner = OwnerId::new();

    ledger.deposit(owner, pln(1000.0)).await?;
    let budget = ledger.create_campaign_budget(owner, pln(400.0)).await?;

    let zeroed = ledger
        .update_campaign_budget(budget.campaign_id, Amount::zero())
        .await?;
    assert_eq!(zeroed.state, BudgetState::Committed);
    assert_eq!(zeroed.reserved_amount, Amount::zero());
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(1000.0));
    ledger.audit_owner(&owner).await?;

    // Deleting a zero-fund budget still works and releases nothing
    let released = ledger.delete_campaign_budget(budget.campaign_id).await?;
    assert_eq!(released.state, BudgetState::Released);
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(1000.0));
    Ok(())
}

#[tokio::test]
async fn create_then_delete_is_a_balance_round_trip() -> anyhow::Result<()> {
    let ledger = service();
    let owner = OwnerId::new();

    ledger.deposit(owner, pln(123.45)).await?;
    let before = ledger.get_available_balance(&owner).await?;

    let budget = ledger.create_campaign_budget(owner, pln(99.99)).await?;
    ledger.delete_campaign_budget(budget.campaign_id).await?;

    assert_eq!(ledger.get_available_balance(&owner).await?, before);
    ledger.audit_owner(&owner).await?;
    Ok(())
}

#[tokio::test]
async fn deposit_creates_the_account_lazily() -> anyhow::Result<()> {
    let ledger = service();
    let owner = OwnerId::new();

    assert_eq!(ledger.get_available_balance(&owner).await?, Amount::zero());
    let available = ledger.deposit(owner, pln(250.0)).await?;
    assert_eq!(available, pln(250.0));
    Ok(())
}

#[tokio::test]
async fn invalid_amounts_are_rejected_before_any_state_change() -> anyhow::Result<()> {
    let ledger = service();
    let owner = OwnerId::new();

    assert!(matches!(
        ledger.deposit(owner, Amount::zero()).await,
        Err(LedgerError::InvalidAmount { .. })
    ));
    assert!(matches!(
        ledger.create_campaign_budget(owner, pln(-5.0)).await,
        Err(LedgerError::InvalidAmount { .. })
    ));
    assert!(Amount::from_pln(f64::NAN).is_err());

    assert_eq!(ledger.get_available_balance(&owner).await?, Amount::zero());
    Ok(())
}

#[tokio::test]
async fn concurrent_creates_on_one_owner_cannot_overspend() -> anyhow::Result<()> {
    let ledger = Arc::new(service());
    let owner = OwnerId::new();
    ledger.deposit(owner, pln(1000.0)).await?;

    // Two concurrent 600 requests against 1000: exactly one fits
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.create_campaign_budget(owner, pln(600.0)).await })
        })
        .collect();

    let mut successes = 0;
    let mut shortfalls = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => shortfalls.push(err.shortfall().expect("loser must carry a shortfall")),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(shortfalls, vec![pln(200.0)]);
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(400.0));
    ledger.audit_owner(&owner).await?;
    Ok(())
}

#[tokio::test]
async fn many_concurrent_writers_preserve_the_invariant() -> anyhow::Result<()> {
    let ledger = Arc::new(service());
    let owner = OwnerId::new();
    ledger.deposit(owner, pln(1000.0)).await?;

    // 10 writers of 150 each sum to 1500: at most 6 can fit
    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.create_campaign_budget(owner, pln(150.0)).await })
        })
        .collect();

    let mut successes = 0u32;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 6);
    assert_eq!(
        ledger.get_available_balance(&owner).await?,
        pln(1000.0 - 150.0 * 6.0)
    );
    ledger.audit_owner(&owner).await?;
    Ok(())
}

/// Campaign store that loses its version guard a set number of times
/// before behaving normally, to drive the commit protocol's rollback
/// and retry paths.
struct ContendedCampaignStore {
    inner: MemoryCampaignStore,
    failures_left: AtomicU32,
}

impl ContendedCampaignStore {
    fn failing(times: u32) -> Self {
        Self {
            inner: MemoryCampaignStore::new(),
            failures_left: AtomicU32::new(times),
        }
    }
}

#[async_trait::async_trait]
impl CampaignStore for ContendedCampaignStore {
    async fn get(&self, campaign_id: &CampaignId) -> adledger_types::Result<Option<CampaignBudget>> {
        self.inner.get(campaign_id).await
    }

    async fn compare_and_set(
        &self,
        budget: CampaignBudget,
        expected_version: Option<u64>,
    ) -> adledger_types::Result<()> {
        let stole_the_race = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stole_the_race {
            return Err(LedgerError::Conflict { attempts: 1 });
        }
        self.inner.compare_and_set(budget, expected_version).await
    }

    async fn for_owner(&self, owner: &OwnerId) -> adledger_types::Result<Vec<CampaignBudget>> {
        self.inner.for_owner(owner).await
    }
}

#[tokio::test]
async fn lost_budget_write_is_rolled_back_and_retried() -> anyhow::Result<()> {
    init_tracing();
    let ledger = LedgerService::new(MemoryAccountStore::new(), ContendedCampaignStore::failing(1));
    let owner = OwnerId::new();
    ledger.deposit(owner, pln(1000.0)).await?;

    // The first budget write loses its guard; the account delta must be
    // rolled back before the retry, which then commits cleanly.
    let budget = ledger.create_campaign_budget(owner, pln(400.0)).await?;
    assert_eq!(budget.state, BudgetState::Committed);
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(600.0));
    ledger.audit_owner(&owner).await?;
    Ok(())
}

#[tokio::test]
async fn exhausted_retries_surface_conflict_with_balance_restored() -> anyhow::Result<()> {
    init_tracing();
    let ledger = LedgerService::new(
        MemoryAccountStore::new(),
        ContendedCampaignStore::failing(MAX_COMMIT_ATTEMPTS),
    );
    let owner = OwnerId::new();
    ledger.deposit(owner, pln(1000.0)).await?;

    let err = ledger
        .create_campaign_budget(owner, pln(400.0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Conflict {
            attempts: MAX_COMMIT_ATTEMPTS
        }
    ));
    assert!(err.is_retriable());

    // Every attempt's account delta was compensated; nothing stays reserved
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(1000.0));
    ledger.audit_owner(&owner).await?;
    Ok(())
}

#[tokio::test]
async fn audit_surfaces_overflow_instead_of_saturating() -> anyhow::Result<()> {
    init_tracing();
    let campaigns = MemoryCampaignStore::new();
    let owner = OwnerId::new();

    // Two live reservations whose sum exceeds i128: the aggregate check
    // must fail loudly rather than clamp and report a false mismatch.
    for _ in 0..2 {
        let mut budget =
            CampaignBudget::proposed(CampaignId::new(), owner, Amount::from_grosz(i128::MAX));
        budget.commit();
        campaigns.compare_and_set(budget, None).await?;
    }

    let ledger = LedgerService::new(MemoryAccountStore::new(), campaigns);
    assert!(matches!(
        ledger.audit_owner(&owner).await,
        Err(LedgerError::InvalidAmount { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn deleting_a_zeroed_budget_leaves_the_account_untouched() -> anyhow::Result<()> {
    init_tracing();
    let accounts = MemoryAccountStore::new();
    let ledger = LedgerService::new(accounts.clone(), MemoryCampaignStore::new());
    let owner = OwnerId::new();

    ledger.deposit(owner, pln(1000.0)).await?;
    let budget = ledger.create_campaign_budget(owner, pln(400.0)).await?;
    ledger
        .update_campaign_budget(budget.campaign_id, Amount::zero())
        .await?;

    let version_before = accounts.get(&owner).await?.unwrap().version;
    let released = ledger.delete_campaign_budget(budget.campaign_id).await?;
    assert_eq!(released.state, BudgetState::Released);

    // Nothing to return, so the account record was not rewritten
    let account = accounts.get(&owner).await?.unwrap();
    assert_eq!(account.version, version_before);
    assert_eq!(ledger.get_available_balance(&owner).await?, pln(1000.0));
    ledger.audit_owner(&owner).await?;
    Ok(())
}

#[tokio::test]
async fn owners_are_isolated_from_each_other() -> anyhow::Result<()> {
    let ledger = service();
    let a = OwnerId::new();
    let b = OwnerId::new();

    ledger.deposit(a, pln(100.0)).await?;
    ledger.deposit(b, pln(500.0)).await?;
    ledger.create_campaign_budget(b, pln(300.0)).await?;

    assert_eq!(ledger.get_available_balance(&a).await?, pln(100.0));
    assert_eq!(ledger.get_available_balance(&b).await?, pln(200.0));
    ledger.audit_owner(&a).await?;
    ledger.audit_owner(&b).await?;
    Ok(())
}
