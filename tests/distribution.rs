//! Balance distribution scenarios against a mock ledger.

mod common;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use common::{MockLedger, ReceiptMode};
use txload::{Account, AccountPool, DistributionConfig, Distributor};

fn distribution_config() -> DistributionConfig {
    DistributionConfig {
        amount: U256::from(1_000_000u64),
        gas_limit: 21_000,
        gas_price: 20_000_000_000,
        batch_size: 4,
        receipt_timeout: Duration::from_millis(20),
    }
}

fn source() -> Account {
    Account::generate()
}

#[tokio::test]
async fn insufficient_funds_sends_nothing() {
    let ledger = Arc::new(MockLedger::new().with_balance(U256::from(1u64)));
    let distributor = Distributor::new(ledger.clone(), distribution_config());
    let targets = AccountPool::create(10);

    let err = distributor.distribute(&source(), targets.accounts()).await.unwrap_err();
    assert!(matches!(err, txload::Error::InsufficientFunds { .. }));
    assert_eq!(ledger.submissions(), 0);
}

#[tokio::test]
async fn funds_every_target_in_batches() {
    let ledger = Arc::new(MockLedger::new());
    let distributor = Distributor::new(ledger.clone(), distribution_config());
    let targets = AccountPool::create(10);
    let source = source();

    let report = distributor.distribute(&source, targets.accounts()).await.unwrap();

    assert_eq!(report.funded, 10);
    assert_eq!(report.failed, 0);
    assert_eq!(ledger.submissions(), 10);

    // The source's nonce sequence is strictly increasing with no gaps.
    assert_eq!(ledger.nonces_for(source.address), (0..10).collect::<Vec<u64>>());
}

#[tokio::test]
async fn submission_failures_do_not_abort_and_still_consume_nonces() {
    let ledger = Arc::new(MockLedger::new().with_fail_every(3));
    let distributor = Distributor::new(ledger.clone(), distribution_config());
    let targets = AccountPool::create(12);
    let source = source();

    let report = distributor.distribute(&source, targets.accounts()).await.unwrap();

    // Attempts 3, 6, 9, 12 were rejected; the rest confirmed.
    assert_eq!(report.failed, 4);
    assert_eq!(report.funded, 8);
    assert_eq!(ledger.submissions(), 12);

    // Rejected attempts burned their nonce slot rather than leaving a gap.
    assert_eq!(ledger.nonces_for(source.address), (0..12).collect::<Vec<u64>>());
}

#[tokio::test]
async fn unsuccessful_receipts_count_as_failures() {
    let ledger = Arc::new(MockLedger::new().with_receipt_mode(ReceiptMode::Unsuccessful));
    let distributor = Distributor::new(ledger.clone(), distribution_config());
    let targets = AccountPool::create(6);

    let report = distributor.distribute(&source(), targets.accounts()).await.unwrap();

    assert_eq!(report.funded, 0);
    assert_eq!(report.failed, 6);
    assert_eq!(ledger.submissions(), 6);
}

#[tokio::test]
async fn receipt_timeouts_count_as_failures_without_aborting() {
    let ledger = Arc::new(MockLedger::new().with_receipt_mode(ReceiptMode::Timeout));
    let distributor = Distributor::new(ledger.clone(), distribution_config());
    let targets = AccountPool::create(6);

    let report = distributor.distribute(&source(), targets.accounts()).await.unwrap();

    assert_eq!(report.funded, 0);
    assert_eq!(report.failed, 6);
    assert_eq!(ledger.submissions(), 6);
}

#[tokio::test]
async fn verify_funding_counts_balances_against_the_floor() {
    let ledger = Arc::new(MockLedger::new().with_balance(U256::from(5u64)));
    let distributor = Distributor::new(ledger.clone(), distribution_config());
    let targets = AccountPool::create(4);

    let (ready, underfunded) =
        distributor.verify_funding(targets.accounts(), U256::from(5u64)).await.unwrap();
    assert_eq!((ready, underfunded), (4, 0));

    let (ready, underfunded) =
        distributor.verify_funding(targets.accounts(), U256::from(6u64)).await.unwrap();
    assert_eq!((ready, underfunded), (0, 4));
}
