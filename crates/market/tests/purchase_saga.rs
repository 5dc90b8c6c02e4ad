//! Integration tests for the purchase saga.

use std::time::Duration;

use common::{CategoryId, ItemId, UserId};
use domain::{Item, ItemDraft, ItemStatus, Money, User};
use market::{MarketError, OrchestratorConfig, PurchaseOrchestrator};
use store::{InMemoryMarketStore, ItemStore, LedgerStore, StoreOp};

type TestOrchestrator = PurchaseOrchestrator<InMemoryMarketStore, InMemoryMarketStore>;

struct TestHarness {
    orchestrator: TestOrchestrator,
    store: InMemoryMarketStore,
    seller: User,
    buyer: User,
    item: Item,
}

impl TestHarness {
    /// Price 500, seller balance 1000, buyer balance 700, item on sale.
    async fn new() -> Self {
        Self::with_config(OrchestratorConfig::default()).await
    }

    async fn with_config(config: OrchestratorConfig) -> Self {
        let store = InMemoryMarketStore::with_default_categories();
        let orchestrator = PurchaseOrchestrator::with_config(store.clone(), store.clone(), config);

        let seller = store.seed_user("seller", Money::new(1000)).await;
        let buyer = store.seed_user("buyer", Money::new(700)).await;
        let item = store
            .seed_item(seller.id, draft("Walnut desk", 500), ItemStatus::OnSale)
            .await;

        Self {
            orchestrator,
            store,
            seller,
            buyer,
            item,
        }
    }

    async fn balance(&self, user_id: UserId) -> Money {
        self.store.get_user(user_id).await.unwrap().balance
    }

    async fn status(&self, item_id: ItemId) -> ItemStatus {
        self.store.get_item(item_id).await.unwrap().status
    }

    /// Asserts the pre-purchase state is fully restored.
    async fn assert_untouched(&self) {
        self.store.clear_faults().await;
        assert_eq!(self.status(self.item.id).await, ItemStatus::OnSale);
        assert_eq!(self.balance(self.buyer.id).await, Money::new(700));
        assert_eq!(self.balance(self.seller.id).await, Money::new(1000));
        assert_eq!(self.store.total_balance().await, 1700);
    }
}

fn draft(name: &str, price: i64) -> ItemDraft {
    ItemDraft::new(name, Money::new(price), "solid wood", CategoryId::new(2))
}

#[tokio::test]
async fn test_purchase_moves_money_and_marks_sold() {
    let h = TestHarness::new().await;

    let receipt = h
        .orchestrator
        .purchase(h.buyer.id, h.item.id)
        .await
        .unwrap();
    assert_eq!(receipt.buyer_id, h.buyer.id);
    assert_eq!(receipt.seller_id, h.seller.id);
    assert_eq!(receipt.price, Money::new(500));

    assert_eq!(h.balance(h.buyer.id).await, Money::new(200));
    assert_eq!(h.balance(h.seller.id).await, Money::new(1500));
    assert_eq!(h.status(h.item.id).await, ItemStatus::SoldOut);
    assert_eq!(h.store.total_balance().await, 1700);

    // A second buyer finds the item already sold.
    let other = h.store.seed_user("other", Money::new(10_000)).await;
    let result = h.orchestrator.purchase(other.id, h.item.id).await;
    assert!(matches!(result, Err(MarketError::InvalidState(_))));
    assert_eq!(h.balance(other.id).await, Money::new(10_000));
}

#[tokio::test]
async fn test_sell_then_purchase() {
    let h = TestHarness::new().await;
    let fresh = h
        .store
        .seed_item(h.seller.id, draft("Lamp", 100), ItemStatus::Initial)
        .await;

    let result = h.orchestrator.purchase(h.buyer.id, fresh.id).await;
    assert!(matches!(result, Err(MarketError::InvalidState(_))));

    h.orchestrator.sell(h.seller.id, fresh.id).await.unwrap();
    h.orchestrator.purchase(h.buyer.id, fresh.id).await.unwrap();

    assert_eq!(h.status(fresh.id).await, ItemStatus::SoldOut);
    assert_eq!(h.balance(h.buyer.id).await, Money::new(600));
}

#[tokio::test]
async fn test_seller_cannot_buy_own_item() {
    let h = TestHarness::new().await;

    let result = h.orchestrator.purchase(h.seller.id, h.item.id).await;
    assert!(matches!(result, Err(MarketError::Forbidden(_))));
    h.assert_untouched().await;
}

#[tokio::test]
async fn test_non_seller_cannot_sell() {
    let h = TestHarness::new().await;
    let fresh = h
        .store
        .seed_item(h.seller.id, draft("Lamp", 100), ItemStatus::Initial)
        .await;

    let result = h.orchestrator.sell(h.buyer.id, fresh.id).await;
    assert!(matches!(result, Err(MarketError::Forbidden(_))));
    assert_eq!(h.status(fresh.id).await, ItemStatus::Initial);
}

#[tokio::test]
async fn test_insufficient_funds_writes_nothing() {
    let h = TestHarness::new().await;
    let poor = h.store.seed_user("poor", Money::new(499)).await;

    let result = h.orchestrator.purchase(poor.id, h.item.id).await;
    assert!(matches!(result, Err(MarketError::InsufficientFunds(_))));
    assert_eq!(h.balance(poor.id).await, Money::new(499));
    assert_eq!(h.status(h.item.id).await, ItemStatus::OnSale);
}

#[tokio::test]
async fn test_missing_item_is_not_found() {
    let h = TestHarness::new().await;

    let result = h.orchestrator.purchase(h.buyer.id, ItemId::new()).await;
    assert!(matches!(result, Err(MarketError::NotFound { entity: "Item", .. })));
    h.assert_untouched().await;
}

#[tokio::test]
async fn test_debit_failure_reverts_item() {
    let h = TestHarness::new().await;
    h.store.fail_op(StoreOp::Withdraw).await;

    let result = h.orchestrator.purchase(h.buyer.id, h.item.id).await;
    assert!(matches!(result, Err(MarketError::StoreUnavailable(_))));
    h.assert_untouched().await;
}

#[tokio::test]
async fn test_seller_lookup_failure_restores_state() {
    let h = TestHarness::new().await;
    h.store
        .fail_op_for_user(StoreOp::GetUser, h.seller.id)
        .await;

    let result = h.orchestrator.purchase(h.buyer.id, h.item.id).await;

    // The original error, not a compensation failure.
    assert!(matches!(result, Err(MarketError::StoreUnavailable(_))));
    h.assert_untouched().await;
}

#[tokio::test]
async fn test_missing_seller_refunds_buyer() {
    let h = TestHarness::new().await;
    let orphan = h
        .store
        .seed_item(UserId::new(), draft("Orphan chair", 300), ItemStatus::OnSale)
        .await;

    let result = h.orchestrator.purchase(h.buyer.id, orphan.id).await;
    assert!(matches!(result, Err(MarketError::NotFound { entity: "User", .. })));
    assert_eq!(h.status(orphan.id).await, ItemStatus::OnSale);
    assert_eq!(h.balance(h.buyer.id).await, Money::new(700));
}

#[tokio::test]
async fn test_credit_failure_refunds_buyer_and_reverts_item() {
    let h = TestHarness::new().await;
    h.store
        .fail_op_for_user(StoreOp::AddBalance, h.seller.id)
        .await;

    let result = h.orchestrator.purchase(h.buyer.id, h.item.id).await;
    assert!(matches!(result, Err(MarketError::StoreUnavailable(_))));
    h.assert_untouched().await;
}

#[tokio::test]
async fn test_failed_refund_is_compensation_failed() {
    let h = TestHarness::new().await;
    // Crediting the seller fails, and so does refunding the buyer.
    h.store.fail_op(StoreOp::AddBalance).await;

    let result = h.orchestrator.purchase(h.buyer.id, h.item.id).await;
    let err = result.unwrap_err();
    assert_eq!(err.kind(), "compensation_failed");
    match err {
        MarketError::CompensationFailed {
            original,
            compensation,
        } => {
            assert_eq!(original.kind(), "store_unavailable");
            assert_eq!(compensation.kind(), "store_unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }

    h.store.clear_faults().await;
    // The revert still ran, the refund did not: a detectable imbalance.
    assert_eq!(h.status(h.item.id).await, ItemStatus::OnSale);
    assert_eq!(h.balance(h.buyer.id).await, Money::new(200));
    assert_eq!(h.balance(h.seller.id).await, Money::new(1000));
    assert_eq!(h.store.total_balance().await, 1200);
}

#[tokio::test]
async fn test_failed_revert_is_compensation_failed() {
    let h = TestHarness::new().await;
    h.store.fail_op(StoreOp::Withdraw).await;
    h.store.fail_op(StoreOp::SetStatus).await;

    let result = h.orchestrator.purchase(h.buyer.id, h.item.id).await;
    assert!(matches!(result, Err(MarketError::CompensationFailed { .. })));

    h.store.clear_faults().await;
    assert_eq!(h.status(h.item.id).await, ItemStatus::SoldOut);
    assert_eq!(h.balance(h.buyer.id).await, Money::new(700));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_have_one_winner() {
    let h = TestHarness::new().await;
    let rival = h.store.seed_user("rival", Money::new(700)).await;

    let first = {
        let orchestrator = h.orchestrator.clone();
        let (buyer, item) = (h.buyer.id, h.item.id);
        tokio::spawn(async move { orchestrator.purchase(buyer, item).await })
    };
    let second = {
        let orchestrator = h.orchestrator.clone();
        let item = h.item.id;
        tokio::spawn(async move { orchestrator.purchase(rival.id, item).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);

    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, MarketError::Conflict(_) | MarketError::InvalidState(_)),
                "unexpected error: {e}"
            );
        }
    }

    assert_eq!(h.status(h.item.id).await, ItemStatus::SoldOut);
    assert_eq!(h.balance(h.seller.id).await, Money::new(1500));
    assert_eq!(h.store.total_balance().await, 2400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_buyer_cannot_overdraw_with_parallel_purchases() {
    let h = TestHarness::new().await;
    let second_item = h
        .store
        .seed_item(h.seller.id, draft("Bookshelf", 500), ItemStatus::OnSale)
        .await;

    let mut handles = Vec::new();
    for item_id in [h.item.id, second_item.id] {
        let orchestrator = h.orchestrator.clone();
        let buyer = h.buyer.id;
        handles.push(tokio::spawn(async move {
            orchestrator.purchase(buyer, item_id).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e.kind(), "insufficient_funds"),
        }
    }
    assert_eq!(successes, 1);

    assert_eq!(h.balance(h.buyer.id).await, Money::new(200));
    assert_eq!(h.balance(h.seller.id).await, Money::new(1500));

    let statuses = [h.status(h.item.id).await, h.status(second_item.id).await];
    assert_eq!(
        statuses.iter().filter(|s| **s == ItemStatus::SoldOut).count(),
        1
    );
    assert_eq!(
        statuses.iter().filter(|s| **s == ItemStatus::OnSale).count(),
        1
    );
}

#[tokio::test]
async fn test_store_timeout_triggers_failure() {
    let h =
        TestHarness::with_config(OrchestratorConfig::with_store_timeout(Duration::from_millis(20)))
            .await;
    h.store.set_latency(Some(Duration::from_millis(200))).await;

    let result = h.orchestrator.purchase(h.buyer.id, h.item.id).await;
    assert!(matches!(result, Err(MarketError::StoreUnavailable(_))));
    h.assert_untouched().await;
}

#[tokio::test]
async fn test_late_debit_reply_is_not_mistaken_for_failure() {
    let h =
        TestHarness::with_config(OrchestratorConfig::with_store_timeout(Duration::from_millis(20)))
            .await;
    // The debit commits at once but answers long after the timeout.
    h.store
        .delay_reply(StoreOp::Withdraw, Duration::from_millis(200))
        .await;

    let receipt = h.orchestrator.purchase(h.buyer.id, h.item.id).await.unwrap();

    assert_eq!(receipt.buyer_balance, Money::new(200));
    assert_eq!(h.status(h.item.id).await, ItemStatus::SoldOut);
    assert_eq!(h.balance(h.buyer.id).await, Money::new(200));
    assert_eq!(h.balance(h.seller.id).await, Money::new(1500));
    assert_eq!(h.store.total_balance().await, 1700);
}

#[tokio::test]
async fn test_late_credit_reply_is_not_refunded() {
    let h =
        TestHarness::with_config(OrchestratorConfig::with_store_timeout(Duration::from_millis(20)))
            .await;
    h.store
        .delay_reply(StoreOp::AddBalance, Duration::from_millis(200))
        .await;

    h.orchestrator.purchase(h.buyer.id, h.item.id).await.unwrap();

    assert_eq!(h.status(h.item.id).await, ItemStatus::SoldOut);
    assert_eq!(h.balance(h.buyer.id).await, Money::new(200));
    assert_eq!(h.balance(h.seller.id).await, Money::new(1500));
    assert_eq!(h.store.total_balance().await, 1700);
}

#[tokio::test]
async fn test_late_debit_is_refunded_when_credit_fails() {
    let h =
        TestHarness::with_config(OrchestratorConfig::with_store_timeout(Duration::from_millis(20)))
            .await;
    h.store
        .delay_reply(StoreOp::Withdraw, Duration::from_millis(200))
        .await;
    h.store
        .fail_op_for_user(StoreOp::AddBalance, h.seller.id)
        .await;

    let result = h.orchestrator.purchase(h.buyer.id, h.item.id).await;
    assert!(matches!(result, Err(MarketError::StoreUnavailable(_))));
    h.assert_untouched().await;
}

#[tokio::test]
async fn test_abandoned_request_still_completes_saga() {
    let h = TestHarness::new().await;
    h.store.set_latency(Some(Duration::from_millis(20))).await;

    // The caller gives up long before the six store calls finish.
    let abandoned = tokio::time::timeout(
        Duration::from_millis(30),
        h.orchestrator.purchase_to_completion(h.buyer.id, h.item.id),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(500)).await;
    h.store.clear_faults().await;

    assert_eq!(h.status(h.item.id).await, ItemStatus::SoldOut);
    assert_eq!(h.balance(h.buyer.id).await, Money::new(200));
    assert_eq!(h.balance(h.seller.id).await, Money::new(1500));
}

#[tokio::test]
async fn test_abandoned_request_still_compensates() {
    let h = TestHarness::new().await;
    h.store.set_latency(Some(Duration::from_millis(20))).await;
    h.store
        .fail_op_for_user(StoreOp::AddBalance, h.seller.id)
        .await;

    let abandoned = tokio::time::timeout(
        Duration::from_millis(30),
        h.orchestrator.purchase_to_completion(h.buyer.id, h.item.id),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(500)).await;
    h.assert_untouched().await;
}

#[tokio::test]
async fn test_purchase_to_completion_returns_receipt() {
    let h = TestHarness::new().await;

    let receipt = h
        .orchestrator
        .purchase_to_completion(h.buyer.id, h.item.id)
        .await
        .unwrap();
    assert_eq!(receipt.buyer_balance, Money::new(200));
    assert_eq!(h.status(h.item.id).await, ItemStatus::SoldOut);
}

#[tokio::test]
async fn test_balance_conservation_over_many_purchases() {
    let h = TestHarness::new().await;
    let rich = h.store.seed_user("rich", Money::new(5_000)).await;

    let mut items = Vec::new();
    for i in 0..5 {
        items.push(
            h.store
                .seed_item(h.seller.id, draft(&format!("Chair {i}"), 100 * (i + 1)), ItemStatus::OnSale)
                .await,
        );
    }
    let before = h.store.total_balance().await;

    // Fail every other purchase at the credit step.
    for (i, item) in items.iter().enumerate() {
        if i % 2 == 1 {
            h.store
                .fail_op_for_user(StoreOp::AddBalance, h.seller.id)
                .await;
        }
        let result = h.orchestrator.purchase(rich.id, item.id).await;
        assert_eq!(result.is_ok(), i % 2 == 0);
        h.store.clear_faults().await;
        assert_eq!(h.store.total_balance().await, before);
    }

    // 100 + 300 + 500 were bought.
    assert_eq!(h.balance(rich.id).await, Money::new(4_100));
    assert_eq!(h.balance(h.seller.id).await, Money::new(1_900));
}
