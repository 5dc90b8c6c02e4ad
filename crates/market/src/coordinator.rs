//! Purchase orchestrator for the buy saga.

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use common::{ItemId, UserId};
use domain::{ItemStateMachine, Money, Transition};
use serde::{Deserialize, Serialize};
use store::{ItemStore, LedgerStore};
use tracing::Instrument;

use crate::compensation::{Compensation, CompensationLog};
use crate::error::{MarketError, Result};
use crate::steps;

/// Default upper bound for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Orchestrator tuning.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// A store read that takes longer fails with `StoreUnavailable`.
    ///
    /// Writes are not abandoned at this bound: a write that outlives it is
    /// logged and awaited, since it may already have committed. Bound writes
    /// in the store itself (see `PostgresMarketStore::connect`).
    pub store_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_store_timeout(store_timeout: Duration) -> Self {
        Self { store_timeout }
    }
}

/// Proof of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub item_id: ItemId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub price: Money,
    /// The buyer's balance right after the debit.
    pub buyer_balance: Money,
    pub purchased_at: DateTime<Utc>,
}

/// Runs the sell operation and the purchase saga against the item and
/// ledger stores.
///
/// The two stores cannot be written in one transaction, so a purchase is a
/// sequence of single-row writes. Each committed write pushes its undo record
/// onto a [`CompensationLog`]; if a later step fails the log is unwound in
/// reverse before the error is returned.
///
/// The orchestrator holds no state of its own between calls.
#[derive(Clone)]
pub struct PurchaseOrchestrator<I, L>
where
    I: ItemStore,
    L: LedgerStore,
{
    items: I,
    ledger: L,
    config: OrchestratorConfig,
}

impl<I, L> PurchaseOrchestrator<I, L>
where
    I: ItemStore,
    L: LedgerStore,
{
    /// Creates an orchestrator with the default configuration.
    pub fn new(items: I, ledger: L) -> Self {
        Self::with_config(items, ledger, OrchestratorConfig::default())
    }

    pub fn with_config(items: I, ledger: L, config: OrchestratorConfig) -> Self {
        Self {
            items,
            ledger,
            config,
        }
    }

    pub fn config(&self) -> OrchestratorConfig {
        self.config
    }

    /// Puts an item on sale (`Initial → OnSale`).
    ///
    /// Only the item's seller may do this. A single conditional write, so
    /// there is nothing to compensate.
    #[tracing::instrument(skip(self))]
    pub async fn sell(&self, actor: UserId, item_id: ItemId) -> Result<Transition> {
        let item = self
            .call(steps::STEP_LOAD_ITEM, self.items.get_item(item_id))
            .await?;

        let transition = ItemStateMachine::sell(actor, &item)?;

        self.write(
            steps::STEP_MARK_ON_SALE,
            self.items
                .conditional_set_status(item_id, transition.from, transition.to),
        )
        .await?;

        metrics::counter!("items_listed_total").increment(1);
        tracing::info!(%item_id, "item put on sale");

        Ok(transition)
    }

    /// Buys an item for `buyer_id`.
    ///
    /// On success the item is `SoldOut` and exactly `price` moved from the
    /// buyer to the seller. On any failure after the item was marked sold,
    /// the buyer is refunded and the item put back on sale before the original
    /// error is returned. If one of those compensations fails as well,
    /// [`MarketError::CompensationFailed`] is returned instead.
    ///
    /// Dropping the returned future between steps can leave a half-applied
    /// purchase. Request handlers should use
    /// [`purchase_to_completion`](Self::purchase_to_completion).
    #[tracing::instrument(skip(self), fields(saga_type = steps::SAGA_TYPE))]
    pub async fn purchase(&self, buyer_id: UserId, item_id: ItemId) -> Result<Receipt> {
        metrics::counter!("purchases_total").increment(1);
        let saga_start = Instant::now();

        let result = self.run_purchase(buyer_id, item_id).await;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("purchase_duration_seconds").record(duration);

        match &result {
            Ok(receipt) => {
                metrics::counter!("purchases_completed").increment(1);
                tracing::info!(
                    seller_id = %receipt.seller_id,
                    price = %receipt.price,
                    duration,
                    "purchase completed"
                );
            }
            Err(e) => {
                metrics::counter!("purchases_failed", "kind" => e.kind()).increment(1);
                if e.is_compensation_failure() {
                    tracing::error!(error = %e, kind = e.kind(), "purchase left stores inconsistent");
                } else {
                    tracing::warn!(error = %e, kind = e.kind(), "purchase failed");
                }
            }
        }

        result
    }

    async fn run_purchase(&self, buyer_id: UserId, item_id: ItemId) -> Result<Receipt> {
        // Steps 1-3 only read, so failing here needs no compensation.
        let item = self
            .call(steps::STEP_LOAD_ITEM, self.items.get_item(item_id))
            .await?;
        let buyer = self
            .call(steps::STEP_LOAD_BUYER, self.ledger.get_user(buyer_id))
            .await?;

        tracing::debug!(step = steps::STEP_VALIDATE, "saga step started");
        let transition = ItemStateMachine::purchase(buyer_id, &item, buyer.balance)?;
        let price = item.price;
        let seller_id = item.seller_id;

        // Step 4. A conflict here means another purchase won the race and
        // nothing has been written.
        self.write(
            steps::STEP_MARK_SOLD_OUT,
            self.items
                .conditional_set_status(item_id, transition.from, transition.to),
        )
        .await?;

        let mut log = CompensationLog::new();
        log.push(Compensation::RevertItem { item_id });

        let buyer_balance = match self
            .write(steps::STEP_DEBIT_BUYER, self.ledger.withdraw(buyer_id, price))
            .await
        {
            Ok(balance) => balance,
            Err(e) => return Err(self.compensate(log, steps::STEP_DEBIT_BUYER, e).await),
        };
        log.push(Compensation::RefundBuyer {
            buyer_id,
            amount: price,
        });

        if let Err(e) = self
            .call(steps::STEP_LOAD_SELLER, self.ledger.get_user(seller_id))
            .await
        {
            return Err(self.compensate(log, steps::STEP_LOAD_SELLER, e).await);
        }

        if let Err(e) = self
            .write(
                steps::STEP_CREDIT_SELLER,
                self.ledger.add_balance(seller_id, price),
            )
            .await
        {
            return Err(self.compensate(log, steps::STEP_CREDIT_SELLER, e).await);
        }

        Ok(Receipt {
            item_id,
            buyer_id,
            seller_id,
            price,
            buyer_balance,
            purchased_at: Utc::now(),
        })
    }

    /// Runs every recorded compensation once, newest first.
    ///
    /// A failing compensation does not stop the others.
    #[tracing::instrument(skip(self, log, original), fields(compensations = log.len()))]
    async fn compensate(
        &self,
        log: CompensationLog,
        failed_step: &'static str,
        original: MarketError,
    ) -> MarketError {
        metrics::counter!("purchase_compensations_total").increment(1);
        tracing::warn!(step = failed_step, error = %original, "saga step failed, compensating");

        let mut first_failure: Option<MarketError> = None;

        for compensation in log.unwind() {
            let result = match compensation {
                Compensation::RevertItem { item_id } => {
                    let revert = ItemStateMachine::revert(item_id);
                    self.write(
                        compensation.name(),
                        self.items.set_status(revert.item_id, revert.to),
                    )
                    .await
                }
                Compensation::RefundBuyer { buyer_id, amount } => self
                    .write(compensation.name(), self.ledger.add_balance(buyer_id, amount))
                    .await
                    .map(|_| ()),
            };

            match result {
                Ok(()) => {
                    tracing::info!(
                        compensation = compensation.name(),
                        "compensation step completed"
                    );
                }
                Err(e) => {
                    metrics::counter!("purchase_compensation_failures_total").increment(1);
                    tracing::error!(
                        compensation = compensation.name(),
                        error = %e,
                        "compensation step failed"
                    );
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                }
            }
        }

        match first_failure {
            None => original,
            Some(compensation) => MarketError::CompensationFailed {
                original: Box::new(original),
                compensation: Box::new(compensation),
            },
        }
    }

    /// Awaits one store read under the configured timeout.
    async fn call<T>(
        &self,
        step: &'static str,
        fut: impl Future<Output = store::Result<T>>,
    ) -> Result<T> {
        tracing::debug!(step, "saga step started");
        match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(result) => result.map_err(MarketError::from),
            Err(_) => Err(MarketError::StoreUnavailable(format!(
                "{step} timed out after {:?}",
                self.config.store_timeout
            ))),
        }
    }

    /// Awaits one store write until it reports its outcome.
    ///
    /// Dropping a write that overran the timeout would leave unknown whether
    /// it committed, and compensation would then run against a guess.
    async fn write<T>(
        &self,
        step: &'static str,
        fut: impl Future<Output = store::Result<T>>,
    ) -> Result<T> {
        tracing::debug!(step, "saga step started");
        let mut fut = std::pin::pin!(fut);
        match tokio::time::timeout(self.config.store_timeout, fut.as_mut()).await {
            Ok(result) => result.map_err(MarketError::from),
            Err(_) => {
                metrics::counter!("purchase_slow_writes_total", "step" => step).increment(1);
                tracing::warn!(
                    step,
                    timeout = ?self.config.store_timeout,
                    "store write overran timeout, awaiting its outcome"
                );
                fut.await.map_err(MarketError::from)
            }
        }
    }
}

impl<I, L> PurchaseOrchestrator<I, L>
where
    I: ItemStore + Clone + 'static,
    L: LedgerStore + Clone + 'static,
{
    /// Runs [`purchase`](Self::purchase) on a detached task.
    ///
    /// If the caller stops waiting, the saga still runs to the end, including
    /// any compensation.
    pub async fn purchase_to_completion(
        &self,
        buyer_id: UserId,
        item_id: ItemId,
    ) -> Result<Receipt> {
        let orchestrator = self.clone();
        let handle = tokio::spawn(
            async move { orchestrator.purchase(buyer_id, item_id).await }.in_current_span(),
        );

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(MarketError::StoreUnavailable(format!(
                "purchase task did not finish: {e}"
            ))),
        }
    }
}
