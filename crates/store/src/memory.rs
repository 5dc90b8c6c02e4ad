use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::{CategoryId, ItemId, UserId};
use domain::{Category, Item, ItemDraft, ItemStatus, Money, User};
use tokio::sync::RwLock;

use crate::{
    ItemQuery, Result, StoreError,
    store::{CategoryStore, ItemStore, LedgerStore},
};

/// Categories every fresh store starts with.
pub const DEFAULT_CATEGORIES: [(i64, &str); 5] = [
    (1, "Fashion"),
    (2, "Furniture"),
    (3, "Food"),
    (4, "Electronics"),
    (5, "Books"),
];

/// Store operations that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetItem,
    ConditionalSetStatus,
    SetStatus,
    GetUser,
    UpdateItem,
    AddBalance,
    Withdraw,
}

#[derive(Debug, Default)]
struct Faults {
    failing: HashSet<StoreOp>,
    failing_for_user: HashSet<(StoreOp, UserId)>,
    latency: Option<Duration>,
    op_delays: HashMap<StoreOp, Duration>,
    reply_delays: HashMap<StoreOp, Duration>,
}

/// In-memory marketplace store.
///
/// Implements all three store contracts over shared maps. Every mutation
/// happens under one write lock, which gives the same single-row atomicity as
/// the PostgreSQL implementation. Faults and latency can be injected to
/// exercise failure paths.
#[derive(Clone, Default)]
pub struct InMemoryMarketStore {
    items: Arc<RwLock<HashMap<ItemId, Item>>>,
    users: Arc<RwLock<HashMap<UserId, User>>>,
    categories: Arc<RwLock<BTreeMap<CategoryId, Category>>>,
    faults: Arc<RwLock<Faults>>,
}

impl InMemoryMarketStore {
    /// Creates an empty store with no categories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with [`DEFAULT_CATEGORIES`].
    pub fn with_default_categories() -> Self {
        let categories = DEFAULT_CATEGORIES
            .iter()
            .map(|(id, name)| (CategoryId::new(*id), Category::new(*id, *name)))
            .collect();
        Self {
            categories: Arc::new(RwLock::new(categories)),
            ..Self::default()
        }
    }

    /// Adds or replaces a category.
    pub async fn add_category(&self, category: Category) {
        self.categories.write().await.insert(category.id, category);
    }

    /// Registers a user with an opening balance.
    pub async fn seed_user(&self, name: &str, balance: Money) -> User {
        let user = User {
            id: UserId::new(),
            name: name.to_string(),
            balance,
        };
        self.users.write().await.insert(user.id, user.clone());
        user
    }

    /// Inserts an item directly in the given status.
    pub async fn seed_item(&self, seller_id: UserId, draft: ItemDraft, status: ItemStatus) -> Item {
        let now = Utc::now();
        let item = Item {
            id: ItemId::new(),
            name: draft.name,
            price: draft.price,
            description: draft.description,
            category_id: draft.category_id,
            seller_id,
            status,
            created_at: now,
            updated_at: now,
        };
        self.items.write().await.insert(item.id, item.clone());
        item
    }

    /// Sum of every user's balance.
    pub async fn total_balance(&self) -> i64 {
        self.users
            .read()
            .await
            .values()
            .map(|u| u.balance.amount())
            .sum()
    }

    /// Returns the number of stored items.
    pub async fn item_count(&self) -> usize {
        self.items.read().await.len()
    }

    /// Makes every call of `op` fail with `Unavailable`.
    pub async fn fail_op(&self, op: StoreOp) {
        self.faults.write().await.failing.insert(op);
    }

    /// Makes calls of `op` that target `user_id` fail with `Unavailable`.
    pub async fn fail_op_for_user(&self, op: StoreOp, user_id: UserId) {
        self.faults
            .write()
            .await
            .failing_for_user
            .insert((op, user_id));
    }

    /// Delays every store call by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.faults.write().await.latency = latency;
    }

    /// Delays `op` before it reads or writes anything.
    pub async fn delay_op(&self, op: StoreOp, delay: Duration) {
        self.faults.write().await.op_delays.insert(op, delay);
    }

    /// Makes `op` apply its write immediately but return only after `delay`,
    /// like a database that committed and then answered late.
    pub async fn delay_reply(&self, op: StoreOp, delay: Duration) {
        self.faults.write().await.reply_delays.insert(op, delay);
    }

    /// Removes all injected faults and latency.
    pub async fn clear_faults(&self) {
        *self.faults.write().await = Faults::default();
    }

    async fn check_fault(&self, op: StoreOp, user_id: Option<UserId>) -> Result<()> {
        let latency = {
            let faults = self.faults.read().await;
            let targeted = user_id.is_some_and(|id| faults.failing_for_user.contains(&(op, id)));
            if faults.failing.contains(&op) || targeted {
                return Err(StoreError::Unavailable(format!("injected fault on {op:?}")));
            }
            let op_delay = faults.op_delays.get(&op).copied();
            faults.latency.into_iter().chain(op_delay).sum::<Duration>()
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }

    async fn reply(&self, op: StoreOp) {
        let delay = self.faults.read().await.reply_delays.get(&op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ItemStore for InMemoryMarketStore {
    async fn get_item(&self, id: ItemId) -> Result<Item> {
        self.check_fault(StoreOp::GetItem, None).await?;
        self.items
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::item_not_found(id))
    }

    async fn conditional_set_status(
        &self,
        id: ItemId,
        expected: ItemStatus,
        next: ItemStatus,
    ) -> Result<()> {
        self.check_fault(StoreOp::ConditionalSetStatus, None).await?;
        {
            let mut items = self.items.write().await;
            let item = items
                .get_mut(&id)
                .ok_or_else(|| StoreError::item_not_found(id))?;

            if item.status != expected {
                return Err(StoreError::Conflict {
                    item_id: id,
                    expected,
                    actual: item.status,
                });
            }
            item.status = next;
            item.updated_at = Utc::now();
        }
        self.reply(StoreOp::ConditionalSetStatus).await;
        Ok(())
    }

    async fn set_status(&self, id: ItemId, next: ItemStatus) -> Result<()> {
        self.check_fault(StoreOp::SetStatus, None).await?;
        {
            let mut items = self.items.write().await;
            let item = items
                .get_mut(&id)
                .ok_or_else(|| StoreError::item_not_found(id))?;
            item.status = next;
            item.updated_at = Utc::now();
        }
        self.reply(StoreOp::SetStatus).await;
        Ok(())
    }

    async fn insert_item(&self, seller_id: UserId, draft: ItemDraft) -> Result<Item> {
        Ok(self.seed_item(seller_id, draft, ItemStatus::Initial).await)
    }

    async fn update_item(&self, id: ItemId, draft: ItemDraft) -> Result<Item> {
        self.check_fault(StoreOp::UpdateItem, None).await?;
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&id)
            .ok_or_else(|| StoreError::item_not_found(id))?;

        if !item.status.can_edit() {
            return Err(StoreError::NotEditable {
                item_id: id,
                status: item.status,
            });
        }
        item.name = draft.name;
        item.price = draft.price;
        item.description = draft.description;
        item.category_id = draft.category_id;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn query_items(&self, query: ItemQuery) -> Result<Vec<Item>> {
        let items = self.items.read().await;
        let mut matched: Vec<_> = items
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then(b.created_at.cmp(&a.created_at))
        });

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait]
impl LedgerStore for InMemoryMarketStore {
    async fn get_user(&self, id: UserId) -> Result<User> {
        self.check_fault(StoreOp::GetUser, Some(id)).await?;
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    async fn create_user(&self, name: &str) -> Result<User> {
        Ok(self.seed_user(name, Money::zero()).await)
    }

    async fn add_balance(&self, id: UserId, delta: Money) -> Result<Money> {
        self.check_fault(StoreOp::AddBalance, Some(id)).await?;
        let balance = {
            let mut users = self.users.write().await;
            let user = users
                .get_mut(&id)
                .ok_or_else(|| StoreError::user_not_found(id))?;
            user.balance = user
                .balance
                .checked_add(delta)
                .ok_or_else(|| StoreError::Unavailable(format!("balance overflow for user {id}")))?;
            user.balance
        };
        self.reply(StoreOp::AddBalance).await;
        Ok(balance)
    }

    async fn withdraw(&self, id: UserId, amount: Money) -> Result<Money> {
        self.check_fault(StoreOp::Withdraw, Some(id)).await?;
        let balance = {
            let mut users = self.users.write().await;
            let user = users
                .get_mut(&id)
                .ok_or_else(|| StoreError::user_not_found(id))?;

            if user.balance < amount {
                return Err(StoreError::InsufficientFunds {
                    user_id: id,
                    balance: user.balance,
                    requested: amount,
                });
            }
            user.balance = user
                .balance
                .checked_sub(amount)
                .ok_or_else(|| StoreError::Unavailable(format!("balance overflow for user {id}")))?;
            user.balance
        };
        self.reply(StoreOp::Withdraw).await;
        Ok(balance)
    }
}

#[async_trait]
impl CategoryStore for InMemoryMarketStore {
    async fn get_category(&self, id: CategoryId) -> Result<Category> {
        self.categories
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::category_not_found(id))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.read().await.values().cloned().collect())
    }
}
