//! Item listings: creation, editing and browsing.

use common::{ItemId, UserId};
use domain::{Category, DomainError, Item, ItemDraft};
use serde::{Deserialize, Serialize};
use store::{CategoryStore, ItemQuery, ItemStore, LedgerStore};

use crate::error::{MarketError, Result};

/// Pagination for listing queries.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Page {
    fn apply(self, mut query: ItemQuery) -> ItemQuery {
        query.limit = self.limit;
        query.offset = self.offset;
        query
    }
}

/// An item together with its category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemDetails {
    #[serde(flatten)]
    pub item: Item,
    pub category_name: String,
}

/// Manages item records outside the purchase flow.
///
/// Status changes are never made here; they belong to the
/// [`PurchaseOrchestrator`](crate::PurchaseOrchestrator).
#[derive(Clone)]
pub struct ListingService<S>
where
    S: ItemStore + CategoryStore + LedgerStore,
{
    store: S,
}

impl<S> ListingService<S>
where
    S: ItemStore + CategoryStore + LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates an item in `Initial` status owned by `seller_id`.
    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_item(&self, seller_id: UserId, draft: ItemDraft) -> Result<Item> {
        draft.validate()?;
        self.store.get_user(seller_id).await?;
        self.ensure_category(&draft).await?;

        let item = self.store.insert_item(seller_id, draft).await?;
        tracing::info!(item_id = %item.id, "item created");
        Ok(item)
    }

    /// Replaces an item's details. Only the seller may edit, and never once
    /// the item is sold.
    ///
    /// The store repeats the status check atomically with the write, so a
    /// purchase landing in between still wins.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update_item(
        &self,
        actor: UserId,
        item_id: ItemId,
        draft: ItemDraft,
    ) -> Result<Item> {
        draft.validate()?;

        let item = self.store.get_item(item_id).await?;
        if !item.is_sold_by(actor) {
            return Err(DomainError::Forbidden {
                actor,
                item_id,
                action: "update",
            }
            .into());
        }
        if !item.status.can_edit() {
            return Err(DomainError::InvalidState {
                item_id,
                current: item.status,
                action: "update",
            }
            .into());
        }
        self.ensure_category(&draft).await?;

        let updated = self.store.update_item(item_id, draft).await?;
        tracing::info!("item updated");
        Ok(updated)
    }

    /// Loads an item with its category name.
    pub async fn get_item(&self, item_id: ItemId) -> Result<ItemDetails> {
        let item = self.store.get_item(item_id).await?;
        let category = self.store.get_category(item.category_id).await?;
        Ok(ItemDetails {
            item,
            category_name: category.name,
        })
    }

    /// Items currently on sale, most recently updated first.
    pub async fn on_sale_items(&self, page: Page) -> Result<Vec<Item>> {
        Ok(self
            .store
            .query_items(page.apply(ItemQuery::on_sale()))
            .await?)
    }

    /// Every item listed by `seller_id`, in any status.
    pub async fn items_by_seller(&self, seller_id: UserId, page: Page) -> Result<Vec<Item>> {
        Ok(self
            .store
            .query_items(page.apply(ItemQuery::for_seller(seller_id)))
            .await?)
    }

    /// Case-insensitive name search across all items.
    pub async fn search(&self, name: &str, page: Page) -> Result<Vec<Item>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MarketError::validation("search term must not be empty"));
        }
        Ok(self
            .store
            .query_items(page.apply(ItemQuery::search(name)))
            .await?)
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    async fn ensure_category(&self, draft: &ItemDraft) -> Result<()> {
        match self.store.get_category(draft.category_id).await {
            Ok(_) => Ok(()),
            Err(store::StoreError::NotFound { .. }) => Err(MarketError::validation(format!(
                "unknown category {}",
                draft.category_id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
