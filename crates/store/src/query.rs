use common::{CategoryId, UserId};
use domain::{Item, ItemStatus};

/// Builder for item listing queries.
///
/// Results are always ordered by `updated_at`, newest first.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// Filter by status.
    pub status: Option<ItemStatus>,

    /// Filter by seller.
    pub seller_id: Option<UserId>,

    /// Filter by category.
    pub category_id: Option<CategoryId>,

    /// Case-insensitive substring match on the item name.
    pub name_contains: Option<String>,

    /// Maximum number of items to return.
    pub limit: Option<usize>,

    /// Number of items to skip.
    pub offset: Option<usize>,
}

impl ItemQuery {
    /// Creates a new empty query matching every item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for items currently on sale.
    pub fn on_sale() -> Self {
        Self::new().status(ItemStatus::OnSale)
    }

    /// Creates a query for items listed by a seller.
    pub fn for_seller(seller_id: UserId) -> Self {
        Self {
            seller_id: Some(seller_id),
            ..Default::default()
        }
    }

    /// Creates a name search query.
    pub fn search(name: impl Into<String>) -> Self {
        Self {
            name_contains: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn seller_id(mut self, seller_id: UserId) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn category_id(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if `item` passes every filter of this query.
    ///
    /// Pagination is not considered.
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(status) = self.status
            && item.status != status
        {
            return false;
        }
        if let Some(seller_id) = self.seller_id
            && item.seller_id != seller_id
        {
            return false;
        }
        if let Some(category_id) = self.category_id
            && item.category_id != category_id
        {
            return false;
        }
        if let Some(ref needle) = self.name_contains
            && !item.name.to_lowercase().contains(&needle.to_lowercase())
        {
            return false;
        }
        true
    }
}
