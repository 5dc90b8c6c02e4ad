use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use common::{CategoryId, ItemId, UserId};
use domain::{Category, Item, ItemDraft, ItemStatus, Money, User};
use sqlx::{
    PgPool, Row,
    postgres::{PgConnectOptions, PgPoolOptions, PgRow},
};
use uuid::Uuid;

use crate::{
    ItemQuery, Result, StoreError,
    store::{CategoryStore, ItemStore, LedgerStore},
};

const ITEM_COLUMNS: &str =
    "id, name, price, description, category_id, seller_id, status, created_at, updated_at";

/// PostgreSQL-backed marketplace store.
///
/// Status changes and balance changes are each a single `UPDATE` statement,
/// so every operation is atomic on its own row without an explicit transaction.
#[derive(Clone)]
pub struct PostgresMarketStore {
    pool: PgPool,
}

impl PostgresMarketStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    ///
    /// Every session gets `statement_timeout`, so a slow statement is cancelled
    /// and rolled back by the server instead of committing after the caller
    /// stopped waiting.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        statement_timeout: Duration,
    ) -> Result<Self> {
        let options = PgConnectOptions::from_str(database_url)?.options([(
            "statement_timeout",
            format!("{}ms", statement_timeout.as_millis()),
        )]);
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    fn row_to_item(row: PgRow) -> Result<Item> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<ItemStatus>()
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))?;

        Ok(Item {
            id: ItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            price: Money::new(row.try_get("price")?),
            description: row.try_get("description")?,
            category_id: CategoryId::new(row.try_get("category_id")?),
            seller_id: UserId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            balance: Money::new(row.try_get("balance")?),
        })
    }

    async fn current_status(&self, id: ItemId) -> Result<Option<ItemStatus>> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM items WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        status
            .map(|s| {
                s.parse::<ItemStatus>()
                    .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
            })
            .transpose()
    }
}

/// Converts a page bound to the `BIGINT` Postgres expects.
fn sql_bound(name: &str, value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| StoreError::InvalidQuery(format!("{name} {value} is too large")))
}

#[async_trait]
impl ItemStore for PostgresMarketStore {
    async fn get_item(&self, id: ItemId) -> Result<Item> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::item_not_found(id))?;

        Self::row_to_item(row)
    }

    async fn conditional_set_status(
        &self,
        id: ItemId,
        expected: ItemStatus,
        next: ItemStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing matched: tell a lost race apart from a missing row.
        match self.current_status(id).await? {
            Some(actual) => {
                tracing::debug!(%id, %expected, %actual, "Conditional status write lost");
                Err(StoreError::Conflict {
                    item_id: id,
                    expected,
                    actual,
                })
            }
            None => Err(StoreError::item_not_found(id)),
        }
    }

    async fn set_status(&self, id: ItemId, next: ItemStatus) -> Result<()> {
        let result = sqlx::query("UPDATE items SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id.as_uuid())
            .bind(next.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::item_not_found(id));
        }
        Ok(())
    }

    async fn insert_item(&self, seller_id: UserId, draft: ItemDraft) -> Result<Item> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO items (id, name, price, description, category_id, seller_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(ItemId::new().as_uuid())
        .bind(&draft.name)
        .bind(draft.price.amount())
        .bind(&draft.description)
        .bind(draft.category_id.as_i64())
        .bind(seller_id.as_uuid())
        .bind(ItemStatus::Initial.as_str())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_item(row)
    }

    async fn update_item(&self, id: ItemId, draft: ItemDraft) -> Result<Item> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE items
            SET name = $2, price = $3, description = $4, category_id = $5, updated_at = now()
            WHERE id = $1 AND status <> $6
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&draft.name)
        .bind(draft.price.amount())
        .bind(&draft.description)
        .bind(draft.category_id.as_i64())
        .bind(ItemStatus::SoldOut.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_item(row),
            None => match self.current_status(id).await? {
                Some(status) => Err(StoreError::NotEditable { item_id: id, status }),
                None => Err(StoreError::item_not_found(id)),
            },
        }
    }

    async fn query_items(&self, query: ItemQuery) -> Result<Vec<Item>> {
        let mut sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if query.seller_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND seller_id = ${param_count}"));
        }
        if query.category_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category_id = ${param_count}"));
        }
        if query.name_contains.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND POSITION(LOWER(${param_count}) IN LOWER(name)) > 0"
            ));
        }

        sql.push_str(" ORDER BY updated_at DESC, created_at DESC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let limit = query.limit.map(|l| sql_bound("limit", l)).transpose()?;
        let offset = query.offset.map(|o| sql_bound("offset", o)).transpose()?;

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }
        if let Some(seller_id) = query.seller_id {
            sqlx_query = sqlx_query.bind(seller_id.as_uuid());
        }
        if let Some(category_id) = query.category_id {
            sqlx_query = sqlx_query.bind(category_id.as_i64());
        }
        if let Some(name) = query.name_contains {
            sqlx_query = sqlx_query.bind(name);
        }
        if let Some(limit) = limit {
            sqlx_query = sqlx_query.bind(limit);
        }
        if let Some(offset) = offset {
            sqlx_query = sqlx_query.bind(offset);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl LedgerStore for PostgresMarketStore {
    async fn get_user(&self, id: UserId) -> Result<User> {
        let row = sqlx::query("SELECT id, name, balance FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::user_not_found(id))?;

        Self::row_to_user(row)
    }

    async fn create_user(&self, name: &str) -> Result<User> {
        let row = sqlx::query(
            "INSERT INTO users (id, name, balance) VALUES ($1, $2, 0) RETURNING id, name, balance",
        )
        .bind(UserId::new().as_uuid())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_user(row)
    }

    async fn add_balance(&self, id: UserId, delta: Money) -> Result<Money> {
        let balance: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET balance = balance + $2 WHERE id = $1 RETURNING balance",
        )
        .bind(id.as_uuid())
        .bind(delta.amount())
        .fetch_optional(&self.pool)
        .await?;

        balance
            .map(Money::new)
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    async fn withdraw(&self, id: UserId, amount: Money) -> Result<Money> {
        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET balance = balance - $2
            WHERE id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(id.as_uuid())
        .bind(amount.amount())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(balance) = balance {
            return Ok(Money::new(balance));
        }

        let current: Option<i64> = sqlx::query_scalar("SELECT balance FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match current {
            Some(balance) => Err(StoreError::InsufficientFunds {
                user_id: id,
                balance: Money::new(balance),
                requested: amount,
            }),
            None => Err(StoreError::user_not_found(id)),
        }
    }
}

#[async_trait]
impl CategoryStore for PostgresMarketStore {
    async fn get_category(&self, id: CategoryId) -> Result<Category> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::category_not_found(id))?;

        Ok(Category::new(row.try_get("id")?, row.try_get::<String, _>("name")?))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> Result<Category> {
                Ok(Category::new(
                    row.try_get("id")?,
                    row.try_get::<String, _>("name")?,
                ))
            })
            .collect()
    }
}
