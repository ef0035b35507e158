use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::db::models::SubscriptionRow;
use crate::error::Result;
use crate::types::{Subscription, SubscriptionKey};

/// Key-ordered store of active subscriptions.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Subscription>>;

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Subscription>>;

    /// Returns false when the dedup key already exists (nothing is written).
    async fn add(&self, sub: &Subscription) -> Result<bool>;

    /// Returns the number of rows removed (0 or 1).
    async fn remove(&self, key: &SubscriptionKey) -> Result<u64>;
}

pub struct SqliteSubscriptionRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SqliteSubscriptionRepository {
    async fn list_all(&self) -> Result<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT user_id, category, lot_name, min_price
            FROM subscriptions
            ORDER BY user_id, category, lot_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Subscription::from).collect())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT user_id, category, lot_name, min_price
            FROM subscriptions
            WHERE user_id = ?
            ORDER BY category, lot_name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Subscription::from).collect())
    }

    async fn add(&self, sub: &Subscription) -> Result<bool> {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO subscriptions (user_id, category, lot_name, min_price, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(sub.user_id)
        .bind(&sub.category)
        .bind(&sub.lot_name)
        .bind(sub.min_price)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, key: &SubscriptionKey) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM subscriptions WHERE user_id = ? AND category = ? AND lot_name = ?",
        )
        .bind(key.user_id)
        .bind(&key.category)
        .bind(&key.lot_name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
