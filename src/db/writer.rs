use tokio::sync::mpsc;
use tracing::error;

use crate::db::models::PriceHistoryRow;
use crate::error::Result;
use crate::types::PriceObservation;

/// Receives price observations from the monitor and appends them to `price_history`.
/// Runs as a dedicated background task so a slow disk never stalls a scan cycle.
pub struct HistoryWriter {
    pool: sqlx::SqlitePool,
    rx: mpsc::Receiver<PriceObservation>,
}

impl HistoryWriter {
    pub fn new(pool: sqlx::SqlitePool, rx: mpsc::Receiver<PriceObservation>) -> Self {
        Self { pool, rx }
    }

    pub async fn run(mut self) {
        while let Some(obs) = self.rx.recv().await {
            if let Err(e) = write_observation(&self.pool, &obs).await {
                error!("Price history write error: {e}");
            }
        }
    }
}

pub async fn write_observation(pool: &sqlx::SqlitePool, obs: &PriceObservation) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO price_history (category, lot_name, listing_name, price, url, observed_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&obs.category)
    .bind(&obs.lot_name)
    .bind(&obs.listing_name)
    .bind(obs.price)
    .bind(&obs.url)
    .bind(obs.observed_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Most recent observations first, optionally narrowed to a category and/or lot name.
pub async fn recent_observations(
    pool: &sqlx::SqlitePool,
    category: Option<&str>,
    lot_name: Option<&str>,
    limit: i64,
) -> Result<Vec<PriceObservation>> {
    let rows = sqlx::query_as::<_, PriceHistoryRow>(
        r#"
        SELECT category, lot_name, listing_name, price, url, observed_at
        FROM price_history
        WHERE (?1 IS NULL OR category = ?1)
          AND (?2 IS NULL OR lot_name = ?2)
        ORDER BY observed_at DESC, id DESC
        LIMIT ?3
        "#,
    )
    .bind(category)
    .bind(lot_name)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(PriceObservation::from).collect())
}
