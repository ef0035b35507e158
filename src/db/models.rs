//! Row types for the tables in `migrations/`. Used by sqlx for typed queries.

use crate::types::{PriceObservation, Subscription};

#[derive(Debug, sqlx::FromRow)]
pub struct SubscriptionRow {
    pub user_id: i64,
    pub category: String,
    pub lot_name: String,
    pub min_price: f64,
}

impl From<SubscriptionRow> for Subscription {
    fn from(r: SubscriptionRow) -> Self {
        Subscription {
            user_id: r.user_id,
            category: r.category,
            lot_name: r.lot_name,
            min_price: r.min_price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PriceHistoryRow {
    pub category: String,
    pub lot_name: String,
    pub listing_name: String,
    pub price: f64,
    pub url: String,
    pub observed_at: i64,
}

impl From<PriceHistoryRow> for PriceObservation {
    fn from(r: PriceHistoryRow) -> Self {
        PriceObservation {
            category: r.category,
            lot_name: r.lot_name,
            listing_name: r.listing_name,
            price: r.price,
            url: r.url,
            observed_at: r.observed_at,
        }
    }
}
