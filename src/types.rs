use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// One scraped marketplace item. Built fresh every scan cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub name: String,
    pub price: f64,
    /// Absolute detail link; empty when the card carries none.
    pub url: String,
    /// Category key the listing was found under.
    pub category: String,
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// A user's single-shot watch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: i64,
    pub category: String,
    /// Case-insensitive substring filter on listing names.
    pub lot_name: String,
    /// Ceiling price: a listing matches when its price is at or below this value.
    pub min_price: f64,
}

impl Subscription {
    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey {
            user_id: self.user_id,
            category: self.category.clone(),
            lot_name: self.lot_name.clone(),
        }
    }

    /// Inclusive: a price equal to the ceiling matches.
    pub fn accepts(&self, price: f64) -> bool {
        price <= self.min_price
    }
}

/// Dedup key `(user_id, category, lot_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionKey {
    pub user_id: i64,
    pub category: String,
    pub lot_name: String,
}

impl std::fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.user_id, self.category, self.lot_name)
    }
}

// ---------------------------------------------------------------------------
// Price history
// ---------------------------------------------------------------------------

/// Cheapest listing seen for a subscription in one cycle, queued for the history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceObservation {
    pub category: String,
    pub lot_name: String,
    pub listing_name: String,
    pub price: f64,
    pub url: String,
    pub observed_at: i64,
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Outcome counters for one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub subscriptions: usize,
    pub notified: usize,
    pub retired: usize,
    /// Cheapest listing found but priced above the ceiling.
    pub above_ceiling: usize,
    /// Lookup failed, timed out, or found nothing.
    pub skipped: usize,
    pub failed_notifications: usize,
    pub failed_removals: usize,
}
