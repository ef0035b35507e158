//! Shared fakes for tests: recording implementations of the repository, provider and
//! notifier traits, and a throwaway local HTTP server.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;

use crate::db::SubscriptionRepository;
use crate::error::{AppError, LookupError, NotifyError, Result};
use crate::notifier::Notifier;
use crate::provider::LotProvider;
use crate::types::{Listing, Subscription, SubscriptionKey};

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeRepo {
    subs: Mutex<Vec<Subscription>>,
    removed: Mutex<Vec<SubscriptionKey>>,
    fail_list: bool,
    fail_remove: bool,
}

impl FakeRepo {
    pub fn with(subs: Vec<Subscription>) -> Self {
        Self {
            subs: Mutex::new(subs),
            ..Default::default()
        }
    }

    pub fn failing_list() -> Self {
        Self {
            fail_list: true,
            ..Default::default()
        }
    }

    pub fn failing_remove(subs: Vec<Subscription>) -> Self {
        Self {
            subs: Mutex::new(subs),
            fail_remove: true,
            ..Default::default()
        }
    }

    pub fn removed(&self) -> Vec<SubscriptionKey> {
        self.removed.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> Vec<Subscription> {
        self.subs.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionRepository for FakeRepo {
    async fn list_all(&self) -> Result<Vec<Subscription>> {
        if self.fail_list {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }
        Ok(self.remaining())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Subscription>> {
        Ok(self
            .remaining()
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .collect())
    }

    async fn add(&self, sub: &Subscription) -> Result<bool> {
        let mut subs = self.subs.lock().unwrap();
        if subs.iter().any(|s| s.key() == sub.key()) {
            return Ok(false);
        }
        subs.push(sub.clone());
        Ok(true)
    }

    async fn remove(&self, key: &SubscriptionKey) -> Result<u64> {
        self.removed.lock().unwrap().push(key.clone());
        if self.fail_remove {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut subs = self.subs.lock().unwrap();
        let before = subs.len();
        subs.retain(|s| &s.key() != key);
        Ok((before - subs.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// Listing source
// ---------------------------------------------------------------------------

/// Unregistered (category, filter) pairs answer "no matching listings".
#[derive(Default)]
pub struct FakeLots {
    by_key: HashMap<(String, String), Vec<Listing>>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeLots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: &str, filter: &str, lots: Vec<Listing>) -> Self {
        self.by_key
            .insert((category.to_string(), filter.to_string()), lots);
        self
    }

    /// Category answers with a 503.
    pub fn failing(mut self, category: &str) -> Self {
        self.failing.insert(category.to_string());
        self
    }

    /// Category never answers.
    pub fn hanging(mut self, category: &str) -> Self {
        self.hanging.insert(category.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LotProvider for FakeLots {
    async fn find_lots(
        &self,
        category: &str,
        name_filter: &str,
    ) -> std::result::Result<Vec<Listing>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging.contains(category) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(category) {
            return Err(LookupError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        }
        self.by_key
            .get(&(category.to_string(), name_filter.to_string()))
            .cloned()
            .ok_or(LookupError::NoMatchingListings)
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Records every attempt, including failed ones.
#[derive(Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<(i64, String)>>,
    fail: bool,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, user_id: i64, message: &str) -> std::result::Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((user_id, message.to_string()));
        if self.fail {
            return Err(NotifyError::Rejected("Forbidden: bot was blocked by the user".to_string()));
        }
        Ok(())
    }
}
