use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use futures_util::stream::{self, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::Config;
use crate::db::SubscriptionRepository;
use crate::error::{LookupError, Result};
use crate::matcher::{evaluate, MatchOutcome};
use crate::notifier::{match_message, Notifier};
use crate::provider::LotProvider;
use crate::types::{CycleReport, Listing, PriceObservation, Subscription};

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Delay between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Deadline for one subscription's lookup.
    pub subscription_timeout: Duration,
    pub concurrency: usize,
}

impl MonitorSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            interval: Duration::from_secs(cfg.scan_interval_secs),
            subscription_timeout: Duration::from_secs(cfg.subscription_timeout_secs),
            concurrency: cfg.scan_concurrency.max(1),
        }
    }
}

/// What happened to one subscription in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubscriptionOutcome {
    Skipped,
    AboveCeiling,
    Retired { notified: bool, removed: bool },
}

impl CycleReport {
    fn absorb(&mut self, outcome: SubscriptionOutcome) {
        match outcome {
            SubscriptionOutcome::Skipped => self.skipped += 1,
            SubscriptionOutcome::AboveCeiling => self.above_ceiling += 1,
            SubscriptionOutcome::Retired { notified, removed } => {
                if notified {
                    self.notified += 1;
                } else {
                    self.failed_notifications += 1;
                }
                if removed {
                    self.retired += 1;
                } else {
                    self.failed_removals += 1;
                }
            }
        }
    }
}

/// Periodic scan over all active subscriptions: look up listings, match against the
/// ceiling, notify, then retire the subscription.
///
/// Cycles never overlap: a cycle holds `cycle_lock` from the bulk read until the last
/// removal, so a retired subscription is gone before any later cycle reads the list.
pub struct MonitorService {
    repo: Arc<dyn SubscriptionRepository>,
    lots: Arc<dyn LotProvider>,
    notifier: Arc<dyn Notifier>,
    settings: MonitorSettings,
    cycle_lock: Mutex<()>,
    history_tx: Option<mpsc::Sender<PriceObservation>>,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
}

impl MonitorService {
    pub fn new(
        repo: Arc<dyn SubscriptionRepository>,
        lots: Arc<dyn LotProvider>,
        notifier: Arc<dyn Notifier>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            repo,
            lots,
            notifier,
            settings,
            cycle_lock: Mutex::new(()),
            history_tx: None,
            health: Arc::new(HealthState::new()),
            latency: Arc::new(LatencyStats::new()),
        }
    }

    pub fn with_history(mut self, tx: mpsc::Sender<PriceObservation>) -> Self {
        self.history_tx = Some(tx);
        self
    }

    pub fn with_metrics(mut self, health: Arc<HealthState>, latency: Arc<LatencyStats>) -> Self {
        self.health = health;
        self.latency = latency;
        self
    }

    /// Fixed-delay scheduler: run a cycle, sleep `interval`, repeat. Errors are
    /// logged and the next cycle proceeds.
    pub async fn run(self: Arc<Self>) {
        info!(
            interval_secs = self.settings.interval.as_secs(),
            concurrency = self.settings.concurrency,
            "Monitor started"
        );
        loop {
            if let Err(e) = self.check_once().await {
                error!("Scan cycle failed: {e}");
            }
            tokio::time::sleep(self.settings.interval).await;
        }
    }

    /// Run one cycle, waiting for any cycle already in progress to finish first.
    pub async fn check_once(&self) -> Result<CycleReport> {
        let _cycle = self.cycle_lock.lock().await;
        self.scan().await
    }

    /// Run one cycle now, or return `None` if one is already in progress.
    pub async fn try_check_once(&self) -> Option<Result<CycleReport>> {
        let _cycle = self.cycle_lock.try_lock().ok()?;
        Some(self.scan().await)
    }

    async fn scan(&self) -> Result<CycleReport> {
        let started = Instant::now();
        let subs = match self.repo.list_all().await {
            Ok(subs) => subs,
            Err(e) => {
                self.health.record_cycle(now_secs(), None);
                return Err(e);
            }
        };

        let mut report = CycleReport {
            subscriptions: subs.len(),
            ..Default::default()
        };

        let outcomes: Vec<SubscriptionOutcome> = stream::iter(subs)
            .map(|sub| self.process(sub))
            .buffer_unordered(self.settings.concurrency)
            .collect()
            .await;
        for outcome in outcomes {
            report.absorb(outcome);
        }

        self.health.record_cycle(now_secs(), Some(&report));
        info!(
            subscriptions = report.subscriptions,
            notified = report.notified,
            retired = report.retired,
            above_ceiling = report.above_ceiling,
            skipped = report.skipped,
            failed_notifications = report.failed_notifications,
            failed_removals = report.failed_removals,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan cycle complete: {} subscriptions, {} notified, {} retired, {} skipped",
            report.subscriptions,
            report.notified,
            report.retired,
            report.skipped,
        );
        Ok(report)
    }

    async fn process(&self, sub: Subscription) -> SubscriptionOutcome {
        let listings = match self.lookup(&sub).await {
            Ok(listings) => listings,
            Err(e) if e.is_no_match() => {
                debug!(
                    user_id = sub.user_id,
                    category = %sub.category,
                    lot_name = %sub.lot_name,
                    "No matching lots this cycle"
                );
                return SubscriptionOutcome::Skipped;
            }
            Err(e) => {
                warn!(
                    user_id = sub.user_id,
                    category = %sub.category,
                    lot_name = %sub.lot_name,
                    "Lookup failed, skipping this cycle: {e}"
                );
                return SubscriptionOutcome::Skipped;
            }
        };

        match evaluate(&sub, &listings) {
            MatchOutcome::Empty => SubscriptionOutcome::Skipped,
            MatchOutcome::AboveCeiling(cheapest) => {
                self.record_observation(&sub, cheapest);
                debug!(
                    user_id = sub.user_id,
                    category = %sub.category,
                    lot_name = %sub.lot_name,
                    price = cheapest.price,
                    ceiling = sub.min_price,
                    "Cheapest lot above ceiling"
                );
                SubscriptionOutcome::AboveCeiling
            }
            MatchOutcome::Match(cheapest) => {
                self.record_observation(&sub, cheapest);
                self.notify_and_retire(&sub, cheapest).await
            }
        }
    }

    /// Provider call bounded by the per-subscription deadline; expiry counts as a fetch error.
    async fn lookup(&self, sub: &Subscription) -> std::result::Result<Vec<Listing>, LookupError> {
        let started = Instant::now();
        let result = timeout(
            self.settings.subscription_timeout,
            self.lots.find_lots(&sub.category, &sub.lot_name),
        )
        .await;
        self.latency.record(started.elapsed());
        result.unwrap_or_else(|_| {
            Err(LookupError::Timeout(self.settings.subscription_timeout.as_secs()))
        })
    }

    /// Notify first, then remove. A failed notification still retires the subscription
    /// (one attempt per match); a failed removal is logged and the notification stands.
    async fn notify_and_retire(&self, sub: &Subscription, lot: &Listing) -> SubscriptionOutcome {
        let message = match_message(lot);
        let notified = match self.notifier.notify(sub.user_id, &message).await {
            Ok(()) => {
                info!(
                    user_id = sub.user_id,
                    category = %sub.category,
                    lot_name = %sub.lot_name,
                    price = lot.price,
                    url = %lot.url,
                    "Match notified: {} at {:.2}",
                    lot.name,
                    lot.price,
                );
                true
            }
            Err(e) => {
                error!(
                    user_id = sub.user_id,
                    category = %sub.category,
                    lot_name = %sub.lot_name,
                    "Notification failed, retiring anyway: {e}"
                );
                false
            }
        };

        let key = sub.key();
        let removed = match self.repo.remove(&key).await {
            Ok(0) => {
                warn!(key = %key, "Subscription already gone at retirement");
                true
            }
            Ok(_) => true,
            Err(e) => {
                error!(key = %key, "Failed to retire subscription after notify: {e}");
                false
            }
        };

        SubscriptionOutcome::Retired { notified, removed }
    }

    fn record_observation(&self, sub: &Subscription, lot: &Listing) {
        let Some(tx) = &self.history_tx else { return };
        let obs = PriceObservation {
            category: sub.category.clone(),
            lot_name: sub.lot_name.clone(),
            listing_name: lot.name.clone(),
            price: lot.price,
            url: lot.url.clone(),
            observed_at: now_secs() as i64,
        };
        if let Err(e) = tx.try_send(obs) {
            warn!("Price history channel unavailable, dropping observation: {e}");
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
