//! Shared health state for the /health endpoint.
//! Updated by the monitor after every cycle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::types::CycleReport;

#[derive(Default)]
pub struct HealthState {
    /// Unix seconds when the last cycle finished (0 = none yet).
    pub last_cycle_at_secs: AtomicU64,
    /// False when the last cycle could not read the subscription list.
    pub last_cycle_ok: AtomicBool,
    pub cycles_run: AtomicU64,
    pub subscriptions_retired: AtomicU64,
    pub notifications_sent: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self, finished_at_secs: u64, report: Option<&CycleReport>) {
        self.last_cycle_at_secs.store(finished_at_secs, Ordering::Relaxed);
        self.cycles_run.fetch_add(1, Ordering::Relaxed);
        self.last_cycle_ok.store(report.is_some(), Ordering::Relaxed);
        if let Some(r) = report {
            self.subscriptions_retired
                .fetch_add(r.retired as u64, Ordering::Relaxed);
            self.notifications_sent
                .fetch_add(r.notified as u64, Ordering::Relaxed);
        }
    }

    pub fn last_cycle_at_secs(&self) -> u64 {
        self.last_cycle_at_secs.load(Ordering::Relaxed)
    }

    pub fn last_cycle_ok(&self) -> bool {
        self.last_cycle_ok.load(Ordering::Relaxed)
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run.load(Ordering::Relaxed)
    }

    pub fn subscriptions_retired(&self) -> u64 {
        self.subscriptions_retired.load(Ordering::Relaxed)
    }

    pub fn notifications_sent(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }
}
