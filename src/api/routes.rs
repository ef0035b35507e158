use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::db::writer::recent_observations;
use crate::db::SubscriptionRepository;
use crate::error::AppError;
use crate::monitor::MonitorService;
use crate::types::{CycleReport, PriceObservation, Subscription, SubscriptionKey};

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 500;

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    pub repo: Arc<dyn SubscriptionRepository>,
    pub monitor: Arc<MonitorService>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route(
            "/subscriptions",
            get(list_subscriptions)
                .post(add_subscription)
                .delete(remove_subscription),
        )
        .route("/history", get(get_history))
        .route("/stats/latency", get(get_stats_latency))
        .route("/scan", post(trigger_scan))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query params / bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: i64,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub category: Option<String>,
    pub lot_name: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewSubscription {
    pub user_id: i64,
    pub category: String,
    pub lot_name: String,
    pub min_price: f64,
}

impl NewSubscription {
    /// Shape checks only; the category key stays opaque.
    fn validate(self) -> Result<Subscription, AppError> {
        let category = self.category.trim().to_string();
        let lot_name = self.lot_name.trim().to_string();
        if category.is_empty() {
            return Err(AppError::InvalidRequest("category must not be empty".to_string()));
        }
        if lot_name.is_empty() {
            return Err(AppError::InvalidRequest("lot_name must not be empty".to_string()));
        }
        if !self.min_price.is_finite() || self.min_price < 0.0 {
            return Err(AppError::InvalidRequest(
                "min_price must be a non-negative number".to_string(),
            ));
        }
        Ok(Subscription {
            user_id: self.user_id,
            category,
            lot_name,
            min_price: self.min_price,
        })
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub last_cycle_at: Option<u64>,
    pub last_cycle_ok: bool,
    pub cycles_run: u64,
    pub notifications_sent: u64,
    pub subscriptions_retired: u64,
}

#[derive(Serialize)]
pub struct AddResponse {
    pub created: bool,
    pub subscription: Subscription,
}

#[derive(Serialize)]
pub struct RemoveResponse {
    pub removed: u64,
}

#[derive(Serialize)]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let h = &state.health;
    let cycles_run = h.cycles_run();
    let status = if cycles_run == 0 {
        "starting"
    } else if h.last_cycle_ok() {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status,
        last_cycle_at: Some(h.last_cycle_at_secs()).filter(|&t| t > 0),
        last_cycle_ok: h.last_cycle_ok(),
        cycles_run,
        notifications_sent: h.notifications_sent(),
        subscriptions_retired: h.subscriptions_retired(),
    })
}

async fn list_subscriptions(
    State(state): State<ApiState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<Subscription>>, AppError> {
    Ok(Json(state.repo.list_by_user(params.user_id).await?))
}

async fn add_subscription(
    State(state): State<ApiState>,
    Json(body): Json<NewSubscription>,
) -> Result<(StatusCode, Json<AddResponse>), AppError> {
    let sub = body.validate()?;
    let created = state.repo.add(&sub).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(AddResponse {
            created,
            subscription: sub,
        }),
    ))
}

async fn remove_subscription(
    State(state): State<ApiState>,
    Json(key): Json<SubscriptionKey>,
) -> Result<Json<RemoveResponse>, AppError> {
    let removed = state.repo.remove(&key).await?;
    Ok(Json(RemoveResponse { removed }))
}

async fn get_history(
    State(state): State<ApiState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<PriceObservation>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let rows = recent_observations(
        &state.pool,
        params.category.as_deref(),
        params.lot_name.as_deref(),
        limit,
    )
    .await?;
    Ok(Json(rows))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let (p50, p95, p99) = state.latency.percentiles();
    let ms = |us: Option<u64>| us.map(|v| v as f64 / 1_000.0);
    Json(LatencyResponse {
        samples: state.latency.len(),
        p50_ms: ms(p50),
        p95_ms: ms(p95),
        p99_ms: ms(p99),
    })
}

/// Run a cycle immediately. 409 while the scheduled cycle is still running.
async fn trigger_scan(
    State(state): State<ApiState>,
) -> Result<(StatusCode, Json<Option<CycleReport>>), AppError> {
    match state.monitor.try_check_once().await {
        Some(report) => Ok((StatusCode::OK, Json(Some(report?)))),
        None => Ok((StatusCode::CONFLICT, Json(None))),
    }
}
