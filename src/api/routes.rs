use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{aggregate, OrderStats};
use crate::api::charts;
use crate::api::health::HealthState;
use crate::api::latency::{LatencyStats, LatencySummary};
use crate::config::Config;
use crate::error::AppError;
use crate::fetcher;
use crate::state::OrderStore;

#[derive(Clone)]
pub struct ApiState {
    pub cfg: Config,
    pub store: Arc<OrderStore>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/events", get(get_events))
        .route("/events/:id/stats", get(get_event_stats))
        .route("/events/:id/charts/:kind", get(get_event_chart))
        .route("/clients", get(get_clients))
        .route("/clients/:id/stats", get(get_client_stats))
        .route("/stats/summary", get(get_stats_summary))
        .route("/stats/latency", get(get_stats_latency))
        .route("/health", get(get_health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct EventsQuery {
    pub status: Option<String>,
    pub min_revenue: Option<f64>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct EventResponse {
    pub id: String,
    pub name: Option<String>,
    pub status: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub total_revenue: f64,
    pub tickets_sold: u64,
    pub conversion_rate: f64,
}

#[derive(Serialize)]
pub struct ClientResponse {
    pub id: String,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub order_count: usize,
}

#[derive(Serialize)]
pub struct ClientStatsResponse {
    pub id: String,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub stats: OrderStats,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub total_events: usize,
    pub total_orders: usize,
    pub stats: OrderStats,
    pub top_events: Vec<EventResponse>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Cached aggregates for an event, computed fresh on a cache miss.
fn stats_for(state: &ApiState, event_id: &str) -> OrderStats {
    state.store.stats(event_id).unwrap_or_else(|| {
        let orders = state.store.orders_snapshot(event_id).unwrap_or_default();
        aggregate(&orders, state.cfg.revenue_policy, Utc::now().date_naive())
    })
}

fn event_response(state: &ApiState, event_id: &str) -> Option<EventResponse> {
    let event = state.store.get_event(event_id)?;
    let stats = stats_for(state, event_id);
    Some(EventResponse {
        id: event.id,
        name: event.name,
        status: event.status.to_string(),
        starts_at: event.date_time.and_then(|dt| dt.start),
        total_revenue: stats.total_revenue,
        tickets_sold: stats.tickets_sold,
        conversion_rate: stats.conversion_rate,
    })
}

async fn get_events(
    State(state): State<ApiState>,
    Query(params): Query<EventsQuery>,
) -> Json<Vec<EventResponse>> {
    let min_revenue = params.min_revenue.unwrap_or(0.0);

    let mut events: Vec<EventResponse> = state
        .store
        .all_event_ids()
        .iter()
        .filter_map(|id| event_response(&state, id))
        .filter(|e| e.total_revenue >= min_revenue)
        .filter(|e| params.status.as_ref().map_or(true, |s| e.status == *s))
        .collect();

    events.sort_by(|a, b| b.total_revenue.partial_cmp(&a.total_revenue).unwrap_or(std::cmp::Ordering::Equal));
    Json(events)
}

async fn get_event_stats(
    State(state): State<ApiState>,
    Path(event_id): Path<String>,
) -> Result<Json<OrderStats>, AppError> {
    if !state.store.contains_event(&event_id) {
        return Err(AppError::NotFound(format!("event {event_id}")));
    }
    Ok(Json(stats_for(&state, &event_id)))
}

async fn get_event_chart(
    State(state): State<ApiState>,
    Path((event_id, kind)): Path<(String, String)>,
) -> Result<Json<Vec<serde_json::Value>>, AppError> {
    if !state.store.contains_event(&event_id) {
        return Err(AppError::NotFound(format!("event {event_id}")));
    }
    let stats = stats_for(&state, &event_id);
    charts::table_for(&stats, &kind)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("chart kind {kind}")))
}

async fn get_clients(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ClientResponse>>, AppError> {
    let (accounts, _stats) = fetcher::get_clients(&state.cfg).await?;
    let clients = accounts
        .into_iter()
        .map(|a| ClientResponse {
            id: a.id,
            name: a.name,
            last_name: a.last_name,
            email: a.email,
            order_count: a.orders.len(),
        })
        .collect();
    Ok(Json(clients))
}

/// The User screen's numbers: fetched on demand and aggregated per request,
/// like every other view owning its own copy of the data.
async fn get_client_stats(
    State(state): State<ApiState>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientStatsResponse>, AppError> {
    let account = fetcher::get_client(&state.cfg, &client_id).await?;
    let stats = aggregate(&account.orders, state.cfg.revenue_policy, Utc::now().date_naive());
    Ok(Json(ClientStatsResponse {
        id: account.id,
        name: account.name,
        last_name: account.last_name,
        email: account.email,
        stats,
    }))
}

async fn get_stats_summary(State(state): State<ApiState>) -> Json<SummaryResponse> {
    let all_orders = state.store.all_orders_snapshot();
    let stats = aggregate(&all_orders, state.cfg.revenue_policy, Utc::now().date_naive());

    let mut top_events: Vec<EventResponse> = state
        .store
        .all_event_ids()
        .iter()
        .filter_map(|id| event_response(&state, id))
        .collect();
    top_events.sort_by(|a, b| b.total_revenue.partial_cmp(&a.total_revenue).unwrap_or(std::cmp::Ordering::Equal));
    top_events.truncate(5);

    Json(SummaryResponse {
        total_events: state.store.event_count(),
        total_orders: all_orders.len(),
        stats,
        top_events,
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencySummary> {
    Json(state.latency.summary())
}

async fn get_health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ws_connected": state.health.ws_connected(),
        "last_update_at_ns": state.health.last_update_at_ns(),
        "updates_applied": state.health.updates_applied(),
        "events_tracked": state.store.event_count(),
        "orders_tracked": state.store.order_count(),
    }))
}
