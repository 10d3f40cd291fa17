mod analytics;
mod api;
mod config;
mod error;
mod fetcher;
mod refresh;
mod state;
mod types;
mod ws;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::analytics::aggregate;
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, CHANNEL_CAPACITY};
use crate::error::Result;
use crate::fetcher::fetch_events;
use crate::refresh::EventRefresher;
use crate::state::OrderStore;
use crate::types::{ControlMsg, Order, UpdateMsg};
use crate::ws::messages::PushFrame;
use crate::ws::WsManager;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- REST bootstrap: fetch the promoter's events with embedded orders ---
    let (events, stats) = fetch_events(&cfg).await?;
    info!(
        "Bootstrap complete: {} events, {} orders, {} sales from {} API results (revenue policy: {})",
        events.len(),
        stats.orders,
        stats.sales,
        stats.api_total,
        cfg.revenue_policy,
    );

    // --- In-memory order store + initial aggregates ---
    let store = OrderStore::new();
    store.add_events(events);

    let today = Utc::now().date_naive();
    for event_id in store.all_event_ids() {
        let orders = store.orders_snapshot(&event_id).unwrap_or_default();
        store.set_stats(&event_id, aggregate(&orders, cfg.revenue_policy, today));
    }
    info!("Aggregates ready for {} events", store.event_count());

    // --- Shared instrumentation ---
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());

    // --- Channels ---
    let (update_tx, update_rx) = mpsc::channel::<UpdateMsg>(CHANNEL_CAPACITY);
    let (control_tx, control_rx) = mpsc::channel::<ControlMsg>(CHANNEL_CAPACITY);

    // --- Spawn tasks ---

    // Socket manager
    let ws_manager = WsManager::new(
        cfg.ws_url.clone(),
        Arc::clone(&store),
        update_tx,
        control_rx,
        Arc::clone(&health),
    );
    tokio::spawn(async move { ws_manager.run().await });

    // Push update consumer: merges into the store and recomputes aggregates
    let consumer_cfg = cfg.clone();
    let consumer_store = Arc::clone(&store);
    let consumer_health = Arc::clone(&health);
    let consumer_latency = Arc::clone(&latency);
    let consumer_control_tx = control_tx.clone();
    tokio::spawn(async move {
        update_consumer(
            update_rx,
            consumer_cfg,
            consumer_store,
            consumer_control_tx,
            consumer_health,
            consumer_latency,
        )
        .await;
    });

    // Event catalog refresher (background, every 300s)
    let refresher = EventRefresher::new(cfg.clone(), Arc::clone(&store), control_tx);
    tokio::spawn(async move { refresher.run().await });

    // --- HTTP API server ---
    let api_state = ApiState {
        cfg: cfg.clone(),
        store,
        health,
        latency,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Consumes push updates in receipt order: folds each into the store, then
/// recomputes the affected event's aggregates from the merged collection.
async fn update_consumer(
    mut rx: mpsc::Receiver<UpdateMsg>,
    cfg: Config,
    store: Arc<OrderStore>,
    control_tx: mpsc::Sender<ControlMsg>,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
) {
    while let Some(msg) = rx.recv().await {
        let event_id = match apply_update(&cfg, &store, &control_tx, msg.frame).await {
            Ok(Some(event_id)) => event_id,
            Ok(None) => continue,
            Err(e) => {
                warn!("push update failed: {e}");
                continue;
            }
        };

        let orders = store.orders_snapshot(&event_id).unwrap_or_default();
        let stats = aggregate(&orders, cfg.revenue_policy, Utc::now().date_naive());
        store.set_stats(&event_id, stats);

        health.inc_updates_applied();
        health.set_last_update_at_ns(msg.received_at_ns);
        latency.record(msg.received_at.elapsed());
    }
}

/// Fold one parsed push frame into the store. Returns the affected event id,
/// or None when the frame cannot be routed to a tracked event.
async fn apply_update(
    cfg: &Config,
    store: &Arc<OrderStore>,
    control_tx: &mpsc::Sender<ControlMsg>,
    frame: PushFrame,
) -> Result<Option<String>> {
    match frame {
        PushFrame::Order { kind, order } => {
            info!(event = %kind, order = %order.id, "order update");
            Ok(fold_order(cfg, store, control_tx, *order).await)
        }

        PushFrame::Sale { kind, order_id, sale } => {
            info!(event = %kind, order = %order_id, ticket = %sale.id, "ticket update");
            if let Some(event_id) = store.apply_sale_update(&order_id, *sale) {
                return Ok(Some(event_id));
            }
            // Unknown parent order — resolve the full order over REST and
            // merge it whole.
            let order = fetcher::get_order(cfg, &order_id).await?;
            Ok(fold_order(cfg, store, control_tx, order).await)
        }

        PushFrame::OrderRef { kind, order_id } => {
            info!(event = %kind, order = %order_id, "identifier-only update, resolving");
            let order = fetcher::get_order(cfg, &order_id).await?;
            Ok(fold_order(cfg, store, control_tx, order).await)
        }
    }
}

async fn fold_order(
    cfg: &Config,
    store: &Arc<OrderStore>,
    control_tx: &mpsc::Sender<ControlMsg>,
    order: Order,
) -> Option<String> {
    let event_id = order
        .event_id
        .clone()
        .or_else(|| store.find_event_for_order(&order.id));
    let Some(event_id) = event_id else {
        warn!(order = %order.id, "order update without a resolvable event, dropped");
        return None;
    };

    // An order can arrive for an event the catalog hasn't picked up yet —
    // resolve the event and start tracking its channel before merging.
    if !store.contains_event(&event_id) {
        match fetcher::get_event(cfg, &event_id).await {
            Ok(event) => {
                store.add_event(event);
                if let Err(e) = control_tx.send(ControlMsg::Subscribe(vec![event_id.clone()])).await {
                    warn!("Failed to send Subscribe for {event_id}: {e}");
                }
            }
            Err(e) => warn!("could not resolve event {event_id}: {e}"),
        }
    }

    store.apply_order_update(&event_id, order);
    Some(event_id)
}
