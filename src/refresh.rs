use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::analytics::aggregate;
use crate::config::{Config, EVENT_REFRESH_INTERVAL_SECS};
use crate::fetcher::fetch_events;
use crate::state::OrderStore;
use crate::types::ControlMsg;

/// Background task that re-fetches the promoter's event catalog on an
/// interval, subscribing channels for newly appearing events and dropping
/// events the backend no longer returns.
pub struct EventRefresher {
    cfg: Config,
    store: Arc<OrderStore>,
    control_tx: mpsc::Sender<ControlMsg>,
}

impl EventRefresher {
    pub fn new(cfg: Config, store: Arc<OrderStore>, control_tx: mpsc::Sender<ControlMsg>) -> Self {
        Self { cfg, store, control_tx }
    }

    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(EVENT_REFRESH_INTERVAL_SECS));
        ticker.tick().await; // skip immediate first tick — bootstrap already ran

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                error!("Event refresh failed: {e}");
            }
        }
    }

    async fn refresh(&self) -> crate::error::Result<()> {
        let (fresh_events, _stats) = fetch_events(&self.cfg).await?;

        let current_ids: HashSet<String> = self.store.all_event_ids().into_iter().collect();
        let fresh_ids: HashSet<String> = fresh_events.iter().map(|e| e.id.clone()).collect();

        // Events to drop: currently tracked but no longer returned.
        let to_remove: Vec<String> = current_ids.difference(&fresh_ids).cloned().collect();

        let removed_count = to_remove.len();
        let unchanged_count = current_ids.len().saturating_sub(removed_count);
        let mut added = Vec::new();

        for event_id in &to_remove {
            // Send Unsubscribe BEFORE removing from the store so the socket
            // handler can still resolve the event while building the frame.
            if let Err(e) = self.control_tx.send(ControlMsg::Unsubscribe(event_id.clone())).await {
                warn!("Failed to send Unsubscribe for {event_id}: {e}");
            }
            self.store.remove_event(event_id);
        }

        let today = Utc::now().date_naive();
        for event in fresh_events {
            let is_new = !current_ids.contains(&event.id);
            let event_id = event.id.clone();

            // Known events get their orders merged too — a refresh doubles
            // as a catch-up for any updates the socket missed.
            self.store.add_event(event);
            let orders = self.store.orders_snapshot(&event_id).unwrap_or_default();
            self.store.set_stats(&event_id, aggregate(&orders, self.cfg.revenue_policy, today));

            if is_new {
                added.push(event_id);
            }
        }

        let added_count = added.len();
        if !added.is_empty() {
            if let Err(e) = self.control_tx.send(ControlMsg::Subscribe(added)).await {
                warn!("Failed to send Subscribe batch: {e}");
            }
        }

        info!(
            added = added_count,
            removed = removed_count,
            unchanged = unchanged_count,
            total = self.store.event_count(),
            "Event refresh complete: +{added_count} added, -{removed_count} removed, {unchanged_count} unchanged",
        );

        Ok(())
    }
}
