use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::api::health::HealthState;
use crate::config::{RECONNECT_BACKOFF_MS, WS_PING_INTERVAL_SECS, WS_SUBSCRIBE_CHUNK_SIZE};
use crate::error::Result;
use crate::state::OrderStore;
use crate::types::{ControlMsg, UpdateMsg};
use crate::ws::messages::{parse_push_frame, PushFrame};
use crate::ws::subscription::SubscriptionManager;

/// Manages the single persistent socket connection to the ticketing backend.
pub struct WsManager {
    ws_url: String,
    store: Arc<OrderStore>,
    update_tx: mpsc::Sender<UpdateMsg>,
    control_rx: mpsc::Receiver<ControlMsg>,
    health: Arc<HealthState>,
    /// Channel bookkeeping — one channel per tracked event.
    subs: SubscriptionManager,
    /// Total socket frames received since process start (for flow diagnostics).
    frames_received: Arc<AtomicU64>,
    /// Total push updates routed to the consumer.
    updates_routed: Arc<AtomicU64>,
    /// Per-frame-shape counters for diagnostics.
    order_frames: Arc<AtomicU64>,
    sale_frames: Arc<AtomicU64>,
    ref_frames: Arc<AtomicU64>,
}

impl WsManager {
    pub fn new(
        ws_url: String,
        store: Arc<OrderStore>,
        update_tx: mpsc::Sender<UpdateMsg>,
        control_rx: mpsc::Receiver<ControlMsg>,
        health: Arc<HealthState>,
    ) -> Self {
        Self {
            ws_url,
            store,
            update_tx,
            control_rx,
            health,
            subs: SubscriptionManager::new(),
            frames_received: Arc::new(AtomicU64::new(0)),
            updates_routed: Arc::new(AtomicU64::new(0)),
            order_frames: Arc::new(AtomicU64::new(0)),
            sale_frames: Arc::new(AtomicU64::new(0)),
            ref_frames: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn run(mut self) {
        let mut backoff_idx = 0usize;

        loop {
            info!("WS connecting to {}", self.ws_url);
            match self.connect_once().await {
                Ok(()) => {
                    info!("WS connection closed cleanly");
                    backoff_idx = 0;
                }
                Err(e) => {
                    error!("WS connection error: {e}");
                }
            }
            self.health.set_ws_connected(false);

            let delay_ms = RECONNECT_BACKOFF_MS
                .get(backoff_idx)
                .copied()
                .unwrap_or(*RECONNECT_BACKOFF_MS.last().unwrap());
            backoff_idx = (backoff_idx + 1).min(RECONNECT_BACKOFF_MS.len() - 1);

            warn!("WS reconnecting in {delay_ms}ms");
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    async fn connect_once(&mut self) -> Result<()> {
        let (ws_stream, _) = connect_async(&self.ws_url).await?;
        let (mut write, mut read) = ws_stream.split();
        self.health.set_ws_connected(true);

        // Track every event the store knows about. subscribe() only flags
        // channels not already held, so reconnects don't inflate refcounts.
        for event_id in self.store.all_event_ids() {
            if !self.subs.is_subscribed(&event_id) {
                self.subs.subscribe(&event_id);
            }
        }

        // (Re-)announce all active channels in chunks to avoid server-side
        // frame size limits.
        let channels = self.subs.active_channels();
        if !channels.is_empty() {
            let chunks: Vec<_> = channels.chunks(WS_SUBSCRIBE_CHUNK_SIZE).collect();
            let total_chunks = chunks.len();
            for (i, chunk) in chunks.into_iter().enumerate() {
                let sub_msg = build_subscribe_msg(chunk);
                write.send(Message::Text(sub_msg.into())).await?;
                if total_chunks > 1 {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                debug!("WS subscribe chunk {}/{} ({} channels)", i + 1, total_chunks, chunk.len());
            }
            info!("WS subscribed to {} event channels in {} chunk(s)", channels.len(), total_chunks);
        }

        let mut ping_interval = interval(Duration::from_secs(WS_PING_INTERVAL_SECS));
        ping_interval.tick().await; // consume immediate first tick

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(&text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            return Ok(());
                        }
                        Some(Err(e)) => return Err(e.into()),
                        Some(Ok(_)) => {}
                    }
                }

                _ = ping_interval.tick() => {
                    debug!("WS ping");
                    write.send(Message::Ping(vec![].into())).await?;
                }

                ctrl = self.control_rx.recv() => {
                    match ctrl {
                        Some(ControlMsg::Subscribe(event_ids)) => {
                            let fresh: Vec<String> = event_ids
                                .into_iter()
                                .filter(|id| self.subs.subscribe(id))
                                .collect();
                            if !fresh.is_empty() {
                                let sub_msg = build_subscribe_msg(&fresh);
                                write.send(Message::Text(sub_msg.into())).await?;
                                info!("WS dynamically subscribed to {} new channels", fresh.len());
                            }
                        }
                        Some(ControlMsg::Unsubscribe(event_id)) => {
                            if self.subs.unsubscribe(&event_id) {
                                let unsub_msg = build_unsubscribe_msg(&[event_id.clone()]);
                                write.send(Message::Text(unsub_msg.into())).await?;
                                info!("WS unsubscribed event {event_id}");
                            }
                        }
                        None => {
                            // Control channel dropped — shut down
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        let received_at = std::time::Instant::now();
        let received_at_ns = now_ns();

        let total_frames = self.frames_received.fetch_add(1, Ordering::Relaxed) + 1;
        if total_frames % 500 == 0 {
            let routed = self.updates_routed.load(Ordering::Relaxed);
            let orders = self.order_frames.load(Ordering::Relaxed);
            let sales = self.sale_frames.load(Ordering::Relaxed);
            let refs = self.ref_frames.load(Ordering::Relaxed);
            info!(
                frames = total_frames,
                routed,
                orders,
                sales,
                refs,
                "[WS] {total_frames} frames | routed={routed} | order={orders} sale={sales} ref={refs}"
            );
        }

        for frame in parse_push_frame(text) {
            match &frame {
                PushFrame::Order { .. } => self.order_frames.fetch_add(1, Ordering::Relaxed),
                PushFrame::Sale { .. } => self.sale_frames.fetch_add(1, Ordering::Relaxed),
                PushFrame::OrderRef { .. } => self.ref_frames.fetch_add(1, Ordering::Relaxed),
            };

            let msg = UpdateMsg {
                frame,
                received_at_ns,
                received_at,
            };
            self.updates_routed.fetch_add(1, Ordering::Relaxed);
            if let Err(e) = self.update_tx.try_send(msg) {
                warn!("update channel full, dropping message: {e}");
            }
        }
    }
}

/// Build an event-channel subscription message.
fn build_subscribe_msg(event_ids: &[String]) -> String {
    serde_json::json!({
        "type": "subscribe",
        "events": event_ids
    })
    .to_string()
}

fn build_unsubscribe_msg(event_ids: &[String]) -> String {
    serde_json::json!({
        "type": "unsubscribe",
        "events": event_ids
    })
    .to_string()
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
