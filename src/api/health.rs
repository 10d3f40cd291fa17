//! Shared health state for the /health endpoint.
//! Updated by WsManager and the update consumer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Shared health metrics. Updated by pipeline components, read by API.
#[derive(Default)]
pub struct HealthState {
    /// True when the socket is connected and in the main loop.
    pub ws_connected: AtomicBool,
    /// Nanosecond timestamp of the last applied push update (0 = none).
    pub last_update_at_ns: AtomicU64,
    /// Total push updates folded into the store since process start.
    pub updates_applied: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ws_connected(&self, v: bool) {
        self.ws_connected.store(v, Ordering::Relaxed);
    }

    pub fn set_last_update_at_ns(&self, ns: u64) {
        self.last_update_at_ns.store(ns, Ordering::Relaxed);
    }

    pub fn inc_updates_applied(&self) {
        self.updates_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ws_connected(&self) -> bool {
        self.ws_connected.load(Ordering::Relaxed)
    }

    pub fn last_update_at_ns(&self) -> u64 {
        self.last_update_at_ns.load(Ordering::Relaxed)
    }

    pub fn updates_applied(&self) -> u64 {
        self.updates_applied.load(Ordering::Relaxed)
    }
}
