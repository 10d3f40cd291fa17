use crate::error::{AppError, Result};
use crate::types::RevenuePolicy;

pub const API_URL: &str = "http://localhost:4000/api";
pub const WS_URL: &str = "ws://localhost:4000/socket";

/// Heartbeat ping interval (seconds).
pub const WS_PING_INTERVAL_SECS: u64 = 30;

/// Reconnect backoff values in milliseconds.
pub const RECONNECT_BACKOFF_MS: &[u64] = &[100, 200, 400, 800];

/// Channel capacity for internal message routing.
pub const CHANNEL_CAPACITY: usize = 1024;

/// Event catalog refresh interval (seconds) — how often to re-fetch the
/// promoter's event list from the backend.
pub const EVENT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Maximum event channels per WS subscribe frame to avoid server-side size limits.
pub const WS_SUBSCRIBE_CHUNK_SIZE: usize = 100;

/// Ticket price band upper bounds (EUR, inclusive).
pub mod price_bands {
    pub const LOW_MAX: f64 = 10.0;
    pub const BUDGET_MAX: f64 = 25.0;
    pub const STANDARD_MAX: f64 = 50.0;
    pub const PREMIUM_MAX: f64 = 100.0;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub ws_url: String,
    pub log_level: String,
    pub api_port: u16,
    /// Which sale statuses count toward revenue and tickets-sold (REVENUE_POLICY).
    /// Fixed once at startup; never varies per call site.
    pub revenue_policy: RevenuePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let revenue_policy = match std::env::var("REVENUE_POLICY") {
            Err(_) => RevenuePolicy::Standard,
            Ok(raw) => match raw.as_str() {
                "standard" => RevenuePolicy::Standard,
                "include_expired" => RevenuePolicy::IncludeExpired,
                other => {
                    return Err(AppError::Config(format!(
                        "REVENUE_POLICY must be 'standard' or 'include_expired', got '{other}'"
                    )))
                }
            },
        };

        Ok(Self {
            api_url: std::env::var("API_URL").unwrap_or_else(|_| API_URL.to_string()),
            ws_url: std::env::var("WS_URL").unwrap_or_else(|_| WS_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            revenue_policy,
        })
    }
}
