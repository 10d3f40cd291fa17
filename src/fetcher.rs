use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::{Account, Event, Order};

#[derive(Debug, Default)]
pub struct FetchStats {
    pub api_total: usize,
    pub skipped_malformed: usize,
    pub orders: usize,
    pub sales: usize,
    /// Sample of parse errors from skipped entities.
    pub malformed_samples: Vec<String>,
}

fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?)
}

/// Parse a JSON array item-by-item, skipping entities the backend sent in a
/// shape we cannot read. The backend does not guarantee complete documents,
/// so one malformed entity must not sink the whole fetch.
fn parse_entity_list<T: DeserializeOwned>(
    items: Vec<serde_json::Value>,
    stats: &mut FetchStats,
) -> Vec<T> {
    let mut parsed = Vec::with_capacity(items.len());
    stats.api_total += items.len();

    for item in items {
        match serde_json::from_value::<T>(item) {
            Ok(entity) => parsed.push(entity),
            Err(e) => {
                stats.skipped_malformed += 1;
                if stats.malformed_samples.len() < 10 {
                    stats.malformed_samples.push(e.to_string());
                }
            }
        }
    }
    parsed
}

/// Fetch the promoter's event list, with embedded orders and sales.
pub async fn fetch_events(cfg: &Config) -> Result<(Vec<Event>, FetchStats)> {
    let client = http_client()?;
    let url = format!("{}/events", cfg.api_url);

    let resp: serde_json::Value = client.get(&url).send().await?.json().await?;
    let items = match resp {
        serde_json::Value::Array(a) => a,
        _ => {
            return Err(AppError::Bootstrap(
                "GET /events response was not an array".to_string(),
            ))
        }
    };

    let mut stats = FetchStats::default();
    let events: Vec<Event> = parse_entity_list(items, &mut stats);

    for event in &events {
        stats.orders += event.orders.len();
        stats.sales += event.orders.iter().map(|o| o.sales.len()).sum::<usize>();
    }
    if stats.skipped_malformed > 0 {
        warn!(
            skipped = stats.skipped_malformed,
            "skipped malformed events during bootstrap: {:?}", stats.malformed_samples
        );
    }

    Ok((events, stats))
}

pub async fn get_event(cfg: &Config, event_id: &str) -> Result<Event> {
    let client = http_client()?;
    let url = format!("{}/events/{}", cfg.api_url, event_id);
    let resp: serde_json::Value = client.get(&url).send().await?.json().await?;
    Ok(serde_json::from_value(resp)?)
}

pub async fn get_clients(cfg: &Config) -> Result<(Vec<Account>, FetchStats)> {
    let client = http_client()?;
    let url = format!("{}/clients", cfg.api_url);
    let resp: serde_json::Value = client.get(&url).send().await?.json().await?;
    let items = match resp {
        serde_json::Value::Array(a) => a,
        _ => {
            return Err(AppError::Bootstrap(
                "GET /clients response was not an array".to_string(),
            ))
        }
    };
    let mut stats = FetchStats::default();
    let accounts = parse_entity_list(items, &mut stats);
    Ok((accounts, stats))
}

pub async fn get_client(cfg: &Config, client_id: &str) -> Result<Account> {
    let client = http_client()?;
    let url = format!("{}/clients/{}", cfg.api_url, client_id);
    let resp: serde_json::Value = client.get(&url).send().await?.json().await?;
    Ok(serde_json::from_value(resp)?)
}

/// Resolve a single order — the follow-up for identifier-only push frames.
pub async fn get_order(cfg: &Config, order_id: &str) -> Result<Order> {
    let client = http_client()?;
    let url = format!("{}/orders/{}", cfg.api_url, order_id);
    let resp: serde_json::Value = client.get(&url).send().await?.json().await?;
    Ok(serde_json::from_value(resp)?)
}
