use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::analytics::buckets::{age_on, AgeBand, PriceBand};
use crate::types::{Order, RevenuePolicy, SaleStatus};

// ---------------------------------------------------------------------------
// Aggregate outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: SaleStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BandCount {
    pub label: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeCount {
    pub label: String,
    pub count: u64,
}

/// Summary statistics over one slice of orders — the numbers behind every
/// dashboard card and chart. Computed in full after each change; there is
/// no delta path.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    pub total_revenue: f64,
    pub tickets_sold: u64,
    pub pending_tickets: u64,
    /// Percentage, one decimal. 0 when nothing was sold or pending.
    pub conversion_rate: f64,
    /// EUR, two decimals. 0 when nothing was sold.
    pub average_ticket_price: f64,
    /// Revenue per calendar month (index 0 = January) of the counted sales.
    pub monthly_revenue: [f64; 12],
    /// One entry per sale status, declaration order, zero counts included.
    pub status_distribution: Vec<StatusCount>,
    /// Five fixed price bands, ascending.
    pub price_distribution: Vec<BandCount>,
    /// Five fixed age bands; sales without a resolvable birthdate are absent.
    pub age_distribution: Vec<BandCount>,
    /// Free-text ticket types in first-seen order.
    pub type_distribution: Vec<TypeCount>,
    /// Distinct account ids across the orders.
    pub total_clients: u64,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Fold a slice of orders into dashboard statistics.
///
/// Pure: the input is read-only and the output freshly allocated. Missing
/// optional fields never fail — a sale without a price counts as 0, one
/// without a creation date stays out of the monthly series, one without a
/// client birthdate stays out of the age distribution. `today` anchors age
/// derivation so callers (and tests) control the clock.
pub fn aggregate(orders: &[Order], policy: RevenuePolicy, today: NaiveDate) -> OrderStats {
    let mut total_revenue = 0.0f64;
    let mut tickets_sold = 0u64;
    let mut pending_tickets = 0u64;
    let mut monthly_revenue = [0.0f64; 12];
    let mut status_counts = [0u64; SaleStatus::ALL.len()];
    let mut price_counts = [0u64; PriceBand::ALL.len()];
    let mut age_counts = [0u64; AgeBand::ALL.len()];
    let mut type_distribution: Vec<TypeCount> = Vec::new();
    let mut accounts: HashSet<&str> = HashSet::new();

    for order in orders {
        if let Some(account) = order.account_id.as_deref() {
            accounts.insert(account);
        }

        for sale in &order.sales {
            status_counts[sale.status as usize] += 1;
            price_counts[PriceBand::from_price(sale.price) as usize] += 1;

            if policy.counts_as_sold(sale.status) {
                total_revenue += sale.price;
                tickets_sold += 1;
                if let Some(created) = sale.created_at {
                    monthly_revenue[created.month0() as usize] += sale.price;
                }
            } else if sale.status == SaleStatus::Pending {
                pending_tickets += 1;
            }

            let band = sale
                .client
                .as_ref()
                .and_then(|c| c.birthdate)
                .and_then(|b| age_on(b.date_naive(), today))
                .and_then(AgeBand::from_age);
            if let Some(band) = band {
                age_counts[band as usize] += 1;
            }

            let label = sale.ticket_type.as_deref().unwrap_or("uncategorized");
            match type_distribution.iter_mut().find(|t| t.label == label) {
                Some(entry) => entry.count += 1,
                None => type_distribution.push(TypeCount { label: label.to_string(), count: 1 }),
            }
        }
    }

    let denominator = tickets_sold + pending_tickets;
    let conversion_rate = if denominator == 0 {
        0.0
    } else {
        round1(tickets_sold as f64 / denominator as f64 * 100.0)
    };
    let average_ticket_price = if tickets_sold == 0 {
        0.0
    } else {
        round2(total_revenue / tickets_sold as f64)
    };

    OrderStats {
        total_revenue,
        tickets_sold,
        pending_tickets,
        conversion_rate,
        average_ticket_price,
        monthly_revenue,
        status_distribution: SaleStatus::ALL
            .iter()
            .zip(status_counts)
            .map(|(&status, count)| StatusCount { status, count })
            .collect(),
        price_distribution: PriceBand::ALL
            .iter()
            .zip(price_counts)
            .map(|(&band, count)| BandCount { label: band.label(), count })
            .collect(),
        age_distribution: AgeBand::ALL
            .iter()
            .zip(age_counts)
            .map(|(&band, count)| BandCount { label: band.label(), count })
            .collect(),
        type_distribution,
        total_clients: accounts.len() as u64,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
