use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ---------------------------------------------------------------------------
// Lifecycle enums
// ---------------------------------------------------------------------------

/// Ticket lifecycle status. Wire spellings are preserved verbatim — the
/// backend sends `TRANSFERED` with one R.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleStatus {
    Pending,
    Processing,
    Open,
    Sale,
    Sold,
    Closed,
    Expired,
    Transfered,
}

impl SaleStatus {
    /// Every status, in declaration order. Distributions cover all of these
    /// even when a count is zero.
    pub const ALL: [SaleStatus; 8] = [
        SaleStatus::Pending,
        SaleStatus::Processing,
        SaleStatus::Open,
        SaleStatus::Sale,
        SaleStatus::Sold,
        SaleStatus::Closed,
        SaleStatus::Expired,
        SaleStatus::Transfered,
    ];
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SaleStatus::Pending => "PENDING",
            SaleStatus::Processing => "PROCESSING",
            SaleStatus::Open => "OPEN",
            SaleStatus::Sale => "SALE",
            SaleStatus::Sold => "SOLD",
            SaleStatus::Closed => "CLOSED",
            SaleStatus::Expired => "EXPIRED",
            SaleStatus::Transfered => "TRANSFERED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Succeeded,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Succeeded => write!(f, "SUCCEEDED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Hold,
    Created,
    Launched,
    Live,
    Closed,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Hold => "HOLD",
            EventStatus::Created => "CREATED",
            EventStatus::Launched => "LAUNCHED",
            EventStatus::Live => "LIVE",
            EventStatus::Closed => "CLOSED",
        };
        write!(f, "{s}")
    }
}

/// Activity kind on a ticket's history trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityKind {
    Pending,
    Processing,
    Processed,
    Granted,
    Denied,
    Transfering,
    Transfered,
}

// ---------------------------------------------------------------------------
// Revenue counting policy
// ---------------------------------------------------------------------------

/// Which sale statuses count toward revenue and tickets-sold.
///
/// The backend's dashboards historically disagreed on whether EXPIRED sales
/// count; the rule is now a single policy selected once via REVENUE_POLICY
/// instead of varying per screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevenuePolicy {
    /// OPEN, SALE and CLOSED count.
    Standard,
    /// OPEN, SALE, CLOSED and EXPIRED count.
    IncludeExpired,
}

impl RevenuePolicy {
    pub fn counts_as_sold(self, status: SaleStatus) -> bool {
        match status {
            SaleStatus::Open | SaleStatus::Sale | SaleStatus::Closed => true,
            SaleStatus::Expired => self == RevenuePolicy::IncludeExpired,
            _ => false,
        }
    }
}

impl std::fmt::Display for RevenuePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevenuePolicy::Standard => write!(f, "standard"),
            RevenuePolicy::IncludeExpired => write!(f, "include_expired"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sale
// ---------------------------------------------------------------------------

/// Parent event reference carried on each ticket.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventRef {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: Option<String>,
    pub address: Option<String>,
}

/// The ticket holder. The backend does not guarantee demographic fields.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub birthdate: Option<DateTime<Utc>>,
}

/// Secondary-market re-listing of an issued ticket.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResaleInfo {
    pub price: Option<f64>,
    pub listed_at: Option<DateTime<Utc>>,
}

/// One entry on a ticket's activity trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub kind: ActivityKind,
    pub at: Option<DateTime<Utc>>,
    pub status: Option<SaleStatus>,
}

/// A single ticket instance within an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(alias = "_id")]
    pub id: String,
    pub order_id: Option<String>,
    pub event: Option<EventRef>,
    pub client: Option<ClientInfo>,
    /// Face price in EUR. Absent on the wire means 0.
    #[serde(default)]
    pub price: f64,
    pub status: SaleStatus,
    /// Ticket type label from the event's catalog ("early bird", "VIP", …).
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub resale: Option<ResaleInfo>,
    #[serde(default)]
    pub is_resale: bool,
    #[serde(default)]
    pub is_transfer: bool,
    #[serde(default)]
    pub is_invitation: bool,
    #[serde(default)]
    pub activity: Vec<ActivityRecord>,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// Buyer contact captured at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// A purchase transaction grouping one or more sales under one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "account")]
    pub account_id: Option<String>,
    #[serde(alias = "event")]
    pub event_id: Option<String>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    pub contact: Option<ContactInfo>,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub launch: Option<DateTime<Utc>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResalePolicy {
    #[serde(default)]
    pub is_resale: bool,
    #[serde(default)]
    pub is_active: bool,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub royalty_percent: Option<f64>,
}

/// One entry in an event's flat ticket catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketType {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub amount: u32,
    #[serde(default)]
    pub price: f64,
}

/// A tiered ticket lot (catalog alternative to the flat type list).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketLot {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TicketType>,
}

/// A ticketed happening with a date window, capacity and ticket catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub artists: Vec<String>,
    pub date_time: Option<EventDateTime>,
    pub status: EventStatus,
    #[serde(default)]
    pub orders: Vec<Order>,
    pub resale: Option<ResalePolicy>,
    #[serde(default)]
    pub ticket_types: Vec<TicketType>,
    #[serde(default)]
    pub lots: Vec<TicketLot>,
}

// ---------------------------------------------------------------------------
// Account (promoter's customer as seen on the User screen)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub birthdate: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

// ---------------------------------------------------------------------------
// Channel message types
// ---------------------------------------------------------------------------

/// Push-channel event names the backend emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    OrderCreated,
    TicketMinted,
    TicketResale,
    TransferCreated,
}

impl std::fmt::Display for PushKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PushKind::OrderCreated => "order-created",
            PushKind::TicketMinted => "ticket-minted",
            PushKind::TicketResale => "ticket-resale",
            PushKind::TransferCreated => "transfer-created",
        };
        write!(f, "{s}")
    }
}

/// Routed from the socket manager to the update consumer.
#[derive(Debug, Clone)]
pub struct UpdateMsg {
    pub frame: crate::ws::messages::PushFrame,
    /// Nanosecond UTC epoch of when the frame was received.
    pub received_at_ns: u64,
    /// For latency measurement — not sent over the wire.
    pub received_at: Instant,
}

/// Control messages for dynamic channel subscription management.
#[derive(Debug)]
pub enum ControlMsg {
    Subscribe(Vec<String>),
    Unsubscribe(String),
}
