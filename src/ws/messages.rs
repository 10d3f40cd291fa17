use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use tracing::warn;

use crate::types::{Order, PushKind, Sale};

static PARSE_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Raw deserializable shape covering all push-channel messages.
/// Fields are optional because different event types carry different subsets.
#[derive(Debug, Deserialize)]
struct RawPushMsg {
    pub event: Option<String>,
    /// Full updated order — `order-created` and re-pushed order updates.
    pub order: Option<Order>,
    /// Present on ticket-level events and on identifier-only frames.
    #[serde(rename = "orderId")]
    pub order_id: Option<String>,
    /// Full updated sale — `ticket-minted`, `ticket-resale`, `transfer-created`.
    #[serde(rename = "ticket")]
    pub sale: Option<Sale>,
}

/// Parsed event from a single push message object.
#[derive(Debug, Clone)]
pub enum PushFrame {
    /// Full updated order payload, ready to merge.
    Order { kind: PushKind, order: Box<Order> },
    /// Full updated sale nested under a known order.
    Sale {
        kind: PushKind,
        order_id: String,
        sale: Box<Sale>,
    },
    /// Identifier-only frame; the consumer resolves the order over REST
    /// before merging.
    OrderRef { kind: PushKind, order_id: String },
}

/// Parse a raw socket text frame into zero or more push events.
///
/// The backend delivers either a single JSON object or an array of objects.
/// Each object names its channel event (`order-created`, `ticket-minted`,
/// `ticket-resale`, `transfer-created`) and carries either a full entity
/// payload or just an order identifier.
pub fn parse_push_frame(raw: &str) -> Vec<PushFrame> {
    let msgs: Vec<RawPushMsg> = if raw.trim_start().starts_with('[') {
        serde_json::from_str(raw).unwrap_or_default()
    } else {
        match serde_json::from_str::<RawPushMsg>(raw) {
            Ok(m) => vec![m],
            Err(_) => vec![],
        }
    };

    if msgs.is_empty() {
        let count = PARSE_FAILURES.fetch_add(1, Ordering::Relaxed) + 1;
        if count <= 10 || count % 1000 == 0 {
            let sample = &raw[..500.min(raw.len())];
            warn!(count, "[PUSH PARSE] unrecognized frame: {sample}");
        }
        return vec![];
    }

    let mut frames = Vec::new();
    for msg in msgs {
        expand_raw_msg(msg, &mut frames);
    }
    frames
}

fn expand_raw_msg(msg: RawPushMsg, out: &mut Vec<PushFrame>) {
    let Some(kind) = msg.event.as_deref().and_then(parse_push_kind) else {
        return;
    };

    if let Some(order) = msg.order {
        out.push(PushFrame::Order { kind, order: Box::new(order) });
        return;
    }

    if let Some(sale) = msg.sale {
        // The order reference may ride on the frame or on the ticket itself.
        let order_id = msg.order_id.or_else(|| sale.order_id.clone());
        match order_id {
            Some(order_id) => out.push(PushFrame::Sale {
                kind,
                order_id,
                sale: Box::new(sale),
            }),
            None => warn!(event = %kind, ticket = %sale.id, "push frame missing order reference, dropped"),
        }
        return;
    }

    if let Some(order_id) = msg.order_id {
        out.push(PushFrame::OrderRef { kind, order_id });
    }
}

fn parse_push_kind(s: &str) -> Option<PushKind> {
    match s {
        "order-created" => Some(PushKind::OrderCreated),
        "ticket-minted" => Some(PushKind::TicketMinted),
        "ticket-resale" => Some(PushKind::TicketResale),
        "transfer-created" => Some(PushKind::TransferCreated),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleStatus;

    #[test]
    fn parses_full_order_payload() {
        let raw = r#"{"event":"order-created","order":{"_id":"o1","event":"ev1","sales":[{"_id":"s1","status":"PENDING","price":20.0}]}}"#;
        let frames = parse_push_frame(raw);
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            PushFrame::Order { kind, order } => {
                assert_eq!(*kind, PushKind::OrderCreated);
                assert_eq!(order.id, "o1");
                assert_eq!(order.event_id.as_deref(), Some("ev1"));
                assert_eq!(order.sales.len(), 1);
                assert_eq!(order.sales[0].status, SaleStatus::Pending);
            }
            other => panic!("expected Order, got {other:?}"),
        }
    }

    #[test]
    fn parses_ticket_frame_with_order_id() {
        let raw = r#"{"event":"ticket-minted","orderId":"o1","ticket":{"_id":"s2","status":"OPEN","price":35.5}}"#;
        let frames = parse_push_frame(raw);
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            PushFrame::Sale { kind, order_id, sale } => {
                assert_eq!(*kind, PushKind::TicketMinted);
                assert_eq!(order_id, "o1");
                assert_eq!(sale.id, "s2");
                assert!((sale.price - 35.5).abs() < 1e-9);
            }
            other => panic!("expected Sale, got {other:?}"),
        }
    }

    #[test]
    fn ticket_frame_falls_back_to_order_ref_on_the_ticket() {
        let raw = r#"{"event":"ticket-resale","ticket":{"_id":"s3","orderId":"o7","status":"SALE"}}"#;
        let frames = parse_push_frame(raw);
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            PushFrame::Sale { order_id, .. } => assert_eq!(order_id, "o7"),
            other => panic!("expected Sale, got {other:?}"),
        }
    }

    #[test]
    fn ticket_frame_without_any_order_reference_is_dropped() {
        let raw = r#"{"event":"transfer-created","ticket":{"_id":"s4","status":"TRANSFERED"}}"#;
        let frames = parse_push_frame(raw);
        assert!(frames.is_empty());
    }

    #[test]
    fn parses_identifier_only_frame() {
        let raw = r#"{"event":"order-created","orderId":"o9"}"#;
        let frames = parse_push_frame(raw);
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            PushFrame::OrderRef { kind, order_id } => {
                assert_eq!(*kind, PushKind::OrderCreated);
                assert_eq!(order_id, "o9");
            }
            other => panic!("expected OrderRef, got {other:?}"),
        }
    }

    #[test]
    fn parses_array_of_frames() {
        let raw = r#"[{"event":"order-created","orderId":"o1"},{"event":"ticket-minted","orderId":"o1","ticket":{"_id":"s1","status":"OPEN"}}]"#;
        let frames = parse_push_frame(raw);
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn unknown_event_name_returns_empty() {
        let raw = r#"{"event":"coupon-redeemed","orderId":"o1"}"#;
        let frames = parse_push_frame(raw);
        assert!(frames.is_empty());
    }

    #[test]
    fn garbage_returns_empty() {
        let raw = r#"{"totally":"unrelated"}"#;
        let frames = parse_push_frame(raw);
        assert!(frames.is_empty());
    }
}
