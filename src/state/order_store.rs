use std::sync::Arc;

use dashmap::DashMap;

use crate::analytics::OrderStats;
use crate::types::{Event, Order, Sale};

// ---------------------------------------------------------------------------
// Merge primitives
// ---------------------------------------------------------------------------

/// Fold an updated order into an ordered collection.
///
/// A matching id updates that order in place (position preserved): scalar
/// fields are taken from the incoming payload and sales are merged
/// entry-by-entry, so sales present only in the old version survive the new
/// version's absence. An unknown id prepends the order at the front.
pub fn merge_order(orders: &mut Vec<Order>, incoming: Order) {
    let Some(existing) = orders.iter_mut().find(|o| o.id == incoming.id) else {
        orders.insert(0, incoming);
        return;
    };

    let Order { id: _, account_id, event_id, sales, contact, status, created_at } = incoming;
    existing.account_id = account_id;
    existing.event_id = event_id;
    existing.contact = contact;
    existing.status = status;
    existing.created_at = created_at;
    for sale in sales {
        merge_sale(&mut existing.sales, sale);
    }
}

/// Replace the matching sale by id, leaving siblings untouched.
/// An unknown id appends — a freshly minted ticket is new by definition.
pub fn merge_sale(sales: &mut Vec<Sale>, incoming: Sale) {
    match sales.iter_mut().find(|s| s.id == incoming.id) {
        Some(slot) => *slot = incoming,
        None => sales.push(incoming),
    }
}

// ---------------------------------------------------------------------------
// OrderStore
// ---------------------------------------------------------------------------

/// In-memory order state shared between the update consumer and the API.
///
/// Orders are held per event in receipt order; aggregates are recomputed in
/// full after every merge and cached here for the read path.
pub struct OrderStore {
    /// event_id → event metadata (orders are held separately)
    events: DashMap<String, Event>,
    /// event_id → ordered order collection
    orders: DashMap<String, Vec<Order>>,
    /// event_id → cached aggregates
    stats: DashMap<String, OrderStats>,
}

impl OrderStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: DashMap::new(),
            orders: DashMap::new(),
            stats: DashMap::new(),
        })
    }

    /// Register an event, splitting its embedded orders into the order map.
    /// Re-adding an already known event merges its orders rather than
    /// replacing the collection.
    pub fn add_event(&self, mut event: Event) {
        let incoming_orders = std::mem::take(&mut event.orders);
        let event_id = event.id.clone();

        let mut orders = self.orders.entry(event_id.clone()).or_default();
        for order in incoming_orders {
            merge_order(&mut orders, order);
        }
        drop(orders);

        self.events.insert(event_id, event);
    }

    pub fn add_events(&self, events: Vec<Event>) {
        for event in events {
            self.add_event(event);
        }
    }

    pub fn remove_event(&self, event_id: &str) {
        self.events.remove(event_id);
        self.orders.remove(event_id);
        self.stats.remove(event_id);
    }

    pub fn contains_event(&self, event_id: &str) -> bool {
        self.events.contains_key(event_id)
    }

    pub fn get_event(&self, event_id: &str) -> Option<Event> {
        self.events.get(event_id).map(|e| e.clone())
    }

    pub fn all_event_ids(&self) -> Vec<String> {
        self.events.iter().map(|e| e.key().clone()).collect()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.iter().map(|e| e.value().len()).sum()
    }

    /// Fold an updated order into the event's collection.
    pub fn apply_order_update(&self, event_id: &str, incoming: Order) {
        let mut orders = self.orders.entry(event_id.to_string()).or_default();
        merge_order(&mut orders, incoming);
    }

    /// Fold an updated sale into its parent order. Returns the owning
    /// event id, or None when no tracked order matches.
    pub fn apply_sale_update(&self, order_id: &str, incoming: Sale) -> Option<String> {
        for mut entry in self.orders.iter_mut() {
            if let Some(order) = entry.value_mut().iter_mut().find(|o| o.id == order_id) {
                merge_sale(&mut order.sales, incoming);
                return Some(entry.key().clone());
            }
        }
        None
    }

    /// Which event's collection holds the given order, if any.
    pub fn find_event_for_order(&self, order_id: &str) -> Option<String> {
        self.orders
            .iter()
            .find(|entry| entry.value().iter().any(|o| o.id == order_id))
            .map(|entry| entry.key().clone())
    }

    /// A fresh copy of one event's ordered order collection.
    pub fn orders_snapshot(&self, event_id: &str) -> Option<Vec<Order>> {
        self.orders.get(event_id).map(|o| o.clone())
    }

    /// A fresh copy of every tracked order across all events.
    pub fn all_orders_snapshot(&self) -> Vec<Order> {
        self.orders.iter().flat_map(|e| e.value().clone()).collect()
    }

    pub fn set_stats(&self, event_id: &str, stats: OrderStats) {
        self.stats.insert(event_id.to_string(), stats);
    }

    pub fn stats(&self, event_id: &str) -> Option<OrderStats> {
        self.stats.get(event_id).map(|s| s.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContactInfo, EventStatus, OrderStatus, SaleStatus};

    fn sale(id: &str, status: SaleStatus, price: f64) -> Sale {
        Sale {
            id: id.to_string(),
            order_id: None,
            event: None,
            client: None,
            price,
            status,
            ticket_type: None,
            created_at: None,
            resale: None,
            is_resale: false,
            is_transfer: false,
            is_invitation: false,
            activity: Vec::new(),
        }
    }

    fn order(id: &str, sales: Vec<Sale>) -> Order {
        Order {
            id: id.to_string(),
            account_id: Some("acct1".to_string()),
            event_id: Some("ev1".to_string()),
            sales,
            contact: None,
            status: OrderStatus::Pending,
            created_at: None,
        }
    }

    fn test_event(id: &str, orders: Vec<Order>) -> Event {
        Event {
            id: id.to_string(),
            name: Some("Test".to_string()),
            location: None,
            capacity: None,
            genres: Vec::new(),
            artists: Vec::new(),
            date_time: None,
            status: EventStatus::Live,
            orders,
            resale: None,
            ticket_types: Vec::new(),
            lots: Vec::new(),
        }
    }

    #[test]
    fn unknown_order_is_prepended() {
        let mut orders = vec![order("o1", vec![]), order("o2", vec![])];
        merge_order(&mut orders, order("o3", vec![]));

        assert_eq!(orders.len(), 3);
        assert_eq!(orders[0].id, "o3");
        assert_eq!(orders[1].id, "o1");
        assert_eq!(orders[2].id, "o2");
    }

    #[test]
    fn known_order_keeps_its_position() {
        let mut orders = vec![order("o1", vec![]), order("o2", vec![])];
        let mut update = order("o2", vec![]);
        update.status = OrderStatus::Succeeded;
        merge_order(&mut orders, update);

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[1].id, "o2");
        assert_eq!(orders[1].status, OrderStatus::Succeeded);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut once = vec![order("o1", vec![sale("s1", SaleStatus::Pending, 10.0)])];
        let update = order("o1", vec![sale("s1", SaleStatus::Open, 10.0)]);

        merge_order(&mut once, update.clone());
        let mut twice = once.clone();
        merge_order(&mut twice, update);

        assert_eq!(once.len(), twice.len());
        assert_eq!(once[0].sales.len(), twice[0].sales.len());
        assert_eq!(once[0].sales[0].status, twice[0].sales[0].status);
    }

    #[test]
    fn sales_absent_from_update_are_not_deleted() {
        let mut orders = vec![order(
            "o1",
            vec![sale("s1", SaleStatus::Open, 10.0), sale("s2", SaleStatus::Pending, 15.0)],
        )];
        // update carries only s2, now OPEN
        merge_order(&mut orders, order("o1", vec![sale("s2", SaleStatus::Open, 15.0)]));

        assert_eq!(orders[0].sales.len(), 2);
        assert_eq!(orders[0].sales[0].id, "s1");
        assert_eq!(orders[0].sales[0].status, SaleStatus::Open);
        assert_eq!(orders[0].sales[1].id, "s2");
        assert_eq!(orders[0].sales[1].status, SaleStatus::Open);
    }

    #[test]
    fn order_update_replaces_scalar_fields() {
        let mut orders = vec![order("o1", vec![])];
        let mut update = order("o1", vec![]);
        update.contact = Some(ContactInfo {
            name: Some("Ada".to_string()),
            last_name: None,
            email: None,
        });
        merge_order(&mut orders, update);

        assert_eq!(orders[0].contact.as_ref().unwrap().name.as_deref(), Some("Ada"));
    }

    #[test]
    fn sale_update_replaces_only_the_matching_sale() {
        let mut sales = vec![sale("s1", SaleStatus::Pending, 10.0), sale("s2", SaleStatus::Pending, 15.0)];
        merge_sale(&mut sales, sale("s1", SaleStatus::Sale, 10.0));

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].status, SaleStatus::Sale);
        assert_eq!(sales[1].status, SaleStatus::Pending);
    }

    #[test]
    fn unknown_sale_is_appended() {
        let mut sales = vec![sale("s1", SaleStatus::Open, 10.0)];
        merge_sale(&mut sales, sale("s2", SaleStatus::Pending, 20.0));

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[1].id, "s2");
    }

    #[test]
    fn store_routes_sale_updates_to_the_owning_event() {
        let store = OrderStore::new();
        store.add_event(test_event("ev1", vec![order("o1", vec![sale("s1", SaleStatus::Pending, 10.0)])]));
        store.add_event(test_event("ev2", vec![order("o2", vec![])]));

        let hit = store.apply_sale_update("o1", sale("s1", SaleStatus::Open, 10.0));
        assert_eq!(hit.as_deref(), Some("ev1"));
        let snapshot = store.orders_snapshot("ev1").unwrap();
        assert_eq!(snapshot[0].sales[0].status, SaleStatus::Open);

        let miss = store.apply_sale_update("o9", sale("s9", SaleStatus::Open, 10.0));
        assert!(miss.is_none());
    }

    #[test]
    fn re_adding_an_event_merges_orders() {
        let store = OrderStore::new();
        store.add_event(test_event("ev1", vec![order("o1", vec![])]));
        store.add_event(test_event("ev1", vec![order("o2", vec![])]));

        let snapshot = store.orders_snapshot("ev1").unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.event_count(), 1);
    }
}
