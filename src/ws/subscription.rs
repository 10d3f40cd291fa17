use std::collections::HashMap;

/// Ref-counted channel subscription bookkeeping.
///
/// Wire traffic happens only on the 0→1 and 1→0 transitions, so repeated
/// refresh ticks or overlapping consumers never double-subscribe a channel.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    counts: HashMap<String, usize>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when this call takes the channel from zero subscribers
    /// to one — the caller must put a subscribe frame on the wire.
    pub fn subscribe(&mut self, channel: &str) -> bool {
        let count = self.counts.entry(channel.to_string()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Returns true when this call releases the last subscriber — the
    /// caller must put an unsubscribe frame on the wire. Unknown channels
    /// are a no-op.
    pub fn unsubscribe(&mut self, channel: &str) -> bool {
        match self.counts.get_mut(channel) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.counts.remove(channel);
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.counts.contains_key(channel)
    }

    /// Channels with at least one subscriber — used to rebuild server-side
    /// state after a reconnect.
    pub fn active_channels(&self) -> Vec<String> {
        self.counts.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_subscribe_hits_the_wire() {
        let mut subs = SubscriptionManager::new();
        assert!(subs.subscribe("ev1"));
        assert!(!subs.subscribe("ev1"));
        assert!(subs.is_subscribed("ev1"));
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn unsubscribe_fires_only_on_the_last_release() {
        let mut subs = SubscriptionManager::new();
        subs.subscribe("ev1");
        subs.subscribe("ev1");

        assert!(!subs.unsubscribe("ev1"));
        assert!(subs.is_subscribed("ev1"));
        assert!(subs.unsubscribe("ev1"));
        assert!(!subs.is_subscribed("ev1"));
    }

    #[test]
    fn unknown_channel_unsubscribe_is_a_noop() {
        let mut subs = SubscriptionManager::new();
        assert!(!subs.unsubscribe("ev1"));
    }

    #[test]
    fn active_channels_reflect_live_subscriptions() {
        let mut subs = SubscriptionManager::new();
        subs.subscribe("ev1");
        subs.subscribe("ev2");
        subs.unsubscribe("ev1");

        assert_eq!(subs.active_channels(), vec!["ev2".to_string()]);
    }
}
