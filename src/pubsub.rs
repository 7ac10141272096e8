use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

use crate::resp::Value;

/// A sink: accepts a protocol value for transmission to one specific
/// connection. The receiving half is drained by that connection's task,
/// which is the only writer to its socket.
pub type Sink = mpsc::UnboundedSender<Value>;
pub type SinkReceiver = mpsc::UnboundedReceiver<Value>;

/// Registry for pub/sub channel subscriptions.
///
/// Each subscribe-invocation registers one sink, so a connection that
/// subscribes to the same channel twice holds two registrations and gets
/// every publish twice. Registration order per channel is preserved.
pub struct PubSubRegistry {
    /// channel name -> ordered subscriber registrations
    channels: HashMap<String, Vec<(u64, Sink)>>,
    /// client_id -> channels it holds registrations on (disconnect cleanup)
    client_channels: HashMap<u64, HashSet<String>>,
}

impl Default for PubSubRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PubSubRegistry {
    pub fn new() -> Self {
        PubSubRegistry {
            channels: HashMap::new(),
            client_channels: HashMap::new(),
        }
    }

    /// Register a sink on a channel.
    pub fn subscribe(&mut self, client_id: u64, channel: &str, sink: Sink) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .push((client_id, sink));
        self.client_channels
            .entry(client_id)
            .or_default()
            .insert(channel.to_string());
    }

    /// Publish a message to a channel. Delivery is fire-and-forget: the
    /// returned count is the number of sinks *attempted*, and a sink whose
    /// connection is gone neither blocks the others nor reduces it.
    pub fn publish(&self, channel: &str, message: &[u8]) -> usize {
        let Some(subscribers) = self.channels.get(channel) else {
            return 0;
        };

        for (_, sink) in subscribers {
            let msg = Value::array(vec![
                Value::bulk_string(b"message".to_vec()),
                Value::bulk_string(channel.as_bytes().to_vec()),
                Value::bulk_string(message.to_vec()),
            ]);
            let _ = sink.send(msg);
        }
        subscribers.len()
    }

    /// Remove every registration held by a client (called on disconnect).
    pub fn unsubscribe_all(&mut self, client_id: u64) {
        if let Some(chans) = self.client_channels.remove(&client_id) {
            for channel in chans {
                if let Some(subscribers) = self.channels.get_mut(&channel) {
                    subscribers.retain(|(id, _)| *id != client_id);
                    if subscribers.is_empty() {
                        self.channels.remove(&channel);
                    }
                }
            }
        }
    }

    /// Number of registrations on a channel.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, |subs| subs.len())
    }
}

pub type SharedPubSub = Arc<RwLock<PubSubRegistry>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn message(channel: &str, payload: &str) -> Value {
        Value::array(vec![
            Value::bulk_string(b"message".to_vec()),
            Value::bulk_string(channel.as_bytes().to_vec()),
            Value::bulk_string(payload.as_bytes().to_vec()),
        ])
    }

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        let mut registry = PubSubRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry.subscribe(1, "c", tx1);
        registry.subscribe(2, "c", tx2);

        assert_eq!(registry.publish("c", b"hi"), 2);
        assert_eq!(rx1.recv().await.unwrap(), message("c", "hi"));
        assert_eq!(rx2.recv().await.unwrap(), message("c", "hi"));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let registry = PubSubRegistry::new();
        assert_eq!(registry.publish("nobody", b"hi"), 0);
    }

    #[test]
    fn test_dead_sink_still_counts() {
        let mut registry = PubSubRegistry::new();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel::<Value>();
        drop(rx_dead);
        registry.subscribe(1, "c", tx_dead);
        registry.subscribe(2, "c", tx_live);

        // Count reflects attempted delivery, and the dead sink does not
        // prevent the live one from receiving.
        assert_eq!(registry.publish("c", b"hi"), 2);
        assert_eq!(rx_live.try_recv().unwrap(), message("c", "hi"));
    }

    #[test]
    fn test_duplicate_subscription_delivers_twice() {
        let mut registry = PubSubRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.subscribe(1, "c", tx.clone());
        registry.subscribe(1, "c", tx);

        assert_eq!(registry.publish("c", b"hi"), 2);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unsubscribe_all_drops_registrations() {
        let mut registry = PubSubRegistry::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry.subscribe(1, "c", tx1.clone());
        registry.subscribe(1, "d", tx1);
        registry.subscribe(2, "c", tx2.clone());

        registry.unsubscribe_all(1);
        assert_eq!(registry.subscriber_count("c"), 1);
        assert_eq!(registry.subscriber_count("d"), 0);
        assert_eq!(registry.publish("c", b"hi"), 1);
        assert!(rx2.try_recv().is_ok());
    }
}
