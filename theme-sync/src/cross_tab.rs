//! Same-origin signalling between contexts.
//!
//! Mirrors the storage event a browser fires in every other tab when one tab
//! writes local storage: a message reaches every endpoint except the one that
//! sent it.

use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossTabMessage {
    pub origin: Uuid,
    pub key: String,
    pub value: String,
}

/// Process-wide bus shared by every context that should see each other.
#[derive(Debug, Clone)]
pub struct CrossTabChannel {
    sender: broadcast::Sender<CrossTabMessage>,
}

impl CrossTabChannel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A fresh endpoint with its own identity on the bus
    pub fn endpoint(&self) -> CrossTabEndpoint {
        CrossTabEndpoint {
            id: Uuid::new_v4(),
            sender: self.sender.clone(),
        }
    }
}

impl Default for CrossTabChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// One context's handle on the bus.
#[derive(Debug, Clone)]
pub struct CrossTabEndpoint {
    id: Uuid,
    sender: broadcast::Sender<CrossTabMessage>,
}

impl CrossTabEndpoint {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Announce a write to every other endpoint. Returns how many receivers
    /// were listening, the sender's own listener included.
    pub fn broadcast(&self, key: &str, value: &str) -> usize {
        let message = CrossTabMessage {
            origin: self.id,
            key: key.to_string(),
            value: value.to_string(),
        };
        // No receivers just means no other tab is open
        self.sender.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self) -> CrossTabReceiver {
        CrossTabReceiver {
            id: self.id,
            receiver: self.sender.subscribe(),
        }
    }
}

/// Receives messages from other endpoints only.
#[derive(Debug)]
pub struct CrossTabReceiver {
    id: Uuid,
    receiver: broadcast::Receiver<CrossTabMessage>,
}

impl CrossTabReceiver {
    /// Next message from another endpoint, `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<CrossTabMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if message.origin == self.id => continue,
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Cross-tab listener lagged, skipped {skipped} messages");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_message_reaches_other_endpoints_only() {
        let channel = CrossTabChannel::new();
        let tab_a = channel.endpoint();
        let tab_b = channel.endpoint();

        let mut rx_a = tab_a.subscribe();
        let mut rx_b = tab_b.subscribe();

        tab_a.broadcast("theme", "holi");

        let message = assert_some!(rx_b.recv().await);
        assert_eq!(message.origin, tab_a.id());
        assert_eq!(message.key, "theme");
        assert_eq!(message.value, "holi");

        // The sender never hears its own write
        assert_err!(timeout(Duration::from_millis(50), rx_a.recv()).await);
    }

    #[tokio::test]
    async fn test_broadcast_without_listeners() {
        let channel = CrossTabChannel::new();
        let tab = channel.endpoint();
        assert_eq!(tab.broadcast("theme", "eid"), 0);
    }

    #[tokio::test]
    async fn test_lagged_receiver_keeps_going() {
        let channel = CrossTabChannel::with_capacity(2);
        let sender = channel.endpoint();
        let mut rx = channel.endpoint().subscribe();

        for value in ["holi", "eid", "diwali", "christmas"] {
            sender.broadcast("theme", value);
        }

        let message = assert_some!(rx.recv().await);
        assert_eq!(message.value, "diwali");
        let message = assert_some!(rx.recv().await);
        assert_eq!(message.value, "christmas");
    }

    #[tokio::test]
    async fn test_recv_ends_when_bus_dropped() {
        let channel = CrossTabChannel::new();
        let endpoint = channel.endpoint();
        let mut rx = endpoint.subscribe();

        drop(endpoint);
        drop(channel);
        assert_none!(rx.recv().await);
    }
}
