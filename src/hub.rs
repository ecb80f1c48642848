//! Connection hub: outbound queues and per-session broadcast groups.

use crate::protocol::{Effect, OutboundEvent};
use crate::session::{ConnectionId, SessionId};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, instrument, trace};

/// Serialized frame queued for one connection.
pub type Frame = String;

/// Tracks live connections and which session groups they belong to.
#[derive(Debug, Default)]
pub struct Hub {
    connections: HashMap<ConnectionId, UnboundedSender<Frame>>,
    groups: HashMap<SessionId, HashSet<ConnectionId>>,
    next_id: u64,
}

impl Hub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an outbound queue and assigns it a connection ID.
    #[instrument(skip(self, sender))]
    pub fn connect(&mut self, sender: UnboundedSender<Frame>) -> ConnectionId {
        self.next_id += 1;
        let connection = format!("conn-{}", self.next_id);
        self.connections.insert(connection.clone(), sender);
        debug!(connection = %connection, live = self.connections.len(), "Connection registered");
        connection
    }

    /// Forgets `connection` and drops it from every group.
    ///
    /// Unknown connections are ignored.
    #[instrument(skip(self))]
    pub fn disconnect(&mut self, connection: &str) {
        if self.connections.remove(connection).is_none() {
            return;
        }
        self.groups.retain(|_, members| {
            members.remove(connection);
            !members.is_empty()
        });
        debug!(live = self.connections.len(), "Connection released");
    }

    /// Applies effects in order.
    pub fn apply(&mut self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            match effect {
                Effect::Subscribe {
                    connection,
                    session_id,
                } => self.subscribe(connection, session_id),
                Effect::Unsubscribe {
                    connection,
                    session_id,
                } => self.unsubscribe(&connection, &session_id),
                Effect::Broadcast { session_id, event } => self.broadcast(&session_id, &event),
                Effect::BroadcastAll { event } => self.broadcast_all(&event),
            }
        }
    }

    fn subscribe(&mut self, connection: ConnectionId, session_id: SessionId) {
        if !self.connections.contains_key(&connection) {
            debug!(connection = %connection, "Subscribe for closed connection skipped");
            return;
        }
        trace!(connection = %connection, session_id = %session_id, "Joining group");
        self.groups.entry(session_id).or_default().insert(connection);
    }

    fn unsubscribe(&mut self, connection: &str, session_id: &str) {
        if let Some(members) = self.groups.get_mut(session_id) {
            members.remove(connection);
            if members.is_empty() {
                self.groups.remove(session_id);
            }
        }
    }

    /// Members of a session group.
    pub fn members(&self, session_id: &str) -> Vec<ConnectionId> {
        self.groups
            .get(session_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    #[instrument(skip(self, event))]
    fn broadcast(&self, session_id: &str, event: &OutboundEvent) {
        let Some(members) = self.groups.get(session_id) else {
            debug!("Broadcast to empty group skipped");
            return;
        };
        if let Some(frame) = encode(event) {
            for connection in members {
                self.send(connection, &frame);
            }
        }
    }

    fn broadcast_all(&self, event: &OutboundEvent) {
        if let Some(frame) = encode(event) {
            for connection in self.connections.keys() {
                self.send(connection, &frame);
            }
        }
    }

    fn send(&self, connection: &str, frame: &str) {
        let Some(sender) = self.connections.get(connection) else {
            return;
        };
        if sender.send(frame.to_string()).is_err() {
            debug!(connection, "Outbound queue closed, frame dropped");
        }
    }
}

fn encode(event: &OutboundEvent) -> Option<Frame> {
    serde_json::to_string(event)
        .inspect_err(|e| error!(error = %e, "Failed to encode outbound event"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::GameOver;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    fn connected(hub: &mut Hub) -> (ConnectionId, UnboundedReceiver<Frame>) {
        let (tx, rx) = unbounded_channel();
        (hub.connect(tx), rx)
    }

    fn game_over() -> OutboundEvent {
        OutboundEvent::GameOver(GameOver { winner: None })
    }

    #[test]
    fn test_broadcast_reaches_group_only() {
        let mut hub = Hub::new();
        let (a, mut rx_a) = connected(&mut hub);
        let (_b, mut rx_b) = connected(&mut hub);

        hub.apply([
            Effect::Subscribe {
                connection: a,
                session_id: "s".into(),
            },
            Effect::Broadcast {
                session_id: "s".into(),
                event: game_over(),
            },
        ]);

        assert_eq!(
            rx_a.try_recv().unwrap(),
            r#"{"event":"gameOver","data":{"winner":null}}"#
        );
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_all_reaches_everyone() {
        let mut hub = Hub::new();
        let (_a, mut rx_a) = connected(&mut hub);
        let (_b, mut rx_b) = connected(&mut hub);
        hub.apply([Effect::BroadcastAll { event: game_over() }]);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_unsubscribe_drops_empty_group() {
        let mut hub = Hub::new();
        let (a, _rx) = connected(&mut hub);
        hub.apply([
            Effect::Subscribe {
                connection: a.clone(),
                session_id: "s".into(),
            },
            Effect::Unsubscribe {
                connection: a,
                session_id: "s".into(),
            },
        ]);
        assert!(hub.members("s").is_empty());
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut hub = Hub::new();
        let (a, _rx) = connected(&mut hub);
        hub.apply([Effect::Subscribe {
            connection: a.clone(),
            session_id: "s".into(),
        }]);
        hub.disconnect(&a);
        hub.disconnect(&a);
        assert_eq!(hub.connection_count(), 0);
        assert!(hub.members("s").is_empty());
    }

    #[test]
    fn test_dropped_receiver_does_not_break_broadcast() {
        let mut hub = Hub::new();
        let (a, rx_a) = connected(&mut hub);
        let (b, mut rx_b) = connected(&mut hub);
        drop(rx_a);
        hub.apply([
            Effect::Subscribe {
                connection: a,
                session_id: "s".into(),
            },
            Effect::Subscribe {
                connection: b,
                session_id: "s".into(),
            },
            Effect::Broadcast {
                session_id: "s".into(),
                event: game_over(),
            },
        ]);
        assert!(rx_b.try_recv().is_ok());
    }
}
