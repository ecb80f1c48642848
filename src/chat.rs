//! Chat relay: stateless fan-out of chat lines to every connection.

use crate::protocol::{ChatMessage, ChatRequest, Effect, OutboundEvent};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, instrument};

/// Name used when a chat line arrives without one.
pub const ANONYMOUS: &str = "Anonymous";

/// Stamps chat lines and addresses them to everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatRelay;

impl ChatRelay {
    /// Relays `request` as received now.
    #[instrument(skip(self, request))]
    pub fn relay(&self, connection: &str, request: ChatRequest) -> Effect {
        self.relay_at(connection, request, Utc::now())
    }

    /// Relays `request` stamped with `at`.
    pub fn relay_at(&self, connection: &str, request: ChatRequest, at: DateTime<Utc>) -> Effect {
        let username = request
            .username
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| ANONYMOUS.to_string());
        debug!(connection, username = %username, "Relaying chat message");
        Effect::BroadcastAll {
            event: OutboundEvent::Message(ChatMessage {
                username,
                message: request.message,
                timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
        }
    }
}
