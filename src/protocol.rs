//! Wire protocol between connections and the coordinator.
//!
//! Every frame is a JSON text message shaped `{"event": <name>, "data": <payload>}`.

use crate::games::gomoku::Symbol;
use crate::session::{ConnectionId, SessionId, SessionSnapshot};
use serde::{Deserialize, Serialize};

/// Event received from a connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Ask to be matched into a session.
    JoinGame,
    /// Place a stone.
    MakeMove {
        /// Target row.
        row: i64,
        /// Target column.
        col: i64,
    },
    /// Restart on a fresh board, keeping only the requester.
    NewGame,
    /// Concede to the opponent.
    Resign,
    /// Leave the current session.
    QuitGame,
    /// Chat line for everyone.
    Message(ChatRequest),
}

/// Chat line as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChatRequest {
    /// Display name; relayed as `Anonymous` when missing.
    #[serde(default)]
    pub username: Option<String>,
    /// Message text.
    #[serde(default)]
    pub message: String,
}

/// Chat line as relayed to every connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Sender display name.
    pub username: String,
    /// Message text.
    pub message: String,
    /// ISO-8601 UTC time the relay received it.
    pub timestamp: String,
}

/// Terminal outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameOver {
    /// Winning symbol; `None` for draws, quits and disconnects.
    pub winner: Option<Symbol>,
}

/// Event sent to connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// Full session state.
    GameState(SessionSnapshot),
    /// Session ended.
    GameOver(GameOver),
    /// Relayed chat line.
    Message(ChatMessage),
}

/// Instruction for the transport, produced by the core.
///
/// Effects are applied in the order they are returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Add a connection to a session's broadcast group.
    Subscribe {
        /// Connection to add.
        connection: ConnectionId,
        /// Group to join.
        session_id: SessionId,
    },
    /// Remove a connection from a session's broadcast group.
    Unsubscribe {
        /// Connection to remove.
        connection: ConnectionId,
        /// Group to leave.
        session_id: SessionId,
    },
    /// Send to every member of a session group.
    Broadcast {
        /// Target group.
        session_id: SessionId,
        /// Event to send.
        event: OutboundEvent,
    },
    /// Send to every connection.
    BroadcastAll {
        /// Event to send.
        event: OutboundEvent,
    },
}
