//! Error types for the coordinator.

use crate::session::{ConnectionId, SessionId};
use derive_more::Display;

/// Reason a game event was rejected.
///
/// Through the event surface these are logged and dropped; the offending
/// connection is never told.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GameError {
    /// Coordinates fall outside the board.
    #[display("Coordinate ({row}, {col}) is outside the board")]
    OutOfBounds {
        /// Requested row.
        row: i64,
        /// Requested column.
        col: i64,
    },

    /// Target cell already holds a stone.
    #[display("Cell ({row}, {col}) is already occupied")]
    CellOccupied {
        /// Row of the occupied cell.
        row: usize,
        /// Column of the occupied cell.
        col: usize,
    },

    /// Mover is not the connection whose turn it is.
    #[display("It is not {connection}'s turn")]
    NotYourTurn {
        /// Connection that tried to move.
        connection: ConnectionId,
    },

    /// Connection is not seated in any session.
    #[display("{connection} has no active session")]
    NoActiveSession {
        /// Connection that sent the event.
        connection: ConnectionId,
    },

    /// Session already seats two players.
    #[display("Session {session_id} already has 2 players")]
    SessionFull {
        /// Session that was full.
        session_id: SessionId,
    },

    /// Connection asked to join while already seated.
    #[display("{connection} is already playing in session {session_id}")]
    AlreadyInSession {
        /// Connection that sent the join.
        connection: ConnectionId,
        /// Session it is seated in.
        session_id: SessionId,
    },

    /// Every cell has been played.
    #[display("Board is full")]
    BoardFull,
}

impl std::error::Error for GameError {}
