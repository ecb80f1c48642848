//! Game session management for two-player matches.

use crate::error::GameError;
use crate::games::gomoku::{Board, MAX_MOVES, Symbol, check_win};
use derive_getters::Getters;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a game session.
pub type SessionId = String;

/// Transport-assigned identifier for a connection.
pub type ConnectionId = String;

/// A connection seated in a session.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Seat {
    /// Seated connection.
    connection: ConnectionId,
    /// Mark this connection places.
    symbol: Symbol,
}

/// Where a session is in its lifecycle.
///
/// Terminal outcomes are not represented: a finished session is removed
/// from the registry immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Fewer than two players seated.
    WaitingForOpponent,
    /// Two players seated, turns alternate.
    InProgress,
}

/// Result of an accepted placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Game continues; the turn passed to the opponent.
    Continue,
    /// The mover completed five in a row.
    Won(Symbol),
    /// The last free cell was filled without a winner.
    Drawn,
}

/// Full session state as broadcast to the session group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Seated connections and their marks.
    pub players: BTreeMap<ConnectionId, Symbol>,
    /// Board contents.
    pub board: Board,
    /// Connection allowed to move next.
    pub current_turn: Option<ConnectionId>,
    /// Accepted placements so far.
    pub move_count: usize,
}

/// A game session with up to two players.
#[derive(Debug, Clone, Getters)]
pub struct GameSession {
    /// Session ID.
    id: SessionId,
    /// Seated players in join order.
    players: Vec<Seat>,
    /// The board.
    board: Board,
    /// Connection allowed to move next; unset until two players are seated.
    current_turn: Option<ConnectionId>,
    /// Accepted placements.
    move_count: usize,
}

impl GameSession {
    /// Creates a new empty session.
    #[instrument]
    pub fn new(id: SessionId) -> Self {
        info!(session_id = %id, "Creating new game session");
        Self {
            id,
            players: Vec::with_capacity(2),
            board: Board::new(),
            current_turn: None,
            move_count: 0,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        if self.players.len() == 2 {
            SessionPhase::InProgress
        } else {
            SessionPhase::WaitingForOpponent
        }
    }

    /// Whether a slot is free.
    pub fn is_open(&self) -> bool {
        self.players.len() < 2
    }

    /// Symbol assigned to `connection`, if seated here.
    pub fn symbol_of(&self, connection: &str) -> Option<Symbol> {
        self.players
            .iter()
            .find(|seat| seat.connection == connection)
            .map(|seat| seat.symbol)
    }

    /// The other seated player, if any.
    pub fn opponent_of(&self, connection: &str) -> Option<&Seat> {
        self.players.iter().find(|seat| seat.connection != connection)
    }

    /// Seats `connection` with the next unassigned symbol.
    ///
    /// The turn is handed to the first-joined player once both slots fill.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub(crate) fn seat(&mut self, connection: ConnectionId) -> Result<Symbol, GameError> {
        if !self.is_open() {
            warn!(connection = %connection, "Session already has 2 players");
            return Err(GameError::SessionFull {
                session_id: self.id.clone(),
            });
        }

        let symbol = match self.players.first() {
            Some(seat) => seat.symbol.opponent(),
            None => Symbol::First,
        };
        info!(connection = %connection, symbol = %symbol, "Seating player");
        self.players.push(Seat { connection, symbol });

        if self.players.len() == 2 {
            self.current_turn = self.players.first().map(|seat| seat.connection.clone());
            info!(current_turn = ?self.current_turn, "Both players seated, game in progress");
        }

        Ok(symbol)
    }

    /// Removes `connection`'s seat; the turn is cleared since a lone player
    /// cannot move.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub(crate) fn unseat(&mut self, connection: &str) -> Option<Seat> {
        let index = self.players.iter().position(|seat| seat.connection == connection)?;
        let seat = self.players.remove(index);
        self.current_turn = None;
        debug!(remaining = self.players.len(), "Player unseated");
        Some(seat)
    }

    /// Starts over on a fresh board keeping only `connection`'s seat.
    ///
    /// Returns the seats that were dropped.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub(crate) fn reset_for(&mut self, connection: &str) -> Vec<Seat> {
        let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut self.players)
            .into_iter()
            .partition(|seat| seat.connection == connection);
        self.players = kept;
        self.board = Board::new();
        self.current_turn = None;
        self.move_count = 0;
        info!(dropped = dropped.len(), "Session reset for new game");
        dropped
    }

    /// Validates and applies a placement by `connection`.
    ///
    /// Nothing changes when this returns an error.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub(crate) fn apply_move(
        &mut self,
        connection: &str,
        row: i64,
        col: i64,
    ) -> Result<MoveOutcome, GameError> {
        if self.current_turn.as_deref() != Some(connection) {
            debug!(current_turn = ?self.current_turn, "Move out of turn");
            return Err(GameError::NotYourTurn {
                connection: connection.to_string(),
            });
        }
        if self.move_count >= MAX_MOVES {
            return Err(GameError::BoardFull);
        }
        let symbol = self
            .symbol_of(connection)
            .ok_or_else(|| GameError::NoActiveSession {
                connection: connection.to_string(),
            })?;

        let pos = self.board.place(row, col, symbol)?;
        self.move_count += 1;

        if check_win(&self.board, pos, symbol) {
            info!(symbol = %symbol, position = %pos, "Five in a row");
            debug!(board = %self.board.display(), "Final board");
            return Ok(MoveOutcome::Won(symbol));
        }
        if self.move_count == MAX_MOVES {
            info!("Board filled without a winner");
            return Ok(MoveOutcome::Drawn);
        }

        self.current_turn = self.opponent_of(connection).map(|seat| seat.connection.clone());
        debug!(
            position = %pos,
            move_count = self.move_count,
            next = ?self.current_turn,
            "Move accepted"
        );
        Ok(MoveOutcome::Continue)
    }

    /// Builds the broadcast view of this session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            players: self
                .players
                .iter()
                .map(|seat| (seat.connection.clone(), seat.symbol))
                .collect(),
            board: self.board.clone(),
            current_turn: self.current_turn.clone(),
            move_count: self.move_count,
        }
    }
}

/// Owns every active session plus the reverse index from connection to session.
///
/// Every structural change goes through this type so the index never drifts
/// from the seats it mirrors.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, GameSession>,
    by_connection: HashMap<ConnectionId, SessionId>,
    next_id: u64,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session registry");
        Self::default()
    }

    /// Creates a new empty session and returns its ID.
    #[instrument(skip(self))]
    pub fn create(&mut self) -> SessionId {
        self.next_id += 1;
        let id = format!("session-{}", self.next_id);
        self.sessions.insert(id.clone(), GameSession::new(id.clone()));
        info!(session_id = %id, "Created new session");
        id
    }

    /// Gets a session by ID.
    pub fn get(&self, id: &str) -> Option<&GameSession> {
        self.sessions.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut GameSession> {
        self.sessions.get_mut(id)
    }

    /// Any session with a free slot.
    #[instrument(skip(self))]
    pub fn find_open_session(&self) -> Option<SessionId> {
        let found = self
            .sessions
            .values()
            .find(|session| session.is_open())
            .map(|session| session.id.clone());
        debug!(found = ?found, "Looked up open session");
        found
    }

    /// Session `connection` is seated in.
    pub fn find_session_for(&self, connection: &str) -> Option<&SessionId> {
        self.by_connection.get(connection)
    }

    /// Seats `connection` in session `id`.
    #[instrument(skip(self))]
    pub fn seat(&mut self, id: &str, connection: ConnectionId) -> Result<Symbol, GameError> {
        if let Some(existing) = self.by_connection.get(&connection) {
            return Err(GameError::AlreadyInSession {
                connection,
                session_id: existing.clone(),
            });
        }
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| GameError::NoActiveSession {
                connection: connection.clone(),
            })?;
        let symbol = session.seat(connection.clone())?;
        self.by_connection.insert(connection, id.to_string());
        Ok(symbol)
    }

    /// Removes `connection` from whatever session seats it.
    ///
    /// Returns the session ID and the removed seat. The session itself stays
    /// registered even if it is now empty.
    #[instrument(skip(self))]
    pub fn unseat(&mut self, connection: &str) -> Option<(SessionId, Seat)> {
        let id = self.by_connection.remove(connection)?;
        let seat = self.sessions.get_mut(&id)?.unseat(connection)?;
        Some((id, seat))
    }

    /// Resets `connection`'s session for a new game, dropping everyone else.
    ///
    /// Returns the session ID and the dropped seats, which are no longer
    /// indexed.
    #[instrument(skip(self))]
    pub fn reset_for(&mut self, connection: &str) -> Result<(SessionId, Vec<Seat>), GameError> {
        let id = self
            .by_connection
            .get(connection)
            .cloned()
            .ok_or_else(|| GameError::NoActiveSession {
                connection: connection.to_string(),
            })?;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| GameError::NoActiveSession {
                connection: connection.to_string(),
            })?;
        let dropped = session.reset_for(connection);
        for seat in &dropped {
            self.by_connection.remove(&seat.connection);
        }
        Ok((id, dropped))
    }

    /// Removes a session and un-indexes its players.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: &str) -> Option<GameSession> {
        let session = self.sessions.remove(id)?;
        for seat in &session.players {
            self.by_connection.remove(&seat.connection);
        }
        info!(session_id = %id, remaining = self.sessions.len(), "Removed session");
        Some(session)
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are active.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Lists all active session IDs.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seated_pair() -> (SessionRegistry, SessionId) {
        let mut registry = SessionRegistry::new();
        let id = registry.create();
        registry.seat(&id, "a".into()).unwrap();
        registry.seat(&id, "b".into()).unwrap();
        (registry, id)
    }

    #[test]
    fn test_symbols_follow_join_order() {
        let (registry, id) = seated_pair();
        let session = registry.get(&id).unwrap();
        assert_eq!(session.symbol_of("a"), Some(Symbol::First));
        assert_eq!(session.symbol_of("b"), Some(Symbol::Second));
        assert_eq!(session.current_turn().as_deref(), Some("a"));
        assert_eq!(session.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn test_third_player_rejected() {
        let (mut registry, id) = seated_pair();
        let err = registry.seat(&id, "c".into()).unwrap_err();
        assert!(matches!(err, GameError::SessionFull { .. }));
        assert!(registry.find_session_for("c").is_none());
    }

    #[test]
    fn test_seated_connection_cannot_seat_again() {
        let mut registry = SessionRegistry::new();
        let first = registry.create();
        registry.seat(&first, "a".into()).unwrap();
        let second = registry.create();
        let err = registry.seat(&second, "a".into()).unwrap_err();
        assert!(matches!(err, GameError::AlreadyInSession { .. }));
    }

    #[test]
    fn test_remove_clears_index() {
        let (mut registry, id) = seated_pair();
        registry.remove(&id).unwrap();
        assert!(registry.find_session_for("a").is_none());
        assert!(registry.find_session_for("b").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unseat_clears_turn() {
        let (mut registry, id) = seated_pair();
        let (from, seat) = registry.unseat("b").unwrap();
        assert_eq!(from, id);
        assert_eq!(seat.symbol(), &Symbol::Second);
        let session = registry.get(&id).unwrap();
        assert_eq!(session.current_turn(), &None);
        assert_eq!(session.phase(), SessionPhase::WaitingForOpponent);
        assert_eq!(registry.find_open_session(), Some(id));
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let (mut registry, id) = seated_pair();
        let session = registry.get_mut(&id).unwrap();
        assert!(matches!(
            session.apply_move("b", 0, 0),
            Err(GameError::NotYourTurn { .. })
        ));
        assert!(matches!(
            session.apply_move("a", 15, 0),
            Err(GameError::OutOfBounds { .. })
        ));
        assert_eq!(session.move_count(), &0);
        assert_eq!(session.board().stones(), 0);
        assert_eq!(session.current_turn().as_deref(), Some("a"));
    }

    #[test]
    fn test_turn_alternates() {
        let (mut registry, id) = seated_pair();
        let session = registry.get_mut(&id).unwrap();
        assert_eq!(session.apply_move("a", 0, 0), Ok(MoveOutcome::Continue));
        assert_eq!(session.current_turn().as_deref(), Some("b"));
        assert!(matches!(
            session.apply_move("b", 0, 0),
            Err(GameError::CellOccupied { .. })
        ));
        assert_eq!(session.apply_move("b", 1, 0), Ok(MoveOutcome::Continue));
        assert_eq!(session.current_turn().as_deref(), Some("a"));
        assert_eq!(session.move_count(), &2);
    }

    #[test]
    fn test_reset_keeps_only_requester() {
        let (mut registry, id) = seated_pair();
        registry.get_mut(&id).unwrap().apply_move("a", 7, 7).unwrap();
        let (reset_id, dropped) = registry.reset_for("b").unwrap();
        assert_eq!(reset_id, id);
        assert_eq!(dropped.len(), 1);
        assert!(registry.find_session_for("a").is_none());

        let session = registry.get(&id).unwrap();
        assert_eq!(session.symbol_of("b"), Some(Symbol::Second));
        assert_eq!(session.move_count(), &0);
        assert_eq!(session.board().stones(), 0);
        assert_eq!(session.current_turn(), &None);
    }

    #[test]
    fn test_rejoin_after_reset_takes_free_symbol() {
        let (mut registry, id) = seated_pair();
        registry.reset_for("b").unwrap();
        let symbol = registry.seat(&id, "c".into()).unwrap();
        assert_eq!(symbol, Symbol::First);
        assert_eq!(registry.get(&id).unwrap().current_turn().as_deref(), Some("b"));
    }
}
