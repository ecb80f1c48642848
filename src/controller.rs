//! Turn and lifecycle controller: the per-session state machine.
//!
//! A session waits for an opponent, alternates turns once both seats are
//! filled, and is removed from the registry the moment it reaches a win,
//! draw or forfeit. Operations return the [`Effect`]s the transport must
//! apply; they never touch the network themselves.

use crate::error::GameError;
use crate::matchmaker::Matchmaker;
use crate::protocol::{Effect, GameOver, InboundEvent, OutboundEvent};
use crate::session::{MoveOutcome, SessionId, SessionRegistry};
use derive_getters::Getters;
use tracing::{debug, info, instrument, warn};

/// Drives every session through its lifecycle.
#[derive(Debug, Default, Getters)]
pub struct GameController {
    registry: SessionRegistry,
    matchmaker: Matchmaker,
}

impl GameController {
    /// Creates a controller around an existing registry.
    #[instrument(skip(registry))]
    pub fn new(registry: SessionRegistry) -> Self {
        info!("Creating game controller");
        Self {
            registry,
            matchmaker: Matchmaker,
        }
    }

    /// Applies one inbound game event from `connection`.
    ///
    /// Rejected events produce no effects; the reason is only logged.
    /// Chat messages are not game events and are ignored here.
    #[instrument(skip(self))]
    pub fn handle(&mut self, connection: &str, event: InboundEvent) -> Vec<Effect> {
        let result = match event {
            InboundEvent::JoinGame => self.join(connection),
            InboundEvent::MakeMove { row, col } => self.make_move(connection, row, col),
            InboundEvent::NewGame => self.new_game(connection),
            InboundEvent::Resign => self.resign(connection),
            InboundEvent::QuitGame => self.quit_game(connection),
            InboundEvent::Message(_) => Ok(Vec::new()),
        };
        result.unwrap_or_else(|e| {
            warn!(connection, error = %e, "Rejected game event");
            Vec::new()
        })
    }

    /// Applies a transport close for `connection`.
    pub fn handle_disconnect(&mut self, connection: &str) -> Vec<Effect> {
        self.disconnect(connection).unwrap_or_else(|e| {
            warn!(connection, error = %e, "Disconnect cleanup failed");
            Vec::new()
        })
    }

    /// Matches `connection` into a session.
    pub fn join(&mut self, connection: &str) -> Result<Vec<Effect>, GameError> {
        self.matchmaker.join(&mut self.registry, connection)
    }

    /// Places a stone for `connection` at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Any failure leaves the session exactly as it was.
    #[instrument(skip(self))]
    pub fn make_move(
        &mut self,
        connection: &str,
        row: i64,
        col: i64,
    ) -> Result<Vec<Effect>, GameError> {
        let session_id = self.session_of(connection)?;
        let session = self
            .registry
            .get_mut(&session_id)
            .ok_or_else(|| GameError::NoActiveSession {
                connection: connection.to_string(),
            })?;

        match session.apply_move(connection, row, col)? {
            MoveOutcome::Continue => Ok(vec![Effect::Broadcast {
                session_id,
                event: OutboundEvent::GameState(session.snapshot()),
            }]),
            MoveOutcome::Won(symbol) => {
                info!(session_id = %session_id, winner = %symbol, "Game won");
                Ok(self.finish(&session_id, GameOver { winner: Some(symbol) }))
            }
            MoveOutcome::Drawn => {
                info!(session_id = %session_id, "Game drawn");
                Ok(self.finish(&session_id, GameOver { winner: None }))
            }
        }
    }

    /// Restarts `connection`'s session on a fresh board.
    ///
    /// Only the requester keeps a seat; a dropped opponent still receives
    /// the reset state and must join again.
    #[instrument(skip(self))]
    pub fn new_game(&mut self, connection: &str) -> Result<Vec<Effect>, GameError> {
        let (session_id, dropped) = self.registry.reset_for(connection)?;
        let snapshot = self
            .registry
            .get(&session_id)
            .map(|session| session.snapshot())
            .ok_or_else(|| GameError::NoActiveSession {
                connection: connection.to_string(),
            })?;

        let mut effects = vec![Effect::Broadcast {
            session_id: session_id.clone(),
            event: OutboundEvent::GameState(snapshot),
        }];
        effects.extend(dropped.into_iter().map(|seat| Effect::Unsubscribe {
            connection: seat.connection().clone(),
            session_id: session_id.clone(),
        }));
        info!(session_id = %session_id, "New game started");
        Ok(effects)
    }

    /// Concedes `connection`'s game to the opponent.
    ///
    /// Resigning without an opponent does nothing.
    #[instrument(skip(self))]
    pub fn resign(&mut self, connection: &str) -> Result<Vec<Effect>, GameError> {
        let session_id = self.session_of(connection)?;
        let winner = self
            .registry
            .get(&session_id)
            .and_then(|session| session.opponent_of(connection))
            .map(|seat| *seat.symbol());

        match winner {
            Some(winner) => {
                info!(session_id = %session_id, winner = %winner, "Player resigned");
                Ok(self.finish(&session_id, GameOver { winner: Some(winner) }))
            }
            None => {
                debug!(session_id = %session_id, "Resign without opponent ignored");
                Ok(Vec::new())
            }
        }
    }

    /// Removes `connection` from its session at the player's request.
    #[instrument(skip(self))]
    pub fn quit_game(&mut self, connection: &str) -> Result<Vec<Effect>, GameError> {
        let session_id = self.session_of(connection)?;
        Ok(self.leave(connection, session_id))
    }

    /// Removes `connection` after its transport closed.
    ///
    /// Safe to call repeatedly: an unseated connection yields no effects.
    #[instrument(skip(self))]
    pub fn disconnect(&mut self, connection: &str) -> Result<Vec<Effect>, GameError> {
        match self.registry.find_session_for(connection).cloned() {
            Some(session_id) => Ok(self.leave(connection, session_id)),
            None => {
                debug!(connection, "Disconnect for unseated connection");
                Ok(Vec::new())
            }
        }
    }

    fn session_of(&self, connection: &str) -> Result<SessionId, GameError> {
        self.registry
            .find_session_for(connection)
            .cloned()
            .ok_or_else(|| GameError::NoActiveSession {
                connection: connection.to_string(),
            })
    }

    /// Ends the game with no winner for whoever is still in the group.
    ///
    /// A remaining opponent is not awarded the win, unlike [`Self::resign`].
    fn leave(&mut self, connection: &str, session_id: SessionId) -> Vec<Effect> {
        let mut effects = vec![Effect::Broadcast {
            session_id: session_id.clone(),
            event: OutboundEvent::GameOver(GameOver { winner: None }),
        }];

        self.registry.unseat(connection);
        effects.push(Effect::Unsubscribe {
            connection: connection.to_string(),
            session_id: session_id.clone(),
        });

        let remaining = self
            .registry
            .get(&session_id)
            .filter(|session| !session.players().is_empty())
            .map(|session| session.snapshot());

        match remaining {
            Some(snapshot) => {
                info!(session_id = %session_id, "Player left, opponent waiting");
                effects.push(Effect::Broadcast {
                    session_id,
                    event: OutboundEvent::GameState(snapshot),
                });
            }
            None => {
                self.registry.remove(&session_id);
                info!(session_id = %session_id, "Last player left");
            }
        }
        effects
    }

    /// Announces `outcome`, empties the group and drops the session.
    fn finish(&mut self, session_id: &str, outcome: GameOver) -> Vec<Effect> {
        let mut effects = vec![Effect::Broadcast {
            session_id: session_id.to_string(),
            event: OutboundEvent::GameOver(outcome),
        }];
        if let Some(session) = self.registry.remove(session_id) {
            effects.extend(session.players().iter().map(|seat| Effect::Unsubscribe {
                connection: seat.connection().clone(),
                session_id: session_id.to_string(),
            }));
        }
        effects
    }
}
