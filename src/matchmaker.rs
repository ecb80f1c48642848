//! Matchmaking: pairs arriving connections into sessions.

use crate::error::GameError;
use crate::protocol::{Effect, OutboundEvent};
use crate::session::SessionRegistry;
use tracing::{info, instrument};

/// Seats connections in an open session, or a fresh one when none is open.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matchmaker;

impl Matchmaker {
    /// Seats `connection` and announces the resulting session state.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::AlreadyInSession`] when `connection` is already
    /// seated somewhere.
    #[instrument(skip(self, registry))]
    pub fn join(
        &self,
        registry: &mut SessionRegistry,
        connection: &str,
    ) -> Result<Vec<Effect>, GameError> {
        if let Some(session_id) = registry.find_session_for(connection) {
            return Err(GameError::AlreadyInSession {
                connection: connection.to_string(),
                session_id: session_id.clone(),
            });
        }

        let session_id = match registry.find_open_session() {
            Some(id) => id,
            None => registry.create(),
        };
        let symbol = registry.seat(&session_id, connection.to_string())?;

        let session = registry
            .get(&session_id)
            .ok_or_else(|| GameError::NoActiveSession {
                connection: connection.to_string(),
            })?;
        info!(
            session_id = %session_id,
            symbol = %symbol,
            phase = ?session.phase(),
            "Connection matched"
        );

        Ok(vec![
            Effect::Subscribe {
                connection: connection.to_string(),
                session_id: session_id.clone(),
            },
            Effect::Broadcast {
                session_id,
                event: OutboundEvent::GameState(session.snapshot()),
            },
        ])
    }
}
