//! WebSocket transport for the coordinator.

use crate::chat::ChatRelay;
use crate::config::ServerConfig;
use crate::controller::GameController;
use crate::hub::{Frame, Hub};
use crate::protocol::InboundEvent;
use crate::session::{ConnectionId, SessionRegistry};
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::Request;
use axum::response::Response;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Everything one event handler may touch, guarded together.
#[derive(Debug, Default)]
struct CoordinatorState {
    controller: GameController,
    hub: Hub,
    chat: ChatRelay,
}

/// Process root: owns the registry, the hub and the relay.
///
/// Cloning shares the same state. Each inbound event is applied and its
/// effects delivered while holding one lock, so handlers never interleave.
#[derive(Debug, Clone, Default)]
pub struct GameServer {
    state: Arc<Mutex<CoordinatorState>>,
}

impl GameServer {
    /// Creates a server around an existing session registry.
    #[instrument(skip(registry))]
    pub fn with_registry(registry: SessionRegistry) -> Self {
        info!("Creating game server");
        Self {
            state: Arc::new(Mutex::new(CoordinatorState {
                controller: GameController::new(registry),
                hub: Hub::new(),
                chat: ChatRelay,
            })),
        }
    }

    /// Creates a server with an empty registry.
    pub fn new() -> Self {
        Self::with_registry(SessionRegistry::new())
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new connection and returns its ID with its outbound queue.
    #[instrument(skip(self))]
    pub fn connect(&self) -> (ConnectionId, UnboundedReceiver<Frame>) {
        let (sender, receiver) = unbounded_channel();
        let connection = self.lock().hub.connect(sender);
        info!(connection = %connection, "A user connected");
        (connection, receiver)
    }

    /// Parses and applies one text frame from `connection`.
    ///
    /// Frames that are not a known event are dropped.
    #[instrument(skip(self, frame))]
    pub fn dispatch(&self, connection: &str, frame: &str) {
        let event: InboundEvent = match serde_json::from_str(frame) {
            Ok(event) => event,
            Err(e) => {
                warn!(connection, error = %e, "Dropping unparseable frame");
                return;
            }
        };
        debug!(connection, event = ?event, "Inbound event");

        let mut state = self.lock();
        let effects = match event {
            InboundEvent::Message(request) => vec![state.chat.relay(connection, request)],
            event => state.controller.handle(connection, event),
        };
        state.hub.apply(effects);
    }

    /// Tears down `connection`: ends its game, then releases its queue.
    ///
    /// Repeated calls are harmless.
    #[instrument(skip(self))]
    pub fn disconnect(&self, connection: &str) {
        let mut state = self.lock();
        let effects = state.controller.handle_disconnect(connection);
        state.hub.apply(effects);
        state.hub.disconnect(connection);
        info!(connection, "A user disconnected");
    }

    /// Number of active sessions.
    pub fn session_count(&self) -> usize {
        self.lock().controller.registry().len()
    }

    /// Builds the HTTP router: `/` for liveness, `/ws` for play.
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(health))
            .route("/ws", get(upgrade))
            .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
                info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
                req
            }))
            .with_state(self)
    }
}

async fn health() -> &'static str {
    "Gomoku coordinator is running"
}

async fn upgrade(ws: WebSocketUpgrade, State(server): State<GameServer>) -> Response {
    ws.on_upgrade(move |socket| run_socket(socket, server))
}

/// Pumps one socket until it closes.
async fn run_socket(socket: WebSocket, server: GameServer) {
    let (connection, mut outbound) = server.connect();
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => server.dispatch(&connection, text.as_str()),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(connection = %connection, error = %e, "Socket read failed");
                break;
            }
        }
    }

    server.disconnect(&connection);
    writer.abort();
}

/// Binds the listener and serves until the process is stopped.
#[instrument(skip(config, server), fields(host = %config.host(), port = *config.port()))]
pub async fn serve(config: &ServerConfig, server: GameServer) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!("Server running at http://{}:{}/", config.host(), config.port());
    axum::serve(listener, server.router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(rx: &mut UnboundedReceiver<Frame>) -> Vec<serde_json::Value> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|frame| serde_json::from_str(&frame).unwrap())
            .collect()
    }

    #[test]
    fn test_join_pair_broadcasts_state() {
        let server = GameServer::new();
        let (a, mut rx_a) = server.connect();
        let (b, mut rx_b) = server.connect();

        server.dispatch(&a, r#"{"event":"joinGame"}"#);
        server.dispatch(&b, r#"{"event":"joinGame"}"#);

        let last = frames(&mut rx_a).pop().unwrap();
        assert_eq!(last["event"], "gameState");
        assert_eq!(last["data"]["currentTurn"], a.as_str());
        assert_eq!(last["data"]["players"][b.as_str()], "O");
        assert_eq!(frames(&mut rx_b).len(), 1);
        assert_eq!(server.session_count(), 1);
    }

    #[test]
    fn test_garbage_frame_ignored() {
        let server = GameServer::new();
        let (a, mut rx_a) = server.connect();
        server.dispatch(&a, "not json");
        server.dispatch(&a, r#"{"event":"makeMove","data":{"row":"x"}}"#);
        assert!(frames(&mut rx_a).is_empty());
    }

    #[test]
    fn test_disconnect_notifies_opponent_once() {
        let server = GameServer::new();
        let (a, _rx_a) = server.connect();
        let (b, mut rx_b) = server.connect();
        server.dispatch(&a, r#"{"event":"joinGame"}"#);
        server.dispatch(&b, r#"{"event":"joinGame"}"#);
        frames(&mut rx_b);

        server.disconnect(&a);
        server.disconnect(&a);

        let received = frames(&mut rx_b);
        assert_eq!(received.len(), 2);
        assert_eq!(received[0], serde_json::json!({"event": "gameOver", "data": {"winner": null}}));
        assert_eq!(received[1]["event"], "gameState");
        assert_eq!(server.session_count(), 1);
    }

    #[test]
    fn test_chat_reaches_unseated_connections() {
        let server = GameServer::new();
        let (a, _rx_a) = server.connect();
        let (_b, mut rx_b) = server.connect();
        server.dispatch(&a, r#"{"event":"message","data":{"message":"hello"}}"#);
        let received = frames(&mut rx_b);
        assert_eq!(received[0]["event"], "message");
        assert_eq!(received[0]["data"]["username"], "Anonymous");
    }
}
