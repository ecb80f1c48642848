//! Strictly Gomoku library - real-time two-player five-in-a-row coordinator
//!
//! Anonymous WebSocket connections are paired into sessions on a 15x15
//! board. Turns alternate strictly, five in a row wins, and resignation,
//! quitting, disconnection and rematch are handled by the controller.
//!
//! # Architecture
//!
//! - **Games**: Board, symbols and the win detector
//! - **Session**: Session aggregate plus the registry and its connection index
//! - **Matchmaker**: Seats arriving connections in an open or new session
//! - **Controller**: Turn and lifecycle state machine producing [`Effect`]s
//! - **Hub / Server**: Broadcast groups and the axum WebSocket transport
//!
//! # Example
//!
//! ```
//! use strictly_gomoku::{GameController, InboundEvent, SessionRegistry};
//!
//! let mut controller = GameController::new(SessionRegistry::new());
//! controller.handle("conn-1", InboundEvent::JoinGame);
//! controller.handle("conn-2", InboundEvent::JoinGame);
//! let effects = controller.handle("conn-1", InboundEvent::MakeMove { row: 7, col: 7 });
//! assert_eq!(effects.len(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod chat;
mod cli;
mod config;
mod controller;
mod error;
mod games;
mod hub;
mod matchmaker;
mod protocol;
mod server;
mod session;

// Crate-level exports - CLI and configuration
pub use cli::{Cli, Command};
pub use config::{ConfigError, PORT_VAR, ServerConfig};

// Crate-level exports - Errors
pub use error::GameError;

// Crate-level exports - Game types (gomoku)
pub use games::gomoku::{
    Axis, BOARD_SIZE, Board, Cell, MAX_MOVES, Position, Symbol, WIN_LENGTH, check_win,
    line_length,
};

// Crate-level exports - Session management
pub use session::{
    ConnectionId, GameSession, MoveOutcome, Seat, SessionId, SessionPhase, SessionRegistry,
    SessionSnapshot,
};

// Crate-level exports - Matchmaking and lifecycle
pub use controller::GameController;
pub use matchmaker::Matchmaker;

// Crate-level exports - Wire protocol
pub use protocol::{ChatMessage, ChatRequest, Effect, GameOver, InboundEvent, OutboundEvent};

// Crate-level exports - Transport
pub use chat::{ANONYMOUS, ChatRelay};
pub use hub::{Frame, Hub};
pub use server::{GameServer, serve};
