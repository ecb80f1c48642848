mod rules;
mod types;

pub use rules::{Axis, check_win, line_length};
pub use types::{BOARD_SIZE, Board, Cell, MAX_MOVES, Position, Symbol, WIN_LENGTH};
