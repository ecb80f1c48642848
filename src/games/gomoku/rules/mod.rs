//! Game rules for gomoku.
//!
//! Pure functions over a [`Board`](super::Board). The coordinator only ever
//! asks about the cell just placed, so nothing here scans the whole board.

pub mod win;

pub use win::{Axis, check_win, line_length};
