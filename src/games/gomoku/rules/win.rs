//! Win detection logic for gomoku.

use super::super::{Board, Cell, Position, Symbol, WIN_LENGTH};
use strum::IntoEnumIterator;
use tracing::instrument;

/// A line through a cell, walked as two opposite rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter)]
pub enum Axis {
    /// Left-right.
    Horizontal,
    /// Up-down.
    Vertical,
    /// Top-left to bottom-right.
    MainDiagonal,
    /// Top-right to bottom-left.
    AntiDiagonal,
}

impl Axis {
    /// Step for the forward ray; the backward ray negates it.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Axis::Horizontal => (0, 1),
            Axis::Vertical => (1, 0),
            Axis::MainDiagonal => (1, 1),
            Axis::AntiDiagonal => (1, -1),
        }
    }
}

/// Counts contiguous `symbol` stones from `from`, excluding `from` itself.
fn ray_length(board: &Board, from: Position, (d_row, d_col): (isize, isize), symbol: Symbol) -> usize {
    let mut count = 0;
    let mut cursor = from;
    while let Some(next) = cursor.step(d_row, d_col) {
        if board.get(next) != Cell::Occupied(symbol) {
            break;
        }
        count += 1;
        cursor = next;
    }
    count
}

/// Number of contiguous `symbol` stones on `axis` through `pos`, counting `pos`.
pub fn line_length(board: &Board, pos: Position, axis: Axis, symbol: Symbol) -> usize {
    let (d_row, d_col) = axis.delta();
    1 + ray_length(board, pos, (d_row, d_col), symbol) + ray_length(board, pos, (-d_row, -d_col), symbol)
}

/// Checks whether the stone just placed at `pos` completes five in a row.
///
/// Only the four lines through `pos` are examined. Lines longer than five
/// also win.
#[instrument(skip(board))]
pub fn check_win(board: &Board, pos: Position, symbol: Symbol) -> bool {
    Axis::iter().any(|axis| line_length(board, pos, axis, symbol) >= WIN_LENGTH)
}
