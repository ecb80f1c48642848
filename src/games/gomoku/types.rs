//! Core domain types for gomoku.

use crate::error::GameError;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Width and height of the board.
pub const BOARD_SIZE: usize = 15;

/// Number of placements that fill the board.
pub const MAX_MOVES: usize = BOARD_SIZE * BOARD_SIZE;

/// Contiguous stones needed to win.
pub const WIN_LENGTH: usize = 5;

/// Mark a player places on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum Symbol {
    /// First joiner's mark.
    #[serde(rename = "X")]
    #[display("X")]
    First,
    /// Second joiner's mark.
    #[serde(rename = "O")]
    #[display("O")]
    Second,
}

impl Symbol {
    /// Returns the opposing symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::First => Symbol::Second,
            Symbol::Second => Symbol::First,
        }
    }
}

/// A cell on the board.
///
/// On the wire an empty cell is `null` and an occupied one is its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<Symbol>", into = "Option<Symbol>")]
pub enum Cell {
    /// Nothing placed yet.
    #[default]
    Empty,
    /// Cell holds a stone.
    Occupied(Symbol),
}

impl From<Option<Symbol>> for Cell {
    fn from(value: Option<Symbol>) -> Self {
        match value {
            Some(symbol) => Cell::Occupied(symbol),
            None => Cell::Empty,
        }
    }
}

impl From<Cell> for Option<Symbol> {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Occupied(symbol) => Some(symbol),
            Cell::Empty => None,
        }
    }
}

/// A coordinate known to lie on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    /// Validates raw coordinates against the board bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] unless both values are in `[0, 15)`.
    #[instrument]
    pub fn new(row: i64, col: i64) -> Result<Self, GameError> {
        let in_range = |v: i64| usize::try_from(v).ok().filter(|&v| v < BOARD_SIZE);
        match (in_range(row), in_range(col)) {
            (Some(row), Some(col)) => Ok(Self { row, col }),
            _ => Err(GameError::OutOfBounds { row, col }),
        }
    }

    /// Row index.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Column index.
    pub fn col(&self) -> usize {
        self.col
    }

    /// Moves one step by `(d_row, d_col)`, or `None` when that leaves the board.
    pub fn step(self, d_row: isize, d_col: isize) -> Option<Self> {
        let row = self.row.checked_add_signed(d_row).filter(|&r| r < BOARD_SIZE)?;
        let col = self.col.checked_add_signed(d_col).filter(|&c| c < BOARD_SIZE)?;
        Some(Self { row, col })
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// 15x15 gomoku board.
///
/// Cells are only ever filled, never cleared; a rematch builds a new board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    /// Cells in row-major order.
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Gets the cell at the given position.
    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.row][pos.col]
    }

    /// Checks if a cell is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Cell::Empty
    }

    /// Places `symbol` at `(row, col)`.
    ///
    /// The board is left untouched when this fails.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] for coordinates off the board and
    /// [`GameError::CellOccupied`] when the target already holds a stone.
    #[instrument(skip(self))]
    pub fn place(&mut self, row: i64, col: i64, symbol: Symbol) -> Result<Position, GameError> {
        let pos = Position::new(row, col)?;
        if !self.is_empty(pos) {
            return Err(GameError::CellOccupied {
                row: pos.row,
                col: pos.col,
            });
        }
        self.cells[pos.row][pos.col] = Cell::Occupied(symbol);
        Ok(pos)
    }

    /// Counts occupied cells.
    pub fn stones(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell != Cell::Empty)
            .count()
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::with_capacity(BOARD_SIZE * (BOARD_SIZE + 1));
        for (i, row) in self.cells.iter().enumerate() {
            for cell in row {
                result.push(match cell {
                    Cell::Empty => '.',
                    Cell::Occupied(Symbol::First) => 'X',
                    Cell::Occupied(Symbol::Second) => 'O',
                });
            }
            if i + 1 < BOARD_SIZE {
                result.push('\n');
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_rejects_negative_and_overflow() {
        assert!(Position::new(-1, 0).is_err());
        assert!(Position::new(0, 15).is_err());
        assert!(Position::new(14, 14).is_ok());
    }

    #[test]
    fn test_step_stops_at_edge() {
        let corner = Position::new(0, 14).unwrap();
        assert_eq!(corner.step(-1, 0), None);
        assert_eq!(corner.step(0, 1), None);
        assert_eq!(corner.step(1, -1), Some(Position::new(1, 13).unwrap()));
    }

    #[test]
    fn test_cell_wire_form() {
        let json = serde_json::to_string(&[Cell::Empty, Cell::Occupied(Symbol::Second)]).unwrap();
        assert_eq!(json, r#"[null,"O"]"#);
    }

    #[test]
    fn test_board_serializes_as_rows() {
        let mut board = Board::new();
        board.place(0, 1, Symbol::First).unwrap();
        let value = serde_json::to_value(&board).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), BOARD_SIZE);
        assert_eq!(rows[0][1], "X");
        assert!(rows[0][0].is_null());
    }

    #[test]
    fn test_display_marks_stones() {
        let mut board = Board::new();
        board.place(0, 0, Symbol::First).unwrap();
        board.place(0, 1, Symbol::Second).unwrap();
        assert!(board.display().starts_with("XO."));
    }
}
