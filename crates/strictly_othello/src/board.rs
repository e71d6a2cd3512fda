//! The 8x8 Othello board.

use crate::types::{Color, EDGE, SQUARES, Square};
use tracing::instrument;

/// Square indices seeded at construction: (3,3) white, (3,4) black, (4,3) black, (4,4) white.
const CENTER: [(usize, Color); 4] = [
    (27, Color::White),
    (28, Color::Black),
    (35, Color::Black),
    (36, Color::White),
];

/// Indices of the four corners.
pub const CORNERS: [usize; 4] = [0, 7, 56, 63];

/// Error returned for writes outside the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Square {} is off the board", _0)]
pub struct BoardError(#[error(not(source))] pub usize);

/// 8x8 board stored row-major.
///
/// Out-of-range indices are rejected explicitly: [`Board::get`] returns `None`,
/// [`Board::set`] returns [`BoardError`], [`Board::is_empty`] returns `false`.
/// `Clone` produces an independent copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [Square; SQUARES],
}

impl Board {
    /// Creates a board with the four center discs seeded.
    pub fn new() -> Self {
        let mut board = Self {
            squares: [Square::Empty; SQUARES],
        };
        board.seed();
        board
    }

    /// Creates a board with no discs at all. Useful for composing positions.
    pub fn empty() -> Self {
        Self {
            squares: [Square::Empty; SQUARES],
        }
    }

    fn seed(&mut self) {
        for (index, color) in CENTER {
            self.squares[index] = Square::Occupied(color);
        }
    }

    /// Converts (row, col) to a square index.
    pub fn index(row: usize, col: usize) -> Option<usize> {
        (row < EDGE && col < EDGE).then_some(row * EDGE + col)
    }

    /// Converts a square index to (row, col).
    pub fn coords(index: usize) -> Option<(usize, usize)> {
        (index < SQUARES).then_some((index / EDGE, index % EDGE))
    }

    /// Index of the square at signed coordinates, or `None` off the board.
    pub fn offset(row: isize, col: isize) -> Option<usize> {
        if (0..EDGE as isize).contains(&row) && (0..EDGE as isize).contains(&col) {
            Some(row as usize * EDGE + col as usize)
        } else {
            None
        }
    }

    /// Gets the square at `index`.
    pub fn get(&self, index: usize) -> Option<Square> {
        self.squares.get(index).copied()
    }

    /// Sets the square at `index`.
    pub fn set(&mut self, index: usize, square: Square) -> Result<(), BoardError> {
        let slot = self.squares.get_mut(index).ok_or(BoardError(index))?;
        *slot = square;
        Ok(())
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Square::Empty))
    }

    /// Clears every square and re-seeds the center.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.squares = [Square::Empty; SQUARES];
        self.seed();
    }

    /// Returns all squares in row-major order.
    pub fn squares(&self) -> &[Square; SQUARES] {
        &self.squares
    }

    /// Number of discs of `color`.
    pub fn count(&self, color: Color) -> usize {
        self.squares
            .iter()
            .filter(|&&s| s == Square::Occupied(color))
            .count()
    }

    /// Number of occupied squares.
    pub fn occupied(&self) -> usize {
        self.squares
            .iter()
            .filter(|&&s| s != Square::Empty)
            .count()
    }

    /// Formats the board as a grid; empty squares show their index.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..EDGE {
            for col in 0..EDGE {
                let index = row * EDGE + col;
                let symbol = match self.squares[index] {
                    Square::Empty => format!("{:>2}", index),
                    Square::Occupied(Color::Black) => " B".to_string(),
                    Square::Occupied(Color::White) => " W".to_string(),
                };
                result.push_str(&symbol);
                if col < EDGE - 1 {
                    result.push_str(" |");
                }
            }
            if row < EDGE - 1 {
                result.push_str("\n---+---+---+---+---+---+---+---\n");
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

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_seeded() {
        let board = Board::new();
        assert_eq!(board.count(Color::Black), 2);
        assert_eq!(board.count(Color::White), 2);
        assert_eq!(board.get(27), Some(Square::Occupied(Color::White)));
        assert_eq!(board.get(28), Some(Square::Occupied(Color::Black)));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut board = Board::new();
        assert_eq!(board.get(64), None);
        assert!(!board.is_empty(64));
        assert_eq!(
            board.set(64, Square::Occupied(Color::Black)),
            Err(BoardError(64))
        );
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_index_coords_bijective() {
        for index in 0..SQUARES {
            let (row, col) = Board::coords(index).unwrap();
            assert_eq!(Board::index(row, col), Some(index));
        }
        assert_eq!(Board::index(8, 0), None);
        assert_eq!(Board::coords(64), None);
        assert_eq!(Board::offset(0, -1), None);
    }

    #[test]
    fn test_reset_restores_center() {
        let mut board = Board::new();
        board.set(0, Square::Occupied(Color::Black)).unwrap();
        board.set(27, Square::Occupied(Color::Black)).unwrap();
        board.reset();
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Board::new();
        let mut copy = original.clone();
        copy.set(0, Square::Occupied(Color::White)).unwrap();
        copy.set(27, Square::Empty).unwrap();
        assert!(original.is_empty(0));
        assert_eq!(original.get(27), Some(Square::Occupied(Color::White)));
    }
}
