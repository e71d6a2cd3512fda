//! Core domain types for Othello.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Number of squares along one edge of the board.
pub const EDGE: usize = 8;

/// Number of squares on the board.
pub const SQUARES: usize = EDGE * EDGE;

/// Move index meaning "I have no legal move". One past the last square.
pub const PASS: usize = SQUARES;

/// Owner of a disc.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum Color {
    /// Moves first.
    Black,
    /// Moves second.
    White,
}

impl Color {
    /// Returns the opposing color.
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Seat index of this color: 0 for the first mover, 1 for the second.
    pub fn seat(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }
}

/// A square on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// No disc.
    Empty,
    /// Holds a disc of the given color.
    Occupied(Color),
}

impl Square {
    /// Flips the occupant's color. Empty stays empty.
    pub fn opposite(self) -> Self {
        match self {
            Square::Empty => Square::Empty,
            Square::Occupied(color) => Square::Occupied(color.opponent()),
        }
    }

    /// Returns the occupant, if any.
    pub fn color(self) -> Option<Color> {
        match self {
            Square::Empty => None,
            Square::Occupied(color) => Some(color),
        }
    }
}

/// A request to place `color` at `index`, or to pass when `index == PASS`.
///
/// Moves are not validated on construction; the engine decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    color: Color,
    index: usize,
}

impl Move {
    /// Creates a placement (or pass, for [`PASS`]) request.
    pub fn new(color: Color, index: usize) -> Self {
        Self { color, index }
    }

    /// Creates a pass request.
    pub fn pass(color: Color) -> Self {
        Self { color, index: PASS }
    }

    /// Color of the mover.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Target square index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True for the pass sentinel.
    pub fn is_pass(&self) -> bool {
        self.index == PASS
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_pass() {
            write!(f, "{} passes", self.color)
        } else {
            write!(f, "{} -> {}", self.color, self.index)
        }
    }
}

/// A named participant bound to a color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Display name, unique per server.
    pub name: String,
    /// Color this participant plays.
    pub color: Color,
}

impl Participant {
    /// Creates a shared participant handle.
    pub fn shared(name: impl Into<String>, color: Color) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            color,
        })
    }
}

/// Outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The color holding more discs.
    Winner(Color),
    /// Equal disc counts.
    Draw,
}

impl Outcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Color> {
        match self {
            Outcome::Winner(color) => Some(*color),
            Outcome::Draw => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner(color) => write!(f, "{} wins", color),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Current status of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// The given color is to move.
    Turn(Color),
    /// Neither color can move.
    Terminal(Outcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for square in [
            Square::Empty,
            Square::Occupied(Color::Black),
            Square::Occupied(Color::White),
        ] {
            assert_eq!(square.opposite().opposite(), square);
        }
        assert_eq!(Square::Empty.opposite(), Square::Empty);
    }

    #[test]
    fn test_pass_move() {
        let mv = Move::pass(Color::White);
        assert!(mv.is_pass());
        assert_eq!(mv.index(), 64);
        assert!(!Move::new(Color::White, 63).is_pass());
    }
}
