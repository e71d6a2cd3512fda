//! Othello game logic.
//!
//! Pure, synchronous rules for 8x8 Othello: the board, move legality and
//! flipping, a turn engine that enforces alternation and passes, a positional
//! evaluation function, and automated strategies built on top of it.
//!
//! # Example
//!
//! ```
//! use strictly_othello::{Color, Game, Move};
//!
//! let mut game = Game::with_names("alice", "bob");
//! assert_eq!(game.valid_moves(), vec![19, 26, 37, 44]);
//!
//! let flips = game.apply_move(Move::new(Color::Black, 19)).unwrap();
//! assert_eq!(flips.total(), 1);
//! assert_eq!(game.to_move(), Color::White);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod game;
pub mod heuristic;
mod rules;
mod strategy;
mod types;

pub use board::{Board, BoardError, CORNERS};
pub use game::{Game, MoveError};
pub use heuristic::{Phase, Stability, evaluate};
pub use rules::{DIRECTIONS, FlipSet, captures, is_legal, legal_moves, place};
pub use strategy::{NaiveStrategy, SmartStrategy, Strategy};
pub use types::{Color, EDGE, GameStatus, Move, Outcome, PASS, Participant, SQUARES, Square};
