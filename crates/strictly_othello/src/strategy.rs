//! Automated move selection.

use crate::game::Game;
use crate::types::{Color, Move};
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

/// Picks a move for the color to move in a game.
///
/// Implementations return [`Move::pass`] when the active color has no legal
/// placement, so the returned move is always accepted by [`Game::apply_move`]
/// on a game that is not over.
pub trait Strategy: Send + Sync {
    /// Display name of the strategy.
    fn name(&self) -> &str;

    /// Chooses a move for `game.to_move()`.
    fn determine_move(&self, game: &Game) -> Move;
}

/// Plays a uniformly random legal move.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveStrategy;

impl Strategy for NaiveStrategy {
    fn name(&self) -> &str {
        "Naive AI"
    }

    fn determine_move(&self, game: &Game) -> Move {
        let color = game.to_move();
        match game.valid_moves().choose(&mut rand::thread_rng()) {
            Some(&index) => Move::new(color, index),
            None => Move::pass(color),
        }
    }
}

/// One-ply greedy search over [`Game::evaluate`].
///
/// Black maximizes the score and white minimizes it. Ties go to the lowest index.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartStrategy;

impl Strategy for SmartStrategy {
    fn name(&self) -> &str {
        "Smart AI"
    }

    #[instrument(skip_all, fields(color = %game.to_move()))]
    fn determine_move(&self, game: &Game) -> Move {
        let color = game.to_move();
        let mut best: Option<(usize, f64)> = None;

        for index in game.valid_moves() {
            let mut trial = game.deep_copy();
            if trial.apply_move(Move::new(color, index)).is_err() {
                continue;
            }
            let score = trial.evaluate();
            let better = match best {
                None => true,
                Some((_, current)) => match color {
                    Color::Black => score > current,
                    Color::White => score < current,
                },
            };
            if better {
                best = Some((index, score));
            }
        }

        match best {
            Some((index, score)) => {
                debug!(index, score, "Selected move");
                Move::new(color, index)
            }
            None => Move::pass(color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::types::{Participant, Square};

    fn blocked_black() -> Game {
        let mut board = Board::empty();
        board.set(0, Square::Occupied(Color::White)).unwrap();
        board.set(1, Square::Occupied(Color::Black)).unwrap();
        Game::from_position(
            board,
            Participant::shared("a", Color::Black),
            Participant::shared("b", Color::White),
            Color::Black,
        )
    }

    #[test]
    fn test_naive_picks_legal_move() {
        let game = Game::with_names("alice", "bob");
        for _ in 0..20 {
            let mv = NaiveStrategy.determine_move(&game);
            assert!(game.is_valid_move(&mv));
        }
    }

    #[test]
    fn test_strategies_pass_without_moves() {
        let game = blocked_black();
        assert!(NaiveStrategy.determine_move(&game).is_pass());
        assert!(SmartStrategy.determine_move(&game).is_pass());
    }

    #[test]
    fn test_smart_does_not_mutate_game() {
        let game = Game::with_names("alice", "bob");
        let mv = SmartStrategy.determine_move(&game);
        assert!(game.is_valid_move(&mv));
        assert_eq!(game.board(), &Board::new());
    }

    #[test]
    fn test_smart_takes_corner() {
        // Black can take corner 0 by flipping 9, or play elsewhere.
        let mut board = Board::empty();
        board.set(9, Square::Occupied(Color::White)).unwrap();
        board.set(18, Square::Occupied(Color::Black)).unwrap();
        board.set(20, Square::Occupied(Color::White)).unwrap();
        board.set(21, Square::Occupied(Color::Black)).unwrap();
        let game = Game::from_position(
            board,
            Participant::shared("a", Color::Black),
            Participant::shared("b", Color::White),
            Color::Black,
        );
        assert_eq!(game.valid_moves(), vec![0, 19]);
        assert_eq!(SmartStrategy.determine_move(&game), Move::new(Color::Black, 0));
    }

    #[test]
    fn test_names() {
        assert_eq!(NaiveStrategy.name(), "Naive AI");
        assert_eq!(SmartStrategy.name(), "Smart AI");
    }
}
