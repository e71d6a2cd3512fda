//! Turn state machine for a two-player Othello game.

use crate::board::Board;
use crate::heuristic;
use crate::rules::{self, FlipSet};
use crate::types::{Color, GameStatus, Move, Outcome, Participant};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Error that can occur when applying a move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    /// The target square already holds a disc.
    #[display("Square {} is already occupied", _0)]
    Occupied(#[error(not(source))] usize),

    /// The target index is neither a square nor the pass sentinel.
    #[display("Index {} is off the board", _0)]
    OutOfBounds(#[error(not(source))] usize),

    /// The placement would not flip anything.
    #[display("Square {} captures no discs", _0)]
    NoCapture(#[error(not(source))] usize),

    /// The move's color is not the one to move.
    #[display("It's not {}'s turn", _0)]
    WrongColor(#[error(not(source))] Color),

    /// A pass was requested while legal placements exist.
    #[display("Cannot pass while legal moves remain")]
    PassWithMovesAvailable,

    /// Neither side can move.
    #[display("Game is already over")]
    GameOver,
}

/// Othello game engine: one board, two participants, one turn indicator.
///
/// `Clone` is a deep copy of the board sharing the participant handles, which
/// is what heuristic search uses to try moves without touching the live game.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    players: [Arc<Participant>; 2],
    turn: usize,
    last_flips: FlipSet,
}

impl Game {
    /// Creates a game on the starting position. `first` plays black and moves first.
    #[instrument(skip_all, fields(first = %first.name, second = %second.name))]
    pub fn new(first: Arc<Participant>, second: Arc<Participant>) -> Self {
        debug!("Creating new game");
        Self::from_position(Board::new(), first, second, Color::Black)
    }

    /// Creates a game from names, assigning black to `first`.
    pub fn with_names(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::new(
            Participant::shared(first, Color::Black),
            Participant::shared(second, Color::White),
        )
    }

    /// Creates a game from an arbitrary position with `to_move` active.
    pub fn from_position(
        board: Board,
        first: Arc<Participant>,
        second: Arc<Participant>,
        to_move: Color,
    ) -> Self {
        Self {
            board,
            players: [first, second],
            turn: to_move.seat(),
            last_flips: FlipSet::default(),
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns both participants in seat order.
    pub fn players(&self) -> &[Arc<Participant>; 2] {
        &self.players
    }

    /// Returns the participant whose turn it is.
    pub fn current(&self) -> &Arc<Participant> {
        &self.players[self.turn]
    }

    /// Returns the color to move.
    pub fn to_move(&self) -> Color {
        if self.turn == 0 { Color::Black } else { Color::White }
    }

    /// Hands the turn to the other seat without touching the board.
    pub fn swap_turn(&mut self) {
        self.turn ^= 1;
    }

    /// Flip runs produced by the most recent placement; empty after a pass.
    pub fn last_flips(&self) -> &FlipSet {
        &self.last_flips
    }

    /// Legal placements for the color to move.
    pub fn valid_moves(&self) -> Vec<usize> {
        rules::legal_moves(&self.board, self.to_move())
    }

    /// Legal placements for the color not to move. Never changes the turn.
    pub fn opponent_valid_moves(&self) -> Vec<usize> {
        rules::legal_moves(&self.board, self.to_move().opponent())
    }

    /// Checks a placement for the active color. Passes are not placements.
    pub fn is_valid_move(&self, mv: &Move) -> bool {
        mv.color() == self.to_move() && rules::is_legal(&self.board, mv.color(), mv.index())
    }

    /// True iff neither color has a legal placement.
    pub fn is_game_over(&self) -> bool {
        self.valid_moves().is_empty() && self.opponent_valid_moves().is_empty()
    }

    /// Applies a placement or a pass for the active color and hands over the turn.
    #[instrument(skip(self), fields(to_move = %self.to_move()))]
    pub fn apply_move(&mut self, mv: Move) -> Result<&FlipSet, MoveError> {
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }
        if mv.color() != self.to_move() {
            return Err(MoveError::WrongColor(mv.color()));
        }

        if mv.is_pass() {
            if !self.valid_moves().is_empty() {
                return Err(MoveError::PassWithMovesAvailable);
            }
            debug!("Passing turn");
            self.last_flips = FlipSet::default();
            self.swap_turn();
            return Ok(&self.last_flips);
        }

        let index = mv.index();
        if Board::coords(index).is_none() {
            return Err(MoveError::OutOfBounds(index));
        }
        if !self.board.is_empty(index) {
            return Err(MoveError::Occupied(index));
        }

        let flips =
            rules::place(&mut self.board, mv.color(), index).ok_or(MoveError::NoCapture(index))?;
        debug!(index, flipped = flips.total(), "Move applied");
        self.last_flips = flips;
        self.swap_turn();
        Ok(&self.last_flips)
    }

    /// Discs held by `color`, or `None` while the game is still running.
    pub fn count(&self, color: Color) -> Option<usize> {
        self.is_game_over().then(|| self.board.count(color))
    }

    /// Final outcome, or `None` while the game is still running.
    pub fn winner(&self) -> Option<Outcome> {
        let black = self.count(Color::Black)?;
        let white = self.count(Color::White)?;
        Some(match black.cmp(&white) {
            std::cmp::Ordering::Greater => Outcome::Winner(Color::Black),
            std::cmp::Ordering::Less => Outcome::Winner(Color::White),
            std::cmp::Ordering::Equal => Outcome::Draw,
        })
    }

    /// Returns the current status.
    pub fn status(&self) -> GameStatus {
        match self.winner() {
            Some(outcome) => GameStatus::Terminal(outcome),
            None => GameStatus::Turn(self.to_move()),
        }
    }

    /// Participant playing `color`.
    pub fn participant(&self, color: Color) -> &Arc<Participant> {
        &self.players[color.seat()]
    }

    /// Independent engine for look-ahead; shares participant handles.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// A random legal placement for the active color.
    pub fn hint(&self) -> Option<usize> {
        self.valid_moves().choose(&mut rand::thread_rng()).copied()
    }

    /// Heuristic score of the position from black's perspective.
    pub fn evaluate(&self) -> f64 {
        heuristic::evaluate(&self.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    #[test]
    fn test_turn_alternates() {
        let mut game = Game::with_names("alice", "bob");
        assert_eq!(game.to_move(), Color::Black);
        game.apply_move(Move::new(Color::Black, 26)).unwrap();
        assert_eq!(game.to_move(), Color::White);
        assert_eq!(game.current().name, "bob");
    }

    #[test]
    fn test_wrong_color_rejected() {
        let mut game = Game::with_names("alice", "bob");
        assert_eq!(
            game.apply_move(Move::new(Color::White, 20)),
            Err(MoveError::WrongColor(Color::White))
        );
    }

    #[test]
    fn test_pass_rejected_with_moves() {
        let mut game = Game::with_names("alice", "bob");
        assert_eq!(
            game.apply_move(Move::pass(Color::Black)),
            Err(MoveError::PassWithMovesAvailable)
        );
        assert_eq!(game.to_move(), Color::Black);
    }

    #[test]
    fn test_pass_accepted_without_moves() {
        // Black has nothing to flip; white can still capture at 2.
        let mut board = Board::empty();
        board.set(0, Square::Occupied(Color::White)).unwrap();
        board.set(1, Square::Occupied(Color::Black)).unwrap();
        let mut game = Game::from_position(
            board.clone(),
            Participant::shared("a", Color::Black),
            Participant::shared("b", Color::White),
            Color::Black,
        );
        assert!(game.valid_moves().is_empty());
        assert!(!game.is_game_over());
        game.apply_move(Move::pass(Color::Black)).unwrap();
        assert_eq!(game.to_move(), Color::White);
        assert_eq!(game.board(), &board);
        assert!(game.last_flips().is_empty());
    }

    #[test]
    fn test_counts_undefined_until_over() {
        let game = Game::with_names("alice", "bob");
        assert_eq!(game.count(Color::Black), None);
        assert_eq!(game.winner(), None);
        assert_eq!(game.status(), GameStatus::Turn(Color::Black));
    }

    #[test]
    fn test_terminal_when_neither_can_move() {
        let mut board = Board::empty();
        board.set(0, Square::Occupied(Color::Black)).unwrap();
        board.set(63, Square::Occupied(Color::Black)).unwrap();
        board.set(7, Square::Occupied(Color::White)).unwrap();
        let game = Game::from_position(
            board,
            Participant::shared("a", Color::Black),
            Participant::shared("b", Color::White),
            Color::White,
        );
        assert!(game.is_game_over());
        assert_eq!(game.count(Color::Black), Some(2));
        assert_eq!(game.winner(), Some(Outcome::Winner(Color::Black)));
    }

    #[test]
    fn test_opponent_moves_leave_turn_alone() {
        let game = Game::with_names("alice", "bob");
        assert_eq!(game.opponent_valid_moves(), vec![20, 29, 34, 43]);
        assert_eq!(game.to_move(), Color::Black);
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let game = Game::with_names("alice", "bob");
        let mut copy = game.deep_copy();
        copy.apply_move(Move::new(Color::Black, 19)).unwrap();
        assert_eq!(game.board(), &Board::new());
        assert_eq!(game.to_move(), Color::Black);
        assert!(Arc::ptr_eq(&game.players()[0], &copy.players()[0]));
    }
}
