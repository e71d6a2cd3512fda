//! A live match between two connections.

use crate::error::MatchError;
use crate::protocol::{GameOverReason, ServerMessage};
use crate::server::{ConnectionId, Outbox};
use strictly_othello::{Color, Game, Move, Outcome, PASS, Participant};
use tracing::{debug, info, instrument, warn};

/// One side of a session.
#[derive(Debug, Clone)]
pub struct Seat {
    /// Connection playing this seat.
    pub conn: ConnectionId,
    /// Name the connection logged in with.
    pub name: String,
    /// Outbound channel of the connection.
    pub outbox: Outbox,
}

/// A game between two seats, black first.
///
/// The session owns its engine exclusively; every mutation happens through
/// [`GameSession::submit`] while the caller holds the session lock.
#[derive(Debug)]
pub struct GameSession {
    game: Game,
    seats: [Seat; 2],
    finished: bool,
}

impl GameSession {
    /// Pairs two seats. `first` plays black.
    #[instrument(skip_all, fields(first = %first.name, second = %second.name))]
    pub fn new(first: Seat, second: Seat) -> Self {
        info!("Creating new game session");
        let game = Game::new(
            Participant::shared(first.name.clone(), Color::Black),
            Participant::shared(second.name.clone(), Color::White),
        );
        Self::from_game(game, first, second)
    }

    /// Seats two connections at an existing position.
    pub(crate) fn from_game(game: Game, first: Seat, second: Seat) -> Self {
        Self {
            game,
            seats: [first, second],
            finished: false,
        }
    }

    /// The engine, for inspection.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Both seats, black first.
    pub fn seats(&self) -> &[Seat; 2] {
        &self.seats
    }

    /// True once a `GAMEOVER` has been sent.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Color played by `conn`, if it sits in this session.
    pub fn color_of(&self, conn: ConnectionId) -> Option<Color> {
        if self.seats[0].conn == conn {
            Some(Color::Black)
        } else if self.seats[1].conn == conn {
            Some(Color::White)
        } else {
            None
        }
    }

    /// The seat opposite `conn`.
    pub fn opponent_of(&self, conn: ConnectionId) -> Option<&Seat> {
        self.color_of(conn)
            .map(|color| &self.seats[color.opponent().seat()])
    }

    /// Sends a message to both seats.
    pub fn broadcast(&self, message: &ServerMessage) {
        for seat in &self.seats {
            send(seat, message.clone());
        }
    }

    /// Validates, broadcasts and applies a move for `conn`.
    ///
    /// When the move ends the game the session is marked finished and the
    /// reason is returned; the caller announces it with [`GameSession::announce`]
    /// once the session is out of the registries.
    #[instrument(skip(self))]
    pub fn submit(
        &mut self,
        conn: ConnectionId,
        index: i64,
    ) -> Result<Option<GameOverReason>, MatchError> {
        if self.finished {
            return Err(MatchError::NoActiveSession);
        }
        let color = self.color_of(conn).ok_or(MatchError::NoActiveSession)?;
        if color != self.game.to_move() {
            warn!(%color, "Move out of turn");
            return Err(MatchError::WrongTurn);
        }

        let mv = self.validate(color, index)?;

        self.broadcast(&ServerMessage::Move(mv.index()));
        if let Err(e) = self.game.apply_move(mv) {
            // Validation above mirrors the engine's own checks.
            warn!(error = %e, "Engine rejected a validated move");
            return Err(MatchError::IllegalMove(e.to_string()));
        }
        debug!(index = mv.index(), "Move applied");

        if let Some(outcome) = self.game.winner() {
            let reason = match outcome {
                Outcome::Winner(color) => GameOverReason::Decisive {
                    winner: self.seats[color.seat()].name.clone(),
                },
                Outcome::Draw => GameOverReason::Draw,
            };
            info!(?reason, "Game finished");
            self.finished = true;
            return Ok(Some(reason));
        }
        Ok(None)
    }

    fn validate(&self, color: Color, index: i64) -> Result<Move, MatchError> {
        let index = usize::try_from(index)
            .ok()
            .filter(|&i| i <= PASS)
            .ok_or_else(|| MatchError::IllegalMove(format!("{} is not a square", index)))?;
        let mv = Move::new(color, index);

        if mv.is_pass() {
            if !self.game.valid_moves().is_empty() {
                return Err(MatchError::IllegalMove(
                    "cannot pass while a legal move exists".to_string(),
                ));
            }
        } else if !self.game.is_valid_move(&mv) {
            return Err(MatchError::IllegalMove(format!(
                "{} captures nothing or is occupied",
                index
            )));
        }
        Ok(mv)
    }

    /// Ends the session by forfeit of `conn` and returns the winning seat.
    ///
    /// Returns `None` if the session already finished, so a forfeit is
    /// announced at most once.
    #[instrument(skip(self))]
    pub fn forfeit(&mut self, conn: ConnectionId) -> Option<Seat> {
        if self.finished {
            return None;
        }
        let winner = self.opponent_of(conn)?.clone();
        info!(winner = %winner.name, "Game forfeited");
        self.finished = true;
        Some(winner)
    }

    /// Sends the `GAMEOVER` for a reason returned by [`GameSession::submit`].
    pub fn announce(&self, reason: GameOverReason) {
        self.broadcast(&ServerMessage::GameOver(reason));
    }
}

impl Seat {
    /// Queues a message on this seat's outbox.
    pub fn send(&self, message: ServerMessage) {
        send(self, message);
    }
}

/// Queues a message on a seat's outbox. A closed outbox means that connection
/// is already on its way out.
fn send(seat: &Seat, message: ServerMessage) {
    if seat.outbox.send(message).is_err() {
        debug!(conn = %seat.conn, "Outbox closed, dropping message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strictly_othello::{Board, Square};
    use tokio::sync::mpsc;

    fn seat(conn: u64, name: &str) -> (Seat, mpsc::UnboundedReceiver<ServerMessage>) {
        let (outbox, rx) = mpsc::unbounded_channel();
        (
            Seat {
                conn: ConnectionId::from(conn),
                name: name.to_string(),
                outbox,
            },
            rx,
        )
    }

    #[test]
    fn test_move_is_broadcast_to_both() {
        let (a, mut rx_a) = seat(1, "alice");
        let (b, mut rx_b) = seat(2, "bob");
        let mut session = GameSession::new(a, b);

        assert_eq!(session.submit(ConnectionId::from(1), 19), Ok(None));
        assert_eq!(rx_a.try_recv().unwrap(), ServerMessage::Move(19));
        assert_eq!(rx_b.try_recv().unwrap(), ServerMessage::Move(19));
        assert_eq!(session.game().to_move(), Color::White);
    }

    #[test]
    fn test_wrong_turn_and_illegal_moves() {
        let (a, _rx_a) = seat(1, "alice");
        let (b, mut rx_b) = seat(2, "bob");
        let mut session = GameSession::new(a, b);

        assert_eq!(
            session.submit(ConnectionId::from(2), 20),
            Err(MatchError::WrongTurn)
        );
        assert!(matches!(
            session.submit(ConnectionId::from(1), 27),
            Err(MatchError::IllegalMove(_))
        ));
        assert!(matches!(
            session.submit(ConnectionId::from(1), 64),
            Err(MatchError::IllegalMove(_))
        ));
        assert!(matches!(
            session.submit(ConnectionId::from(1), 65),
            Err(MatchError::IllegalMove(_))
        ));
        assert!(matches!(
            session.submit(ConnectionId::from(1), -1),
            Err(MatchError::IllegalMove(_))
        ));
        assert!(rx_b.try_recv().is_err());
        assert_eq!(session.game().board(), &Board::new());
    }

    fn at_position(
        board: Board,
        to_move: Color,
    ) -> (
        GameSession,
        mpsc::UnboundedReceiver<ServerMessage>,
        mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        let (a, rx_a) = seat(1, "alice");
        let (b, rx_b) = seat(2, "bob");
        let game = Game::from_position(
            board,
            Participant::shared("alice", Color::Black),
            Participant::shared("bob", Color::White),
            to_move,
        );
        (GameSession::from_game(game, a, b), rx_a, rx_b)
    }

    fn disc(board: &mut Board, index: usize, color: Color) {
        board.set(index, Square::Occupied(color)).unwrap();
    }

    #[test]
    fn test_pass_accepted_only_without_moves() {
        // Black's only disc sits against a white corner: nothing to capture.
        let mut board = Board::empty();
        disc(&mut board, 0, Color::White);
        disc(&mut board, 1, Color::Black);
        let (mut session, mut rx_a, mut rx_b) = at_position(board, Color::Black);

        assert_eq!(session.submit(ConnectionId::from(1), 64), Ok(None));
        assert_eq!(rx_a.try_recv().unwrap(), ServerMessage::Move(64));
        assert_eq!(rx_b.try_recv().unwrap(), ServerMessage::Move(64));
        assert_eq!(session.game().to_move(), Color::White);

        // White can capture at 2, so white may not pass.
        assert!(matches!(
            session.submit(ConnectionId::from(2), 64),
            Err(MatchError::IllegalMove(_))
        ));
        assert!(rx_a.try_recv().is_err());
        assert_eq!(session.game().to_move(), Color::White);
    }

    #[test]
    fn test_final_move_reports_draw() {
        let mut board = Board::empty();
        disc(&mut board, 0, Color::Black);
        disc(&mut board, 1, Color::White);
        for index in [61, 62, 63] {
            disc(&mut board, index, Color::White);
        }
        let (mut session, mut rx_a, mut rx_b) = at_position(board, Color::Black);

        assert_eq!(
            session.submit(ConnectionId::from(1), 2),
            Ok(Some(GameOverReason::Draw))
        );
        assert!(session.is_finished());
        assert_eq!(rx_a.try_recv().unwrap(), ServerMessage::Move(2));
        assert_eq!(rx_b.try_recv().unwrap(), ServerMessage::Move(2));
        assert!(rx_a.try_recv().is_err());

        session.announce(GameOverReason::Draw);
        let over = ServerMessage::GameOver(GameOverReason::Draw);
        assert_eq!(rx_a.try_recv().unwrap(), over);
        assert_eq!(rx_b.try_recv().unwrap(), over);
        assert_eq!(
            session.submit(ConnectionId::from(2), 64),
            Err(MatchError::NoActiveSession)
        );
        assert!(session.forfeit(ConnectionId::from(2)).is_none());
    }

    #[test]
    fn test_final_move_names_winning_seat() {
        let mut board = Board::empty();
        disc(&mut board, 0, Color::White);
        disc(&mut board, 1, Color::Black);
        let (mut session, _rx_a, _rx_b) = at_position(board, Color::White);

        assert_eq!(
            session.submit(ConnectionId::from(2), 2),
            Ok(Some(GameOverReason::Decisive {
                winner: "bob".into()
            }))
        );
    }

    #[test]
    fn test_forfeit_happens_once() {
        let (a, _rx_a) = seat(1, "alice");
        let (b, _rx_b) = seat(2, "bob");
        let mut session = GameSession::new(a, b);

        let winner = session.forfeit(ConnectionId::from(1)).unwrap();
        assert_eq!(winner.name, "bob");
        assert!(session.forfeit(ConnectionId::from(1)).is_none());
        assert!(session.forfeit(ConnectionId::from(2)).is_none());
        assert!(session.is_finished());
        assert_eq!(
            session.submit(ConnectionId::from(2), 20),
            Err(MatchError::NoActiveSession)
        );
    }

    #[test]
    fn test_stranger_cannot_forfeit() {
        let (a, _rx_a) = seat(1, "alice");
        let (b, _rx_b) = seat(2, "bob");
        let mut session = GameSession::new(a, b);
        assert!(session.forfeit(ConnectionId::from(9)).is_none());
        assert!(!session.is_finished());
    }
}
