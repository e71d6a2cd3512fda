//! Position evaluation used to rank moves.
//!
//! The score is a phase-weighted sum of four terms, each a normalized
//! black-minus-white difference:
//!
//! - **Disc parity**: positional weights of each side's discs.
//! - **Mobility**: legal moves (x2.5) plus potential moves next to enemy discs.
//! - **Corners**: corners held (x3).
//! - **Stability**: per-disc stable / semi-stable / unstable classification.
//!
//! Positive scores favor black. The formula is the engine's definition of
//! "good"; it is intentionally not tuned beyond that.

use crate::board::{Board, CORNERS};
use crate::rules::{self, DIRECTIONS};
use crate::types::{Color, SQUARES, Square};
use tracing::trace;

/// Positional weights, row-major. Corners high, squares next to corners low.
const CELL_WEIGHTS: [f64; SQUARES] = [
    4.0, -3.0, 2.0, 2.0, 2.0, 2.0, -3.0, 4.0, //
    -3.0, -4.0, -1.0, -1.0, -1.0, -1.0, -4.0, -3.0, //
    2.0, -1.0, 1.0, 0.0, 0.0, 1.0, -1.0, 2.0, //
    2.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 2.0, //
    2.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 2.0, //
    2.0, -1.0, 1.0, 0.0, 0.0, 1.0, -1.0, 2.0, //
    -3.0, -4.0, -1.0, -1.0, -1.0, -1.0, -4.0, -3.0, //
    4.0, -3.0, 2.0, 2.0, 2.0, 2.0, -3.0, 4.0,
];

/// Squares whose weight drops to zero once the matching corner in [`CORNERS`] is taken.
const CORNER_REGIONS: [[usize; 12]; 4] = [
    [1, 2, 3, 8, 9, 10, 11, 16, 17, 18, 24, 25],
    [4, 5, 6, 12, 13, 14, 15, 21, 22, 23, 30, 31],
    [32, 33, 40, 41, 42, 48, 49, 50, 51, 57, 58, 59],
    [38, 39, 45, 46, 47, 52, 53, 54, 55, 60, 61, 62],
];

/// How hard a disc is to flip later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    /// No axis can be attacked.
    Stable,
    /// Some axis is open but not yet attackable from both ends.
    SemiStable,
    /// Some axis can be attacked from both ends.
    Unstable,
}

impl Stability {
    fn score(self) -> f64 {
        match self {
            Stability::Stable => 1.0,
            Stability::SemiStable => 0.0,
            Stability::Unstable => -1.0,
        }
    }
}

/// Running state of the stability fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exposure {
    /// Both ends of the last axis were empty.
    Neutral,
    /// An empty square was last seen.
    Open,
    /// An enemy disc was seen ahead.
    Flanked,
    /// The axis can be attacked.
    Capturable,
}

/// What a walk from a disc outward runs into after skipping friendly discs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Enemy,
    Empty,
    Edge,
}

fn walk(board: &Board, color: Color, index: usize, (dr, dc): (isize, isize)) -> Boundary {
    let Some((row, col)) = Board::coords(index) else {
        return Boundary::Edge;
    };
    let (mut r, mut c) = (row as isize + dr, col as isize + dc);
    while let Some(next) = Board::offset(r, c) {
        match board.get(next) {
            Some(Square::Empty) => return Boundary::Empty,
            Some(Square::Occupied(owner)) if owner != color => return Boundary::Enemy,
            _ => {}
        }
        r += dr;
        c += dc;
    }
    Boundary::Edge
}

/// Classifies the disc of `color` at `index`; `None` if `color` does not own it.
///
/// Each direction is walked forward then backward and folded into a running
/// [`Exposure`] that persists across directions. Any axis folding to
/// `Capturable` makes the disc unstable immediately; any folding to `Neutral`
/// caps it at semi-stable.
pub fn classify(board: &Board, color: Color, index: usize) -> Option<Stability> {
    if board.get(index)? != Square::Occupied(color) {
        return None;
    }

    let mut exposure = Exposure::Open;
    let mut stability = Stability::Stable;

    for (dr, dc) in DIRECTIONS {
        match walk(board, color, index, (dr, dc)) {
            Boundary::Enemy => exposure = Exposure::Flanked,
            Boundary::Empty => exposure = Exposure::Open,
            Boundary::Edge => {}
        }
        if exposure == Exposure::Neutral {
            continue;
        }

        exposure = match (walk(board, color, index, (-dr, -dc)), exposure) {
            (Boundary::Enemy, Exposure::Flanked) => Exposure::Open,
            (Boundary::Enemy, Exposure::Open) => Exposure::Capturable,
            (Boundary::Empty, Exposure::Flanked) => Exposure::Capturable,
            (Boundary::Empty, Exposure::Open) => Exposure::Neutral,
            (_, unchanged) => unchanged,
        };

        match exposure {
            Exposure::Capturable => return Some(Stability::Unstable),
            Exposure::Neutral => stability = Stability::SemiStable,
            _ => {}
        }
    }

    Some(stability)
}

/// Normalized difference `(a - b) / (a + b)`, zero when the sum is zero.
fn normalized(black: f64, white: f64) -> f64 {
    let sum = black + white;
    if sum != 0.0 { (black - white) / sum } else { 0.0 }
}

/// Positional weights with corner regions neutralized for taken corners.
pub fn cell_weights(board: &Board) -> [f64; SQUARES] {
    let mut weights = CELL_WEIGHTS;
    for (corner, region) in CORNERS.iter().zip(CORNER_REGIONS.iter()) {
        if !board.is_empty(*corner) {
            for &index in region {
                weights[index] = 0.0;
            }
        }
    }
    weights
}

/// Positional-weight parity term.
pub fn disc_parity(board: &Board) -> f64 {
    let weights = cell_weights(board);
    let (mut black, mut white) = (0.0, 0.0);
    for (square, weight) in board.squares().iter().zip(weights) {
        match square {
            Square::Occupied(Color::Black) => black += weight,
            Square::Occupied(Color::White) => white += weight,
            Square::Empty => {}
        }
    }
    normalized(black, white)
}

fn potential_mobility(board: &Board, color: Color) -> f64 {
    let enemy = Square::Occupied(color.opponent());
    let mut potential = 0.0;
    for index in 0..SQUARES {
        if !board.is_empty(index) || rules::is_legal(board, color, index) {
            continue;
        }
        let Some((row, col)) = Board::coords(index) else {
            continue;
        };
        for (dr, dc) in DIRECTIONS {
            let neighbor = Board::offset(row as isize + dr, col as isize + dc);
            if neighbor.and_then(|n| board.get(n)) == Some(enemy) {
                potential += 1.0;
            }
        }
    }
    potential
}

/// Mobility term: 2.5 per legal move plus one per enemy disc adjacent to a
/// non-legal empty square.
pub fn mobility(board: &Board) -> f64 {
    let score = |color| {
        2.5 * rules::legal_moves(board, color).len() as f64 + potential_mobility(board, color)
    };
    normalized(score(Color::Black), score(Color::White))
}

/// Corner term: three per corner held.
pub fn corners(board: &Board) -> f64 {
    let held = |color| {
        CORNERS
            .iter()
            .filter(|&&c| board.get(c) == Some(Square::Occupied(color)))
            .count() as f64
            * 3.0
    };
    normalized(held(Color::Black), held(Color::White))
}

/// Stability term summed over every disc.
pub fn stability(board: &Board) -> f64 {
    let total = |color| {
        (0..SQUARES)
            .filter_map(|index| classify(board, color, index))
            .map(Stability::score)
            .sum::<f64>()
    };
    normalized(total(Color::Black), total(Color::White))
}

/// Game phase keyed on discs on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fewer than 20 discs.
    Opening,
    /// 20 to 44 discs.
    Midgame,
    /// 45 discs or more.
    Endgame,
}

impl Phase {
    /// Phase for a given number of discs.
    pub fn of(discs: usize) -> Self {
        match discs {
            0..20 => Phase::Opening,
            20..45 => Phase::Midgame,
            _ => Phase::Endgame,
        }
    }

    /// Weights for (corners, stability, mobility, parity, per-disc bonus).
    fn weights(self) -> (f64, f64, f64, f64, f64) {
        match self {
            Phase::Opening => (40.0, 30.0, 15.0, 20.0, 0.0),
            Phase::Midgame => (45.0, 35.0, 17.0, 17.0, 5.0),
            Phase::Endgame => (45.0, 30.0, 17.0, 25.0, 25.0),
        }
    }
}

/// Scores a position from black's perspective.
pub fn evaluate(board: &Board) -> f64 {
    let discs = board.occupied();
    let (w_corner, w_stability, w_mobility, w_parity, w_discs) = Phase::of(discs).weights();

    let corner = corners(board);
    let stable = stability(board);
    let mobile = mobility(board);
    let parity = disc_parity(board);

    let score = w_corner * corner
        + w_stability * stable
        + w_mobility * mobile
        + w_parity * parity
        + w_discs * discs as f64;

    trace!(corner, stable, mobile, parity, discs, score, "Evaluated position");
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position_is_balanced() {
        let board = Board::new();
        assert_eq!(corners(&board), 0.0);
        assert_eq!(disc_parity(&board), 0.0);
        assert_eq!(mobility(&board), 0.0);
        assert_eq!(stability(&board), 0.0);
        assert_eq!(evaluate(&board), 0.0);
    }

    #[test]
    fn test_corner_neutralizes_region() {
        let mut board = Board::new();
        assert_eq!(cell_weights(&board)[9], -4.0);
        board.set(0, Square::Occupied(Color::White)).unwrap();
        let weights = cell_weights(&board);
        assert_eq!(weights[9], 0.0);
        assert_eq!(weights[1], 0.0);
        assert_eq!(weights[0], 4.0);
        assert_eq!(weights[14], -4.0);
    }

    #[test]
    fn test_corner_term_favors_holder() {
        let mut board = Board::new();
        board.set(0, Square::Occupied(Color::Black)).unwrap();
        assert_eq!(corners(&board), 1.0);
        board.set(63, Square::Occupied(Color::White)).unwrap();
        assert_eq!(corners(&board), 0.0);
    }

    #[test]
    fn test_lone_corner_disc_is_semi_stable() {
        let mut board = Board::empty();
        board.set(0, Square::Occupied(Color::Black)).unwrap();
        // The diagonal runs edge to empty, which is open but not attackable.
        assert_eq!(
            classify(&board, Color::Black, 0),
            Some(Stability::SemiStable)
        );
        assert_eq!(classify(&board, Color::White, 0), None);
    }

    #[test]
    fn test_disc_between_enemy_and_empty_is_unstable() {
        let mut board = Board::empty();
        board.set(1, Square::Occupied(Color::White)).unwrap();
        board.set(2, Square::Occupied(Color::Black)).unwrap();
        assert_eq!(classify(&board, Color::Black, 2), Some(Stability::Unstable));
    }

    #[test]
    fn test_disc_between_two_enemies_is_not_unstable() {
        let mut board = Board::empty();
        for index in [0, 2] {
            board.set(index, Square::Occupied(Color::White)).unwrap();
        }
        board.set(1, Square::Occupied(Color::Black)).unwrap();
        // Enemies on both ends of the row cancel out.
        assert_eq!(
            classify(&board, Color::Black, 1),
            Some(Stability::SemiStable)
        );
    }

    #[test]
    fn test_mobility_counts_moves_and_potential() {
        // Row 3: W B B. Each side has one legal move (25 for black, 29 for
        // white). Black sees 6 empty squares around the lone white disc;
        // white sees 12 black-disc contacts around the pair.
        let mut board = Board::empty();
        board.set(26, Square::Occupied(Color::White)).unwrap();
        board.set(27, Square::Occupied(Color::Black)).unwrap();
        board.set(28, Square::Occupied(Color::Black)).unwrap();

        assert_eq!(rules::legal_moves(&board, Color::Black), vec![25]);
        assert_eq!(rules::legal_moves(&board, Color::White), vec![29]);
        assert_eq!(potential_mobility(&board, Color::Black), 6.0);
        assert_eq!(potential_mobility(&board, Color::White), 12.0);
        assert!((mobility(&board) - (8.5 - 14.5) / 23.0).abs() < 1e-12);
    }

    #[test]
    fn test_opening_evaluation_of_lone_corner() {
        // corners +1, stability 0 (semi-stable vs nothing), mobility -1
        // (white has 3 potential squares), parity +1.
        let mut board = Board::empty();
        board.set(0, Square::Occupied(Color::Black)).unwrap();

        assert_eq!(corners(&board), 1.0);
        assert_eq!(stability(&board), 0.0);
        assert_eq!(mobility(&board), -1.0);
        assert_eq!(disc_parity(&board), 1.0);
        assert_eq!(evaluate(&board), 40.0 - 15.0 + 20.0);
    }

    #[test]
    fn test_midgame_evaluation_of_black_rows() {
        // Rows 0-2 black: both top corners, every disc semi-stable, white
        // has 22 potential contacts on row 3 and no legal move.
        let mut board = Board::empty();
        for index in 0..24 {
            board.set(index, Square::Occupied(Color::Black)).unwrap();
        }
        assert_eq!(Phase::of(board.occupied()), Phase::Midgame);

        assert_eq!(corners(&board), 1.0);
        assert_eq!(stability(&board), 0.0);
        assert_eq!(potential_mobility(&board, Color::White), 22.0);
        assert_eq!(mobility(&board), -1.0);
        assert_eq!(disc_parity(&board), 1.0);
        assert_eq!(evaluate(&board), 45.0 - 17.0 + 17.0 + 5.0 * 24.0);
    }

    #[test]
    fn test_endgame_evaluation_of_full_board() {
        let mut board = Board::empty();
        for index in 0..SQUARES {
            board.set(index, Square::Occupied(Color::Black)).unwrap();
        }
        assert_eq!(Phase::of(board.occupied()), Phase::Endgame);

        assert_eq!(classify(&board, Color::Black, 27), Some(Stability::Stable));
        assert_eq!(stability(&board), 1.0);
        assert_eq!(mobility(&board), 0.0);
        assert_eq!(disc_parity(&board), 1.0);
        assert_eq!(evaluate(&board), 45.0 + 30.0 + 25.0 + 25.0 * 64.0);
    }

    #[test]
    fn test_phases() {
        assert_eq!(Phase::of(4), Phase::Opening);
        assert_eq!(Phase::of(20), Phase::Midgame);
        assert_eq!(Phase::of(44), Phase::Midgame);
        assert_eq!(Phase::of(45), Phase::Endgame);
    }
}
