//! Move legality and disc flipping.
//!
//! A placement captures along a direction when one or more opposing discs lie
//! contiguously outward from the target and are closed off by a disc of the
//! mover's color. The move is legal iff at least one direction captures.

use crate::board::Board;
use crate::types::{Color, Square};
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

/// The eight compass directions as (row, col) steps, clockwise from north-west.
pub const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// Runs of flipped indices, one run per capturing direction.
///
/// Each run is ordered outward from the placed disc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipSet {
    runs: Vec<Vec<usize>>,
}

impl FlipSet {
    /// Per-direction runs in [`DIRECTIONS`] order.
    pub fn runs(&self) -> &[Vec<usize>] {
        &self.runs
    }

    /// Total number of flipped discs.
    pub fn total(&self) -> usize {
        self.runs.iter().map(Vec::len).sum()
    }

    /// True if nothing is flipped.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// All flipped indices, flattened.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.runs.iter().flatten().copied()
    }
}

/// Walks outward from `index` along `(dr, dc)` and returns the captured run,
/// or `None` if this direction does not capture.
fn scan(board: &Board, color: Color, index: usize, (dr, dc): (isize, isize)) -> Option<Vec<usize>> {
    let (row, col) = Board::coords(index)?;
    let opponent = Square::Occupied(color.opponent());
    let mut run = Vec::new();
    let (mut r, mut c) = (row as isize + dr, col as isize + dc);

    while let Some(next) = Board::offset(r, c) {
        match board.get(next)? {
            square if square == opponent => run.push(next),
            Square::Occupied(_) => return (!run.is_empty()).then_some(run),
            Square::Empty => return None,
        }
        r += dr;
        c += dc;
    }

    None
}

/// Computes the runs `color` would capture by placing at `index`.
///
/// Empty for occupied or off-board targets.
pub fn captures(board: &Board, color: Color, index: usize) -> FlipSet {
    if !board.is_empty(index) {
        return FlipSet::default();
    }

    let runs = DIRECTIONS
        .iter()
        .filter_map(|&dir| scan(board, color, index, dir))
        .collect();

    FlipSet { runs }
}

/// Checks whether `color` may place at `index`.
pub fn is_legal(board: &Board, color: Color, index: usize) -> bool {
    board.is_empty(index)
        && DIRECTIONS
            .iter()
            .any(|&dir| scan(board, color, index, dir).is_some())
}

/// Lists every legal placement for `color`, ascending.
pub fn legal_moves(board: &Board, color: Color) -> Vec<usize> {
    (0..board.squares().len())
        .filter(|&index| is_legal(board, color, index))
        .collect()
}

/// Places `color` at `index` and flips every captured run.
///
/// Returns `None` and leaves the board untouched when the placement captures
/// nothing (including occupied or off-board targets).
#[instrument(skip(board))]
pub fn place(board: &mut Board, color: Color, index: usize) -> Option<FlipSet> {
    let flips = captures(board, color, index);
    if flips.is_empty() {
        return None;
    }

    board.set(index, Square::Occupied(color)).ok()?;
    for flipped in flips.indices() {
        // Indices come from `scan`, which only yields on-board squares.
        let _ = board.set(flipped, Square::Occupied(color));
    }

    trace!(flipped = flips.total(), runs = flips.runs().len(), "Placed disc");
    Some(flips)
}
