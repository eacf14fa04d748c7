//! Transfer rules: which pours are legal, and how to apply and undo them.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Error, MoveError, PrecondViolation};
use crate::puzzle::{Layout, PuzzleConfig};
use crate::state::PuzzleState;

/// Moves available from one node (inline for typical tube counts)
pub type MoveList = SmallVec<[Move; 16]>;

/// Pour the top unit of `source` onto `dest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub source: usize,
    pub dest: usize,
}

impl Move {
    pub fn new(source: usize, dest: usize) -> Self {
        Self { source, dest }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.dest)
    }
}

/// All useful transfers from `state`, in ascending `(source, dest)` order.
///
/// Sources that are empty or already solved are skipped. Moves into
/// different empty tubes are listed separately.
pub fn legal_moves(state: &PuzzleState) -> MoveList {
    let mut moves = MoveList::new();
    let tubes = state.tube_count();

    for source in 0..tubes {
        if state.is_solved_tube(source) {
            continue;
        }
        let Ok(color) = state.top(source) else {
            continue;
        };
        for dest in 0..tubes {
            if source != dest && state.can_receive(dest, color) {
                moves.push(Move::new(source, dest));
            }
        }
    }

    moves
}

/// Whether `mv` obeys the pour rule in `state`, solved source tubes included.
pub fn is_legal(state: &PuzzleState, mv: Move) -> bool {
    if mv.source == mv.dest || mv.source >= state.tube_count() || mv.dest >= state.tube_count() {
        return false;
    }
    match state.top(mv.source) {
        Ok(color) => state.can_receive(mv.dest, color),
        Err(_) => false,
    }
}

impl PuzzleState {
    /// Apply a transfer and record it in the history.
    ///
    /// Only the stack preconditions are checked; color matching is the
    /// caller's job (see [`legal_moves`]).
    pub fn apply(&mut self, mv: Move) -> Result<(), PrecondViolation> {
        let color = self.top(mv.source)?;
        self.push(mv.dest, color)?;
        self.pop(mv.source)?;
        self.history.push(mv);
        Ok(())
    }

    /// Reverse the most recent transfer. Returns `None` when nothing was applied.
    pub fn undo(&mut self) -> Result<Option<Move>, PrecondViolation> {
        let Some(mv) = self.history.pop() else {
            return Ok(None);
        };
        let color = self.top(mv.dest)?;
        self.push(mv.source, color)?;
        self.pop(mv.dest)?;
        Ok(Some(mv))
    }

    /// The layout after each of `moves`, applied to a copy of this state.
    pub fn layouts_after(&self, moves: &[Move]) -> Result<Vec<Layout>, PrecondViolation> {
        let mut replayed = self.clone();
        moves
            .iter()
            .map(|&mv| {
                replayed.apply(mv)?;
                Ok(replayed.to_layout())
            })
            .collect()
    }
}

/// Replay `moves` from the puzzle's starting layout.
pub fn replay(config: &PuzzleConfig, moves: &[Move]) -> Result<PuzzleState, Error> {
    let mut state = PuzzleState::from_config(config)?;
    for (index, &mv) in moves.iter().enumerate() {
        if !is_legal(&state, mv) {
            return Err(MoveError::Illegal { index, mv }.into());
        }
        state.apply(mv)?;
    }
    Ok(state)
}

/// Does the move list solve the puzzle?
pub fn verify_solution(config: &PuzzleConfig, moves: &[Move]) -> bool {
    replay(config, moves).map_or(false, |state| state.is_solved())
}
