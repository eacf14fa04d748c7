//! Error types for the tube-sort core.
//!
//! Unsolvable puzzles are not errors: the solver reports them in-band through
//! [`crate::solver::SolverResult`]. Everything here is either bad input or a
//! caller applying a transfer the rules do not allow.

use thiserror::Error;

use crate::moves::Move;

/// A primitive stack operation was called in a state that forbids it.
///
/// The search only applies moves produced by the move rules, so hitting one
/// of these from inside the solver means the rules themselves are broken.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecondViolation {
    #[error("tube {tube} is empty")]
    EmptyTube { tube: usize },

    #[error("tube {tube} is full")]
    FullTube { tube: usize },

    #[error("tube {tube} does not exist ({tube_count} tubes)")]
    NoSuchTube { tube: usize, tube_count: usize },
}

/// A layout or puzzle class that cannot be turned into a state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("capacity must be between 1 and {max}, got {capacity}")]
    InvalidCapacity { capacity: usize, max: usize },

    #[error("tube {tube} holds {len} units but capacity is {capacity}")]
    Overfilled {
        tube: usize,
        len: usize,
        capacity: usize,
    },

    #[error("color id {0} is reserved for empty cells")]
    ReservedColor(u8),

    #[error("layout has no tubes")]
    NoTubes,

    #[error("invalid puzzle class {0:?}, expected COLORS:CAPACITY:EMPTY")]
    InvalidClass(String),
}

/// A move list that cannot be replayed from its starting layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("move {index} ({mv}) is not legal")]
    Illegal { index: usize, mv: Move },
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Precondition(#[from] PrecondViolation),

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, Error>;
