//! Tube-sort puzzle solver.
//!
//! This crate models tube-sort puzzles (fixed-capacity stacks of colored
//! units) and searches for a sequence of legal pours that sorts every tube.
//! A generator on top of the solver builds catalogs of solvable layouts.

pub mod catalog;
pub mod error;
pub mod generator;
pub mod logging;
pub mod moves;
pub mod puzzle;
pub mod solver;
pub mod state;

// Re-export main types
pub use catalog::{Catalog, CatalogEntry};
pub use error::{Error, LayoutError, MoveError, PrecondViolation, Result};
pub use generator::{generate, generate_class, ClassReport, GeneratorConfig, SamplingStrategy};
pub use moves::{legal_moves, replay, verify_solution, Move};
pub use puzzle::{Color, Layout, PuzzleClass, PuzzleConfig};
pub use solver::{search, solve, Outcome, PathMode, SearchSession, SolverConfig, SolverResult};
pub use state::{PuzzleState, StateKey};
