//! Depth-first backtracking search for a sorting move sequence.
//!
//! The search walks the move graph with an explicit frame stack, so the
//! depth ceiling bounds heap use rather than native stack use. Every state
//! reached by a move is recorded in a [`SearchSession`]; a move that lands on
//! a recorded state is undone and skipped. The starting state itself is not
//! recorded, only states produced by moves.
//!
//! Enumeration order is fixed by [`legal_moves`], so a given layout and
//! configuration always produce the same move sequence.

use std::collections::HashSet;
use std::time::Instant;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, PrecondViolation};
use crate::moves::{legal_moves, Move, MoveList};
use crate::puzzle::{Layout, PuzzleConfig};
use crate::state::{PuzzleState, StateKey};

/// Default maximum search depth
pub const DEFAULT_DEPTH_CEILING: usize = 900;

/// Which layouts end up in [`SolverResult::path`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum PathMode {
    /// Only the layouts along the solving move sequence
    #[default]
    Winning,
    /// Every state kept during the search, in visit order, abandoned
    /// branches included
    Explored,
}

/// Configuration for the solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Nodes deeper than this are not expanded
    pub depth_ceiling: usize,
    pub path_mode: PathMode,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            depth_ceiling: DEFAULT_DEPTH_CEILING,
            path_mode: PathMode::default(),
        }
    }
}

/// How a solve attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Solved,
    /// Every reachable state was tried
    Exhausted,
    /// No solution found and at least one branch was cut at the ceiling
    DepthLimited,
    /// Rejected before searching: a tube starts full and single-colored
    Degenerate,
}

/// Counters collected during a search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    /// States whose moves were enumerated
    pub nodes_expanded: usize,
    /// Moves undone because they reached an already-seen state
    pub duplicates_pruned: usize,
    /// States not expanded because they sat beyond the ceiling
    pub ceiling_prunes: usize,
    pub max_depth: usize,
    pub time_elapsed_ms: u64,
}

/// Result of a solve attempt
#[derive(Debug, Clone)]
pub struct SolverResult {
    pub solved: bool,
    pub outcome: Outcome,
    /// Length of the solving sequence, 0 when unsolved
    pub step_count: usize,
    /// The solving sequence, empty when unsolved
    pub moves: Vec<Move>,
    pub path: Vec<Layout>,
    pub stats: SearchStats,
}

/// Visited states for one solve attempt.
///
/// Independent attempts each take their own session, so nothing is shared
/// between them.
#[derive(Debug, Default)]
pub struct SearchSession {
    visited: HashSet<StateKey>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a state. Returns false if it was already present.
    pub fn insert(&mut self, key: StateKey) -> bool {
        self.visited.insert(key)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    pub fn clear(&mut self) {
        self.visited.clear();
    }
}

/// One level of the search: the moves available at that node and a cursor.
#[derive(Debug)]
struct SearchFrame {
    moves: MoveList,
    next: usize,
}

impl SearchFrame {
    fn new(state: &PuzzleState) -> Self {
        Self {
            moves: legal_moves(state),
            next: 0,
        }
    }

    fn next_move(&mut self) -> Option<Move> {
        let mv = self.moves.get(self.next).copied();
        self.next += 1;
        mv
    }
}

/// Solve a puzzle from its layout with a fresh session.
pub fn solve(config: &PuzzleConfig, solver_config: &SolverConfig) -> Result<SolverResult, Error> {
    let mut state = PuzzleState::from_config(config)?;
    let mut session = SearchSession::new();
    search(&mut state, &mut session, solver_config).map_err(Error::from)
}

/// Search from the current contents of `state`.
///
/// On success the state is left solved and its history ends with the
/// solving moves; otherwise it is back where it started. Precondition
/// violations can only come from broken move rules and are passed straight
/// up.
pub fn search(
    state: &mut PuzzleState,
    session: &mut SearchSession,
    config: &SolverConfig,
) -> Result<SolverResult, PrecondViolation> {
    let start_time = Instant::now();
    let mut stats = SearchStats::default();

    if state.is_degenerate_initial() {
        debug!("degenerate starting layout, not searching");
        return Ok(finish(Outcome::Degenerate, Vec::new(), Vec::new(), stats, start_time));
    }

    let start = state.clone();
    let base = state.history().len();
    let mut explored = Vec::new();

    if state.is_solved() {
        return Ok(finish(Outcome::Solved, Vec::new(), Vec::new(), stats, start_time));
    }

    let mut frames = vec![SearchFrame::new(state)];
    stats.nodes_expanded = 1;

    while let Some(frame) = frames.last_mut() {
        let Some(mv) = frame.next_move() else {
            frames.pop();
            // The root frame was not entered through a move
            if !frames.is_empty() {
                state.undo()?;
            }
            continue;
        };

        state.apply(mv)?;
        if !session.insert(state.canonical_encoding()) {
            stats.duplicates_pruned += 1;
            state.undo()?;
            continue;
        }

        let depth = frames.len();
        stats.max_depth = stats.max_depth.max(depth);
        if config.path_mode == PathMode::Explored {
            explored.push(state.to_layout());
        }

        if state.is_solved() {
            let moves = state.history()[base..].to_vec();
            let path = match config.path_mode {
                PathMode::Winning => start.layouts_after(&moves)?,
                PathMode::Explored => explored,
            };
            return Ok(finish(Outcome::Solved, moves, path, stats, start_time));
        }

        if depth > config.depth_ceiling {
            stats.ceiling_prunes += 1;
            state.undo()?;
            continue;
        }

        stats.nodes_expanded += 1;
        frames.push(SearchFrame::new(state));
    }

    let outcome = if stats.ceiling_prunes > 0 {
        Outcome::DepthLimited
    } else {
        Outcome::Exhausted
    };
    Ok(finish(outcome, Vec::new(), explored, stats, start_time))
}

fn finish(
    outcome: Outcome,
    moves: Vec<Move>,
    path: Vec<Layout>,
    mut stats: SearchStats,
    start_time: Instant,
) -> SolverResult {
    stats.time_elapsed_ms = start_time.elapsed().as_millis() as u64;
    debug!(
        ?outcome,
        steps = moves.len(),
        nodes = stats.nodes_expanded,
        duplicates = stats.duplicates_pruned,
        max_depth = stats.max_depth,
        "search finished"
    );
    SolverResult {
        solved: outcome == Outcome::Solved,
        outcome,
        step_count: moves.len(),
        moves,
        path,
        stats,
    }
}
