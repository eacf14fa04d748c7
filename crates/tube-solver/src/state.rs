//! Tube grid state with stack-style push/pop primitives.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::error::{LayoutError, PrecondViolation};
use crate::moves::Move;
use crate::puzzle::{Color, Layout, PuzzleClass, PuzzleConfig};

/// Cell value marking an unoccupied slot
pub const EMPTY_CELL: u8 = u8::MAX;

/// Largest supported tube capacity (heights are stored as bytes)
pub const MAX_CAPACITY: usize = u8::MAX as usize;

/// Packed image of the grid, one byte per cell in tube order.
///
/// Two keys are equal iff every tube holds the same cell sequence at the same
/// index. Interchangeable empty tubes are not folded together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey(Box<[u8]>);

impl StateKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Mutable puzzle state: a `tube_count x capacity` grid plus per-tube heights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleState {
    capacity: usize,
    cells: Vec<u8>,
    heights: SmallVec<[u8; 16]>,
    pub(crate) history: Vec<Move>,
}

impl PuzzleState {
    /// The sorted starting grid of a class: full single-color tubes followed
    /// by the empty ones.
    pub fn new(class: &PuzzleClass) -> Result<Self, LayoutError> {
        Self::from_layout(&Layout::sorted(class), class.capacity)
    }

    /// Build a state from the exchange format.
    pub fn from_layout(layout: &Layout, capacity: usize) -> Result<Self, LayoutError> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(LayoutError::InvalidCapacity {
                capacity,
                max: MAX_CAPACITY,
            });
        }
        if layout.tube_count() == 0 {
            return Err(LayoutError::NoTubes);
        }

        let mut cells = vec![EMPTY_CELL; layout.tube_count() * capacity];
        let mut heights = SmallVec::with_capacity(layout.tube_count());

        for (tube, units) in layout.tubes().iter().enumerate() {
            if units.len() > capacity {
                return Err(LayoutError::Overfilled {
                    tube,
                    len: units.len(),
                    capacity,
                });
            }
            for (slot, color) in units.iter().enumerate() {
                if color.0 == EMPTY_CELL {
                    return Err(LayoutError::ReservedColor(color.0));
                }
                cells[tube * capacity + slot] = color.0;
            }
            heights.push(units.len() as u8);
        }

        Ok(Self {
            capacity,
            cells,
            heights,
            history: Vec::new(),
        })
    }

    pub fn from_config(config: &PuzzleConfig) -> Result<Self, LayoutError> {
        Self::from_layout(&config.tubes, config.capacity())
    }

    /// Convert back to the exchange format.
    pub fn to_layout(&self) -> Layout {
        Layout(
            (0..self.tube_count())
                .map(|t| self.tube(t).iter().copied().map(Color).collect())
                .collect(),
        )
    }

    pub fn tube_count(&self) -> usize {
        self.heights.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Units in tube `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` is not a tube of this grid.
    pub fn height(&self, t: usize) -> usize {
        self.heights[t] as usize
    }

    /// Moves applied since construction, oldest first
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Occupied cells of tube `t`, bottom to top.
    fn tube(&self, t: usize) -> &[u8] {
        let start = t * self.capacity;
        &self.cells[start..start + self.height(t)]
    }

    fn check_tube(&self, t: usize) -> Result<(), PrecondViolation> {
        if t >= self.tube_count() {
            return Err(PrecondViolation::NoSuchTube {
                tube: t,
                tube_count: self.tube_count(),
            });
        }
        Ok(())
    }

    /// Tube predicates index the grid directly and panic when
    /// `t >= tube_count()`; `top`, `pop` and `push` are the checked accessors.
    pub fn is_full(&self, t: usize) -> bool {
        self.height(t) == self.capacity
    }

    /// Panics if `t` is out of range, like [`Self::is_full`].
    pub fn is_empty(&self, t: usize) -> bool {
        self.heights[t] == 0
    }

    /// True if the tube is empty or every unit matches the bottom one.
    /// Panics if `t` is out of range.
    pub fn has_one_color(&self, t: usize) -> bool {
        match self.tube(t) {
            [] => true,
            [base, rest @ ..] => rest.iter().all(|c| c == base),
        }
    }

    pub fn is_solved_tube(&self, t: usize) -> bool {
        self.is_empty(t) || (self.is_full(t) && self.has_one_color(t))
    }

    pub fn is_solved(&self) -> bool {
        (0..self.tube_count()).all(|t| self.is_solved_tube(t))
    }

    /// A starting grid with a tube that is already full and single-colored.
    ///
    /// The generator does not count such layouts as puzzles.
    pub fn is_degenerate_initial(&self) -> bool {
        (0..self.tube_count()).any(|t| self.is_full(t) && self.has_one_color(t))
    }

    pub fn top(&self, t: usize) -> Result<Color, PrecondViolation> {
        self.check_tube(t)?;
        if self.is_empty(t) {
            return Err(PrecondViolation::EmptyTube { tube: t });
        }
        Ok(Color(self.cells[t * self.capacity + self.height(t) - 1]))
    }

    pub fn pop(&mut self, t: usize) -> Result<Color, PrecondViolation> {
        let color = self.top(t)?;
        let slot = t * self.capacity + self.height(t) - 1;
        self.cells[slot] = EMPTY_CELL;
        self.heights[t] -= 1;
        Ok(color)
    }

    pub fn push(&mut self, t: usize, color: Color) -> Result<(), PrecondViolation> {
        self.check_tube(t)?;
        if self.is_full(t) {
            return Err(PrecondViolation::FullTube { tube: t });
        }
        let slot = t * self.capacity + self.height(t);
        self.cells[slot] = color.0;
        self.heights[t] += 1;
        Ok(())
    }

    /// Whether `color` may be poured onto tube `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` is not a tube of this grid.
    pub fn can_receive(&self, t: usize, color: Color) -> bool {
        if self.is_empty(t) {
            return true;
        }
        !self.is_full(t) && self.top(t) == Ok(color)
    }

    pub fn canonical_encoding(&self) -> StateKey {
        StateKey(self.cells.clone().into_boxed_slice())
    }

    /// Units per color across the whole grid.
    pub fn color_counts(&self) -> BTreeMap<Color, usize> {
        let mut counts = BTreeMap::new();
        for t in 0..self.tube_count() {
            for &c in self.tube(t) {
                *counts.entry(Color(c)).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Progress score for learning-style drivers.
    ///
    /// Solved grids score `10 * capacity * colors + 100`, a grid already seen
    /// in the current attempt scores -10, anything else earns 10 points per
    /// unit sitting in a single-colored tube.
    pub fn reward(&self, seen: bool) -> i64 {
        if self.is_solved() {
            let colors = self.color_counts().len() as i64;
            return 10 * self.capacity as i64 * colors + 100;
        }
        if seen {
            return -10;
        }
        (0..self.tube_count())
            .filter(|&t| self.has_one_color(t))
            .map(|t| 10 * self.height(t) as i64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(tubes: &[&[u8]], capacity: usize) -> PuzzleState {
        PuzzleState::from_layout(&Layout::from_ids(tubes), capacity).unwrap()
    }

    #[test]
    fn test_tube_predicates() {
        let s = state(&[&[0, 1], &[1, 1], &[0], &[]], 2);

        assert!(s.is_full(0));
        assert!(!s.has_one_color(0));
        assert!(!s.is_solved_tube(0));

        assert!(s.is_full(1) && s.has_one_color(1));
        assert!(s.is_solved_tube(1));

        assert!(!s.is_full(2) && s.has_one_color(2));
        assert!(!s.is_solved_tube(2));

        assert!(s.is_empty(3) && s.has_one_color(3));
        assert!(s.is_solved_tube(3));
    }

    #[test]
    fn test_solved_predicate() {
        assert!(state(&[&[0, 0], &[1, 1], &[]], 2).is_solved());
        assert!(state(&[&[], &[]], 3).is_solved());
        assert!(!state(&[&[0, 1], &[1, 0], &[]], 2).is_solved());
        // Uniform but not full
        assert!(!state(&[&[0], &[0], &[1, 1]], 2).is_solved());
    }

    #[test]
    fn test_push_pop_preconditions() {
        let mut s = state(&[&[0, 1], &[]], 2);

        assert_eq!(s.top(1), Err(PrecondViolation::EmptyTube { tube: 1 }));
        assert_eq!(s.pop(1), Err(PrecondViolation::EmptyTube { tube: 1 }));
        assert_eq!(s.push(0, Color(1)), Err(PrecondViolation::FullTube { tube: 0 }));
        assert_eq!(
            s.top(5),
            Err(PrecondViolation::NoSuchTube {
                tube: 5,
                tube_count: 2
            })
        );

        assert_eq!(s.pop(0), Ok(Color(1)));
        assert_eq!(s.height(0), 1);
        assert_eq!(s.top(0), Ok(Color(0)));
        s.push(1, Color(1)).unwrap();
        assert_eq!(s.to_layout(), Layout::from_ids(&[vec![0u8], vec![1]]));
    }

    #[test]
    #[should_panic]
    fn test_predicate_out_of_range_panics() {
        let s = state(&[&[0, 1], &[]], 2);
        s.can_receive(2, Color(0));
    }

    #[test]
    fn test_pop_clears_cell() {
        let mut s = state(&[&[0, 1], &[]], 2);
        s.pop(0).unwrap();
        assert_eq!(s.canonical_encoding().as_bytes(), &[0, EMPTY_CELL, EMPTY_CELL, EMPTY_CELL]);
    }

    #[test]
    fn test_can_receive() {
        let s = state(&[&[0, 1], &[1], &[0], &[]], 2);
        assert!(s.can_receive(3, Color(0)));
        assert!(s.can_receive(1, Color(1)));
        assert!(!s.can_receive(1, Color(0)));
        // Matching top but no room
        assert!(!s.can_receive(0, Color(1)));
    }

    #[test]
    fn test_degenerate_initial() {
        assert!(state(&[&[0, 0], &[1, 1]], 2).is_degenerate_initial());
        assert!(!state(&[&[0, 1], &[1, 0], &[]], 2).is_degenerate_initial());
        // Single-colored but not full is fine
        assert!(!state(&[&[0], &[1, 0], &[1]], 2).is_degenerate_initial());
    }

    #[test]
    fn test_layout_round_trip() {
        let layout = Layout::from_ids(&[vec![2u8, 0, 1], vec![1], vec![], vec![0, 2]]);
        let s = PuzzleState::from_layout(&layout, 3).unwrap();
        assert_eq!(s.to_layout(), layout);

        let rebuilt = PuzzleState::from_layout(&s.to_layout(), 3).unwrap();
        assert_eq!(rebuilt.canonical_encoding(), s.canonical_encoding());
    }

    #[test]
    fn test_encoding_respects_tube_order() {
        let a = state(&[&[0], &[]], 2);
        let b = state(&[&[], &[0]], 2);
        assert_ne!(a.canonical_encoding(), b.canonical_encoding());
    }

    #[test]
    fn test_invalid_layouts() {
        let layout = Layout::from_ids(&[vec![0u8, 0, 0]]);
        assert!(matches!(
            PuzzleState::from_layout(&layout, 2),
            Err(LayoutError::Overfilled { tube: 0, len: 3, capacity: 2 })
        ));
        assert!(matches!(
            PuzzleState::from_layout(&layout, 0),
            Err(LayoutError::InvalidCapacity { .. })
        ));
        assert_eq!(
            PuzzleState::from_layout(&Layout::default(), 2),
            Err(LayoutError::NoTubes)
        );
        assert_eq!(
            PuzzleState::from_layout(&Layout::from_ids(&[vec![255u8]]), 2),
            Err(LayoutError::ReservedColor(255))
        );
    }

    #[test]
    fn test_new_builds_sorted_grid() {
        let s = PuzzleState::new(&PuzzleClass::new(3, 4, 2)).unwrap();
        assert_eq!(s.tube_count(), 5);
        assert!(s.is_solved());
        assert!(s.is_degenerate_initial());
        assert_eq!(s.color_counts().values().copied().collect::<Vec<_>>(), vec![4, 4, 4]);
    }

    #[test]
    fn test_reward() {
        let solved = state(&[&[0, 0], &[1, 1], &[]], 2);
        assert_eq!(solved.reward(false), 10 * 2 * 2 + 100);

        let s = state(&[&[0, 1], &[1], &[0], &[]], 2);
        assert_eq!(s.reward(true), -10);
        // Tubes 1 and 2 are single-colored with one unit each
        assert_eq!(s.reward(false), 20);
    }
}
