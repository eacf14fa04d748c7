//! Random instance generation for building a puzzle catalog.
//!
//! For each puzzle class the generator draws layouts, drops the degenerate
//! ones, runs the solver and records every solved layout with its step count.
//! A class stops after its attempt count or its wall-clock budget, whichever
//! comes first. The budget is only checked between solve calls.

use std::path::Path;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::{LayoutError, Result};
use crate::puzzle::{Color, Layout, PuzzleClass, PuzzleConfig};
use crate::solver::{search, SearchSession, SolverConfig};
use crate::state::PuzzleState;

/// How candidate layouts are drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Shuffle every unit independently
    #[default]
    Units,
    /// Keep the interleaved starting rows intact and permute whole tubes.
    /// Shuffles accumulate across draws, so at most `colors!` layouts exist.
    Tubes,
}

/// Configuration for the generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Layouts drawn per class
    pub attempts: usize,
    /// Wall-clock budget per class
    pub budget: Duration,
    /// Seed for reproducible runs; drawn from the OS when absent
    pub seed: Option<u64>,
    pub strategy: SamplingStrategy,
    pub solver: SolverConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            attempts: 100,
            budget: Duration::from_secs(120),
            seed: None,
            strategy: SamplingStrategy::default(),
            solver: SolverConfig::default(),
        }
    }
}

/// What happened while generating one class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassReport {
    pub class: Option<PuzzleClass>,
    /// Layouts drawn
    pub drawn: usize,
    /// Layouts skipped as degenerate
    pub degenerate: usize,
    /// Layouts the solver was run on
    pub searched: usize,
    pub solved: usize,
    /// Solved layouts that were new to the catalog
    pub accepted: usize,
    pub budget_exhausted: bool,
}

/// Draws candidate layouts for one class.
pub struct LayoutSampler {
    class: PuzzleClass,
    strategy: SamplingStrategy,
    /// Filled tubes only; empty tubes are appended per draw
    rows: Vec<Vec<Color>>,
}

impl LayoutSampler {
    /// Start from the interleaved grid: color ids `0..colors` repeated
    /// `capacity` times, cut into tubes of `capacity` units.
    pub fn new(
        class: PuzzleClass,
        strategy: SamplingStrategy,
    ) -> std::result::Result<Self, LayoutError> {
        class.validate()?;
        let units: Vec<Color> = (0..class.capacity)
            .flat_map(|_| (0..class.colors).map(|c| Color(c as u8)))
            .collect();
        let rows = units.chunks(class.capacity).map(<[Color]>::to_vec).collect();
        Ok(Self {
            class,
            strategy,
            rows,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Layout {
        match self.strategy {
            SamplingStrategy::Units => {
                let mut units: Vec<Color> = self.rows.concat();
                units.shuffle(rng);
                self.rows = units.chunks(self.class.capacity).map(<[Color]>::to_vec).collect();
            }
            SamplingStrategy::Tubes => self.rows.shuffle(rng),
        }

        let mut tubes = self.rows.clone();
        tubes.extend((0..self.class.empty).map(|_| Vec::new()));
        Layout(tubes)
    }
}

/// Draw a single layout for `class`.
pub fn sample_layout<R: Rng + ?Sized>(
    class: &PuzzleClass,
    strategy: SamplingStrategy,
    rng: &mut R,
) -> std::result::Result<Layout, LayoutError> {
    Ok(LayoutSampler::new(*class, strategy)?.sample(rng))
}

/// Generate solved layouts for one class into `catalog`.
pub fn generate_class<R: Rng + ?Sized>(
    class: PuzzleClass,
    config: &GeneratorConfig,
    rng: &mut R,
    catalog: &mut Catalog,
) -> Result<ClassReport> {
    // A budget too large to represent means no deadline
    let deadline = Instant::now().checked_add(config.budget);
    let mut sampler = LayoutSampler::new(class, config.strategy)?;
    let mut report = ClassReport {
        class: Some(class),
        ..Default::default()
    };
    catalog.ensure_class(class);

    for _ in 0..config.attempts {
        let layout = sampler.sample(rng);
        report.drawn += 1;

        let mut state = PuzzleState::from_layout(&layout, class.capacity)?;
        if state.is_degenerate_initial() {
            report.degenerate += 1;
            continue;
        }

        let mut session = SearchSession::new();
        let result = search(&mut state, &mut session, &config.solver)?;
        report.searched += 1;

        if result.solved {
            report.solved += 1;
            let entry = CatalogEntry {
                layout,
                steps: result.step_count,
            };
            if catalog.insert(class, entry) {
                report.accepted += 1;
            }
        }
        debug!(%class, solved = result.solved, steps = result.step_count, "attempt finished");

        if deadline.is_some_and(|deadline| Instant::now() > deadline) {
            report.budget_exhausted = true;
            break;
        }
    }

    Ok(report)
}

/// Run every class in order, rewriting `output` after each one.
///
/// An existing catalog at `output` is loaded and extended.
pub fn generate(
    classes: &[PuzzleClass],
    config: &GeneratorConfig,
    output: &Path,
) -> Result<(Catalog, Vec<ClassReport>)> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut catalog = Catalog::load_or_default(output)?;
    let mut reports = Vec::with_capacity(classes.len());

    for &class in classes {
        let report = generate_class(class, config, &mut rng, &mut catalog)?;
        info!(
            total = catalog.total(),
            %class,
            count = catalog.class_len(&class),
            accepted = report.accepted,
            "class finished"
        );
        catalog.save(output)?;
        reports.push(report);
    }

    Ok((catalog, reports))
}

/// Puzzle config for a catalog entry of `class`.
pub fn entry_config(class: &PuzzleClass, entry: &CatalogEntry) -> PuzzleConfig {
    PuzzleConfig::new(entry.layout.clone(), class.capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::moves::verify_solution;
    use crate::solver::solve;

    fn quick_config(seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            attempts: 12,
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_sampler_conserves_units() {
        let class = PuzzleClass::new(4, 3, 2);
        let mut rng = StdRng::seed_from_u64(1);
        for strategy in [SamplingStrategy::Units, SamplingStrategy::Tubes] {
            let mut sampler = LayoutSampler::new(class, strategy).unwrap();
            for _ in 0..20 {
                let layout = sampler.sample(&mut rng);
                assert_eq!(layout.tube_count(), 6);
                assert!(layout.tubes()[4].is_empty() && layout.tubes()[5].is_empty());

                let state = PuzzleState::from_layout(&layout, 3).unwrap();
                let counts: Vec<usize> = state.color_counts().values().copied().collect();
                assert_eq!(counts, vec![3, 3, 3, 3]);
            }
        }
    }

    #[test]
    fn test_tube_strategy_permutes_rows() {
        let class = PuzzleClass::new(3, 2, 1);
        let mut rng = StdRng::seed_from_u64(5);
        let mut sampler = LayoutSampler::new(class, SamplingStrategy::Tubes).unwrap();

        let mut rows = sampler.sample(&mut rng).tubes()[..3].to_vec();
        rows.sort();
        let expected = Layout::from_ids(&[vec![0u8, 1], vec![1, 2], vec![2, 0]]);
        assert_eq!(rows, expected.tubes());
    }

    #[test]
    fn test_single_color_class_is_always_degenerate() {
        let class = PuzzleClass::new(1, 3, 1);
        let mut rng = StdRng::seed_from_u64(0);
        let mut catalog = Catalog::new();

        let report = generate_class(class, &quick_config(0), &mut rng, &mut catalog).unwrap();
        assert_eq!(report.drawn, 12);
        assert_eq!(report.degenerate, 12);
        assert_eq!(report.searched, 0);
        assert_eq!(catalog.class_len(&class), 0);
    }

    #[test]
    fn test_accepted_entries_are_solvable() {
        let class = PuzzleClass::new(3, 3, 2);
        let mut rng = StdRng::seed_from_u64(9);
        let mut catalog = Catalog::new();

        let report = generate_class(class, &quick_config(9), &mut rng, &mut catalog).unwrap();
        assert_eq!(report.drawn, report.degenerate + report.searched);
        assert!(report.accepted <= report.solved);
        assert_eq!(catalog.class_len(&class), report.accepted);

        for entry in catalog.entries(&class) {
            let puzzle = entry_config(&class, entry);
            let result = solve(&puzzle, &SolverConfig::default()).unwrap();
            assert!(result.solved);
            assert_eq!(result.step_count, entry.steps);
            assert!(verify_solution(&puzzle, &result.moves));
        }
    }

    #[test]
    fn test_zero_budget_stops_after_first_search() {
        let class = PuzzleClass::new(3, 3, 2);
        let mut rng = StdRng::seed_from_u64(2);
        let mut catalog = Catalog::new();
        let config = GeneratorConfig {
            budget: Duration::ZERO,
            ..quick_config(2)
        };

        let report = generate_class(class, &config, &mut rng, &mut catalog).unwrap();
        assert_eq!(report.searched, 1);
        assert!(report.budget_exhausted);
    }

    #[test]
    fn test_unbounded_budget_has_no_deadline() {
        let class = PuzzleClass::new(2, 2, 1);
        let mut rng = StdRng::seed_from_u64(4);
        let mut catalog = Catalog::new();
        let config = GeneratorConfig {
            attempts: 3,
            budget: Duration::from_secs(u64::MAX),
            ..quick_config(4)
        };

        let report = generate_class(class, &config, &mut rng, &mut catalog).unwrap();
        assert_eq!(report.drawn, 3);
        assert!(!report.budget_exhausted);
    }

    #[test]
    fn test_oversized_class_rejected() {
        let class = PuzzleClass::new(300, 2, 1);
        assert!(LayoutSampler::new(class, SamplingStrategy::Units).is_err());

        let mut rng = StdRng::seed_from_u64(0);
        let mut catalog = Catalog::new();
        let err = generate_class(class, &quick_config(0), &mut rng, &mut catalog).unwrap_err();
        assert!(matches!(err, Error::Layout(LayoutError::InvalidClass(_))));
        assert_eq!(catalog.classes().count(), 0);
    }

    #[test]
    fn test_generate_is_reproducible_and_extends_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let classes = [PuzzleClass::new(2, 2, 1), PuzzleClass::new(3, 3, 2)];

        let first_path = dir.path().join("first.json");
        let second_path = dir.path().join("second.json");
        let (first, reports) = generate(&classes, &quick_config(77), &first_path).unwrap();
        let (second, _) = generate(&classes, &quick_config(77), &second_path).unwrap();

        assert_eq!(first, second);
        assert_eq!(reports.len(), 2);
        assert_eq!(Catalog::load(&first_path).unwrap(), first);

        // Same seed again into the same file adds nothing new
        let (again, reports) = generate(&classes, &quick_config(77), &first_path).unwrap();
        assert_eq!(again, first);
        assert!(reports.iter().all(|r| r.accepted == 0));
    }
}
