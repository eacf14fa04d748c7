//! CLI entry point for the tube-sort solver.
//!
//! Usage:
//!   tube-solver solve <puzzle.json> [options]
//!   tube-solver solve --stdin [options]
//!   tube-solver verify <puzzle.json> --moves '[{"source":0,"dest":2}]'
//!   tube-solver generate --class 9:6:2 --class 10:5:2 --output catalog.json [options]
//!
//! Puzzle files look like `{"capacity": 2, "tubes": [[0,1],[1,0],[]]}`.
//! Results are printed to stdout as JSON; logs go to stderr (see `RUST_LOG`).

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use tube_solver::generator::{generate, ClassReport, GeneratorConfig, SamplingStrategy};
use tube_solver::moves::{replay, Move};
use tube_solver::puzzle::{Layout, PuzzleClass, PuzzleConfig};
use tube_solver::solver::{solve, Outcome, PathMode, SearchStats, SolverConfig, SolverResult};
use tube_solver::{logging, Error};

#[derive(Parser)]
#[command(name = "tube-solver")]
#[command(about = "Backtracking solver and instance generator for tube-sort puzzles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a move sequence that sorts a puzzle
    Solve {
        /// Path to puzzle JSON file (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read puzzle from stdin instead of file
        #[arg(long)]
        stdin: bool,

        /// Maximum search depth
        #[arg(long, default_value = "900")]
        depth_ceiling: usize,

        /// Which layouts to report in the path
        #[arg(long, value_enum, default_value = "winning")]
        path: PathMode,
    },

    /// Check that a move list sorts a puzzle
    Verify {
        /// Path to puzzle JSON file (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read puzzle from stdin instead of file
        #[arg(long)]
        stdin: bool,

        /// Moves as a JSON array of {"source", "dest"} objects
        #[arg(long)]
        moves: String,
    },

    /// Build a catalog of solvable layouts
    Generate {
        /// Puzzle class as COLORS:CAPACITY:EMPTY (repeatable)
        #[arg(long = "class", value_name = "CLASS", required = true)]
        classes: Vec<PuzzleClass>,

        /// Catalog file; extended if it already exists
        #[arg(long)]
        output: PathBuf,

        /// Layouts drawn per class
        #[arg(long, default_value = "100")]
        attempts: usize,

        /// Wall-clock budget per class in seconds
        #[arg(long, default_value = "120")]
        budget_secs: u64,

        /// RNG seed for reproducible catalogs
        #[arg(long)]
        seed: Option<u64>,

        /// How candidate layouts are drawn
        #[arg(long, value_enum, default_value = "units")]
        strategy: SamplingStrategy,

        /// Maximum search depth
        #[arg(long, default_value = "900")]
        depth_ceiling: usize,
    },
}

/// Output format for a solve
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SolveOutput {
    solved: bool,
    outcome: Outcome,
    step_count: usize,
    moves: Vec<Move>,
    path: Vec<Layout>,
    stats: SearchStats,
}

/// Output format for a move-list check
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOutput {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_layout: Option<Layout>,
}

/// Output format for a generator run
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateOutput {
    catalog_size: usize,
    classes: Vec<ClassReport>,
}

fn main() {
    logging::init("warn");
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Solve {
            file,
            stdin,
            depth_ceiling,
            path,
        } => {
            let puzzle = read_puzzle(file, stdin)?;
            let config = SolverConfig {
                depth_ceiling,
                path_mode: path,
            };

            let result = solve(&puzzle, &config).context("solver failed")?;
            let solved = result.solved;
            print_json(&format_result(result))?;

            // Exit with appropriate code
            Ok(if solved { 0 } else { 1 })
        }

        Commands::Verify { file, stdin, moves } => {
            let puzzle = read_puzzle(file, stdin)?;
            let moves: Vec<Move> =
                serde_json::from_str(&moves).context("failed to parse --moves")?;

            let output = match replay(&puzzle, &moves) {
                Ok(state) if state.is_solved() => VerifyOutput {
                    valid: true,
                    reason: None,
                    final_layout: Some(state.to_layout()),
                },
                Ok(state) => VerifyOutput {
                    valid: false,
                    reason: Some("moves do not sort the puzzle".to_string()),
                    final_layout: Some(state.to_layout()),
                },
                Err(e @ Error::Move(_)) => VerifyOutput {
                    valid: false,
                    reason: Some(e.to_string()),
                    final_layout: None,
                },
                Err(e) => return Err(e.into()),
            };
            print_json(&output)?;

            Ok(if output.valid { 0 } else { 1 })
        }

        Commands::Generate {
            classes,
            output,
            attempts,
            budget_secs,
            seed,
            strategy,
            depth_ceiling,
        } => {
            let config = GeneratorConfig {
                attempts,
                budget: Duration::from_secs(budget_secs),
                seed,
                strategy,
                solver: SolverConfig {
                    depth_ceiling,
                    ..Default::default()
                },
            };

            let (catalog, reports) = generate(&classes, &config, &output)
                .with_context(|| format!("failed to generate catalog {}", output.display()))?;
            print_json(&GenerateOutput {
                catalog_size: catalog.total(),
                classes: reports,
            })?;

            Ok(0)
        }
    }
}

fn read_puzzle(file: Option<PathBuf>, stdin: bool) -> anyhow::Result<PuzzleConfig> {
    let json_content = if stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read from stdin")?;
        buffer
    } else if let Some(path) = file {
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?
    } else {
        bail!("must provide either a file path or --stdin");
    };

    serde_json::from_str(&json_content).context("failed to parse puzzle JSON")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_result(result: SolverResult) -> SolveOutput {
    SolveOutput {
        solved: result.solved,
        outcome: result.outcome,
        step_count: result.step_count,
        moves: result.moves,
        path: result.path,
        stats: result.stats,
    }
}
