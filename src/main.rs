//! Couch Puzzle Solver
//!
//! Loads couch-pushing levels from text files and prints a shortest input
//! sequence that pushes every couch onto its goal. Without a subcommand it
//! keeps prompting for level files until `q` is entered.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};

use couch::{format_moves, solve_with, Direction, Puzzle, SolverConfig};

/// Solves couch-pushing puzzles.
#[derive(Parser)]
#[command(name = "couch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a level and print the shortest input sequence.
    Solve {
        /// Level file to load.
        level: PathBuf,
        /// Worker threads (defaults to available parallelism).
        #[arg(long)]
        threads: Option<usize>,
        /// Idle worker backoff in milliseconds.
        #[arg(long)]
        backoff_ms: Option<u64>,
        /// Print the board after every push of the solution.
        #[arg(long)]
        show: bool,
    },
    /// Print the initial board of a level.
    Render {
        /// Level file to load.
        level: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Solve {
            level,
            threads,
            backoff_ms,
            show,
        }) => {
            let mut config = SolverConfig::default();
            if let Some(threads) = threads {
                config.threads = threads;
            }
            if let Some(backoff_ms) = backoff_ms {
                config.backoff = Duration::from_millis(backoff_ms);
            }
            if !run_solve(&level, &config, show) {
                std::process::exit(1);
            }
        }
        Some(Command::Render { level }) => match Puzzle::load(&level) {
            Ok(puzzle) => println!("{}", puzzle.format_state(&puzzle.initial_state)),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => {
            if let Err(e) = run_interactive(&SolverConfig::default()) {
                eprintln!("Failed to read input: {}", e);
            }
        }
    }
}

/// Loads and solves one level, printing the result. Returns `false` if the
/// level could not be loaded.
fn run_solve(level: &Path, config: &SolverConfig, show: bool) -> bool {
    let puzzle = match Puzzle::load(level) {
        Ok(puzzle) => puzzle,
        Err(e) => {
            eprintln!("{}", e);
            return false;
        }
    };

    let outcome = solve_with(&puzzle, config);
    print!("{}", format_report(&puzzle, outcome.moves.as_deref(), show));
    true
}

/// Prompts for level files until the user quits or stdin closes.
fn run_interactive(config: &SolverConfig) -> io::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("File name (q to quit): ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let name = line?;
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if name == "q" {
            return Ok(());
        }

        let puzzle = match Puzzle::load(name) {
            Ok(puzzle) => puzzle,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        println!("{}", puzzle.format_state(&puzzle.initial_state));
        let outcome = solve_with(&puzzle, config);
        print!("{}", format_report(&puzzle, outcome.moves.as_deref(), false));
    }
}

/// Describes a search result; with `show`, also draws the board after every
/// input that moves a couch.
fn format_report(puzzle: &Puzzle, moves: Option<&[Direction]>, show: bool) -> String {
    let Some(moves) = moves else {
        return String::from("No solution\n");
    };

    let mut output = format!("Solved in {} moves: {}\n", moves.len(), format_moves(moves));
    if !show {
        return output;
    }

    let mut state = puzzle.initial_state.clone();
    for (step, &direction) in moves.iter().enumerate() {
        let Some(next) = state.apply_input(direction, &puzzle.metadata) else {
            output.push_str(&format!("Input {} ({}) is blocked\n", step + 1, direction));
            break;
        };
        if next.couches() != state.couches() {
            output.push_str(&format!("After input {} ({}):\n", step + 1, direction));
            output.push_str(&puzzle.format_state(&next));
            output.push('\n');
        }
        state = next;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_without_solution() {
        let puzzle = Puzzle::parse(include_str!("../levels/no_match.txt")).expect("valid level");
        assert_eq!(format_report(&puzzle, None, true), "No solution\n");
    }

    #[test]
    fn test_report_shows_each_push() {
        let puzzle = Puzzle::parse(include_str!("../levels/hallway.txt")).expect("valid level");
        let moves = [Direction::Right, Direction::Right];

        insta::assert_snapshot!(format_report(&puzzle, Some(&moves[..]), true), @r"
        Solved in 2 moves: →→
        After input 1 (→):
        -----------
        |         |
        |  p 1 1 1|
        |         |
        -----------
        After input 2 (→):
        -----------
        |         |
        |    p 1 1|
        |         |
        -----------
        ");
    }
}
