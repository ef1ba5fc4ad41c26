//! Parallel best-first search over board states.
//!
//! Workers share three structures and nothing else:
//! - `pending`: a skip list keyed by `(move count, state key)`, so popping the
//!   front always yields a globally shortest candidate
//! - `visited`: a sharded map from state key to the shortest move count seen
//! - `best`: the shortest solution found so far, with its length mirrored in
//!   an atomic so workers can prune without taking the lock
//!
//! The search stops once the best solution is no longer than the front of the
//! pending set, or once the pending set stays empty with no worker busy.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_skiplist::SkipMap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, info};
use rustc_hash::FxBuildHasher;

use crate::deadlock::is_dead;
use crate::explore::{find_pushes, resolve_push};
use crate::geometry::Direction;
use crate::pieces::Puzzle;
use crate::state::{BoardState, StateKey};

/// Sentinel for "no solution yet" in `Search::best_len`.
const NO_SOLUTION: usize = usize::MAX;

/// Tuning knobs for the search driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Number of worker threads. Zero is treated as one.
    pub threads: usize,
    /// How long an idle worker waits before looking at the pending set again.
    pub backoff: Duration,
    /// Worker 0 logs progress every this many expansions; zero disables it.
    pub progress_interval: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            threads: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            backoff: Duration::from_millis(10),
            progress_interval: 20_000,
        }
    }
}

impl SolverConfig {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads,
            ..Self::default()
        }
    }
}

/// Result of a finished search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Shortest input sequence, or `None` if the puzzle has no solution.
    pub moves: Option<Vec<Direction>>,
    /// Distinct states recorded in the visited table.
    pub visited: usize,
    /// Pending entries taken off the frontier and expanded.
    pub expanded: u64,
}

/// Frontier order: fewest inputs first, then state key.
type PendingKey = (usize, StateKey);

/// Shared state of one search run.
pub struct Search<'a> {
    puzzle: &'a Puzzle,
    config: SolverConfig,
    pending: SkipMap<PendingKey, Vec<Direction>>,
    visited: DashMap<StateKey, usize, FxBuildHasher>,
    best_len: AtomicUsize,
    best: Mutex<Option<Vec<Direction>>>,
    /// Workers currently holding a popped entry.
    in_flight: AtomicUsize,
    expanded: AtomicU64,
}

impl<'a> Search<'a> {
    pub fn new(puzzle: &'a Puzzle, config: &SolverConfig) -> Self {
        Self {
            puzzle,
            config: config.clone(),
            pending: SkipMap::new(),
            visited: DashMap::with_hasher(FxBuildHasher),
            best_len: AtomicUsize::new(NO_SOLUTION),
            best: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            expanded: AtomicU64::new(0),
        }
    }

    /// Runs the search to completion on `config.threads` scoped workers.
    pub fn run(&self) -> SearchOutcome {
        let started = Instant::now();
        let metadata = &self.puzzle.metadata;
        let initial = &self.puzzle.initial_state;

        let initial_key = self.puzzle.codec.encode(initial);
        self.visited.insert(initial_key, 0);

        if initial.is_solved(metadata) {
            info!("initial state is already solved");
            return self.outcome(Some(Vec::new()));
        }

        self.pending.insert((0, initial_key), Vec::new());
        let threads = self.config.threads.max(1);
        info!(
            "searching {}x{} board with {} couches and {} goals on {} threads ({}-bit keys)",
            metadata.width(),
            metadata.height(),
            initial.couches().len(),
            metadata.goal_count(),
            threads,
            self.puzzle.codec.key_bits(),
        );

        thread::scope(|scope| {
            for worker in 0..threads {
                scope.spawn(move || self.work(worker));
            }
        });

        let moves = self
            .best
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let outcome = self.outcome(moves);
        match &outcome.moves {
            Some(moves) => info!(
                "found {}-move solution in {:.2?}: {} states visited, {} expanded",
                moves.len(),
                started.elapsed(),
                outcome.visited,
                outcome.expanded,
            ),
            None => info!(
                "no solution after {:.2?}: {} states visited, {} expanded",
                started.elapsed(),
                outcome.visited,
                outcome.expanded,
            ),
        }
        outcome
    }

    /// Whether `state` was ever recorded in the visited table.
    pub fn was_visited(&self, state: &BoardState) -> bool {
        self.visited.contains_key(&self.puzzle.codec.encode(state))
    }

    fn outcome(&self, moves: Option<Vec<Direction>>) -> SearchOutcome {
        SearchOutcome {
            moves,
            visited: self.visited.len(),
            expanded: self.expanded.load(Ordering::Relaxed),
        }
    }

    fn work(&self, worker: usize) {
        let mut local_expanded = 0u64;

        while !self.is_proven_optimal() {
            // claim before popping so an empty frontier plus zero in-flight
            // workers really means nothing more can be enqueued
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            let Some(entry) = self.pending.pop_front() else {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                if self.in_flight.load(Ordering::SeqCst) == 0 && self.pending.is_empty() {
                    break;
                }
                thread::sleep(self.config.backoff);
                continue;
            };

            let (moves_len, key) = *entry.key();
            self.expand(moves_len, key, entry.value());
            drop(entry);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            local_expanded += 1;
            if worker == 0
                && self.config.progress_interval > 0
                && local_expanded % self.config.progress_interval == 0
            {
                info!(
                    "progress: {} visited, {} pending, at {} moves",
                    self.visited.len(),
                    self.pending.len(),
                    moves_len
                );
            }
        }
    }

    /// No pending entry can beat the best solution found so far.
    fn is_proven_optimal(&self) -> bool {
        let best_len = self.best_len.load(Ordering::Acquire);
        if best_len == NO_SOLUTION {
            return false;
        }
        match self.pending.front() {
            Some(entry) => best_len <= entry.key().0,
            None => true,
        }
    }

    fn expand(&self, moves_len: usize, key: StateKey, moves: &[Direction]) {
        // stale entry: the state was re-queued with a shorter path
        if self
            .visited
            .get(&key)
            .is_some_and(|shortest| *shortest < moves_len)
        {
            return;
        }
        let Some(state) = self.puzzle.codec.decode(key) else {
            return;
        };
        self.expanded.fetch_add(1, Ordering::Relaxed);

        let metadata = &self.puzzle.metadata;
        for push in find_pushes(&state, metadata) {
            let next_len = moves_len + push.inputs.len();
            if next_len >= self.best_len.load(Ordering::Acquire) {
                continue;
            }
            let Some(moved) =
                resolve_push(&state, metadata, push.couch_index, push.contact, push.direction)
            else {
                continue;
            };
            let next = state.with_push(push.contact, push.couch_index, moved, metadata);

            if next.is_solved(metadata) {
                let mut solution = Vec::with_capacity(next_len);
                solution.extend_from_slice(moves);
                solution.extend_from_slice(&push.inputs);
                self.offer_solution(solution);
                continue;
            }
            if is_dead(&next, &moved, metadata) {
                continue;
            }

            let next_key = self.puzzle.codec.encode(&next);
            if self.record_visit(next_key, next_len) {
                let mut path = Vec::with_capacity(next_len);
                path.extend_from_slice(moves);
                path.extend_from_slice(&push.inputs);
                self.pending.insert((next_len, next_key), path);
            }
        }
    }

    /// Records `moves_len` for `key` unless an equal or shorter count is known.
    fn record_visit(&self, key: StateKey, moves_len: usize) -> bool {
        match self.visited.entry(key) {
            Entry::Occupied(mut shortest) => {
                if *shortest.get() <= moves_len {
                    return false;
                }
                shortest.insert(moves_len);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(moves_len);
                true
            }
        }
    }

    /// Keeps `solution` if it is strictly shorter than the current best.
    fn offer_solution(&self, solution: Vec<Direction>) {
        let len = solution.len();
        if self.best_len.fetch_min(len, Ordering::AcqRel) <= len {
            return;
        }

        let mut best = self.best.lock().unwrap_or_else(PoisonError::into_inner);
        // a shorter one may have landed between the swap and the lock
        if best.as_ref().is_some_and(|current| current.len() <= len) {
            return;
        }
        debug!("improved solution to {len} moves");
        *best = Some(solution);
    }
}

/// Solves `puzzle` with the given configuration.
pub fn solve(puzzle: &Puzzle, config: &SolverConfig) -> SearchOutcome {
    Search::new(puzzle, config).run()
}
