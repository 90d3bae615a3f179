//! Slot assignment
//!
//! Randomized greedy construction with restarts. Every attempt works on a
//! private copy of the grid, shuffles the task order, and for each task
//! shuffles the week's slots and takes the first one where the teacher and
//! all participating classes are free. There is no backtracking inside an
//! attempt: one unplaceable task abandons the attempt and the next one starts
//! over with a fresh shuffle.
//!
//! Attempts are independent, so they can also run on the rayon pool. The
//! lowest-numbered successful attempt wins in both modes, which keeps seeded
//! runs reproducible.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use timetable_core::{Grid, Setup, TeacherId};
use tracing::{debug, info, warn};

use crate::tasks::PlacementTask;

/// Attempt budget used when none is configured
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// Solver configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverOptions {
    /// Number of randomized attempts before giving up
    pub max_attempts: usize,
    /// Base seed; attempt `n` uses `seed + n`. Random when unset.
    pub seed: Option<u64>,
    /// Run attempts on the rayon thread pool
    pub parallel: bool,
    /// After the random attempts fail, try once with most-constrained-first
    /// ordering and slots in calendar order
    pub fallback: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: None,
            parallel: false,
            fallback: false,
        }
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }
}

/// Result of one solve
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Every task placed; `attempt` is 1-based
    Solved { grid: Grid, attempt: usize },
    /// No attempt placed every task; the input grid is untouched
    Exhausted { attempts: usize },
}

impl SolveOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved { .. })
    }
}

/// A (day, period) position, day as an index into `Setup::days`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Slot {
    day: usize,
    period: usize,
}

fn all_slots(setup: &Setup) -> Vec<Slot> {
    (0..setup.days.len())
        .flat_map(|day| (0..setup.periods_per_day).map(move |period| Slot { day, period }))
        .collect()
}

/// Teacher → occupied slots, rebuilt from the working grid every attempt
#[derive(Debug, Default)]
struct BusyMap {
    busy: HashMap<TeacherId, HashSet<Slot>>,
}

impl BusyMap {
    fn from_grid(grid: &Grid, setup: &Setup) -> Self {
        let mut map = Self::default();
        for (_, day, period, session) in grid.occupied(setup) {
            if let Some(day) = setup.day_index(day) {
                map.mark(&session.teacher, Slot { day, period });
            }
        }
        map
    }

    fn is_busy(&self, teacher: &str, slot: Slot) -> bool {
        self.busy
            .get(teacher)
            .map(|slots| slots.contains(&slot))
            .unwrap_or(false)
    }

    fn mark(&mut self, teacher: &str, slot: Slot) {
        self.busy
            .entry(teacher.to_string())
            .or_default()
            .insert(slot);
    }
}

/// Randomized constructive solver
#[derive(Clone, Debug, Default)]
pub struct SlotSolver {
    options: SolverOptions,
}

impl SlotSolver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    /// Place every task, or report exhaustion without touching `grid`
    pub fn solve(&self, tasks: &[PlacementTask], grid: &Grid, setup: &Setup) -> SolveOutcome {
        let max_attempts = self.options.max_attempts;
        let base_seed = self.options.seed.unwrap_or_else(|| rand::rng().random());
        debug!(
            tasks = tasks.len(),
            max_attempts,
            base_seed,
            parallel = self.options.parallel,
            "starting slot assignment"
        );

        let run = |attempt: usize| {
            random_attempt(tasks, grid, setup, base_seed, attempt).map(|grid| (attempt, grid))
        };
        let found = if self.options.parallel {
            (1..=max_attempts).into_par_iter().find_map_first(run)
        } else {
            (1..=max_attempts).find_map(run)
        };

        if let Some((attempt, grid)) = found {
            info!(attempt, "auto-fill succeeded");
            return SolveOutcome::Solved { grid, attempt };
        }

        let mut attempts = max_attempts;
        if self.options.fallback {
            attempts += 1;
            let order = most_constrained_first(tasks);
            if let Some(grid) = place_tasks(&order, grid, setup, |_| {}) {
                info!(attempt = attempts, "auto-fill succeeded with ordered fallback");
                return SolveOutcome::Solved {
                    grid,
                    attempt: attempts,
                };
            }
        }

        warn!(attempts, "auto-fill exhausted all attempts");
        SolveOutcome::Exhausted { attempts }
    }
}

fn random_attempt(
    tasks: &[PlacementTask],
    grid: &Grid,
    setup: &Setup,
    base_seed: u64,
    attempt: usize,
) -> Option<Grid> {
    let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(attempt as u64));
    let mut order: Vec<&PlacementTask> = tasks.iter().collect();
    order.shuffle(&mut rng);

    let placed = place_tasks(&order, grid, setup, |slots| slots.shuffle(&mut rng));
    if placed.is_none() {
        debug!(attempt, "attempt failed");
    }
    placed
}

/// Tasks with the most classes first, then those whose teacher carries the
/// most tasks. Stable, so ties keep their build order.
fn most_constrained_first(tasks: &[PlacementTask]) -> Vec<&PlacementTask> {
    let mut load: HashMap<&str, usize> = HashMap::new();
    for task in tasks {
        *load.entry(task.teacher.as_str()).or_default() += 1;
    }

    let mut order: Vec<&PlacementTask> = tasks.iter().collect();
    order.sort_by(|a, b| {
        b.classes
            .len()
            .cmp(&a.classes.len())
            .then_with(|| load[b.teacher.as_str()].cmp(&load[a.teacher.as_str()]))
    });
    order
}

/// One constructive pass. `arrange` orders the candidate slots before each
/// task is placed.
fn place_tasks(
    order: &[&PlacementTask],
    grid: &Grid,
    setup: &Setup,
    mut arrange: impl FnMut(&mut [Slot]),
) -> Option<Grid> {
    let mut working = grid.clone();
    let mut busy = BusyMap::from_grid(&working, setup);
    let mut slots = all_slots(setup);

    for task in order {
        arrange(&mut slots);

        let slot = slots.iter().copied().find(|&slot| {
            let day = &setup.days[slot.day];
            !busy.is_busy(&task.teacher, slot)
                && task
                    .classes
                    .iter()
                    .all(|class| working.is_free(class, day, slot.period))
        });

        let Some(slot) = slot else {
            debug!(
                teacher = %task.teacher,
                subject = %task.subject,
                classes = ?task.classes,
                "no feasible slot"
            );
            return None;
        };

        let day = &setup.days[slot.day];
        let session = task.session();
        for class in &task.classes {
            if let Ok(cell) = working.slot_mut(class, day, slot.period) {
                *cell = Some(session.clone());
            }
        }
        busy.mark(&task.teacher, slot);
    }

    Some(working)
}
