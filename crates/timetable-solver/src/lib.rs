//! # timetable-solver
//!
//! Slot assignment engine for weekly school timetables.
//!
//! This crate provides:
//! - Requirement calculation (targets minus what the grid already holds)
//! - Task building (combined sessions first, solo sessions after)
//! - Randomized greedy slot assignment with restarts
//! - Collision detection for teachers booked under two subjects at once
//! - Manual cell edits with the same per-subject caps
//!
//! ## Example
//!
//! ```rust
//! use timetable_core::{Allocation, Setup};
//! use timetable_solver::{detect_collisions, init_grid_structure, run_auto_fill, AutoFill, SolverOptions};
//!
//! let setup = Setup::new(["Mon", "Tue"], 2);
//! let allocations = vec![
//!     Allocation::new("A").subject("Math", "T1", 2),
//!     Allocation::new("B").subject("Math", "T1", 1),
//! ];
//! let grid = init_grid_structure(&setup, &allocations);
//!
//! let outcome = run_auto_fill(&setup, &allocations, &grid, &SolverOptions::new().seed(1)).unwrap();
//! if let AutoFill::Filled { grid, .. } = outcome {
//!     assert!(detect_collisions(&setup, &grid).is_empty());
//! }
//! ```

pub mod collisions;
pub mod edit;
pub mod engine;
pub mod requirements;
pub mod shared;
pub mod tasks;

pub use collisions::{detect_collisions, Booking, Collision};
pub use edit::set_cell;
pub use engine::{SlotSolver, SolveOutcome, SolverOptions, DEFAULT_MAX_ATTEMPTS};
pub use requirements::{
    calculate_requirements, requirements_for, ClassNeed, RequirementGroup, RequirementKey,
    Requirements, SubjectProgress,
};
pub use shared::{SharedTimetable, Snapshot};
pub use tasks::{build_tasks, PlacementTask};

use timetable_core::{Allocation, Grid, Setup, TimetableError};
use tracing::{info, warn};

use crate::requirements::clamp;

/// All-empty grid for every allocated class, day and period
pub fn init_grid_structure(setup: &Setup, allocations: &[Allocation]) -> Grid {
    Grid::for_setup(setup, allocations)
}

/// Outcome of an auto-fill run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AutoFill {
    /// Every outstanding session was placed
    Filled {
        grid: Grid,
        /// 1-based number of the attempt that succeeded
        attempts_used: usize,
        tasks_placed: usize,
    },
    /// The grid already meets every target
    NothingToSchedule,
    /// The attempt budget ran out; the input grid is unchanged. `attempts`
    /// is zero when some class needs more sessions than it has free cells.
    Exhausted { attempts: usize },
}

impl AutoFill {
    /// Turn exhaustion into `TimetableError::SolverExhausted`
    pub fn into_result(self) -> Result<AutoFill, TimetableError> {
        match self {
            AutoFill::Exhausted { attempts } => Err(TimetableError::SolverExhausted { attempts }),
            other => Ok(other),
        }
    }
}

/// Fill every outstanding requirement on top of `grid`.
///
/// The input grid is never modified; on success the filled copy is returned
/// for the caller to commit.
pub fn run_auto_fill(
    setup: &Setup,
    allocations: &[Allocation],
    grid: &Grid,
    options: &SolverOptions,
) -> Result<AutoFill, TimetableError> {
    setup.validate()?;
    if allocations.is_empty() {
        return Err(TimetableError::ConfigurationMissing(
            "no class allocations defined".into(),
        ));
    }

    let mut base = grid.clone();
    base.normalize(setup, allocations);

    let requirements = calculate_requirements(setup, allocations, &base);
    if requirements.is_satisfied() {
        info!("schedule is already full");
        return Ok(AutoFill::NothingToSchedule);
    }
    if let Some((class, needed, free)) = overbooked_class(setup, &base, &requirements) {
        warn!(class, needed, free, "more sessions outstanding than free cells");
        return Ok(AutoFill::Exhausted { attempts: 0 });
    }

    let tasks = build_tasks(&requirements);
    info!(
        tasks = tasks.len(),
        outstanding = requirements.total_outstanding(),
        "auto-filling"
    );

    Ok(
        match SlotSolver::new(options.clone()).solve(&tasks, &base, setup) {
            SolveOutcome::Solved { grid, attempt } => AutoFill::Filled {
                grid,
                attempts_used: attempt,
                tasks_placed: tasks.len(),
            },
            SolveOutcome::Exhausted { attempts } => AutoFill::Exhausted { attempts },
        },
    )
}

/// First class whose outstanding sessions cannot fit in its free cells
fn overbooked_class<'a>(
    setup: &Setup,
    grid: &Grid,
    requirements: &'a Requirements,
) -> Option<(&'a str, u64, usize)> {
    let mut outstanding: Vec<(&str, u64)> = Vec::new();
    for need in requirements.groups().iter().flat_map(|g| &g.needs) {
        let left = u64::from(clamp(need.remaining));
        match outstanding.iter_mut().find(|(class, _)| *class == need.class) {
            Some((_, total)) => *total += left,
            None => outstanding.push((need.class.as_str(), left)),
        }
    }

    outstanding.into_iter().find_map(|(class, needed)| {
        let free = setup
            .days
            .iter()
            .flat_map(|day| (0..setup.periods_per_day).map(move |period| (day, period)))
            .filter(|(day, period)| grid.is_free(class, day, *period))
            .count();
        (needed > free as u64).then_some((class, needed, free))
    })
}
