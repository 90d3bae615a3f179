//! Shared, committed timetable state
//!
//! Readers take a snapshot (a cheap `Arc` clone) and work on it without
//! holding the lock. Writers build a complete new document off-lock and
//! publish it with a single swap, so nobody ever observes a half-written
//! grid. A commit computed from an outdated snapshot is refused.

use std::sync::Arc;

use parking_lot::RwLock;
use timetable_core::{Grid, Session, TimetableDocument, TimetableError};
use tracing::debug;

use crate::collisions::{detect_collisions, Collision};
use crate::edit::set_cell;
use crate::engine::SolverOptions;
use crate::requirements::{calculate_requirements, Requirements};
use crate::{run_auto_fill, AutoFill};

/// A consistent view of the document at one version
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub version: u64,
    pub document: Arc<TimetableDocument>,
}

#[derive(Debug)]
struct Versioned {
    version: u64,
    document: Arc<TimetableDocument>,
}

/// The authoritative document, safe to share across threads
#[derive(Debug)]
pub struct SharedTimetable {
    state: RwLock<Versioned>,
}

impl SharedTimetable {
    pub fn new(document: TimetableDocument) -> Self {
        Self {
            state: RwLock::new(Versioned {
                version: 0,
                document: Arc::new(document),
            }),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.read();
        Snapshot {
            version: state.version,
            document: Arc::clone(&state.document),
        }
    }

    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    /// Replace the grid if nothing was committed since `base_version`.
    /// Returns the new version.
    pub fn commit_grid(&self, base_version: u64, grid: Grid) -> Result<u64, TimetableError> {
        let mut state = self.state.write();
        if state.version != base_version {
            return Err(TimetableError::ConcurrentModification);
        }
        let mut document = (*state.document).clone();
        document.grid = grid;
        state.document = Arc::new(document);
        state.version += 1;
        debug!(version = state.version, "grid committed");
        Ok(state.version)
    }

    /// Auto-fill the current grid and commit the result on success
    pub fn auto_fill(&self, options: &SolverOptions) -> Result<AutoFill, TimetableError> {
        let snapshot = self.snapshot();
        let (setup, allocations) = snapshot.document.configuration()?;
        let outcome = run_auto_fill(setup, allocations, &snapshot.document.grid, options)?;
        if let AutoFill::Filled { grid, .. } = &outcome {
            self.commit_grid(snapshot.version, grid.clone())?;
        }
        Ok(outcome)
    }

    /// Edit one cell of the current grid and commit it
    pub fn set_cell(
        &self,
        class: &str,
        day: &str,
        period: usize,
        session: Option<Session>,
    ) -> Result<(), TimetableError> {
        let snapshot = self.snapshot();
        let mut grid = snapshot.document.grid.clone();
        set_cell(
            &mut grid,
            &snapshot.document.allocations,
            class,
            day,
            period,
            session,
        )?;
        self.commit_grid(snapshot.version, grid)?;
        Ok(())
    }

    /// Collisions in the current grid; an unconfigured document has none
    pub fn detect_collisions(&self) -> Vec<Collision> {
        let snapshot = self.snapshot();
        match &snapshot.document.setup {
            Some(setup) => detect_collisions(setup, &snapshot.document.grid),
            None => Vec::new(),
        }
    }

    /// Residual requirements of the current grid
    pub fn requirements(&self) -> Result<Requirements, TimetableError> {
        let snapshot = self.snapshot();
        let (setup, allocations) = snapshot.document.configuration()?;
        Ok(calculate_requirements(
            setup,
            allocations,
            &snapshot.document.grid,
        ))
    }
}
