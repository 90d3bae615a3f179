//! # timetable-core
//!
//! Core domain model and traits for the timetable engine.
//!
//! This crate provides:
//! - Domain types: `Setup`, `Allocation`, `Session`, `Grid`, `TimetableDocument`
//! - Core traits: `DataSource`, `Renderer`
//! - Error types and result aliases
//!
//! ## Example
//!
//! ```rust
//! use timetable_core::{Allocation, Grid, Session, Setup};
//!
//! let setup = Setup::new(["Mon", "Tue"], 2);
//! let allocations = vec![
//!     Allocation::new("10A").subject("Math", "T1", 2),
//!     Allocation::new("10B").subject("Math", "T1", 1),
//! ];
//!
//! let mut grid = Grid::for_setup(&setup, &allocations);
//! *grid.slot_mut("10A", "Mon", 0).unwrap() = Some(Session::new("Math", "T1"));
//! assert_eq!(grid.count_sessions("10A", &Session::new("Math", "T1")), 1);
//! ```

pub mod grid;
pub mod label;

pub use grid::{ClassWeek, DayRow, Grid, RawCell, RawGrid};
pub use label::MalformedLabel;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a class-section
pub type ClassName = String;

/// Unique identifier for a teacher
pub type TeacherId = String;

/// Subject name
pub type SubjectName = String;

// ============================================================================
// Setup
// ============================================================================

/// Weekly cycle definition: which days exist and how many periods each has.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setup {
    /// Ordered day names
    pub days: Vec<String>,
    /// Number of periods on every day
    pub periods_per_day: usize,
}

impl Setup {
    pub fn new<I, S>(days: I, periods_per_day: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            days: days.into_iter().map(Into::into).collect(),
            periods_per_day,
        }
    }

    /// Total number of (day, period) slots in one week
    pub fn slot_count(&self) -> usize {
        self.days.len() * self.periods_per_day
    }

    /// Position of a day in the weekly cycle
    pub fn day_index(&self, day: &str) -> Option<usize> {
        self.days.iter().position(|d| d == day)
    }

    /// A setup needs at least one day, at least one period, and distinct
    /// day names
    pub fn validate(&self) -> Result<(), TimetableError> {
        if self.days.is_empty() || self.periods_per_day == 0 {
            return Err(TimetableError::ConfigurationMissing(
                "setup has no days or no periods".into(),
            ));
        }
        for (i, day) in self.days.iter().enumerate() {
            if self.days[..i].contains(day) {
                return Err(TimetableError::ConfigurationMissing(format!(
                    "day {:?} is listed more than once (position {})",
                    day,
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Allocation
// ============================================================================

/// Weekly target for one (subject, teacher) pair in a class
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectAllocation {
    pub subject: SubjectName,
    pub teacher: TeacherId,
    /// Required sessions per week
    pub periods: u32,
}

impl SubjectAllocation {
    /// The session label this allocation produces in the grid
    pub fn session(&self) -> Session {
        Session::new(self.subject.clone(), self.teacher.clone())
    }

    pub fn matches(&self, session: &Session) -> bool {
        self.subject == session.subject && self.teacher == session.teacher
    }
}

/// Subject allocations for one class-section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub class_name: ClassName,
    pub subjects: Vec<SubjectAllocation>,
}

impl Allocation {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            subjects: Vec::new(),
        }
    }

    /// Add a subject taught by `teacher` for `periods` sessions per week
    pub fn subject(
        mut self,
        subject: impl Into<String>,
        teacher: impl Into<String>,
        periods: u32,
    ) -> Self {
        self.subjects.push(SubjectAllocation {
            subject: subject.into(),
            teacher: teacher.into(),
            periods,
        });
        self
    }

    /// Declared target for a session type.
    ///
    /// When the same pair is listed more than once, the last entry wins.
    pub fn target_for(&self, session: &Session) -> Option<u32> {
        self.subjects
            .iter()
            .rev()
            .find(|s| s.matches(session))
            .map(|s| s.periods)
    }
}

/// Find the allocation for a class
pub fn find_allocation<'a>(allocations: &'a [Allocation], class: &str) -> Option<&'a Allocation> {
    allocations.iter().find(|a| a.class_name == class)
}

/// All teachers named in the allocations, sorted and deduplicated
pub fn teachers(allocations: &[Allocation]) -> Vec<TeacherId> {
    let mut teachers: Vec<TeacherId> = allocations
        .iter()
        .flat_map(|a| a.subjects.iter().map(|s| s.teacher.clone()))
        .collect();
    teachers.sort();
    teachers.dedup();
    teachers
}

// ============================================================================
// Session
// ============================================================================

/// A (subject, teacher) pair occupying one grid cell
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Session {
    pub subject: SubjectName,
    pub teacher: TeacherId,
}

impl Session {
    pub fn new(subject: impl Into<String>, teacher: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            teacher: teacher.into(),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.subject, self.teacher)
    }
}

// ============================================================================
// Document
// ============================================================================

/// The persisted aggregate: setup, allocations and the schedule grid
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TimetableDocument {
    pub setup: Option<Setup>,
    pub allocations: Vec<Allocation>,
    pub grid: Grid,
}

impl TimetableDocument {
    pub fn new(setup: Setup, allocations: Vec<Allocation>) -> Self {
        let grid = Grid::for_setup(&setup, &allocations);
        Self {
            setup: Some(setup),
            allocations,
            grid,
        }
    }

    /// Setup and allocations, or `ConfigurationMissing` when either is absent
    pub fn configuration(&self) -> Result<(&Setup, &[Allocation]), TimetableError> {
        let setup = self.setup.as_ref().ok_or_else(|| {
            TimetableError::ConfigurationMissing("no setup (days and periods) defined".into())
        })?;
        setup.validate()?;
        if self.allocations.is_empty() {
            return Err(TimetableError::ConfigurationMissing(
                "no class allocations defined".into(),
            ));
        }
        Ok((setup, &self.allocations))
    }

    /// Regenerate an absent grid, or bring an existing one in line with
    /// setup and allocations
    pub fn normalize(&mut self) {
        let Some(setup) = &self.setup else {
            return;
        };
        if self.grid.is_empty() {
            self.grid = Grid::for_setup(setup, &self.allocations);
        } else {
            self.grid.normalize(setup, &self.allocations);
        }
    }

    /// Replace the grid with an all-empty one
    pub fn reset_grid(&mut self) -> Result<(), TimetableError> {
        let (setup, allocations) = self.configuration()?;
        self.grid = Grid::for_setup(setup, allocations);
        Ok(())
    }
}

/// On-disk form of the document, tolerant of legacy string labels
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub setup: Option<Setup>,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
    #[serde(default)]
    pub grid: RawGrid,
}

impl RawDocument {
    /// Convert into a normalized document, skipping cells whose labels do
    /// not parse
    pub fn into_loaded(self) -> LoadedDocument {
        let (grid, warnings) = Grid::from_raw(self.grid);
        let mut document = TimetableDocument {
            setup: self.setup,
            allocations: self.allocations,
            grid,
        };
        document.normalize();
        LoadedDocument { document, warnings }
    }
}

/// A loaded document plus the cells that had to be skipped
#[derive(Clone, Debug, Default)]
pub struct LoadedDocument {
    pub document: TimetableDocument,
    pub warnings: Vec<MalformedLabel>,
}

// ============================================================================
// Traits
// ============================================================================

/// Persistence collaborator for the document
pub trait DataSource {
    /// Read the document; an absent store yields an empty document
    fn load(&self) -> Result<LoadedDocument, TimetableError>;

    /// Persist the full document
    fn save(&self, document: &TimetableDocument) -> Result<(), TimetableError>;
}

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a view of the document
    fn render(&self, document: &TimetableDocument) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Timetable error
#[derive(Debug, Error)]
pub enum TimetableError {
    #[error("Not yet configured: {0}")]
    ConfigurationMissing(String),

    #[error("Limit reached: {subject} ({teacher}) allows only {limit} periods in {class}")]
    CapacityExceeded {
        class: ClassName,
        subject: SubjectName,
        teacher: TeacherId,
        limit: u32,
    },

    #[error("Could not auto-fill without conflicts after {attempts} attempts; try clearing some slots")]
    SolverExhausted { attempts: usize },

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error(transparent)]
    MalformedLabel(#[from] MalformedLabel),

    #[error("Class not found: {0}")]
    UnknownClass(ClassName),

    #[error("Day not found: {0}")]
    UnknownDay(String),

    /// `period` is the zero-based index that was asked for
    #[error("Period {} out of range (periods per day: {periods_per_day})", .period + 1)]
    PeriodOutOfRange { period: usize, periods_per_day: usize },

    #[error("{session} is not allocated to {class}")]
    NotAllocated { class: ClassName, session: Session },

    #[error("Timetable was modified concurrently; reload and retry")]
    ConcurrentModification,
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
