//! Schedule grid
//!
//! The grid maps every class to every day to a row of period cells. Each cell
//! is either empty or holds one [`Session`].
//!
//! Grids are plain values: engine operations take one in and hand a new one
//! back, so a half-written grid is never observable from outside.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::label::{parse_label, MalformedLabel};
use crate::{Allocation, ClassName, Session, Setup, TimetableError};

/// Period cells of one day
pub type DayRow = Vec<Option<Session>>;

/// All days of one class, keyed by day name
pub type ClassWeek = BTreeMap<String, DayRow>;

/// Class → day → period → optional session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    classes: BTreeMap<ClassName, ClassWeek>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// All-empty grid with an entry for every allocated class, every day and
    /// every period
    pub fn for_setup(setup: &Setup, allocations: &[Allocation]) -> Self {
        let mut grid = Self::new();
        grid.normalize(setup, allocations);
        grid
    }

    /// Materialize missing classes, days and periods, drop classes that have
    /// no allocation, and resize period rows to `periods_per_day`.
    pub fn normalize(&mut self, setup: &Setup, allocations: &[Allocation]) {
        self.classes
            .retain(|class, _| allocations.iter().any(|a| &a.class_name == class));

        for alloc in allocations {
            let week = self.classes.entry(alloc.class_name.clone()).or_default();
            week.retain(|day, _| setup.days.contains(day));
            for day in &setup.days {
                week.entry(day.clone())
                    .or_default()
                    .resize(setup.periods_per_day, None);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class names in grid order
    pub fn class_names(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    /// The week of one class
    pub fn class_week(&self, class: &str) -> Option<&ClassWeek> {
        self.classes.get(class)
    }

    /// Look up one cell
    pub fn cell(
        &self,
        class: &str,
        day: &str,
        period: usize,
    ) -> Result<Option<&Session>, TimetableError> {
        let row = self
            .classes
            .get(class)
            .ok_or_else(|| TimetableError::UnknownClass(class.to_string()))?
            .get(day)
            .ok_or_else(|| TimetableError::UnknownDay(day.to_string()))?;
        row.get(period)
            .map(Option::as_ref)
            .ok_or(TimetableError::PeriodOutOfRange {
                period,
                periods_per_day: row.len(),
            })
    }

    /// Mutable access to one cell
    pub fn slot_mut(
        &mut self,
        class: &str,
        day: &str,
        period: usize,
    ) -> Result<&mut Option<Session>, TimetableError> {
        let row = self
            .classes
            .get_mut(class)
            .ok_or_else(|| TimetableError::UnknownClass(class.to_string()))?
            .get_mut(day)
            .ok_or_else(|| TimetableError::UnknownDay(day.to_string()))?;
        let periods_per_day = row.len();
        row.get_mut(period).ok_or(TimetableError::PeriodOutOfRange {
            period,
            periods_per_day,
        })
    }

    /// Whether a cell exists and is empty
    pub fn is_free(&self, class: &str, day: &str, period: usize) -> bool {
        matches!(self.cell(class, day, period), Ok(None))
    }

    /// Number of cells in `class` holding exactly `session`
    pub fn count_sessions(&self, class: &str, session: &Session) -> usize {
        self.classes
            .get(class)
            .map(|week| {
                week.values()
                    .flatten()
                    .filter(|cell| cell.as_ref() == Some(session))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Every occupied cell as `(class, day, period, session)`, classes in grid
    /// order and days in the order of `setup`
    pub fn occupied<'a>(
        &'a self,
        setup: &'a Setup,
    ) -> impl Iterator<Item = (&'a str, &'a str, usize, &'a Session)> + 'a {
        self.classes.iter().flat_map(move |(class, week)| {
            setup.days.iter().filter_map(move |day| week.get_key_value(day)).flat_map(
                move |(day, row)| {
                    row.iter().enumerate().filter_map(move |(period, cell)| {
                        cell.as_ref()
                            .map(|session| (class.as_str(), day.as_str(), period, session))
                    })
                },
            )
        })
    }

    /// Convert an on-disk grid, skipping cells whose legacy label does not
    /// parse.
    pub fn from_raw(raw: RawGrid) -> (Self, Vec<MalformedLabel>) {
        let mut warnings = Vec::new();
        let mut classes = BTreeMap::new();

        for (class, days) in raw {
            let mut week = ClassWeek::new();
            for (day, cells) in days {
                let row: DayRow = cells
                    .into_iter()
                    .enumerate()
                    .map(|(period, cell)| match cell {
                        None => None,
                        Some(RawCell::Session(session)) => Some(session),
                        Some(RawCell::Label(label)) => match parse_label(&label) {
                            Ok(session) => session,
                            Err(()) => {
                                let malformed = MalformedLabel {
                                    class: class.clone(),
                                    day: day.clone(),
                                    period,
                                    label,
                                };
                                warn!("{}", malformed);
                                warnings.push(malformed);
                                None
                            }
                        },
                    })
                    .collect();
                week.insert(day, row);
            }
            classes.insert(class, week);
        }

        (Self { classes }, warnings)
    }
}

/// On-disk grid: cells may be structured, legacy strings, or null
pub type RawGrid = BTreeMap<ClassName, BTreeMap<String, Vec<Option<RawCell>>>>;

/// One on-disk cell
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Session(Session),
    /// Legacy `"Subject (Teacher)"` encoding, `""` for empty
    Label(String),
}
