//! Staff view
//!
//! Pivots the class grid into one week per teacher, listing the classes a
//! teacher is with in each slot. Teachers come from the allocations; grid
//! entries for anyone else are left out.

use std::collections::BTreeMap;

use timetable_core::{teachers, ClassName, RenderError, Renderer, TeacherId, TimetableDocument};

use crate::{format_table, EMPTY_CELL};

/// Teacher → day index → period → classes in that slot
pub type StaffSchedule = BTreeMap<TeacherId, Vec<Vec<Vec<ClassName>>>>;

/// Build the per-teacher pivot of the grid
pub fn staff_schedule(document: &TimetableDocument) -> Result<StaffSchedule, RenderError> {
    let (setup, allocations) = document
        .configuration()
        .map_err(|e| RenderError::InvalidData(e.to_string()))?;

    let mut schedule: StaffSchedule = teachers(allocations)
        .into_iter()
        .map(|t| (t, vec![vec![Vec::new(); setup.periods_per_day]; setup.days.len()]))
        .collect();

    for (class, day, period, session) in document.grid.occupied(setup) {
        let (Some(week), Some(day)) = (schedule.get_mut(&session.teacher), setup.day_index(day))
        else {
            continue;
        };
        if let Some(slot) = week.get_mut(day).and_then(|d| d.get_mut(period)) {
            slot.push(class.to_string());
        }
    }

    Ok(schedule)
}

/// Text renderer for all teachers, or a chosen subset
#[derive(Clone, Debug, Default)]
pub struct StaffViewRenderer {
    /// Teachers to include; all when empty
    pub only: Vec<TeacherId>,
}

impl StaffViewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict output to the given teachers
    pub fn only<I, S>(mut self, teachers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = teachers.into_iter().map(Into::into).collect();
        self
    }
}

impl Renderer for StaffViewRenderer {
    type Output = String;

    fn render(&self, document: &TimetableDocument) -> Result<String, RenderError> {
        let schedule = staff_schedule(document)?;
        let Some(setup) = &document.setup else {
            return Err(RenderError::InvalidData("No setup defined".into()));
        };

        let mut header = vec!["Day".to_string()];
        header.extend((1..=setup.periods_per_day).map(|p| format!("Pd {}", p)));

        let mut blocks = Vec::new();
        for (teacher, week) in &schedule {
            if !self.only.is_empty() && !self.only.contains(teacher) {
                continue;
            }
            let rows: Vec<Vec<String>> = setup
                .days
                .iter()
                .zip(week)
                .map(|(day, periods)| {
                    let mut row = vec![day.clone()];
                    row.extend(periods.iter().map(|classes| {
                        if classes.is_empty() {
                            EMPTY_CELL.to_string()
                        } else {
                            classes.join(", ")
                        }
                    }));
                    row
                })
                .collect();
            blocks.push(format!("{}\n{}", teacher, format_table(&header, &rows)));
        }

        Ok(blocks.join("\n"))
    }
}
