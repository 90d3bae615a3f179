//! # timetable-render
//!
//! Plain-text views of a timetable document.
//!
//! This crate provides:
//! - Class view: one class's week with per-subject progress
//! - Staff view: the grid pivoted per teacher
//!
//! ## Example
//!
//! ```rust
//! use timetable_core::{Allocation, Renderer, Setup, TimetableDocument};
//! use timetable_render::{ClassViewRenderer, StaffViewRenderer};
//!
//! let doc = TimetableDocument::new(
//!     Setup::new(["Mon", "Tue"], 2),
//!     vec![Allocation::new("10A").subject("Math", "T1", 2)],
//! );
//!
//! let class_view = ClassViewRenderer::new("10A").render(&doc).unwrap();
//! assert!(class_view.contains("Math (T1)  0/2"));
//!
//! let staff_view = StaffViewRenderer::new().render(&doc).unwrap();
//! assert!(staff_view.contains("T1"));
//! ```

pub mod staff;

pub use staff::{staff_schedule, StaffSchedule, StaffViewRenderer};

use timetable_core::{RenderError, Renderer, TimetableDocument};
use timetable_solver::requirements_for;

/// Placeholder for an empty cell
pub const EMPTY_CELL: &str = "--";

/// Text renderer for one class
#[derive(Clone, Debug)]
pub struct ClassViewRenderer {
    /// Class to render
    pub class: String,
    /// Whether to append per-subject progress lines
    pub show_progress: bool,
}

impl ClassViewRenderer {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            show_progress: true,
        }
    }

    /// Render only the grid
    pub fn no_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }
}

impl Renderer for ClassViewRenderer {
    type Output = String;

    fn render(&self, document: &TimetableDocument) -> Result<String, RenderError> {
        let (setup, allocations) = document
            .configuration()
            .map_err(|e| RenderError::InvalidData(e.to_string()))?;
        let week = document
            .grid
            .class_week(&self.class)
            .ok_or_else(|| RenderError::InvalidData(format!("Class not found: {}", self.class)))?;

        let mut header = vec!["Day".to_string()];
        header.extend((1..=setup.periods_per_day).map(|p| format!("Period {}", p)));

        let mut rows = Vec::new();
        for day in &setup.days {
            let mut row = vec![day.clone()];
            for period in 0..setup.periods_per_day {
                let cell = week
                    .get(day)
                    .and_then(|r| r.get(period))
                    .and_then(Option::as_ref)
                    .map(ToString::to_string)
                    .unwrap_or_else(|| EMPTY_CELL.to_string());
                row.push(cell);
            }
            rows.push(row);
        }

        let mut output = String::new();
        output.push_str(&format!("Class {}\n", self.class));
        output.push_str(&format_table(&header, &rows));

        if self.show_progress {
            let progress = requirements_for(setup, allocations, &document.grid, &self.class)
                .map_err(|e| RenderError::InvalidData(e.to_string()))?;
            let labels: Vec<String> = progress
                .iter()
                .map(|p| format!("{} ({})", p.subject, p.teacher))
                .collect();
            let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

            output.push_str("\nProgress\n");
            for (label, p) in labels.iter().zip(&progress) {
                let marker = if p.is_complete() { " done" } else { "" };
                output.push_str(&format!(
                    "  {:<width$}  {}/{}{}\n",
                    label,
                    p.periods_placed,
                    p.periods_required,
                    marker,
                    width = width
                ));
            }
        }

        Ok(output)
    }
}

/// Lay out rows as a left-aligned, `|`-separated table with a rule under the
/// header
pub(crate) fn format_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<w$}", cell, w = w))
            .collect();
        format!("{}\n", padded.join(" | ").trim_end())
    };

    let mut output = line(header);
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    output.push_str(&format!("{}\n", rule.join("-+-")));
    for row in rows {
        output.push_str(&line(row));
    }
    output
}
