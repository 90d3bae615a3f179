//! Collision detection
//!
//! Audits a grid for teachers booked under two different subjects in the same
//! slot. The same subject at the same slot across several classes is one
//! combined session and is not reported.
//!
//! The occupancy map is rebuilt from the grid on every call, so manual edits
//! that bypassed the engine are caught as well.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use timetable_core::{ClassName, Grid, Setup, SubjectName, TeacherId};

/// One side of a collision
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub subject: SubjectName,
    pub class: ClassName,
}

/// A teacher recorded under two subjects in one slot
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub teacher: TeacherId,
    pub day: String,
    /// Zero-based period index
    pub period: usize,
    /// The booking seen first in scan order
    pub first: Booking,
    pub second: Booking,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}({}) vs {}({}) on {} Pd {}",
            self.teacher,
            self.first.subject,
            self.first.class,
            self.second.subject,
            self.second.class,
            self.day,
            self.period + 1
        )
    }
}

/// Scan the grid once and report every conflicting booking.
///
/// Classes are visited in grid order, days in setup order, periods ascending.
/// The first booking seen for a (teacher, day, period) stays the reference for
/// later ones.
pub fn detect_collisions(setup: &Setup, grid: &Grid) -> Vec<Collision> {
    let mut seen: HashMap<&str, HashMap<(&str, usize), (&str, &str)>> = HashMap::new();
    let mut collisions = Vec::new();

    for (class, day, period, session) in grid.occupied(setup) {
        let slots = seen.entry(session.teacher.as_str()).or_default();
        match slots.get(&(day, period)) {
            Some(&(subject, first_class)) => {
                if subject != session.subject {
                    collisions.push(Collision {
                        teacher: session.teacher.clone(),
                        day: day.to_string(),
                        period,
                        first: Booking {
                            subject: subject.to_string(),
                            class: first_class.to_string(),
                        },
                        second: Booking {
                            subject: session.subject.clone(),
                            class: class.to_string(),
                        },
                    });
                }
            }
            None => {
                slots.insert((day, period), (session.subject.as_str(), class));
            }
        }
    }

    collisions
}
