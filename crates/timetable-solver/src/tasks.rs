//! Placement task building
//!
//! Each task is one session to be placed into a single (day, period) slot
//! for every class it lists. Classes that share a teacher for a subject are
//! combined for as many sessions as they all still need; the class with the
//! larger need then continues alone.

use serde::Serialize;
use timetable_core::{ClassName, Session, SubjectName, TeacherId};

use crate::requirements::{clamp, Requirements};

/// One atomic session to place for a set of classes
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlacementTask {
    pub teacher: TeacherId,
    pub subject: SubjectName,
    /// Participating classes; all of them get the same slot
    pub classes: Vec<ClassName>,
}

impl PlacementTask {
    pub fn session(&self) -> Session {
        Session::new(self.subject.clone(), self.teacher.clone())
    }

    /// Whether more than one class attends this session
    pub fn is_shared(&self) -> bool {
        self.classes.len() > 1
    }
}

/// Turn residual requirements into placement tasks.
///
/// For every group, task `i` takes every class whose counter is still
/// positive and decrements it, so shared sessions come first and solo
/// sessions after.
pub fn build_tasks(requirements: &Requirements) -> Vec<PlacementTask> {
    let mut tasks = Vec::new();

    for group in requirements.groups() {
        let mut counters: Vec<(&str, u32)> = group
            .needs
            .iter()
            .map(|n| (n.class.as_str(), clamp(n.remaining)))
            .collect();

        for _ in 0..group.max_needed() {
            let mut classes = Vec::new();
            for (class, left) in &mut counters {
                if *left > 0 {
                    classes.push((*class).to_string());
                    *left -= 1;
                }
            }
            if !classes.is_empty() {
                tasks.push(PlacementTask {
                    teacher: group.key.teacher.clone(),
                    subject: group.key.subject.clone(),
                    classes,
                });
            }
        }
    }

    tasks
}
