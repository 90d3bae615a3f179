//! Requirement calculation
//!
//! Diffs the declared weekly targets against what the grid already holds.
//! Requirements are grouped by (teacher, subject) so that classes sharing a
//! teacher for the same subject can later be placed together.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use timetable_core::{
    find_allocation, Allocation, ClassName, Grid, Session, Setup, SubjectName, TeacherId,
    TimetableError,
};

/// Grouping key for combined sessions
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequirementKey {
    pub teacher: TeacherId,
    pub subject: SubjectName,
}

impl RequirementKey {
    pub fn new(teacher: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            teacher: teacher.into(),
            subject: subject.into(),
        }
    }

    pub fn session(&self) -> Session {
        Session::new(self.subject.clone(), self.teacher.clone())
    }
}

impl fmt::Display for RequirementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.teacher, self.subject)
    }
}

/// Remaining sessions one class needs within a group.
///
/// Negative when the grid already holds more than the target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassNeed {
    pub class: ClassName,
    pub remaining: i64,
}

/// All classes taught `key.subject` by `key.teacher`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequirementGroup {
    pub key: RequirementKey,
    /// Classes in allocation order
    pub needs: Vec<ClassNeed>,
}

impl RequirementGroup {
    /// Largest remaining need, clamped at zero
    pub fn max_needed(&self) -> u32 {
        self.needs
            .iter()
            .map(|n| clamp(n.remaining))
            .max()
            .unwrap_or(0)
    }
}

/// Residual requirements, groups in first-seen order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Requirements {
    groups: Vec<RequirementGroup>,
}

impl Requirements {
    pub fn groups(&self) -> &[RequirementGroup] {
        &self.groups
    }

    pub fn group(&self, key: &RequirementKey) -> Option<&RequirementGroup> {
        self.groups.iter().find(|g| &g.key == key)
    }

    /// Raw remaining count for one class in one group
    pub fn remaining(&self, key: &RequirementKey, class: &str) -> Option<i64> {
        self.group(key)?
            .needs
            .iter()
            .find(|n| n.class == class)
            .map(|n| n.remaining)
    }

    /// Sum of all positive remaining counts
    pub fn total_outstanding(&self) -> u64 {
        self.groups
            .iter()
            .flat_map(|g| &g.needs)
            .map(|n| u64::from(clamp(n.remaining)))
            .sum()
    }

    pub fn is_satisfied(&self) -> bool {
        self.total_outstanding() == 0
    }
}

/// Clamp a raw remaining count for task building
pub(crate) fn clamp(remaining: i64) -> u32 {
    u32::try_from(remaining.max(0)).unwrap_or(u32::MAX)
}

/// Count cells of `class` holding `session`, over the days of `setup`
fn placed(setup: &Setup, grid: &Grid, class: &str, session: &Session) -> usize {
    let Some(week) = grid.class_week(class) else {
        return 0;
    };
    setup
        .days
        .iter()
        .filter_map(|day| week.get(day))
        .flatten()
        .filter(|cell| cell.as_ref() == Some(session))
        .count()
}

/// Derive per-(teacher, subject) remaining needs from targets and the grid.
///
/// Counting is by exact (subject, teacher) match. When a class lists the same
/// pair twice, the later entry replaces the earlier one.
pub fn calculate_requirements(
    setup: &Setup,
    allocations: &[Allocation],
    grid: &Grid,
) -> Requirements {
    let mut groups: Vec<RequirementGroup> = Vec::new();
    let mut index: HashMap<RequirementKey, usize> = HashMap::new();

    for alloc in allocations {
        for sub in &alloc.subjects {
            let key = RequirementKey::new(sub.teacher.as_str(), sub.subject.as_str());
            let count = placed(setup, grid, &alloc.class_name, &sub.session());
            let remaining = i64::from(sub.periods) - count as i64;

            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push(RequirementGroup {
                    key,
                    needs: Vec::new(),
                });
                groups.len() - 1
            });
            let needs = &mut groups[slot].needs;
            match needs.iter_mut().find(|n| n.class == alloc.class_name) {
                Some(need) => need.remaining = remaining,
                None => needs.push(ClassNeed {
                    class: alloc.class_name.clone(),
                    remaining,
                }),
            }
        }
    }

    Requirements { groups }
}

/// Placement progress for one subject of a class
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubjectProgress {
    pub subject: SubjectName,
    pub teacher: TeacherId,
    pub periods_required: u32,
    pub periods_placed: usize,
}

impl SubjectProgress {
    pub fn is_complete(&self) -> bool {
        self.periods_placed >= self.periods_required as usize
    }

    /// Completion percentage, capped at 100
    pub fn percent(&self) -> u32 {
        if self.periods_required == 0 {
            return 100;
        }
        let pct = self.periods_placed * 100 / self.periods_required as usize;
        pct.min(100) as u32
    }
}

/// Per-subject progress for one class, in allocation order
pub fn requirements_for(
    setup: &Setup,
    allocations: &[Allocation],
    grid: &Grid,
    class: &str,
) -> Result<Vec<SubjectProgress>, TimetableError> {
    let alloc = find_allocation(allocations, class)
        .ok_or_else(|| TimetableError::UnknownClass(class.to_string()))?;

    Ok(alloc
        .subjects
        .iter()
        .map(|sub| SubjectProgress {
            subject: sub.subject.clone(),
            teacher: sub.teacher.clone(),
            periods_required: sub.periods,
            periods_placed: placed(setup, grid, class, &sub.session()),
        })
        .collect())
}
