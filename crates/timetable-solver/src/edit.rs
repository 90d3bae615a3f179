//! Manual single-cell edits

use timetable_core::{find_allocation, Allocation, Grid, Session, TimetableError};
use tracing::debug;

/// Write or clear one cell.
///
/// Clearing always succeeds for an existing cell. Placing a session requires
/// the (subject, teacher) pair to be allocated to the class, and the class
/// must stay within that pair's weekly target once the cell is counted. The
/// grid is unchanged on error.
pub fn set_cell(
    grid: &mut Grid,
    allocations: &[Allocation],
    class: &str,
    day: &str,
    period: usize,
    session: Option<Session>,
) -> Result<(), TimetableError> {
    let current = grid.cell(class, day, period)?.cloned();

    let Some(session) = session else {
        *grid.slot_mut(class, day, period)? = None;
        return Ok(());
    };

    let alloc = find_allocation(allocations, class)
        .ok_or_else(|| TimetableError::UnknownClass(class.to_string()))?;
    let limit = alloc
        .target_for(&session)
        .ok_or_else(|| TimetableError::NotAllocated {
            class: class.to_string(),
            session: session.clone(),
        })?;

    let mut used = grid.count_sessions(class, &session);
    if current.as_ref() == Some(&session) {
        used -= 1;
    }
    if used + 1 > limit as usize {
        return Err(TimetableError::CapacityExceeded {
            class: class.to_string(),
            subject: session.subject,
            teacher: session.teacher,
            limit,
        });
    }

    debug!(class, day, period, session = %session, "cell updated");
    *grid.slot_mut(class, day, period)? = Some(session);
    Ok(())
}
