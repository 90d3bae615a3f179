//! Integration tests for auto-fill
//!
//! Checks the guarantees every successful run must hold: combined sessions
//! land in one slot, no teacher is double-booked, no class exceeds a target,
//! and a failed run leaves the grid alone.

use std::collections::HashMap;

use timetable_core::{Allocation, Grid, Session, Setup};
use timetable_solver::{
    build_tasks, calculate_requirements, detect_collisions, init_grid_structure, run_auto_fill,
    AutoFill, SlotSolver, SolveOutcome, SolverOptions,
};

fn week() -> Setup {
    Setup::new(["Mon", "Tue", "Wed", "Thu", "Fri"], 6)
}

fn school() -> Vec<Allocation> {
    vec![
        Allocation::new("9A")
            .subject("Math", "Khan", 5)
            .subject("English", "Osei", 4)
            .subject("Physics", "Novak", 3)
            .subject("History", "Brandt", 2)
            .subject("PE", "Silva", 2),
        Allocation::new("9B")
            .subject("Math", "Khan", 5)
            .subject("English", "Osei", 4)
            .subject("Chemistry", "Novak", 3)
            .subject("History", "Brandt", 2)
            .subject("PE", "Silva", 2),
        Allocation::new("10A")
            .subject("Math", "Reyes", 6)
            .subject("English", "Osei", 3)
            .subject("Physics", "Novak", 4)
            .subject("PE", "Silva", 2),
    ]
}

fn filled(setup: &Setup, allocations: &[Allocation], grid: &Grid, seed: u64) -> Grid {
    match run_auto_fill(setup, allocations, grid, &SolverOptions::new().seed(seed)).unwrap() {
        AutoFill::Filled { grid, .. } => grid,
        other => panic!("seed {seed}: expected a filled grid, got {other:?}"),
    }
}

// =============================================================================
// Scenario: two classes sharing a teacher
// =============================================================================

#[test]
fn shared_scenario_two_tasks_two_slots() {
    let setup = Setup::new(["Mon", "Tue"], 2);
    let allocations = vec![
        Allocation::new("A").subject("Math", "T1", 2),
        Allocation::new("B").subject("Math", "T1", 1),
    ];
    let grid = init_grid_structure(&setup, &allocations);

    let tasks = build_tasks(&calculate_requirements(&setup, &allocations, &grid));
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].classes, vec!["A", "B"]);
    assert_eq!(tasks[1].classes, vec!["A"]);

    for seed in 0..25 {
        let solved = filled(&setup, &allocations, &grid, seed);
        let math = Session::new("Math", "T1");

        let a_slots: Vec<(&str, usize)> = solved
            .occupied(&setup)
            .filter(|(class, ..)| *class == "A")
            .map(|(_, day, period, _)| (day, period))
            .collect();
        let b_slots: Vec<(&str, usize)> = solved
            .occupied(&setup)
            .filter(|(class, ..)| *class == "B")
            .map(|(_, day, period, _)| (day, period))
            .collect();

        assert_eq!(a_slots.len(), 2, "seed {seed}");
        assert_eq!(b_slots.len(), 1, "seed {seed}");
        assert!(a_slots.contains(&b_slots[0]), "seed {seed}: B must share a slot with A");
        assert_ne!(a_slots[0], a_slots[1]);
        assert_eq!(solved.count_sessions("A", &math), 2);

        // Two of the four slots are used, T1 is never doubled
        assert!(detect_collisions(&setup, &solved).is_empty());
    }
}

// =============================================================================
// Invariants across seeds
// =============================================================================

#[test]
fn no_teacher_collisions_after_success() {
    let setup = week();
    let allocations = school();
    let grid = init_grid_structure(&setup, &allocations);

    for seed in 0..10 {
        let solved = filled(&setup, &allocations, &grid, seed);
        assert!(
            detect_collisions(&setup, &solved).is_empty(),
            "seed {seed} produced a collision"
        );

        // Stronger than the collision check: one subject per teacher per slot
        let mut per_slot: HashMap<(&str, &str, usize), &str> = HashMap::new();
        for (_, day, period, session) in solved.occupied(&setup) {
            let subject = per_slot
                .entry((session.teacher.as_str(), day, period))
                .or_insert(session.subject.as_str());
            assert_eq!(*subject, session.subject);
        }
    }
}

#[test]
fn targets_are_met_exactly() {
    let setup = week();
    let allocations = school();
    let grid = init_grid_structure(&setup, &allocations);
    let solved = filled(&setup, &allocations, &grid, 99);

    for alloc in &allocations {
        for sub in &alloc.subjects {
            assert_eq!(
                solved.count_sessions(&alloc.class_name, &sub.session()),
                sub.periods as usize,
                "{} {}",
                alloc.class_name,
                sub.session()
            );
        }
    }
    assert!(calculate_requirements(&setup, &allocations, &solved).is_satisfied());
}

#[test]
fn combined_tasks_share_one_slot() {
    let setup = week();
    let allocations = school();
    let grid = init_grid_structure(&setup, &allocations);
    let tasks = build_tasks(&calculate_requirements(&setup, &allocations, &grid));

    let outcome = SlotSolver::new(SolverOptions::new().seed(5)).solve(&tasks, &grid, &setup);
    let SolveOutcome::Solved { grid: solved, .. } = outcome else {
        panic!("expected a solution");
    };

    // Khan teaches Math to 9A and 9B for 5 periods each: every one of those
    // slots must hold the session in both classes
    let khan = Session::new("Math", "Khan");
    let slots: Vec<(&str, usize)> = solved
        .occupied(&setup)
        .filter(|(class, _, _, s)| *class == "9A" && **s == khan)
        .map(|(_, day, period, _)| (day, period))
        .collect();
    assert_eq!(slots.len(), 5);
    for (day, period) in slots {
        assert_eq!(solved.cell("9B", day, period).unwrap(), Some(&khan));
    }
}

#[test]
fn existing_sessions_are_kept() {
    let setup = week();
    let allocations = school();
    let mut grid = init_grid_structure(&setup, &allocations);
    let pinned = Session::new("PE", "Silva");
    *grid.slot_mut("10A", "Fri", 5).unwrap() = Some(pinned.clone());

    let solved = filled(&setup, &allocations, &grid, 17);
    assert_eq!(solved.cell("10A", "Fri", 5).unwrap(), Some(&pinned));
    assert_eq!(solved.count_sessions("10A", &pinned), 2);
}

#[test]
fn exhausted_run_leaves_input_unchanged() {
    // Three one-period classes all taught by the same teacher, different
    // subjects, in a week with two slots: impossible
    let setup = Setup::new(["Mon"], 2);
    let allocations = vec![
        Allocation::new("A").subject("Math", "T1", 1),
        Allocation::new("B").subject("Physics", "T1", 1),
        Allocation::new("C").subject("Chemistry", "T1", 1),
    ];
    let grid = init_grid_structure(&setup, &allocations);
    let before = grid.clone();

    let outcome = run_auto_fill(
        &setup,
        &allocations,
        &grid,
        &SolverOptions::new().max_attempts(20).seed(0).fallback(true),
    )
    .unwrap();

    assert_eq!(outcome, AutoFill::Exhausted { attempts: 21 });
    assert_eq!(grid, before);
}

#[test]
fn parallel_attempts_match_sequential() {
    let setup = week();
    let allocations = school();
    let grid = init_grid_structure(&setup, &allocations);

    let sequential = run_auto_fill(&setup, &allocations, &grid, &SolverOptions::new().seed(8)).unwrap();
    let parallel = run_auto_fill(
        &setup,
        &allocations,
        &grid,
        &SolverOptions::new().seed(8).parallel(true),
    )
    .unwrap();

    assert_eq!(sequential, parallel);
}
