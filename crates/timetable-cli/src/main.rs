//! timetable CLI - School Timetable Engine
//!
//! Command-line interface for building, checking and editing a school
//! timetable stored in a JSON data file.

mod store;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use timetable_core::{
    Allocation, DataSource, Renderer, Session, Setup, TimetableDocument, TimetableError,
};
use timetable_render::{ClassViewRenderer, StaffViewRenderer};
use timetable_solver::{
    requirements_for, AutoFill, Collision, SharedTimetable, SolverOptions, DEFAULT_MAX_ATTEMPTS,
};

use crate::store::JsonFileStore;

#[derive(Parser)]
#[command(name = "timetable")]
#[command(author, version, about = "School timetable engine", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Timetable data file
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "TIMETABLE_DATA",
        default_value = "data/school_data.json"
    )]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter data file
    Init {
        /// Overwrite an existing data file
        #[arg(long)]
        force: bool,
    },

    /// Clear every placed session
    Reset,

    /// Print one class's week, or the staff view
    Show {
        /// Class to show
        #[arg(long, conflicts_with = "staff", required_unless_present = "staff")]
        class: Option<String>,

        /// Show the per-teacher view instead
        #[arg(long)]
        staff: bool,

        /// Limit the staff view to these teachers
        #[arg(long = "teacher", value_name = "TEACHER", requires = "staff")]
        teachers: Vec<String>,
    },

    /// Per-subject progress for a class
    Progress {
        /// Class name
        #[arg(value_name = "CLASS")]
        class: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Place every outstanding session
    Autofill {
        /// Restart budget
        #[arg(long, env = "TIMETABLE_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
        attempts: usize,

        /// Seed for reproducible runs
        #[arg(long, env = "TIMETABLE_SEED")]
        seed: Option<u64>,

        /// Run attempts on all cores
        #[arg(long)]
        parallel: bool,

        /// Try a most-constrained-first pass when random attempts fail
        #[arg(long)]
        fallback: bool,

        /// Report the outcome without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Report teacher double-bookings
    Check {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Place a session in one cell
    Set {
        #[arg(value_name = "CLASS")]
        class: String,
        #[arg(value_name = "DAY")]
        day: String,
        /// 1-based period
        #[arg(value_name = "PERIOD")]
        period: usize,
        #[arg(value_name = "SUBJECT")]
        subject: String,
        #[arg(value_name = "TEACHER")]
        teacher: String,
    },

    /// Empty one cell
    Clear {
        #[arg(value_name = "CLASS")]
        class: String,
        #[arg(value_name = "DAY")]
        day: String,
        /// 1-based period
        #[arg(value_name = "PERIOD")]
        period: usize,
    },

    /// Write the normalized document to a file
    Export {
        /// Output file path
        #[arg(value_name = "PATH")]
        output: PathBuf,
    },
}

// =============================================================================
// Exit status
// =============================================================================

/// Process exit status
///
/// | Code | Meaning |
/// |------|---------|
/// | 0 | Success |
/// | 1 | Auto-fill exhausted, collisions found, or an edit was rejected |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Success = 0,
    Failure = 1,
}

impl Status {
    fn from_problem_count(count: usize) -> Self {
        if count > 0 {
            Status::Failure
        } else {
            Status::Success
        }
    }
}

impl From<Status> for std::process::ExitCode {
    fn from(status: Status) -> Self {
        std::process::ExitCode::from(status as u8)
    }
}

fn main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let store = JsonFileStore::new(&cli.data);
    debug!(data = %store.path().display(), "using data file");

    let status = match cli.command {
        Commands::Init { force } => cmd_init(&store, force)?,
        Commands::Reset => cmd_reset(&store)?,
        Commands::Show {
            class,
            staff,
            teachers,
        } => cmd_show(&store, class, staff, teachers)?,
        Commands::Progress { class, json } => cmd_progress(&store, &class, json)?,
        Commands::Autofill {
            attempts,
            seed,
            parallel,
            fallback,
            dry_run,
        } => {
            let mut options = SolverOptions::new()
                .max_attempts(attempts)
                .parallel(parallel)
                .fallback(fallback);
            if let Some(seed) = seed {
                options = options.seed(seed);
            }
            cmd_autofill(&store, &options, dry_run)?
        }
        Commands::Check { json } => cmd_check(&store, json)?,
        Commands::Set {
            class,
            day,
            period,
            subject,
            teacher,
        } => cmd_edit(
            &store,
            &class,
            &day,
            period,
            Some(Session::new(subject, teacher)),
        )?,
        Commands::Clear { class, day, period } => cmd_edit(&store, &class, &day, period, None)?,
        Commands::Export { output } => cmd_export(&store, &output)?,
    };

    Ok(status.into())
}

fn load(store: &JsonFileStore) -> Result<TimetableDocument> {
    let loaded = store
        .load()
        .with_context(|| format!("Failed to load {}", store.path().display()))?;
    if !loaded.warnings.is_empty() {
        info!(skipped = loaded.warnings.len(), "loaded with malformed cells skipped");
    }
    Ok(loaded.document)
}

fn save(store: &JsonFileStore, document: &TimetableDocument) -> Result<()> {
    store
        .save(document)
        .with_context(|| format!("Failed to save {}", store.path().display()))
}

/// Load a document and insist it is configured
fn load_configured(store: &JsonFileStore) -> Result<Option<TimetableDocument>> {
    let document = load(store)?;
    if let Err(err) = document.configuration() {
        eprintln!("{}", err);
        return Ok(None);
    }
    Ok(Some(document))
}

// =============================================================================
// Commands
// =============================================================================

fn starter_document() -> TimetableDocument {
    TimetableDocument::new(
        Setup::new(["Mon", "Tue", "Wed", "Thu", "Fri"], 6),
        vec![
            Allocation::new("10A")
                .subject("Math", "Khan", 5)
                .subject("English", "Osei", 4)
                .subject("Physics", "Novak", 3)
                .subject("PE", "Silva", 2),
            Allocation::new("10B")
                .subject("Math", "Khan", 5)
                .subject("English", "Osei", 4)
                .subject("Chemistry", "Novak", 3)
                .subject("PE", "Silva", 2),
        ],
    )
}

fn cmd_init(store: &JsonFileStore, force: bool) -> Result<Status> {
    if store.path().exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            store.path().display()
        );
    }
    save(store, &starter_document())?;
    println!("Created: {}", store.path().display());
    Ok(Status::Success)
}

fn cmd_reset(store: &JsonFileStore) -> Result<Status> {
    let Some(mut document) = load_configured(store)? else {
        return Ok(Status::Failure);
    };
    document.reset_grid()?;
    save(store, &document)?;
    println!("Grid cleared");
    Ok(Status::Success)
}

fn cmd_show(
    store: &JsonFileStore,
    class: Option<String>,
    staff: bool,
    teachers: Vec<String>,
) -> Result<Status> {
    let document = load(store)?;
    let output = match class {
        Some(class) if !staff => ClassViewRenderer::new(class).render(&document),
        _ => StaffViewRenderer::new().only(teachers).render(&document),
    };
    match output {
        Ok(text) => {
            print!("{}", text);
            Ok(Status::Success)
        }
        Err(err) => {
            eprintln!("{}", err);
            Ok(Status::Failure)
        }
    }
}

fn cmd_progress(store: &JsonFileStore, class: &str, json: bool) -> Result<Status> {
    let Some(document) = load_configured(store)? else {
        return Ok(Status::Failure);
    };
    let (setup, allocations) = document.configuration()?;
    let progress = match requirements_for(setup, allocations, &document.grid, class) {
        Ok(progress) => progress,
        Err(err) => {
            eprintln!("{}", err);
            return Ok(Status::Failure);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&progress)?);
    } else {
        for p in &progress {
            println!(
                "{} ({}): {}/{} ({}%)",
                p.subject,
                p.teacher,
                p.periods_placed,
                p.periods_required,
                p.percent()
            );
        }
    }
    Ok(Status::Success)
}

fn cmd_autofill(store: &JsonFileStore, options: &SolverOptions, dry_run: bool) -> Result<Status> {
    let Some(document) = load_configured(store)? else {
        return Ok(Status::Failure);
    };
    let shared = SharedTimetable::new(document);

    match shared.auto_fill(options)?.into_result() {
        Ok(AutoFill::Filled {
            attempts_used,
            tasks_placed,
            ..
        }) => {
            if !dry_run {
                save(store, &shared.snapshot().document)?;
            }
            println!(
                "Auto-filled successfully (Attempt {}, {} sessions placed)",
                attempts_used, tasks_placed
            );
            Ok(Status::Success)
        }
        Ok(_) => {
            println!("Schedule is already full!");
            Ok(Status::Success)
        }
        Err(err @ TimetableError::SolverExhausted { .. }) => {
            eprintln!("{}", err);
            Ok(Status::Failure)
        }
        Err(err) => Err(err.into()),
    }
}

/// Collision as reported by `check --json`
#[derive(Serialize)]
struct CollisionReport<'a> {
    teacher: &'a str,
    day: &'a str,
    period: usize,
    classes: [&'a str; 2],
    subjects: [&'a str; 2],
    message: String,
}

impl<'a> From<&'a Collision> for CollisionReport<'a> {
    fn from(c: &'a Collision) -> Self {
        Self {
            teacher: &c.teacher,
            day: &c.day,
            period: c.period + 1,
            classes: [c.first.class.as_str(), c.second.class.as_str()],
            subjects: [c.first.subject.as_str(), c.second.subject.as_str()],
            message: c.to_string(),
        }
    }
}

fn cmd_check(store: &JsonFileStore, json: bool) -> Result<Status> {
    let shared = SharedTimetable::new(load(store)?);
    let collisions = shared.detect_collisions();

    if json {
        let report: Vec<CollisionReport<'_>> = collisions.iter().map(Into::into).collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if collisions.is_empty() {
        println!("No collisions found!");
    } else {
        for collision in &collisions {
            println!("{}", collision);
        }
        println!("{} collision(s) found", collisions.len());
    }

    Ok(Status::from_problem_count(collisions.len()))
}

fn cmd_edit(
    store: &JsonFileStore,
    class: &str,
    day: &str,
    period: usize,
    session: Option<Session>,
) -> Result<Status> {
    let Some(document) = load_configured(store)? else {
        return Ok(Status::Failure);
    };
    let Some(index) = period.checked_sub(1) else {
        eprintln!("Periods are numbered from 1");
        return Ok(Status::Failure);
    };

    let shared = SharedTimetable::new(document);
    let described = session
        .as_ref()
        .map_or_else(|| "empty".to_string(), ToString::to_string);
    if let Err(err) = shared.set_cell(class, day, index, session) {
        eprintln!("{}", err);
        return Ok(Status::Failure);
    }

    save(store, &shared.snapshot().document)?;
    println!("{} {} Pd {}: {}", class, day, period, described);
    Ok(Status::Success)
}

fn cmd_export(store: &JsonFileStore, output: &Path) -> Result<Status> {
    let document = load(store)?;
    JsonFileStore::new(output)
        .save(&document)
        .with_context(|| format!("Failed to export to {}", output.display()))?;
    println!("Exported: {}", output.display());
    Ok(Status::Success)
}
