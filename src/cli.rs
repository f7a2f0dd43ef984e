//! CLI interface for procureflow.
//!
//! Every subcommand is non-interactive: arguments in, text (or JSON) out.
//! Errors come back as messages; `main` prints them and exits non-zero.

mod format;
mod priority;
mod project;
mod timer;

use clap::{Parser, Subcommand};
use jiff::tz::TimeZone;

use crate::board::Board;
use crate::config::Config;
use crate::model::DurationDays;
use crate::store::SqliteStore;

use priority::PriorityCommand;
use project::StatusField;
use timer::TimerCommand;

/// procureflow: billing project workflow and deadlines.
#[derive(Debug, Parser)]
#[command(name = "procureflow", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow: moving a project to registration
  1. procureflow new PID-0042 'Gedung Serbaguna' --start 2025-06-01 --duration 30
  2. procureflow status PID-0042 ct sudah   (repeat for ut, rekap-boq, rekon-material, pelurusan-material)
  3. procureflow options PID-0042           (late-stage procurement unlocks once all five are done)
  4. procureflow status PID-0042 procurement 'OTW Reg'

Dashboard:
  procureflow stats
  procureflow list --filter delayed
  procureflow priority bulk 1 PID-0042 PID-0043
  procureflow timer watch";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a project with every checkpoint at "Belum".
    New {
        /// Business identifier (PID).
        pid: String,

        /// Project name.
        #[arg(default_value = "")]
        name: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<jiff::civil::Date>,

        /// Estimated duration in days (1-365). Defaults to the configured value.
        #[arg(long)]
        duration: Option<String>,
    },

    /// List projects in stable order (newest first).
    List {
        /// Dashboard view: all, completed, ongoing, delayed, not-recon.
        #[arg(long, default_value = "all")]
        filter: crate::classify::Filter,

        /// Match PID or name, ignoring case.
        #[arg(long)]
        search: Option<String>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show dashboard card counts.
    Stats {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Ask the store for its own aggregate instead of counting the list.
        #[arg(long)]
        from_store: bool,
    },

    /// Set one status field.
    ///
    /// Checkpoints accept the full label ("Sudah CT") or just sudah/belum.
    /// Late-stage procurement values are refused until every checkpoint is done.
    Status {
        pid: String,

        #[arg(value_enum)]
        field: StatusField,

        value: String,
    },

    /// Show which procurement statuses a project may move to.
    Options { pid: String },

    /// Set the estimated duration in days (1-365).
    Duration {
        pid: String,

        #[arg(allow_hyphen_values = true)]
        days: String,
    },

    /// Set the start date (YYYY-MM-DD), or `none` to clear it.
    Start { pid: String, date: String },

    /// Set or clear manual priority.
    Priority {
        #[command(subcommand)]
        command: PriorityCommand,
    },

    /// Deadline countdowns.
    Timer {
        #[command(subcommand)]
        command: TimerCommand,
    },
}

/// What every command runs against.
struct Env<'a> {
    store: &'a SqliteStore,
    board: Board,
    tz: TimeZone,
    default_duration: DurationDays,
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, store: &SqliteStore) -> Result<(), String> {
    let cli = Cli::parse();

    let board = Board::load(store).map_err(|e| format!("failed to load projects: {e}"))?;
    let mut env = Env {
        store,
        board,
        tz: config.time_zone()?,
        default_duration: config.default_duration()?,
    };

    match cli.command {
        Command::New {
            pid,
            name,
            start,
            duration,
        } => project::cmd_new(&mut env, &pid, &name, start, duration.as_deref()),
        Command::List {
            filter,
            search,
            json,
        } => project::cmd_list(&env, filter, search.as_deref(), json),
        Command::Stats { json, from_store } => project::cmd_stats(&env, json, from_store),
        Command::Status { pid, field, value } => {
            project::cmd_status(&mut env, &pid, field, &value)
        }
        Command::Options { pid } => project::cmd_options(&env, &pid),
        Command::Duration { pid, days } => project::cmd_duration(&mut env, &pid, &days),
        Command::Start { pid, date } => project::cmd_start(&mut env, &pid, &date),
        Command::Priority { command } => priority::run(&mut env, command),
        Command::Timer { command } => timer::run(&mut env, command),
    }
}
