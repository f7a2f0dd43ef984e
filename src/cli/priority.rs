//! Priority commands: set one, bulk-set a selection.

use clap::Subcommand;
use jiff::Zoned;

use crate::priority::{self, parse_priority};

use super::Env;
use super::format;

#[derive(Debug, Subcommand)]
pub enum PriorityCommand {
    /// Set one project's priority: 1, 2, 3, or `none` to clear.
    Set { pid: String, level: String },

    /// Set the same priority on several projects at once.
    ///
    /// Unknown or blank PIDs are skipped. The write is all or nothing.
    Bulk {
        level: String,

        #[arg(required = true)]
        pids: Vec<String>,
    },
}

pub(super) fn run(env: &mut Env<'_>, command: PriorityCommand) -> Result<(), String> {
    match command {
        PriorityCommand::Set { pid, level } => {
            let level = parse_priority(&level)?;
            let updated = priority::set_priority(&mut env.board, env.store, &pid, level)
                .map_err(|e| e.to_string())?;
            let now = Zoned::now().with_time_zone(env.tz.clone());
            println!("{}", format::format_row(updated, &now));
        }
        PriorityCommand::Bulk { level, pids } => {
            let level = parse_priority(&level)?;
            let outcome = priority::set_priority_selected(&mut env.board, env.store, &pids, level)
                .map_err(|e| e.to_string())?;
            println!("Updated {} project(s).", outcome.total_updated);
        }
    }
    Ok(())
}
