//! Timer commands: show, watch, complete, reopen.

use std::collections::HashMap;
use std::ops::ControlFlow;

use clap::Subcommand;
use jiff::{Timestamp, Zoned};

use crate::board::Board;
use crate::countdown::{Subscription, Ticker, TimerInputs};
use crate::model::Project;

use super::Env;
use super::format;

#[derive(Debug, Subcommand)]
pub enum TimerCommand {
    /// Print the current countdown. No PIDs means every project.
    Show { pids: Vec<String> },

    /// Print countdowns once a second until interrupted.
    ///
    /// Completed timers are not watched.
    Watch {
        pids: Vec<String>,

        /// Stop after this many ticks.
        #[arg(long)]
        ticks: Option<u32>,
    },

    /// Mark a project's timer as completed now.
    Complete { pid: String },

    /// Clear the completion mark so the countdown runs again.
    Reopen { pid: String },
}

pub(super) fn run(env: &mut Env<'_>, command: TimerCommand) -> Result<(), String> {
    match command {
        TimerCommand::Show { pids } => cmd_show(env, &pids),
        TimerCommand::Watch { pids, ticks } => cmd_watch(env, &pids, ticks),
        TimerCommand::Complete { pid } => cmd_mark(env, &pid, true),
        TimerCommand::Reopen { pid } => cmd_mark(env, &pid, false),
    }
}

/// Projects named on the command line, or all of them.
fn select<'b>(env: &'b Env<'_>, pids: &[String]) -> Result<Vec<&'b Project>, String> {
    if pids.is_empty() {
        return Ok(env.board.projects().iter().collect());
    }
    pids.iter()
        .map(|pid| {
            env.board
                .get(pid)
                .ok_or_else(|| format!("unknown project '{pid}'"))
        })
        .collect()
}

fn cmd_show(env: &Env<'_>, pids: &[String]) -> Result<(), String> {
    let now = Zoned::now().with_time_zone(env.tz.clone());
    for project in select(env, pids)? {
        let countdown = project.countdown(&now);
        println!(
            "{}  {}",
            project.pid,
            format::format_timer(project, &countdown, &now)
        );
    }
    Ok(())
}

fn cmd_watch(env: &mut Env<'_>, pids: &[String], ticks: Option<u32>) -> Result<(), String> {
    let ticker = Ticker::new(env.tz.clone());
    let mut names = HashMap::new();
    let mut subscriptions = Vec::new();
    for project in select(env, pids)? {
        if project.timer_selesai_pada.is_some() {
            continue;
        }
        let subscription = ticker.subscribe(TimerInputs::of(project));
        names.insert(subscription.id(), project.pid.clone());
        subscriptions.push((project.pid.clone(), subscription));
    }

    if ticker.is_empty() {
        println!("No running timers.");
        return Ok(());
    }
    tracing::debug!(timers = ticker.len(), "watching timers");

    let mut remaining = ticks;
    ticker.run(Ticker::PERIOD, |readings| {
        for (id, countdown) in readings {
            if let Some(pid) = names.get(id) {
                println!(
                    "{pid}  {} [{}]",
                    format::format_countdown(countdown),
                    format::urgency(countdown)
                );
            }
        }
        println!();

        // Pick up edits made elsewhere before the next tick.
        match env.board.refresh(env.store) {
            Ok(()) => sync(&env.board, &mut subscriptions),
            Err(e) => tracing::warn!(error = %e, "refresh during watch failed"),
        }

        match remaining.as_mut() {
            Some(n) if *n <= 1 => ControlFlow::Break(()),
            Some(n) => {
                *n -= 1;
                ControlFlow::Continue(())
            }
            None => ControlFlow::Continue(()),
        }
    });

    Ok(())
}

/// Point each watched timer at its project's current inputs.
///
/// Timers whose project is gone or marked complete are dropped.
fn sync(board: &Board, subscriptions: &mut Vec<(String, Subscription)>) {
    subscriptions.retain(|(pid, subscription)| match board.get(pid) {
        Some(project) if project.timer_selesai_pada.is_none() => {
            subscription.retarget(TimerInputs::of(project));
            true
        }
        _ => {
            tracing::debug!(pid = %pid, "timer no longer running");
            false
        }
    });
}

fn cmd_mark(env: &mut Env<'_>, pid: &str, completed: bool) -> Result<(), String> {
    let updated = env
        .board
        .set_timer_completed(env.store, pid, completed, Timestamp::now())
        .map_err(|e| e.to_string())?;

    let now = Zoned::now().with_time_zone(env.tz.clone());
    let countdown = updated.countdown(&now);
    println!(
        "{}  {}",
        updated.pid,
        format::format_timer(updated, &countdown, &now)
    );
    Ok(())
}
