//! Project commands: new, list, stats, status, options, duration, start.

use clap::ValueEnum;
use jiff::{Timestamp, Zoned, civil::Date};

use crate::classify::Filter;
use crate::model::{Checkpoint, DurationDays, ProcurementStatus, Progress, Project, normalize};
use crate::store::ProjectStore;
use crate::workflow;

use super::Env;
use super::format::{self, ProjectView};

/// The status field a `status` command writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusField {
    Ct,
    Ut,
    RekapBoq,
    RekonMaterial,
    PelurusanMaterial,
    Procurement,
}

impl StatusField {
    fn checkpoint(self) -> Option<Checkpoint> {
        match self {
            Self::Ct => Some(Checkpoint::Ct),
            Self::Ut => Some(Checkpoint::Ut),
            Self::RekapBoq => Some(Checkpoint::RekapBoq),
            Self::RekonMaterial => Some(Checkpoint::RekonMaterial),
            Self::PelurusanMaterial => Some(Checkpoint::PelurusanMaterial),
            Self::Procurement => None,
        }
    }
}

pub(super) fn cmd_new(
    env: &mut Env<'_>,
    pid: &str,
    name: &str,
    start: Option<Date>,
    duration: Option<&str>,
) -> Result<(), String> {
    let pid = pid.trim();
    if pid.is_empty() {
        return Err("PID must not be empty".to_string());
    }
    if env.board.get(pid).is_some() {
        return Err(format!("project '{pid}' already exists"));
    }

    let days = match duration {
        Some(raw) => DurationDays::parse(raw).map_err(|e| e.to_string())?,
        None => env.default_duration,
    };
    let mut project = Project::new(pid, name.trim(), days, Timestamp::now());
    project.tanggal_mulai = start;

    let created = env
        .board
        .create(env.store, project)
        .map_err(|e| format!("failed to create project: {e}"))?;
    println!("{}", format::format_row(created, &Zoned::now().with_time_zone(env.tz.clone())));
    Ok(())
}

pub(super) fn cmd_list(
    env: &Env<'_>,
    filter: Filter,
    search: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let now = Zoned::now().with_time_zone(env.tz.clone());
    let projects = env.board.view(filter, search);

    if json {
        let views: Vec<ProjectView> = projects.iter().map(|p| ProjectView::new(p, &now)).collect();
        let json = serde_json::to_string_pretty(&views)
            .map_err(|e| format!("failed to serialize projects: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects.");
        return Ok(());
    }
    for project in projects {
        println!("{}", format::format_row(project, &now));
    }
    Ok(())
}

pub(super) fn cmd_stats(env: &Env<'_>, json: bool, from_store: bool) -> Result<(), String> {
    let stats = if from_store {
        env.store
            .card_stats()
            .map_err(|e| format!("failed to read store stats: {e}"))?
    } else {
        env.board.stats()
    };
    if json {
        let json = serde_json::to_string_pretty(&stats)
            .map_err(|e| format!("failed to serialize stats: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", format::format_stats(&stats));
    }
    Ok(())
}

pub(super) fn cmd_status(
    env: &mut Env<'_>,
    pid: &str,
    field: StatusField,
    value: &str,
) -> Result<(), String> {
    let updated = match field.checkpoint() {
        Some(checkpoint) => {
            let progress = parse_progress(checkpoint, value)?;
            env.board
                .set_checkpoint(env.store, pid, checkpoint, progress)
        }
        None => {
            let status = ProcurementStatus::parse(value).map_err(|e| e.to_string())?;
            env.board.set_procurement(env.store, pid, status)
        }
    }
    .map_err(|e| e.to_string())?;

    let now = Zoned::now().with_time_zone(env.tz.clone());
    println!("{}", format::format_row(updated, &now));
    Ok(())
}

/// Accept the full label (`Sudah CT`) or a bare `sudah` / `belum`.
fn parse_progress(checkpoint: Checkpoint, raw: &str) -> Result<Progress, String> {
    checkpoint.parse(raw).or_else(|e| match normalize(raw).as_str() {
        "sudah" => Ok(Progress::Sudah),
        "belum" => Ok(Progress::Belum),
        _ => Err(e.to_string()),
    })
}

pub(super) fn cmd_options(env: &Env<'_>, pid: &str) -> Result<(), String> {
    let project = env
        .board
        .get(pid)
        .ok_or_else(|| format!("unknown project '{pid}'"))?;

    println!("{}: {}", project.pid, project.status_procurement);
    for option in workflow::procurement_options(project) {
        println!("{}", format::format_option(&option));
    }
    println!("{}", format::format_allowed(&workflow::allowed_procurement(project)));
    Ok(())
}

pub(super) fn cmd_duration(env: &mut Env<'_>, pid: &str, days: &str) -> Result<(), String> {
    let updated = env
        .board
        .set_duration(env.store, pid, days)
        .map_err(|e| e.to_string())?;

    let now = Zoned::now().with_time_zone(env.tz.clone());
    println!("{}", format::format_row(updated, &now));
    Ok(())
}

pub(super) fn cmd_start(env: &mut Env<'_>, pid: &str, date: &str) -> Result<(), String> {
    let start = parse_start(date)?;
    let updated = env
        .board
        .set_start_date(env.store, pid, start)
        .map_err(|e| e.to_string())?;

    let now = Zoned::now().with_time_zone(env.tz.clone());
    println!("{}", format::format_row(updated, &now));
    Ok(())
}

fn parse_start(raw: &str) -> Result<Option<Date>, String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    raw.parse::<Date>()
        .map(Some)
        .map_err(|e| format!("invalid start date '{raw}': {e}"))
}
