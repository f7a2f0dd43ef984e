//! Output formatting for CLI display.

use jiff::Zoned;
use serde::Serialize;

use crate::classify::{self, CardStats, Category, Filter};
use crate::countdown::Countdown;
use crate::model::{ProcurementStatus, Project, ProjectRecord};
use crate::workflow::{OptionState, ProcurementOption};

/// Format a countdown for display, e.g. `3d 04:05:06 left` or `overdue 1d 00:00:09`.
pub(super) fn format_countdown(countdown: &Countdown) -> String {
    let clock = format!(
        "{}d {:02}:{:02}:{:02}",
        countdown.days, countdown.hours, countdown.minutes, countdown.seconds
    );
    if countdown.is_overdue() {
        format!("overdue {clock}")
    } else {
        format!("{clock} left")
    }
}

/// The urgency marker a timer is colored by.
pub(super) fn urgency(countdown: &Countdown) -> &'static str {
    if countdown.is_overdue() {
        "overdue"
    } else if countdown.is_danger() {
        "danger"
    } else if countdown.is_warning() {
        "warning"
    } else {
        "ok"
    }
}

/// Timer column: the countdown, plus the completion date when marked done.
pub(super) fn format_timer(project: &Project, countdown: &Countdown, now: &Zoned) -> String {
    match project.timer_selesai_pada {
        Some(at) => {
            let date = at.to_zoned(now.time_zone().clone()).date();
            format!("completed on {date}")
        }
        None => format!("{} [{}]", format_countdown(countdown), urgency(countdown)),
    }
}

/// One list row.
pub(super) fn format_row(project: &Project, now: &Zoned) -> String {
    let category = classify::classify(project).as_str();
    let recon = if classify::is_not_recon(project) {
        " [not-recon]"
    } else {
        ""
    };
    let priority = project
        .prioritas
        .map(|p| format!(" [{}]", p.label()))
        .unwrap_or_default();
    let countdown = project.countdown(now);
    format!(
        "{}  [{category}]{recon}{priority}  {}  {}  {}",
        project.pid,
        project.nama_proyek,
        project.status_procurement,
        format_timer(project, &countdown, now)
    )
}

pub(super) fn format_stats(stats: &CardStats) -> String {
    Filter::ALL
        .into_iter()
        .map(|f| format!("{:<10} {}", f.as_str(), stats.count(f)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn format_option(option: &ProcurementOption) -> String {
    let marker = match option.state {
        OptionState::Selectable => "  ",
        OptionState::DisabledCurrent => "* ",
        OptionState::Invalid => "x ",
    };
    let note = match option.state {
        OptionState::Selectable => "",
        OptionState::DisabledCurrent => "  (current; locked until prerequisites are done)",
        OptionState::Invalid => "  (locked until prerequisites are done)",
    };
    format!("{marker}{}{note}", option.status)
}

/// The procurement values a project may move to, in pipeline order.
pub(super) fn format_allowed(allowed: &[ProcurementStatus]) -> String {
    let names: Vec<&str> = allowed.iter().map(|s| s.as_str()).collect();
    format!("allowed: {}", names.join(", "))
}

/// JSON shape for `list --json`.
#[derive(Debug, Serialize)]
pub(super) struct ProjectView {
    #[serde(flatten)]
    pub record: ProjectRecord,
    pub category: Category,
    pub not_recon: bool,
    pub countdown: Countdown,
}

impl ProjectView {
    pub fn new(project: &Project, now: &Zoned) -> Self {
        Self {
            record: ProjectRecord::from(project),
            category: classify::classify(project),
            not_recon: classify::is_not_recon(project),
            countdown: project.countdown(now),
        }
    }
}
