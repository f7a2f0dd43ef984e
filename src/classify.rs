//! Dashboard classification: completed, ongoing, delayed, and not-recon.
//!
//! `classify` is the single predicate behind both the list filters and the
//! card counts, so the two can never disagree.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::model::{ProcurementStatus, Progress, Project};
use crate::workflow::is_procurement_prerequisite_satisfied;

/// The mutually exclusive dashboard bucket of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Completed,
    Ongoing,
    Delayed,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Ongoing => "ongoing",
            Self::Delayed => "delayed",
        }
    }
}

/// Every checkpoint done and procurement at `OTW Reg`.
pub fn is_completed(project: &Project) -> bool {
    is_procurement_prerequisite_satisfied(project)
        && project.status_procurement == ProcurementStatus::OtwReg
}

/// Sent back to the partner for revision.
pub fn is_delayed(project: &Project) -> bool {
    project.status_procurement == ProcurementStatus::RevisiMitra
}

/// The residual bucket.
pub fn is_ongoing(project: &Project) -> bool {
    !is_delayed(project) && !is_completed(project)
}

/// BoQ recap not done yet. Overlaps with every category.
pub fn is_not_recon(project: &Project) -> bool {
    project.rekap_boq == Progress::Belum
}

/// Assign exactly one category. Delayed is tested first, then completed.
pub fn classify(project: &Project) -> Category {
    let delayed = is_delayed(project);
    let completed = is_completed(project);
    if delayed && completed {
        tracing::warn!(pid = %project.pid, "project matches both delayed and completed");
    }
    if delayed {
        Category::Delayed
    } else if completed {
        Category::Completed
    } else {
        Category::Ongoing
    }
}

/// A dashboard list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    #[default]
    All,
    Completed,
    Ongoing,
    Delayed,
    NotRecon,
}

impl Filter {
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::Completed,
        Self::Ongoing,
        Self::Delayed,
        Self::NotRecon,
    ];

    pub fn matches(self, project: &Project) -> bool {
        match self {
            Self::All => true,
            Self::Completed => classify(project) == Category::Completed,
            Self::Ongoing => is_ongoing(project),
            Self::Delayed => classify(project) == Category::Delayed,
            Self::NotRecon => is_not_recon(project),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Ongoing => "ongoing",
            Self::Delayed => "delayed",
            Self::NotRecon => "not-recon",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown filter '{s}'"))
    }
}

/// Dashboard card counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStats {
    pub total: usize,
    pub completed: usize,
    pub ongoing: usize,
    pub delayed: usize,
    pub not_recon: usize,
}

impl CardStats {
    pub fn from_projects<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Self {
        projects.into_iter().fold(Self::default(), |mut stats, p| {
            stats.total += 1;
            match classify(p) {
                Category::Completed => stats.completed += 1,
                Category::Ongoing => stats.ongoing += 1,
                Category::Delayed => stats.delayed += 1,
            }
            if is_not_recon(p) {
                stats.not_recon += 1;
            }
            stats
        })
    }

    /// The count a card shows for a given filter.
    pub fn count(&self, filter: Filter) -> usize {
        match filter {
            Filter::All => self.total,
            Filter::Completed => self.completed,
            Filter::Ongoing => self.ongoing,
            Filter::Delayed => self.delayed,
            Filter::NotRecon => self.not_recon,
        }
    }
}
