//! Procurement gating: which procurement statuses a project may move to.
//!
//! The late-stage statuses (`Sekuler TTD`, `Scan Dokumen Mitra`, `OTW Reg`)
//! open up only once every checkpoint is done. The gate is recomputed from
//! the project on every call and holds no state of its own.
//!
//! A stored gated value is never cleared when a checkpoint is later reverted.
//! It stays visible as [`OptionState::DisabledCurrent`]; only new
//! transitions into gated values are refused.

use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::model::{Checkpoint, ProcurementStatus, Project, ProjectPatch};

/// Whether every prerequisite checkpoint is done.
pub fn is_procurement_prerequisite_satisfied(project: &Project) -> bool {
    Checkpoint::ALL
        .into_iter()
        .all(|c| project.checkpoint(c).is_done())
}

/// Procurement values a project may be moved to right now.
pub fn allowed_procurement(project: &Project) -> Vec<ProcurementStatus> {
    let satisfied = is_procurement_prerequisite_satisfied(project);
    ProcurementStatus::ALL
        .into_iter()
        .filter(|s| satisfied || !s.is_gated())
        .collect()
}

/// How a single procurement option should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionState {
    /// May be chosen.
    Selectable,

    /// Gated, but it is the stored value: shown, not choosable.
    DisabledCurrent,

    /// Gated and not stored: not choosable.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcurementOption {
    pub status: ProcurementStatus,
    pub state: OptionState,
}

/// The full procurement option set for a project, in pipeline order.
pub fn procurement_options(project: &Project) -> Vec<ProcurementOption> {
    let satisfied = is_procurement_prerequisite_satisfied(project);
    ProcurementStatus::ALL
        .into_iter()
        .map(|status| {
            let state = if satisfied || !status.is_gated() {
                OptionState::Selectable
            } else if status == project.status_procurement {
                OptionState::DisabledCurrent
            } else {
                OptionState::Invalid
            };
            ProcurementOption { status, state }
        })
        .collect()
}

/// Refuse a move into a gated status while prerequisites are incomplete.
///
/// Re-submitting the stored value is not a transition and always passes.
pub fn check_procurement_transition(project: &Project, target: ProcurementStatus) -> Result<()> {
    if target == project.status_procurement
        || !target.is_gated()
        || is_procurement_prerequisite_satisfied(project)
    {
        return Ok(());
    }
    Err(EngineError::GatedTransition {
        pid: project.pid.clone(),
        target,
    })
}

/// Check a patch against the gate as it would stand after the patch.
///
/// Checkpoint changes in the same patch count: completing the last
/// checkpoint and moving to `OTW Reg` in one write is allowed.
pub fn check_patch(project: &Project, patch: &ProjectPatch) -> Result<()> {
    let Some(target) = patch.status_procurement else {
        return Ok(());
    };
    let mut after = project.clone();
    for (checkpoint, progress) in &patch.checkpoints {
        after.set_checkpoint(*checkpoint, *progress);
    }
    // Compare against the stored value, not the patched one.
    after.status_procurement = project.status_procurement;
    check_procurement_transition(&after, target)
}
