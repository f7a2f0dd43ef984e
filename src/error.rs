//! Engine errors.
//!
//! Local validation failures (`InvalidDuration`, `GatedTransition`,
//! `NoSelection`) are raised before anything is written. Store failures are
//! wrapped unchanged so the caller sees exactly what the collaborator said.

use crate::model::{ProcurementStatus, StatusError};
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid duration: {0} (expected whole days within 1..=365)")]
    InvalidDuration(String),

    #[error("project {pid} cannot move to {target}: prerequisites are not all done")]
    GatedTransition {
        pid: String,
        target: ProcurementStatus,
    },

    #[error("no valid projects selected")]
    NoSelection,

    #[error("project not found: {0}")]
    UnknownProject(String),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = core::result::Result<T, EngineError>;
