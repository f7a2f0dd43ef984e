//! Core data model for procureflow.
//!
//! Projects, their status vocabulary, priorities, and the partial updates
//! the engine sends to the store.

mod project;
mod status;

pub use project::{DurationDays, Priority, Project, ProjectPatch, ProjectRecord};
pub use status::{Checkpoint, ProcurementStatus, Progress, StatusError, normalize};
