//! Domain enums and wire-level DTOs shared by every crate in the workspace.
//!
//! Nothing here touches I/O: this crate exists so that `cardflow_db`,
//! `cardflow_scheduler`, `cardflow_reconcile`, and `cardflow_api` agree on
//! the same vocabulary for statuses, sources, and match outcomes without
//! depending on each other.

pub mod enums;
pub mod envelope;
pub mod extraction;

pub use enums::{
    ConflictType, DayEntrySource, EmployeeStatus, ExtractionMode, IdentityReason, JobStatus,
    MatchMethod, ReviewStatus, UploadStatus, WorkCardSource,
};
pub use envelope::ApiEnvelope;
pub use extraction::{ExtractedEntry, ExtractionResult, PassportCandidate, RowState};
