//! Reconciliation of work-card hours across a month: effective-card
//! selection, day-level conflict classification against the immediate
//! previous card, the four-step approval protocol, and the hours matrix.

pub mod approval;
pub mod conflict;
pub mod edit;
pub mod effective;
pub mod error;
pub mod matrix;
mod signature;

pub use approval::{approve_work_card, ApprovalRequest, ApprovalSummary};
pub use conflict::{classify_card, classify_day, DayConflict};
pub use edit::{update_day_entries, DayEntryEdit};
pub use effective::select_effective_cards;
pub use error::{ReconcileError, Result};
pub use matrix::{build_hours_matrix, employee_upload_status, HoursMatrix};
pub use signature::EntrySignature;
