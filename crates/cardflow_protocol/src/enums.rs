//! Status and classification enums shared across the pipeline and the HTTP boundary.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`crate`]-level work card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    NeedsAssignment,
    NeedsReview,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::NeedsAssignment => "NEEDS_ASSIGNMENT",
            ReviewStatus::NeedsReview => "NEEDS_REVIEW",
            ReviewStatus::Approved => "APPROVED",
            ReviewStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ReviewStatus::Approved)
    }
}

/// Where a work card photograph originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkCardSource {
    AdminSingle,
    AdminBatch,
    ResponsibleEmployee,
    Telegram,
}

/// State machine for an extraction job's single lease-guarded lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

/// Extraction depth requested for a job; `HoursOnly` skips identity extraction
/// for re-extraction passes where the employee is already confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionMode {
    Full,
    HoursOnly,
}

impl Default for ExtractionMode {
    fn default() -> Self {
        ExtractionMode::Full
    }
}

/// Provenance of a single day's extracted hours entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayEntrySource {
    Extracted,
    Manual,
    CarriedForward,
}

/// Roster status of an employee, independent of `active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeStatus {
    Active,
    ReportedInSpark,
    ReportedReturnedFromEscape,
}

/// Which tier of the employee resolution policy produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum MatchMethod {
    PassportNormalizedExact,
    PassportCandidateExact,
    NameSiteHighConfidenceFallback,
}

impl MatchMethod {
    pub fn confidence(&self) -> f64 {
        match self {
            MatchMethod::PassportNormalizedExact => 1.0,
            MatchMethod::PassportCandidateExact => 0.95,
            MatchMethod::NameSiteHighConfidenceFallback => 0.85,
        }
    }

    pub fn is_exact(&self) -> bool {
        !matches!(self, MatchMethod::NameSiteHighConfidenceFallback)
    }
}

/// Outcome of comparing an assigned employee's passport to an extracted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentityReason {
    NoExtractedId,
    NoAssignedId,
    FormatOnlyDiff,
    ValueDiff,
}

impl IdentityReason {
    /// Only `ValueDiff` is surfaced as an actual mismatch in the UI.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, IdentityReason::ValueDiff)
    }
}

/// Classification of a current-card day entry against the immediate previous card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    WithApproved,
    WithPending,
}

/// Per-employee upload status used by the admin dashboard when no effective
/// card exists or the effective card has not yet reached extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    NoUpload,
    Pending,
    Failed,
    Extracted,
    Approved,
}

impl From<ReviewStatus> for UploadStatus {
    fn from(status: ReviewStatus) -> Self {
        match status {
            ReviewStatus::Approved => UploadStatus::Approved,
            ReviewStatus::NeedsReview | ReviewStatus::NeedsAssignment => UploadStatus::Extracted,
            ReviewStatus::Rejected => UploadStatus::Failed,
        }
    }
}
