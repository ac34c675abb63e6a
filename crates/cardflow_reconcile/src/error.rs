use cardflow_ids::WorkCardId;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("work card {0} not found")]
    NotFound(WorkCardId),

    #[error("day {day} is locked because it was approved in a previous card")]
    DayLocked { day: i32 },

    #[error("approving requires confirmation of override for approved day(s): {approved_conflict_days:?}")]
    ApprovalOverrideRequired { approved_conflict_days: Vec<i32> },

    #[error("day_of_month must be between 1 and 31, got {0}")]
    DayOutOfRange(i32),

    #[error(transparent)]
    Db(#[from] cardflow_db::DbError),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
