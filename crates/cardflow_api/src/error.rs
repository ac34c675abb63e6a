//! Single error type at the HTTP boundary. Every inner crate's error enum
//! converts into one of these variants; the variant alone decides the HTTP
//! status, so handlers never set a status code by hand.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cardflow_protocol::ApiEnvelope;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Input(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { message: String, data: Value },

    #[error("rate limited")]
    RateLimited,

    #[error("{0}")]
    Dependency(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn conflict(message: impl Into<String>, data: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            data,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Dependency(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, error_label, data) = match &self {
            Self::Conflict { message, data } => (message.clone(), "Conflict".to_string(), data.clone()),
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                ("an internal error occurred".to_string(), "Internal".to_string(), Value::Null)
            }
            other => (other.to_string(), status.canonical_reason().unwrap_or("Error").to_string(), Value::Null),
        };
        let envelope = ApiEnvelope::err_with_data(message, error_label, data);
        (status, Json(envelope)).into_response()
    }
}

impl From<cardflow_db::DbError> for ApiError {
    fn from(err: cardflow_db::DbError) -> Self {
        match err {
            cardflow_db::DbError::NotFound(msg) => Self::NotFound(msg),
            cardflow_db::DbError::Constraint(msg) => Self::conflict(msg, Value::Null),
            cardflow_db::DbError::InvalidState(msg) => Self::Internal(anyhow::anyhow!(msg)),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<cardflow_reconcile::ReconcileError> for ApiError {
    fn from(err: cardflow_reconcile::ReconcileError) -> Self {
        use cardflow_reconcile::ReconcileError as E;
        match err {
            E::NotFound(id) => Self::NotFound(format!("work card {id}")),
            E::DayLocked { day } => Self::conflict(
                format!(
                    "Day {day} is locked because it was approved in a previous card. \
                     Resolve conflict at approval time to override."
                ),
                Value::Null,
            ),
            E::ApprovalOverrideRequired { approved_conflict_days } => Self::conflict(
                "Overriding approved previous data requires explicit confirmation. \
                 Resubmit with confirm_override_approved=true."
                    .to_string(),
                serde_json::json!({ "approved_conflict_days": approved_conflict_days }),
            ),
            E::DayOutOfRange(day) => Self::Input(format!("day_of_month must be between 1 and 31, got {day}")),
            E::Db(db_err) => db_err.into(),
        }
    }
}

impl From<cardflow_security::AuthError> for ApiError {
    fn from(err: cardflow_security::AuthError) -> Self {
        use cardflow_security::AuthError as E;
        match err {
            E::Expired | E::Invalid | E::WrongScope => Self::Unauthorized,
        }
    }
}
