//! Request-scoped principals extracted from the `Authorization` header.
//! Two flavors mirror the two JWT kinds `cardflow_security` issues: an
//! admin bearer principal and a portal-scoped upload principal.

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use cardflow_ids::{BusinessId, EmployeeId, SiteId, UploadAccessRequestId, UserId};
use chrono::NaiveDate;

use crate::error::ApiError;
use crate::state::AppState;

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)
}

#[derive(Debug, Clone, Copy)]
pub struct AdminPrincipal {
    pub user_id: UserId,
    pub business_id: BusinessId,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts)?;
        let claims = app_state.admin_tokens.verify(token)?;
        Ok(AdminPrincipal {
            user_id: claims.sub,
            business_id: claims.business_id,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PortalPrincipal {
    pub request_id: UploadAccessRequestId,
    pub business_id: BusinessId,
    pub site_id: SiteId,
    pub employee_id: EmployeeId,
    pub processing_month: NaiveDate,
}

#[async_trait]
impl<S> FromRequestParts<S> for PortalPrincipal
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts)?;
        let claims = app_state.portal_tokens.verify(token)?;
        Ok(PortalPrincipal {
            request_id: claims.request_id,
            business_id: claims.business_id,
            site_id: claims.site_id,
            employee_id: claims.employee_id,
            processing_month: claims.processing_month,
        })
    }
}
