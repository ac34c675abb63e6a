//! The unauthenticated portal surface: phone-verified access-link exchange
//! and the resulting scoped upload session.

use axum::extract::{ConnectInfo, Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use cardflow_protocol::{ApiEnvelope, WorkCardSource};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::ApiError;
use crate::routes::work_cards::{BatchUploadResponse, FailedFile, UploadedFile};
use crate::state::AppState;

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// Strips everything but digits, then rewrites a leading `972` country code
/// to a local `0` prefix, matching the original portal's comparison rule.
fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.starts_with("972") && digits.len() >= 10 {
        format!("0{}", &digits[3..])
    } else {
        digits
    }
}

fn client_ip(headers: &HeaderMap, connect_info: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(',').next().unwrap_or(value).trim().to_string())
        .unwrap_or_else(|| connect_info.ip().to_string())
}

#[derive(Debug, Deserialize)]
pub struct VerifyAccessRequest {
    pub token: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyAccessResponse {
    pub session_token: String,
    pub site_name: String,
    pub employee_name: String,
    pub month: chrono::NaiveDate,
}

pub async fn verify_access(
    State(state): State<AppState>,
    ConnectInfo(connect_info): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<VerifyAccessRequest>,
) -> Result<Json<ApiEnvelope<VerifyAccessResponse>>, ApiError> {
    if body.token.is_empty() || body.phone_number.is_empty() {
        return Err(ApiError::Input("token and phone_number are required".to_string()));
    }

    let ip = client_ip(&headers, &connect_info);
    if !state.verify_limiter.check(&ip) {
        return Err(ApiError::RateLimited);
    }

    let access_request = cardflow_db::repo::upload_access_requests::find_by_token(&state.pool, &body.token)
        .await?
        .filter(|request| request.active)
        .ok_or_else(|| ApiError::NotFound("Invalid or expired access link".to_string()))?;

    let employee = cardflow_db::repo::employees::get(&state.pool, access_request.business_id, access_request.employee_id).await?;

    let assigned_phone = employee.phone.as_deref().unwrap_or_default();
    if normalize_phone(assigned_phone) != normalize_phone(&body.phone_number) {
        return Err(ApiError::Unauthorized);
    }

    cardflow_db::repo::upload_access_requests::touch_last_accessed(&state.pool, access_request.id).await?;

    let session_token = state.portal_tokens.issue(
        access_request.id,
        access_request.business_id,
        access_request.site_id,
        access_request.employee_id,
        access_request.processing_month,
    )?;

    let site = cardflow_db::repo::sites::get(&state.pool, access_request.business_id, access_request.site_id).await?;

    Ok(Json(ApiEnvelope::ok(
        "Verification successful",
        VerifyAccessResponse {
            session_token,
            site_name: site.name,
            employee_name: employee.full_name,
            month: access_request.processing_month,
        },
    )))
}

pub async fn upload(
    State(state): State<AppState>,
    portal: crate::auth::PortalPrincipal,
    mut multipart: Multipart,
) -> Result<Json<ApiEnvelope<BatchUploadResponse>>, ApiError> {
    let access_request = cardflow_db::repo::upload_access_requests::get(&state.pool, portal.request_id).await?;
    if !access_request.active {
        return Err(ApiError::Forbidden("Access link revoked".to_string()));
    }
    if access_request.expires_at.is_some_and(|expires_at| expires_at <= chrono::Utc::now()) {
        return Err(ApiError::Forbidden("Access link expired".to_string()));
    }

    let mut uploaded = Vec::new();
    let mut failed = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::Input(e.to_string()))? {
        if field.name() != Some("files") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
        let bytes = field.bytes().await.map_err(|e| ApiError::Input(e.to_string()))?.to_vec();

        if !ALLOWED_MIME_TYPES.contains(&content_type.as_str()) {
            failed.push(FailedFile {
                filename,
                error: "Invalid file type".to_string(),
            });
            continue;
        }

        let mut tx = state.pool.begin().await.map_err(cardflow_db::DbError::from)?;
        let card_id = cardflow_db::repo::work_cards::create(
            &mut *tx,
            portal.business_id,
            Some(portal.site_id),
            None,
            portal.processing_month,
            WorkCardSource::ResponsibleEmployee,
            &filename,
            &content_type,
            bytes.len() as i64,
        )
        .await;

        match card_id {
            Ok(card_id) => {
                let result = async {
                    cardflow_db::repo::work_card_files::create(&mut *tx, card_id, &bytes, &content_type, &filename).await?;
                    cardflow_db::repo::extraction_jobs::create(&mut *tx, card_id, cardflow_protocol::ExtractionMode::Full).await?;
                    tx.commit().await.map_err(cardflow_db::DbError::from)?;
                    Ok::<_, cardflow_db::DbError>(())
                }
                .await;
                match result {
                    Ok(()) => uploaded.push(UploadedFile { id: card_id, filename }),
                    Err(err) => failed.push(FailedFile { filename, error: err.to_string() }),
                }
            }
            Err(err) => failed.push(FailedFile { filename, error: err.to_string() }),
        }
    }

    state.dashboard_cache.invalidate_business(portal.business_id).await;
    let total = uploaded.len() + failed.len();
    let message = format!("Uploaded {} files", uploaded.len());
    Ok(Json(ApiEnvelope::ok(message, BatchUploadResponse { uploaded, failed, total })))
}
