use cardflow_ids::WorkCardId;
use sqlx::PgExecutor;

use crate::error::{DbError, Result};
use crate::models::WorkCardFile;

/// Exactly one file per work card; immutable after create.
pub async fn create<'c>(
    executor: impl PgExecutor<'c>,
    work_card_id: WorkCardId,
    bytes: &[u8],
    mime: &str,
    filename: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO work_card_files (work_card_id, bytes, mime, filename, size) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(work_card_id.as_uuid())
    .bind(bytes)
    .bind(mime)
    .bind(filename)
    .bind(bytes.len() as i64)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_bytes<'c>(executor: impl PgExecutor<'c>, work_card_id: WorkCardId) -> Result<Vec<u8>> {
    let file = sqlx::query_as::<_, WorkCardFile>("SELECT * FROM work_card_files WHERE work_card_id = $1")
        .bind(work_card_id.as_uuid())
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DbError::invalid_state(format!("missing image for work card {work_card_id}")))?;
    Ok(file.bytes)
}
