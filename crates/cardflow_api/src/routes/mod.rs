pub mod matrix;
pub mod public;
pub mod work_cards;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/work_cards/:id/approve", post(work_cards::approve))
        .route("/api/work_cards/:id/day-entries", put(work_cards::update_day_entries))
        .route("/api/work_cards/upload/single", post(work_cards::upload_single))
        .route("/api/work_cards/upload/batch", post(work_cards::upload_batch))
        .route("/api/sites/:id/matrix", get(matrix::get_matrix))
        .route("/api/public/verify-access", post(public::verify_access))
        .route("/api/public/upload", post(public::upload))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
