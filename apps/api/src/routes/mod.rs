pub mod health;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::screening::handlers as screening;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Interactive interview
        .route("/api/v1/interviews", post(interview::handle_create))
        .route(
            "/api/v1/interviews/:id",
            get(interview::handle_get).delete(interview::handle_delete),
        )
        .route("/api/v1/interviews/:id/start", post(interview::handle_start))
        .route(
            "/api/v1/interviews/:id/answers",
            post(interview::handle_answer),
        )
        .route("/api/v1/interviews/:id/retry", post(interview::handle_retry))
        .route(
            "/api/v1/interviews/:id/report",
            post(interview::handle_report),
        )
        .route("/api/v1/interviews/:id/reset", post(interview::handle_reset))
        // Bulk screening
        .route("/api/v1/screenings", post(screening::handle_screen))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
