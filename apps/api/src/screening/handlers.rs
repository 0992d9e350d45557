//! Axum route handler for bulk résumé screening.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::errors::AppError;
use crate::routes::upload::read_form;
use crate::screening::screener::{Document, ScreeningOutcome};
use crate::state::AppState;

/// POST /api/v1/screenings
///
/// Multipart: a required `job_description` text field plus one or more files. Every uploaded
/// file is screened, whatever its field name. Per-document failures are reported in
/// `failures` and never fail the request.
pub async fn handle_screen(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScreeningOutcome>, AppError> {
    let screener = state.screener()?;

    let form = read_form(multipart).await?;
    let job_description = form.text("job_description");
    if job_description.is_empty() {
        return Err(AppError::Validation(
            "a 'job_description' is required for screening".to_string(),
        ));
    }
    let documents: Vec<Document> = form.files.into_iter().map(|(_, d)| d).collect();
    if documents.is_empty() {
        return Err(AppError::Validation(
            "at least one resume file is required".to_string(),
        ));
    }

    let outcome = screener.screen(documents, &job_description).await;
    Ok(Json(outcome))
}
