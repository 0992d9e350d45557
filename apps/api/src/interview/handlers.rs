//! Axum route handlers for the interactive interview mode.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::extract_blocking;
use crate::interview::report::REPORT_FILE_NAME;
use crate::interview::session::{
    CompletionReason, InterviewSession, Message, SessionStatus, TurnOutcome,
};
use crate::interview::store::SessionHandle;
use crate::routes::upload::read_form;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Client-facing snapshot of a session. The résumé text itself is not echoed back.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub status: SessionStatus,
    pub turn_limit: usize,
    pub interviewer_turns: usize,
    pub awaiting_question: bool,
    pub completion_reason: Option<CompletionReason>,
    pub job_description: String,
    pub history: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&InterviewSession> for SessionView {
    fn from(session: &InterviewSession) -> Self {
        Self {
            id: session.id,
            status: session.status(),
            turn_limit: session.turn_limit(),
            interviewer_turns: session.interviewer_turns(),
            awaiting_question: session.awaiting_question(),
            completion_reason: session.completion_reason(),
            job_description: session.job_description().to_string(),
            history: session.history().to_vec(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub question: String,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    #[serde(flatten)]
    pub outcome: TurnOutcome,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: String,
    pub file_name: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

async fn find_session(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))
}

/// POST /api/v1/interviews
///
/// Registers an empty session using the configured turn limit.
pub async fn handle_create(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let (_, handle) = state.sessions.create(state.config.turn_limit).await;
    let session = handle.lock().await;
    Ok((StatusCode::CREATED, Json(SessionView::from(&*session))))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

/// DELETE /api/v1/interviews/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Interview {id} not found")))
    }
}

/// POST /api/v1/interviews/:id/start
///
/// Multipart: a `resume` file plus an optional `job_description` text field.
/// Extracts the résumé text, then asks the opening question.
pub async fn handle_start(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<StartResponse>, AppError> {
    let llm = state.gateway()?;
    let handle = find_session(&state, id).await?;

    let form = read_form(multipart).await?;
    let resume = form
        .files_named("resume")
        .next()
        .cloned()
        .ok_or_else(|| AppError::Validation("a 'resume' file is required".to_string()))?;
    let job_description = form.text("job_description");

    let resume_text =
        extract_blocking(state.extractor.clone(), resume.file_name, resume.content).await?;

    let mut session = handle.lock().await;
    let question = session
        .start(resume_text, job_description, llm.as_ref())
        .await?;

    Ok(Json(StartResponse {
        question,
        session: SessionView::from(&*session),
    }))
}

/// POST /api/v1/interviews/:id/answers
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    if request.answer.trim().is_empty() {
        return Err(AppError::Validation("answer cannot be empty".to_string()));
    }
    let llm = state.gateway()?;
    let handle = find_session(&state, id).await?;

    let mut session = handle.lock().await;
    let outcome = session.submit_answer(request.answer, llm.as_ref()).await?;

    Ok(Json(TurnResponse {
        outcome,
        session: SessionView::from(&*session),
    }))
}

/// POST /api/v1/interviews/:id/retry
///
/// Regenerates the question after a failed follow-up generation.
pub async fn handle_retry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnResponse>, AppError> {
    let llm = state.gateway()?;
    let handle = find_session(&state, id).await?;

    let mut session = handle.lock().await;
    let outcome = session.retry_question(llm.as_ref()).await?;

    Ok(Json(TurnResponse {
        outcome,
        session: SessionView::from(&*session),
    }))
}

/// POST /api/v1/interviews/:id/report
pub async fn handle_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportResponse>, AppError> {
    let llm = state.gateway()?;
    let handle = find_session(&state, id).await?;

    let session = handle.lock().await;
    let report = session.generate_report(llm.as_ref()).await?;

    Ok(Json(ReportResponse {
        report,
        file_name: REPORT_FILE_NAME,
    }))
}

/// POST /api/v1/interviews/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;

    let mut session = handle.lock().await;
    session.reset();

    Ok(Json(SessionView::from(&*session)))
}
