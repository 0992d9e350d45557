//! Interview Session: the per-candidate turn-taking state machine.
//!
//! ```text
//! Empty --start--> Active --submit_answer--> Active
//!                    |                          |
//!                    +---- phrase / limit ------+--> Completed --reset--> Empty
//! ```
//!
//! `turn_limit` counts interviewer messages, the opening introduction included, so a session
//! that runs to the limit holds `turn_limit` interviewer and `turn_limit - 1` candidate
//! messages. While `Active`, the interviewer count is always below the limit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::interview::{questions, report};
use crate::llm_client::{ChatMessage, LlmError, LlmGateway};

/// Case-insensitive phrase that lets the candidate stop the interview early.
pub const TERMINATION_PHRASE: &str = "end interview";

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Interviewer,
    Candidate,
}

impl Role {
    /// Transcript label.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Interviewer => "Interviewer",
            Role::Candidate => "Candidate",
        }
    }
}

/// One transcript entry. Never modified after it is appended.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// The interviewer is the model's own voice; the candidate speaks as the user.
    pub fn to_chat(&self) -> ChatMessage {
        match self.role {
            Role::Interviewer => ChatMessage::assistant(self.content.clone()),
            Role::Candidate => ChatMessage::user(self.content.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Empty,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    CandidateRequested,
    TurnLimitReached,
}

/// What happened after a candidate answer was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    NextQuestion {
        question: String,
    },
    /// `closing_message` is the last interviewer message when the limit was reached by asking it.
    Completed {
        reason: CompletionReason,
        closing_message: Option<String>,
    },
}

#[derive(Debug)]
pub struct InterviewSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    resume_text: String,
    job_description: String,
    history: Vec<Message>,
    status: SessionStatus,
    completion_reason: Option<CompletionReason>,
    turn_limit: usize,
}

impl InterviewSession {
    /// Creates an `Empty` session. A `turn_limit` of zero is raised to one.
    pub fn new(turn_limit: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            resume_text: String::new(),
            job_description: String::new(),
            history: Vec::new(),
            status: SessionStatus::Empty,
            completion_reason: None,
            turn_limit: turn_limit.max(1),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn resume_text(&self) -> &str {
        &self.resume_text
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn turn_limit(&self) -> usize {
        self.turn_limit
    }

    pub fn completion_reason(&self) -> Option<CompletionReason> {
        self.completion_reason
    }

    pub fn interviewer_turns(&self) -> usize {
        self.history
            .iter()
            .filter(|m| m.role == Role::Interviewer)
            .count()
    }

    /// True when the last message is an answer still waiting for the next question,
    /// which only happens after a failed generation.
    pub fn awaiting_question(&self) -> bool {
        self.is_active()
            && self
                .history
                .last()
                .is_some_and(|m| m.role == Role::Candidate)
    }

    /// Loads the résumé and job description and asks the opening question.
    ///
    /// Nothing is stored if generation fails; the session stays `Empty`.
    pub async fn start(
        &mut self,
        resume_text: String,
        job_description: String,
        llm: &dyn LlmGateway,
    ) -> Result<String, InterviewError> {
        match self.status {
            SessionStatus::Empty => {}
            SessionStatus::Active => {
                return Err(InterviewError::Precondition(
                    "interview is already in progress".to_string(),
                ))
            }
            SessionStatus::Completed => {
                return Err(InterviewError::Precondition(
                    "interview has completed; reset it before starting again".to_string(),
                ))
            }
        }
        if resume_text.trim().is_empty() {
            return Err(InterviewError::Precondition(
                "resume text is empty".to_string(),
            ));
        }

        let opening =
            questions::generate_question(&resume_text, &job_description, &[], llm).await?;

        self.resume_text = resume_text;
        self.job_description = job_description;
        self.history.push(Message::new(Role::Interviewer, opening.clone()));
        self.status = SessionStatus::Active;
        self.touch();
        info!(session_id = %self.id, turn_limit = self.turn_limit, "Interview started");

        // A limit of one means the introduction is the whole interview.
        if self.interviewer_turns() >= self.turn_limit {
            self.complete(CompletionReason::TurnLimitReached);
        }
        Ok(opening)
    }

    /// Records a candidate answer, then ends the interview or asks the next question.
    ///
    /// On `InterviewError::Generation` the answer stays in the history, no interviewer message is
    /// added and the session remains `Active`; [`Self::retry_question`] resumes it.
    pub async fn submit_answer(
        &mut self,
        answer: String,
        llm: &dyn LlmGateway,
    ) -> Result<TurnOutcome, InterviewError> {
        self.ensure_active()?;

        let wants_to_stop = answer.to_lowercase().contains(TERMINATION_PHRASE);
        self.history.push(Message::new(Role::Candidate, answer));
        self.touch();

        if wants_to_stop {
            self.complete(CompletionReason::CandidateRequested);
            return Ok(TurnOutcome::Completed {
                reason: CompletionReason::CandidateRequested,
                closing_message: None,
            });
        }

        // Defensive: an Active session is always under the limit, the check after
        // asking in `ask_next` is the one that ends interviews in practice.
        if self.interviewer_turns() >= self.turn_limit {
            warn!(session_id = %self.id, "Active session found at its turn limit");
            self.complete(CompletionReason::TurnLimitReached);
            return Ok(TurnOutcome::Completed {
                reason: CompletionReason::TurnLimitReached,
                closing_message: None,
            });
        }

        self.ask_next(llm).await
    }

    /// Regenerates the question for an answer whose follow-up failed to generate.
    pub async fn retry_question(
        &mut self,
        llm: &dyn LlmGateway,
    ) -> Result<TurnOutcome, InterviewError> {
        self.ensure_active()?;
        if !self.awaiting_question() {
            return Err(InterviewError::Precondition(
                "no answer is waiting for a question".to_string(),
            ));
        }
        self.ask_next(llm).await
    }

    /// Produces the evaluation report. Leaves the session untouched and may be repeated.
    pub async fn generate_report(&self, llm: &dyn LlmGateway) -> Result<String, InterviewError> {
        if self.status != SessionStatus::Completed {
            return Err(InterviewError::Precondition(
                "report is only available once the interview has completed".to_string(),
            ));
        }
        if self.history.is_empty() {
            return Err(InterviewError::Precondition(
                "interview has no transcript".to_string(),
            ));
        }

        let report =
            report::render(&self.resume_text, &self.job_description, &self.history, llm).await?;
        Ok(report)
    }

    /// Discards the transcript and résumé and returns to `Empty`. Always succeeds.
    pub fn reset(&mut self) {
        self.history.clear();
        self.resume_text.clear();
        self.job_description.clear();
        self.status = SessionStatus::Empty;
        self.completion_reason = None;
        self.touch();
        info!(session_id = %self.id, "Interview reset");
    }

    async fn ask_next(&mut self, llm: &dyn LlmGateway) -> Result<TurnOutcome, InterviewError> {
        let question = questions::generate_question(
            &self.resume_text,
            &self.job_description,
            &self.history,
            llm,
        )
        .await
        .map_err(|e| {
            warn!(session_id = %self.id, "Question generation failed: {e}");
            e
        })?;

        self.history
            .push(Message::new(Role::Interviewer, question.clone()));
        self.touch();

        if self.interviewer_turns() >= self.turn_limit {
            self.complete(CompletionReason::TurnLimitReached);
            return Ok(TurnOutcome::Completed {
                reason: CompletionReason::TurnLimitReached,
                closing_message: Some(question),
            });
        }

        Ok(TurnOutcome::NextQuestion { question })
    }

    fn ensure_active(&self) -> Result<(), InterviewError> {
        match self.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::Empty => Err(InterviewError::Precondition(
                "interview has not been started".to_string(),
            )),
            SessionStatus::Completed => Err(InterviewError::Precondition(
                "interview has already completed".to_string(),
            )),
        }
    }

    fn complete(&mut self, reason: CompletionReason) {
        self.status = SessionStatus::Completed;
        self.completion_reason = Some(reason);
        self.touch();
        info!(
            session_id = %self.id,
            ?reason,
            messages = self.history.len(),
            "Interview completed"
        );
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
