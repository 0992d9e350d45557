//! Question generation shared by session start and every follow-up turn.

use tracing::debug;

use crate::interview::prompts::{NEXT_QUESTION_NUDGE, QUESTION_SYSTEM_TEMPLATE};
use crate::interview::session::Message;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{ChatMessage, LlmError, LlmGateway};

/// Asks the gateway for the next interviewer message.
///
/// The reply is returned verbatim; an empty `history` makes the model open with an introduction.
pub async fn generate_question(
    resume_text: &str,
    job_description: &str,
    history: &[Message],
    llm: &dyn LlmGateway,
) -> Result<String, LlmError> {
    let system = fill_template(
        QUESTION_SYSTEM_TEMPLATE,
        &[
            ("resume_text", resume_text),
            ("job_description", job_description),
        ],
    );

    let mut conversation: Vec<ChatMessage> = history.iter().map(Message::to_chat).collect();
    conversation.push(ChatMessage::user(NEXT_QUESTION_NUDGE));

    debug!(history_len = history.len(), "Generating interview question");
    llm.generate(&system, &conversation).await
}
