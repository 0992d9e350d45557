//! Report Generator: renders a finished interview into one evaluation prompt.
//!
//! The returned report is opaque prose: its five sections are requested, never validated.

use tracing::info;

use crate::interview::prompts::REPORT_SYSTEM_TEMPLATE;
use crate::interview::session::Message;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{LlmError, LlmGateway};

/// Suggested download name for a generated report.
pub const REPORT_FILE_NAME: &str = "candidate_report.md";

/// Renders `history` as `"<Role>: <content>\n"` lines in order.
pub fn render_transcript(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}\n", m.role.label(), m.content))
        .collect()
}

pub async fn render(
    resume_text: &str,
    job_description: &str,
    history: &[Message],
    llm: &dyn LlmGateway,
) -> Result<String, LlmError> {
    let transcript = render_transcript(history);
    let system = fill_template(
        REPORT_SYSTEM_TEMPLATE,
        &[
            ("resume_text", resume_text),
            ("job_description", job_description),
            ("transcript", &transcript),
        ],
    );

    let report = llm.generate(&system, &[]).await?;
    info!(
        turns = history.len(),
        report_chars = report.len(),
        "Interview report generated"
    );
    Ok(report)
}
