// Bulk mode: score many résumés against one job description and rank them.
// All LLM calls go through the `LlmGateway` trait.

pub mod evaluation;
pub mod handlers;
pub mod prompts;
pub mod screener;
