// Interactive mode: a bounded question-and-answer session followed by an evaluation report.
// All LLM calls go through the `LlmGateway` trait.

pub mod handlers;
pub mod prompts;
pub mod questions;
pub mod report;
pub mod session;
pub mod store;
