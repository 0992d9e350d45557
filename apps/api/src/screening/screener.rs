//! Batch Screener: scores a set of résumés against one job description and ranks them.
//!
//! Flow per document: extract text → single-shot evaluation prompt → strip fences →
//! parse (or fallback record) → tag with the source file.
//!
//! Documents are independent. They run with bounded concurrency and complete in any order;
//! each result carries its input index so ties rank in upload order.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::extract::{extract_blocking, TextExtractor};
use crate::llm_client::prompts::{fill_template, JSON_ONLY_INSTRUCTION};
use crate::llm_client::LlmGateway;
use crate::screening::evaluation::{parse_or_fallback, CandidateEvaluation};
use crate::screening::prompts::EVALUATION_SYSTEM_TEMPLATE;

/// An uploaded résumé.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub content: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Extraction,
    Generation,
}

/// A document that produced no evaluation. Does not stop the batch.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    pub file_name: String,
    pub stage: FailureStage,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScreeningOutcome {
    /// Score descending; equal scores keep input order.
    pub ranked: Vec<CandidateEvaluation>,
    /// In input order.
    pub failures: Vec<DocumentFailure>,
}

pub struct BatchScreener {
    extractor: Arc<dyn TextExtractor>,
    llm: Arc<dyn LlmGateway>,
    concurrency: usize,
}

impl BatchScreener {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn LlmGateway>,
        concurrency: usize,
    ) -> Self {
        Self {
            extractor,
            llm,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn screen(&self, documents: Vec<Document>, job_description: &str) -> ScreeningOutcome {
        let total = documents.len();
        info!(total, concurrency = self.concurrency, "Screening batch started");

        let results: Vec<(usize, Result<CandidateEvaluation, DocumentFailure>)> =
            stream::iter(documents.into_iter().enumerate())
                .map(|(index, document)| async move {
                    let result = self.screen_one(document, job_description).await;
                    (index, result)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut evaluations = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (index, result) in results {
            match result {
                Ok(evaluation) => evaluations.push((index, evaluation)),
                Err(failure) => failures.push((index, failure)),
            }
        }
        failures.sort_by_key(|(index, _)| *index);

        let outcome = ScreeningOutcome {
            ranked: rank(evaluations),
            failures: failures.into_iter().map(|(_, f)| f).collect(),
        };
        info!(
            total,
            evaluated = outcome.ranked.len(),
            failed = outcome.failures.len(),
            degraded = outcome.ranked.iter().filter(|e| e.is_fallback()).count(),
            "Screening batch finished"
        );
        outcome
    }

    async fn screen_one(
        &self,
        document: Document,
        job_description: &str,
    ) -> Result<CandidateEvaluation, DocumentFailure> {
        let Document { file_name, content } = document;

        let resume_text = extract_blocking(self.extractor.clone(), file_name.clone(), content)
            .await
            .map_err(|e| {
                warn!(file_name = %file_name, "Skipping document: {e}");
                DocumentFailure {
                    file_name: file_name.clone(),
                    stage: FailureStage::Extraction,
                    message: e.to_string(),
                }
            })?;

        let system = fill_template(
            EVALUATION_SYSTEM_TEMPLATE,
            &[
                ("resume_text", &resume_text),
                ("job_description", job_description),
                ("json_only", JSON_ONLY_INSTRUCTION),
            ],
        );

        let raw = self.llm.generate(&system, &[]).await.map_err(|e| {
            warn!(file_name = %file_name, "Evaluation call failed: {e}");
            DocumentFailure {
                file_name: file_name.clone(),
                stage: FailureStage::Generation,
                message: e.to_string(),
            }
        })?;

        let (evaluation, parse_error) = parse_or_fallback(&raw, &file_name);
        if let Some(e) = parse_error {
            warn!(file_name = %file_name, "Using fallback evaluation: {e}");
        }
        info!(file_name = %file_name, score = evaluation.score, "Document screened");
        Ok(evaluation)
    }
}

/// Orders evaluations by score descending, breaking ties by input index.
pub fn rank(mut indexed: Vec<(usize, CandidateEvaluation)>) -> Vec<CandidateEvaluation> {
    indexed.sort_by(|(index_a, a), (index_b, b)| {
        b.score.cmp(&a.score).then(index_a.cmp(index_b))
    });
    indexed.into_iter().map(|(_, evaluation)| evaluation).collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::extract::testing::FakeExtractor;
    use crate::llm_client::testing::ScriptedGateway;
    use crate::llm_client::{ChatMessage, LlmError};

    fn evaluation(name: &str, score: u8) -> CandidateEvaluation {
        CandidateEvaluation {
            name: name.to_string(),
            score,
            summary: String::new(),
            strengths: vec![],
            weaknesses: vec![],
            source_file: format!("{name}.pdf"),
        }
    }

    fn document(name: &str, text: &str) -> Document {
        Document {
            file_name: name.to_string(),
            content: Bytes::from(text.to_string()),
        }
    }

    fn reply(name: &str, score: u8) -> Result<String, String> {
        Ok(serde_json::json!({
            "name": name,
            "score": score,
            "summary": format!("{name} summary"),
            "strengths": ["Rust"],
            "weaknesses": [],
        })
        .to_string())
    }

    /// Scores each résumé by the `SCORE=<n>` marker embedded in its text.
    struct MarkerGateway;

    #[async_trait]
    impl LlmGateway for MarkerGateway {
        async fn generate(&self, system: &str, _: &[ChatMessage]) -> Result<String, LlmError> {
            let marker = system
                .split_whitespace()
                .find_map(|w| w.strip_prefix("SCORE="))
                .ok_or(LlmError::EmptyContent)?;
            let score: u8 = marker.parse().map_err(|_| LlmError::EmptyContent)?;
            tokio::task::yield_now().await;
            Ok(format!(r#"{{"name": "n{score}", "score": {score}}}"#))
        }
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let ranked = rank(vec![
            (0, evaluation("a", 70)),
            (1, evaluation("b", 95)),
            (2, evaluation("c", 95)),
            (3, evaluation("d", 40)),
        ]);
        let names: Vec<&str> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_rank_uses_index_not_arrival_order() {
        let ranked = rank(vec![
            (2, evaluation("late", 95)),
            (0, evaluation("first", 95)),
            (1, evaluation("low", 10)),
        ]);
        let names: Vec<&str> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["first", "late", "low"]);
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_only_that_document() {
        let llm = Arc::new(ScriptedGateway::new(vec![
            reply("Alice", 80),
            reply("Charlie", 90),
        ]));
        let screener = BatchScreener::new(
            Arc::new(FakeExtractor::failing_on(&["bob.pdf"])),
            llm.clone(),
            1,
        );

        let outcome = screener
            .screen(
                vec![
                    document("alice.pdf", "Alice"),
                    document("bob.pdf", "Bob"),
                    document("charlie.pdf", "Charlie"),
                ],
                "Rust engineer",
            )
            .await;

        assert_eq!(outcome.ranked.len(), 2);
        assert_eq!(outcome.ranked[0].name, "Charlie");
        assert_eq!(outcome.ranked[0].source_file, "charlie.pdf");
        assert_eq!(outcome.ranked[1].name, "Alice");
        assert_eq!(outcome.ranked[1].source_file, "alice.pdf");

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].file_name, "bob.pdf");
        assert_eq!(outcome.failures[0].stage, FailureStage::Extraction);
        assert_eq!(llm.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_does_not_abort_batch() {
        let llm = Arc::new(ScriptedGateway::new(vec![
            Err("timeout".into()),
            reply("Eve", 30),
        ]));
        let screener = BatchScreener::new(Arc::new(FakeExtractor::new()), llm, 1);

        let outcome = screener
            .screen(
                vec![document("dave.pdf", "Dave"), document("eve.pdf", "Eve")],
                "PM",
            )
            .await;

        assert_eq!(outcome.ranked.len(), 1);
        assert_eq!(outcome.ranked[0].source_file, "eve.pdf");
        assert_eq!(outcome.failures[0].file_name, "dave.pdf");
        assert_eq!(outcome.failures[0].stage, FailureStage::Generation);
    }

    #[tokio::test]
    async fn test_malformed_reply_becomes_tagged_fallback() {
        let llm = Arc::new(ScriptedGateway::new(vec![Ok(
            "I think this candidate is a 7/10.".into()
        )]));
        let screener = BatchScreener::new(Arc::new(FakeExtractor::new()), llm, 1);

        let outcome = screener
            .screen(vec![document("frank.pdf", "Frank")], "Any")
            .await;

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.ranked, vec![CandidateEvaluation::fallback("frank.pdf")]);
    }

    #[tokio::test]
    async fn test_prompt_carries_resume_and_job_description() {
        let llm = Arc::new(ScriptedGateway::new(vec![reply("Gina", 50)]));
        let screener = BatchScreener::new(Arc::new(FakeExtractor::new()), llm.clone(), 1);

        screener
            .screen(vec![document("gina.txt", "Gina, Kotlin")], "Android developer")
            .await;

        let call = &llm.calls()[0];
        assert!(call.system.contains("Gina, Kotlin"));
        assert!(call.system.contains("Android developer"));
        assert!(call.system.contains("valid JSON"));
        assert!(call.history.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_screening_keeps_tie_order() {
        let screener =
            BatchScreener::new(Arc::new(FakeExtractor::new()), Arc::new(MarkerGateway), 4);

        let outcome = screener
            .screen(
                vec![
                    document("one.pdf", "SCORE=70"),
                    document("two.pdf", "SCORE=95"),
                    document("three.pdf", "SCORE=95"),
                    document("four.pdf", "SCORE=40"),
                ],
                "Role",
            )
            .await;

        let files: Vec<&str> = outcome
            .ranked
            .iter()
            .map(|e| e.source_file.as_str())
            .collect();
        assert_eq!(files, vec!["two.pdf", "three.pdf", "one.pdf", "four.pdf"]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let screener = BatchScreener::new(
            Arc::new(FakeExtractor::new()),
            Arc::new(ScriptedGateway::new(vec![])),
            2,
        );
        let outcome = screener.screen(Vec::new(), "Role").await;
        assert!(outcome.ranked.is_empty());
        assert!(outcome.failures.is_empty());
    }
}
