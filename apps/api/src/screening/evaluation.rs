//! Structured evaluation records returned by the screening prompt.
//!
//! Parsing is lenient about the descriptive fields and strict about `score`: a record
//! without a usable score cannot be ranked, so it is replaced by the fallback record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::llm_client::strip_json_fences;

pub const FALLBACK_NAME: &str = "Unknown";
/// Summary of the fallback record; callers match on it to spot degraded results.
pub const FALLBACK_SUMMARY: &str = "Error parsing AI response.";
pub const MAX_SCORE: u8 = 100;

/// One ranked candidate. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub name: String,
    pub score: u8,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub source_file: String,
}

impl CandidateEvaluation {
    /// Substitute for a reply that could not be parsed.
    pub fn fallback(source_file: impl Into<String>) -> Self {
        Self {
            name: FALLBACK_NAME.to_string(),
            score: 0,
            summary: FALLBACK_SUMMARY.to_string(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            source_file: source_file.into(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.summary == FALLBACK_SUMMARY
    }
}

#[derive(Debug, Error)]
pub enum EvaluationParseError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("response has no score")]
    MissingScore,

    #[error("score is not a number: {0}")]
    InvalidScore(String),
}

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    score: Option<Value>,
    #[serde(default)]
    summary: Option<Value>,
    #[serde(default)]
    strengths: Option<Value>,
    #[serde(default)]
    weaknesses: Option<Value>,
}

/// Parses a raw model reply, tolerating markdown fences around the JSON.
pub fn parse_evaluation(
    raw: &str,
    source_file: &str,
) -> Result<CandidateEvaluation, EvaluationParseError> {
    let cleaned = strip_json_fences(raw);
    let value: Value = serde_json::from_str(&cleaned)?;
    if !value.is_object() {
        return Err(EvaluationParseError::NotAnObject);
    }
    let raw: RawEvaluation = serde_json::from_value(value)?;

    let score = match raw.score {
        None | Some(Value::Null) => return Err(EvaluationParseError::MissingScore),
        Some(Value::Number(n)) => normalize_score(&n)?,
        Some(other) => return Err(EvaluationParseError::InvalidScore(other.to_string())),
    };

    Ok(CandidateEvaluation {
        name: text_field(raw.name).unwrap_or_else(|| FALLBACK_NAME.to_string()),
        score,
        summary: text_field(raw.summary).unwrap_or_default(),
        strengths: list_field(raw.strengths),
        weaknesses: list_field(raw.weaknesses),
        source_file: source_file.to_string(),
    })
}

/// Parses `raw`, substituting the fallback record on any failure.
/// Returns the parse error alongside so callers can log it.
pub fn parse_or_fallback(
    raw: &str,
    source_file: &str,
) -> (CandidateEvaluation, Option<EvaluationParseError>) {
    match parse_evaluation(raw, source_file) {
        Ok(evaluation) => (evaluation, None),
        Err(e) => (CandidateEvaluation::fallback(source_file), Some(e)),
    }
}

/// Rounds fractional scores and clamps into `0..=100`.
fn normalize_score(n: &serde_json::Number) -> Result<u8, EvaluationParseError> {
    if let Some(u) = n.as_u64() {
        return Ok(u.min(MAX_SCORE as u64) as u8);
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => Ok(f.round().clamp(0.0, MAX_SCORE as f64) as u8),
        _ => Err(EvaluationParseError::InvalidScore(n.to_string())),
    }
}

fn text_field(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Accepts an array of strings; a single string becomes a one-element list.
fn list_field(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_record_parses_without_loss() {
        let original = CandidateEvaluation {
            name: "Alice Smith".to_string(),
            score: 87,
            summary: "Strong Python backend engineer. Five years of Django.".to_string(),
            strengths: vec!["Django".to_string(), "SQL".to_string()],
            weaknesses: vec!["No Kubernetes".to_string()],
            source_file: "resume_alice.pdf".to_string(),
        };
        let encoded = serde_json::json!({
            "name": original.name,
            "score": original.score,
            "summary": original.summary,
            "strengths": original.strengths,
            "weaknesses": original.weaknesses,
        })
        .to_string();

        let parsed = parse_evaluation(&encoded, "resume_alice.pdf").unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_fenced_reply_is_accepted() {
        let raw = "```json\n{\"name\": \"Bob\", \"score\": 64, \"summary\": \"ok\", \
                   \"strengths\": [], \"weaknesses\": [\"CSS\"]}\n```";
        let parsed = parse_evaluation(raw, "bob.pdf").unwrap();
        assert_eq!(parsed.name, "Bob");
        assert_eq!(parsed.score, 64);
        assert_eq!(parsed.weaknesses, vec!["CSS".to_string()]);
    }

    #[test]
    fn test_fence_tag_case_and_language_are_ignored() {
        for raw in [
            "```JSON\n{\"name\":\"Ann\",\"score\":80}\n```",
            "```javascript\n{\"name\":\"Ann\",\"score\":80}\n```",
        ] {
            let (evaluation, error) = parse_or_fallback(raw, "ann.pdf");
            assert!(error.is_none(), "unexpected parse error for {raw:?}");
            assert_eq!(evaluation.name, "Ann");
            assert_eq!(evaluation.score, 80);
            assert_eq!(evaluation.source_file, "ann.pdf");
        }
    }

    #[test]
    fn test_malformed_reply_yields_exact_fallback() {
        let (evaluation, error) = parse_or_fallback("Sure! The candidate is great.", "eve.pdf");
        assert!(matches!(error, Some(EvaluationParseError::Json(_))));
        assert_eq!(
            evaluation,
            CandidateEvaluation {
                name: "Unknown".to_string(),
                score: 0,
                summary: "Error parsing AI response.".to_string(),
                strengths: vec![],
                weaknesses: vec![],
                source_file: "eve.pdf".to_string(),
            }
        );
        assert!(evaluation.is_fallback());
    }

    #[test]
    fn test_missing_score_is_a_parse_failure() {
        let err = parse_evaluation(r#"{"name": "Dana"}"#, "d.pdf").unwrap_err();
        assert!(matches!(err, EvaluationParseError::MissingScore));

        let err = parse_evaluation(r#"{"name": "Dana", "score": null}"#, "d.pdf").unwrap_err();
        assert!(matches!(err, EvaluationParseError::MissingScore));
    }

    #[test]
    fn test_non_numeric_score_is_a_parse_failure() {
        let err = parse_evaluation(r#"{"score": "high"}"#, "d.pdf").unwrap_err();
        assert!(matches!(err, EvaluationParseError::InvalidScore(_)));

        let err = parse_evaluation(r#"{"score": "85"}"#, "d.pdf").unwrap_err();
        assert!(matches!(err, EvaluationParseError::InvalidScore(_)));
    }

    #[test]
    fn test_non_object_is_a_parse_failure() {
        let err = parse_evaluation("[1, 2, 3]", "x.pdf").unwrap_err();
        assert!(matches!(err, EvaluationParseError::NotAnObject));
    }

    #[test]
    fn test_optional_fields_default_and_extras_are_ignored() {
        let parsed =
            parse_evaluation(r#"{"score": 55, "years": 7, "seniority": "mid"}"#, "c.pdf").unwrap();
        assert_eq!(parsed.name, "Unknown");
        assert_eq!(parsed.summary, "");
        assert!(parsed.strengths.is_empty());
        assert!(parsed.weaknesses.is_empty());
        assert_eq!(parsed.score, 55);
        assert!(!parsed.is_fallback());
    }

    #[test]
    fn test_score_is_rounded_and_clamped() {
        assert_eq!(parse_evaluation(r#"{"score": 72.6}"#, "a").unwrap().score, 73);
        assert_eq!(parse_evaluation(r#"{"score": 250}"#, "a").unwrap().score, 100);
        assert_eq!(parse_evaluation(r#"{"score": -5}"#, "a").unwrap().score, 0);
    }

    #[test]
    fn test_single_string_strengths_become_a_list() {
        let parsed =
            parse_evaluation(r#"{"score": 40, "strengths": "Agile"}"#, "pm.pdf").unwrap();
        assert_eq!(parsed.strengths, vec!["Agile".to_string()]);
    }
}
