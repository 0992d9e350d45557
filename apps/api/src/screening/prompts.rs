// LLM prompt templates for bulk résumé screening.

/// Single-shot evaluation of one résumé against a job description.
/// Placeholders: `{resume_text}`, `{job_description}`, `{json_only}`.
pub const EVALUATION_SYSTEM_TEMPLATE: &str = r#"You are an expert Technical Recruiter.
Evaluate the candidate's resume against the Job Description.

Resume:
{resume_text}

Job Description:
{job_description}

Return a JSON object with the following fields:
- name: Candidate's name (extract from resume)
- score: Integer (0-100) representing fit
- summary: 2-sentence summary of the candidate
- strengths: List of strings
- weaknesses: List of strings

{json_only}"#;
