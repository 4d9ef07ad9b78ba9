//! Normalization boundary for loosely-typed input.
//!
//! Scores arrive as JSON numbers, numeric strings, blanks or junk, both in the
//! static document and in edit requests. Everything is normalized here once;
//! the store and the aggregator only ever see finite, non-negative `f64`s.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{GradebookError, Result};
use crate::model::{Assessment, Subject, SubjectId};

/// Coerce a raw score. Blank, non-numeric and non-finite input become 0;
/// negative values are clamped to 0.
pub fn coerce_score(raw: &Value) -> f64 {
    let v = match raw {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                0.0
            } else {
                t.parse::<f64>().unwrap_or(0.0)
            }
        }
        _ => 0.0,
    };
    if !v.is_finite() || v < 0.0 {
        return 0.0;
    }
    v
}

pub fn deserialize_score<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(coerce_score(&raw))
}

fn text_field(params: &Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Fields for a new student, validated before the store is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDraft {
    pub name: String,
    pub course: String,
    pub block: String,
}

impl StudentDraft {
    pub fn from_params(params: &Value) -> Result<Self> {
        let draft = Self {
            name: text_field(params, "name").trim().to_string(),
            course: text_field(params, "course").trim().to_string(),
            block: text_field(params, "block").trim().to_string(),
        };
        draft.validate()?;
        Ok(draft)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GradebookError::validation("name", "student name is required"));
        }
        Ok(())
    }
}

/// Fields for a new subject. Scores are already coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectDraft {
    pub subject: String,
    pub code: String,
    pub scores: [f64; 4],
    pub feedback: String,
}

impl SubjectDraft {
    pub fn from_params(params: &Value) -> Result<Self> {
        let mut scores = [0.0; 4];
        for (slot, a) in scores.iter_mut().zip(Assessment::ALL) {
            *slot = params.get(a.key()).map(coerce_score).unwrap_or(0.0);
        }
        let draft = Self {
            subject: text_field(params, "subject").trim().to_string(),
            code: text_field(params, "code").trim().to_string(),
            scores,
            feedback: text_field(params, "feedback"),
        };
        draft.validate()?;
        Ok(draft)
    }

    pub fn validate(&self) -> Result<()> {
        if self.subject.trim().is_empty() {
            return Err(GradebookError::validation(
                "subject",
                "subject name and code are required",
            ));
        }
        if self.code.trim().is_empty() {
            return Err(GradebookError::validation(
                "code",
                "subject name and code are required",
            ));
        }
        Ok(())
    }

    pub fn into_subject(self) -> Subject {
        let [assignments, quizzes, projects, exams] = self.scores;
        Subject {
            id: SubjectId::new_v4(),
            subject: self.subject,
            code: self.code,
            assignments,
            quizzes,
            projects,
            exams,
            feedback: self.feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_score_handles_strings_blanks_and_junk() {
        assert_eq!(coerce_score(&json!(87.5)), 87.5);
        assert_eq!(coerce_score(&json!(" 91 ")), 91.0);
        assert_eq!(coerce_score(&json!("")), 0.0);
        assert_eq!(coerce_score(&json!("abc")), 0.0);
        assert_eq!(coerce_score(&json!(null)), 0.0);
        assert_eq!(coerce_score(&json!(true)), 0.0);
        assert_eq!(coerce_score(&json!("inf")), 0.0);
    }

    #[test]
    fn coerce_score_clamps_negative_values() {
        assert_eq!(coerce_score(&json!(-5)), 0.0);
        assert_eq!(coerce_score(&json!("-12.5")), 0.0);
    }

    #[test]
    fn subject_draft_requires_name_and_code() {
        let err = SubjectDraft::from_params(&json!({ "subject": "", "code": "X" }))
            .expect_err("blank subject");
        assert_eq!(err.code(), "validation_failed");

        let err = SubjectDraft::from_params(&json!({ "subject": "Physics", "code": "  " }))
            .expect_err("blank code");
        assert!(matches!(err, GradebookError::Validation { field: "code", .. }));
    }

    #[test]
    fn subject_draft_coerces_scores() {
        let draft = SubjectDraft::from_params(&json!({
            "subject": "Physics",
            "code": "PHY101",
            "assignments": "80",
            "quizzes": "n/a",
            "projects": 75,
            "feedback": "Keep going"
        }))
        .expect("valid draft");
        assert_eq!(draft.scores, [80.0, 0.0, 75.0, 0.0]);
        assert_eq!(draft.feedback, "Keep going");
    }

    #[test]
    fn student_draft_requires_name() {
        assert!(StudentDraft::from_params(&json!({ "name": "   ", "course": "BSIT" })).is_err());
        let d = StudentDraft::from_params(&json!({ "name": " Ana ", "course": "BSIT" }))
            .expect("valid");
        assert_eq!(d.name, "Ana");
        assert_eq!(d.block, "");
    }
}
