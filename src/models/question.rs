// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::{scoring::Gradable, utils::html::clean_html};

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Question set this belongs to. Attempts draw from a single set.
    pub set_number: i64,

    /// Free-form subject label, e.g. "Algebra".
    pub topic: String,

    /// The text content of the question.
    pub content: String,

    /// List of options (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// The correct option, verbatim.
    pub answer: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Gradable for Question {
    fn id(&self) -> i64 {
        self.id
    }

    fn topic(&self) -> &str {
        &self.topic
    }

    fn correct_answer(&self) -> &str {
        &self.answer
    }
}

/// DTO for sending question to client (excludes answer).
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub topic: String,
    pub content: String,
    pub options: Vec<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            topic: q.topic,
            content: q.content,
            options: q.options.0,
        }
    }
}

/// One question as produced by the question generator or typed in by an admin.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionDraft {
    #[validate(length(min = 1, max = 100))]
    pub topic: String,
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
}

impl QuestionDraft {
    /// Runs field validation, then checks the answer is one of the options.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;

        if !self.options.iter().any(|opt| opt == &self.answer) {
            return Err(format!(
                "answer '{}' is not one of the options of question '{}'",
                self.answer, self.content
            ));
        }
        Ok(())
    }

    /// Strips unsafe HTML from every text field.
    /// Answer and options go through the same cleaner so they still match.
    pub fn sanitized(self) -> Self {
        Self {
            topic: clean_html(&self.topic),
            content: clean_html(&self.content),
            options: self.options.iter().map(|opt| clean_html(opt)).collect(),
            answer: clean_html(&self.answer),
        }
    }
}

/// DTO for creating a single question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(range(min = 1))]
    pub set_number: i64,
    #[serde(flatten)]
    pub question: QuestionDraft,
}

/// DTO for replacing a whole question set.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportQuestionSetRequest {
    #[validate(length(min = 1, max = 500))]
    pub questions: Vec<QuestionDraft>,
}

/// Row of the question-set overview.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct QuestionSetSummary {
    pub set_number: i64,
    pub question_count: i64,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("at_least_two_options"));
    }
    for (i, opt) in options.iter().enumerate() {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("option_length"));
        }
        if options[..i].contains(opt) {
            return Err(validator::ValidationError::new("duplicate_option"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(options: &[&str], answer: &str) -> QuestionDraft {
        QuestionDraft {
            topic: "Algebra".to_string(),
            content: "2x = 4, x = ?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn test_check_accepts_valid_draft() {
        assert!(draft(&["1", "2", "3"], "2").check().is_ok());
    }

    #[test]
    fn test_check_rejects_answer_outside_options() {
        let err = draft(&["1", "2", "3"], "4").check().unwrap_err();
        assert!(err.contains("not one of the options"));
    }

    #[test]
    fn test_check_rejects_bad_options() {
        assert!(draft(&["2"], "2").check().is_err());
        assert!(draft(&["2", "2"], "2").check().is_err());
        assert!(draft(&["2", ""], "2").check().is_err());
    }

    #[test]
    fn test_sanitized_keeps_answer_matching() {
        let d = draft(&["x < y", "<script>alert(1)</script>y"], "x < y").sanitized();

        assert!(!d.options[1].contains("script"));
        assert!(d.options.contains(&d.answer));
    }
}
