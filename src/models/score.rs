// src/models/score.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, types::Json};

use crate::{
    models::question::PublicQuestion,
    scoring::{
        AnswerSubmission, Difficulty, PerformanceTier, RemediationCatalog, ScoreResult,
        classify_total_score,
    },
};

/// Represents the 'attempts' table: the questions handed out to one user.
#[derive(Debug, Clone, FromRow)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub set_number: i64,
    /// Question IDs in presentation order.
    pub question_ids: Json<Vec<i64>>,
    pub submitted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'scores' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: i64,
    pub user_id: i64,
    pub attempt_id: i64,
    pub set_number: i64,
    pub attempt_number: i64,
    pub total_score: i64,
    pub max_score: i64,
    pub score_by_topic: Json<BTreeMap<String, u32>>,
    pub topic_totals: Json<BTreeMap<String, u32>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Score row joined with its owner, for the admin dashboard.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ScoreEntry {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub username: String,
    pub set_number: i64,
    pub attempt_number: i64,
    pub total_score: i64,
    pub max_score: i64,
    pub score_by_topic: Json<BTreeMap<String, u32>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for starting an attempt. A random set is picked when `set_number` is absent.
#[derive(Debug, Default, Deserialize)]
pub struct StartAttemptRequest {
    pub set_number: Option<i64>,
}

/// DTO returned when an attempt starts.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptResponse {
    pub attempt_id: i64,
    pub set_number: i64,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitAnswersRequest {
    /// User's answers map.
    /// Key: Question ID (keys that are not integers are dropped)
    /// Value: User's selected option (String)
    #[serde(deserialize_with = "answers_by_question_id")]
    pub answers: AnswerSubmission,
}

fn answers_by_question_id<'de, D>(deserializer: D) -> Result<AnswerSubmission, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, String>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, answer)| key.parse::<i64>().ok().map(|id| (id, answer)))
        .collect())
}

/// Per-topic line of a score report.
#[derive(Debug, Serialize, Deserialize)]
pub struct TopicReport {
    pub topic: String,
    pub score: u32,
    pub question_count: u32,
    pub percentage: f64,
    pub difficulty: Difficulty,
    pub message: String,
    /// `None` means no video is catalogued; clients show a placeholder.
    pub remediation_url: Option<String>,
}

/// Everything the results view needs for one submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score_id: i64,
    pub attempt_number: i64,
    pub set_number: i64,
    pub total_score: u32,
    pub max_score: u32,
    pub tier: PerformanceTier,
    pub tier_message: String,
    pub score_by_topic: BTreeMap<String, u32>,
    pub lowest_topic: Option<String>,
    pub topics: Vec<TopicReport>,
}

impl ScoreReport {
    pub fn build(
        score_id: i64,
        attempt_number: i64,
        set_number: i64,
        result: &ScoreResult,
        catalog: &RemediationCatalog,
    ) -> Self {
        let max_score = result.max_score();
        let tier = classify_total_score(result.total, max_score);

        let topics = result
            .classify_topics()
            .into_iter()
            .map(|(topic, classification)| TopicReport {
                topic: topic.to_string(),
                score: result.per_topic.get(topic).copied().unwrap_or(0),
                question_count: result.topic_totals.get(topic).copied().unwrap_or(0),
                percentage: classification.percentage,
                difficulty: classification.difficulty,
                message: classification.difficulty.message().to_string(),
                remediation_url: catalog
                    .lookup(topic, classification.difficulty)
                    .map(str::to_string),
            })
            .collect();

        Self {
            score_id,
            attempt_number,
            set_number,
            total_score: result.total,
            max_score,
            tier,
            tier_message: tier.message().to_string(),
            score_by_topic: result.per_topic.clone(),
            lowest_topic: result.lowest_topic().map(str::to_string),
            topics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(per_topic: &[(&str, u32, u32)]) -> ScoreResult {
        ScoreResult {
            total: per_topic.iter().map(|(_, s, _)| s).sum(),
            per_topic: per_topic
                .iter()
                .map(|(t, s, _)| (t.to_string(), *s))
                .collect(),
            topic_totals: per_topic
                .iter()
                .map(|(t, _, c)| (t.to_string(), *c))
                .collect(),
        }
    }

    #[test]
    fn test_build_report_uses_real_denominators() {
        // 3 of 4 Algebra = 75% Hard, 1 of 5 Geometry = 20% Basic
        let r = result(&[("Algebra", 3, 4), ("Geometry", 1, 5)]);
        let report = ScoreReport::build(7, 2, 1, &r, &RemediationCatalog::default());

        assert_eq!(report.total_score, 4);
        assert_eq!(report.max_score, 9);
        assert_eq!(report.tier, PerformanceTier::KeepStriving);
        assert_eq!(report.lowest_topic.as_deref(), Some("Geometry"));
        assert_eq!(report.topics.len(), 2);

        let algebra = &report.topics[0];
        assert_eq!(algebra.topic, "Algebra");
        assert_eq!(algebra.difficulty, Difficulty::Hard);
        assert_eq!(algebra.percentage, 75.0);
        assert_eq!(
            algebra.remediation_url.as_deref(),
            Some("https://example.com/algebra-hard")
        );

        let geometry = &report.topics[1];
        assert_eq!(geometry.difficulty, Difficulty::Basic);
        assert_eq!(geometry.question_count, 5);
    }

    #[test]
    fn test_build_report_uncatalogued_topic() {
        let r = result(&[("Statistics", 2, 2)]);
        let report = ScoreReport::build(1, 1, 3, &r, &RemediationCatalog::default());

        assert_eq!(report.tier, PerformanceTier::Outstanding);
        assert_eq!(report.topics[0].remediation_url, None);
    }

    #[test]
    fn test_submit_request_rejects_unknown_shape() {
        let ok: Result<SubmitAnswersRequest, _> =
            serde_json::from_str(r#"{"answers": {"1": "A", "2": "B"}}"#);
        assert_eq!(ok.unwrap().answers.get(&2).map(String::as_str), Some("B"));

        let wrapped: Result<SubmitAnswersRequest, _> =
            serde_json::from_str(r#"{"data": {"answers": {"1": "A"}}}"#);
        assert!(wrapped.is_err());
    }

    #[test]
    fn test_submit_request_drops_malformed_keys() {
        let req: SubmitAnswersRequest =
            serde_json::from_str(r#"{"answers": {"1": "A", "abc": "B", "": "C", "2.5": "D"}}"#)
                .unwrap();

        assert_eq!(req.answers.len(), 1);
        assert_eq!(req.answers.get(&1).map(String::as_str), Some("A"));

        let only_junk: SubmitAnswersRequest =
            serde_json::from_str(r#"{"answers": {"abc": "A"}}"#).unwrap();
        assert!(only_junk.answers.is_empty());
    }
}
