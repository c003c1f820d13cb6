// src/scoring/evaluator.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// User's answers for one attempt.
/// Key: Question ID, Value: the option text the user selected.
pub type AnswerSubmission = HashMap<i64, String>;

/// Anything that can be graded against a submission.
///
/// Implemented by the stored `Question` model, and by lightweight keys in tests.
pub trait Gradable {
    fn id(&self) -> i64;
    fn topic(&self) -> &str;
    fn correct_answer(&self) -> &str;
}

/// Outcome of grading one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    /// Number of correctly answered questions.
    pub total: u32,

    /// Topic -> number of correct answers for that topic.
    pub per_topic: BTreeMap<String, u32>,

    /// Topic -> number of questions of that topic in the attempt.
    /// Used as the denominator when classifying a topic.
    pub topic_totals: BTreeMap<String, u32>,
}

impl ScoreResult {
    /// Highest attainable total for the graded question set.
    pub fn max_score(&self) -> u32 {
        self.topic_totals.values().sum()
    }

    /// Topic with the weakest correct/asked ratio.
    /// Ties go to the alphabetically first topic.
    pub fn lowest_topic(&self) -> Option<&str> {
        let mut lowest: Option<(&str, u32, u32)> = None;

        for (topic, &score) in &self.per_topic {
            let count = self.topic_totals.get(topic).copied().unwrap_or(0);
            let is_lower = match lowest {
                None => true,
                // score / count < best_score / best_count, cross-multiplied
                Some((_, best_score, best_count)) => {
                    u64::from(score) * u64::from(best_count)
                        < u64::from(best_score) * u64::from(count)
                }
            };
            if is_lower {
                lowest = Some((topic.as_str(), score, count));
            }
        }

        lowest.map(|(topic, _, _)| topic)
    }

    /// Classifies every topic against its real question count.
    pub fn classify_topics(&self) -> BTreeMap<&str, Classification> {
        self.per_topic
            .iter()
            .map(|(topic, &score)| {
                let count = self.topic_totals.get(topic).copied().unwrap_or(0);
                (topic.as_str(), classify_difficulty(score, count))
            })
            .collect()
    }
}

/// Grades the questions presented in an attempt.
///
/// Every topic present in `questions` shows up in the result, even with a zero score.
/// Answers for IDs that are not part of `questions` are ignored.
pub fn compute_score<Q: Gradable>(questions: &[Q], submission: &AnswerSubmission) -> ScoreResult {
    let mut per_topic: BTreeMap<String, u32> = BTreeMap::new();
    let mut topic_totals: BTreeMap<String, u32> = BTreeMap::new();

    for question in questions {
        per_topic.entry(question.topic().to_owned()).or_insert(0);
        *topic_totals.entry(question.topic().to_owned()).or_insert(0) += 1;
    }

    let mut total = 0;
    for question in questions {
        let Some(user_ans) = submission.get(&question.id()) else {
            continue;
        };

        // Simple strict string matching
        if user_ans == question.correct_answer() {
            total += 1;
            if let Some(counter) = per_topic.get_mut(question.topic()) {
                *counter += 1;
            }
        }
    }

    ScoreResult {
        total,
        per_topic,
        topic_totals,
    }
}

/// Qualitative performance tier for a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Basic,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Basic => "Basic",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Difficulty::Hard => "Exceptional! Your expertise in this topic is truly commendable.",
            Difficulty::Medium => "Well Done! A little more practice will take you to the next level.",
            Difficulty::Basic => "Keep Learning! Building a strong foundation is the key to success.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub difficulty: Difficulty,
    /// `100 * score / question_count`, 0 when the topic had no questions.
    pub percentage: f64,
}

const HARD_PERCENTAGE: u64 = 60;
const MEDIUM_PERCENTAGE: u64 = 35;

/// Classifies a topic score.
///
/// `>= 60%` is Hard, `>= 35%` is Medium, anything lower is Basic.
/// A topic with zero questions is Basic at 0%.
pub fn classify_difficulty(topic_score: u32, topic_question_count: u32) -> Classification {
    if topic_question_count == 0 {
        return Classification {
            difficulty: Difficulty::Basic,
            percentage: 0.0,
        };
    }

    let scaled = 100 * u64::from(topic_score);
    let count = u64::from(topic_question_count);

    let difficulty = if scaled >= HARD_PERCENTAGE * count {
        Difficulty::Hard
    } else if scaled >= MEDIUM_PERCENTAGE * count {
        Difficulty::Medium
    } else {
        Difficulty::Basic
    };

    Classification {
        difficulty,
        percentage: 100.0 * f64::from(topic_score) / f64::from(topic_question_count),
    }
}

/// Overall result tier shown next to the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Outstanding,
    Excellent,
    Great,
    KeepStriving,
}

impl PerformanceTier {
    pub fn message(&self) -> &'static str {
        match self {
            PerformanceTier::Outstanding => {
                "Outstanding Performance! You demonstrated exceptional mastery."
            }
            PerformanceTier::Excellent => {
                "Excellent Work! Your strong grasp of the concepts is evident."
            }
            PerformanceTier::Great => "Great Effort! You're making significant progress.",
            PerformanceTier::KeepStriving => {
                "Keep Striving! Every attempt is a step toward improvement."
            }
        }
    }
}

/// Classifies a total score against the maximum attainable score.
///
/// A full score is Outstanding. Excellent starts at 5/6 of the maximum and Great at
/// 2/3 (rounded up), i.e. 25 and 20 for a 30-question quiz.
pub fn classify_total_score(total_score: u32, max_score: u32) -> PerformanceTier {
    if max_score == 0 {
        return PerformanceTier::KeepStriving;
    }

    if total_score >= max_score {
        PerformanceTier::Outstanding
    } else if total_score >= ceil_frac(max_score, 5, 6) {
        PerformanceTier::Excellent
    } else if total_score >= ceil_frac(max_score, 2, 3) {
        PerformanceTier::Great
    } else {
        PerformanceTier::KeepStriving
    }
}

/// `ceil(value * num / den)` without floating point.
fn ceil_frac(value: u32, num: u32, den: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(num);
    scaled.div_ceil(u64::from(den)) as u32
}
