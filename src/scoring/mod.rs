// src/scoring/mod.rs

//! Score computation and topic classification.
//!
//! Everything in here is pure: no I/O, no shared state. Handlers load the
//! attempt's questions, call `compute_score`, and persist the result themselves.

pub mod evaluator;
pub mod remediation;

pub use evaluator::{
    AnswerSubmission, Classification, Difficulty, Gradable, PerformanceTier, ScoreResult,
    classify_difficulty, classify_total_score, compute_score,
};
pub use remediation::{CatalogError, RemediationCatalog};
