// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::{Sqlite, SqlitePool, types::Json as SqlJson};

use crate::{
    error::AppError,
    models::{
        question::{PublicQuestion, Question, QuestionSetSummary},
        score::{
            Attempt, AttemptResponse, ScoreRecord, ScoreReport, StartAttemptRequest,
            SubmitAnswersRequest,
        },
    },
    scoring::compute_score,
    state::AppState,
    utils::{extract::AppJson, jwt::Claims},
};

/// Lists the question sets that can be attempted.
pub async fn list_sets(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let sets = sqlx::query_as::<_, QuestionSetSummary>(
        r#"
        SELECT set_number, COUNT(*) AS question_count
        FROM questions
        GROUP BY set_number
        ORDER BY set_number
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list question sets: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(sets))
}

/// Starts an attempt for the caller.
///
/// * Picks the requested set, or a random non-empty one. The body is optional.
/// * Draws up to `questions_per_attempt` random questions from it.
/// * Records which questions were handed out, so scoring later uses exactly those.
/// * Returns the questions without their answers.
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let pool = &state.pool;

    let req: StartAttemptRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StartAttemptRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };

    let set_number = match req.set_number {
        Some(n) => n,
        None => sqlx::query_scalar::<_, i64>(
            "SELECT set_number FROM questions GROUP BY set_number ORDER BY RANDOM() LIMIT 1",
        )
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("No question sets available".to_string()))?,
    };

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, set_number, topic, content, options, answer, created_at
        FROM questions
        WHERE set_number = ?
        ORDER BY RANDOM()
        LIMIT ?
        "#,
    )
    .bind(set_number)
    .bind(state.config.questions_per_attempt)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to draw questions for set {}: {:?}", set_number, e);
        AppError::InternalServerError(e.to_string())
    })?;

    if questions.is_empty() {
        return Err(AppError::NotFound(format!(
            "Question set {} not found",
            set_number
        )));
    }

    let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

    let attempt_id = sqlx::query(
        r#"
        INSERT INTO attempts (user_id, set_number, question_ids, submitted, created_at)
        VALUES (?, ?, ?, 0, ?)
        "#,
    )
    .bind(user_id)
    .bind(set_number)
    .bind(SqlJson(&question_ids))
    .bind(chrono::Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create attempt: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .last_insert_rowid();

    tracing::info!(
        "User {} started attempt {} on set {} ({} questions)",
        user_id,
        attempt_id,
        set_number,
        question_ids.len()
    );

    Ok(Json(AttemptResponse {
        attempt_id,
        set_number,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
    }))
}

/// Submits answers for an attempt and scores it.
///
/// * Only the attempt's owner may submit, and only once.
/// * Grades exactly the questions handed out for the attempt; answers for any
///   other question ID are ignored.
/// * Stores the score record and returns the full per-topic report.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
    AppJson(req): AppJson<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut tx = state.pool.begin().await?;

    // Claim first: the transaction must hold the write lock before it reads.
    let claimed = sqlx::query(
        "UPDATE attempts SET submitted = 1 WHERE id = ? AND user_id = ? AND submitted = 0",
    )
    .bind(attempt_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let attempt = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT id, user_id, set_number, question_ids, submitted, created_at
        FROM attempts
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(attempt_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if claimed.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Attempt has already been submitted".to_string(),
        ));
    }

    let questions = load_attempt_questions(&mut tx, &attempt.question_ids.0).await?;
    if questions.len() < attempt.question_ids.len() {
        tracing::warn!(
            "Attempt {}: {} of its questions no longer exist and are not scored",
            attempt.id,
            attempt.question_ids.len() - questions.len()
        );
    }

    let result = compute_score(&questions, &req.answers);

    let attempt_number = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attempts WHERE user_id = ? AND submitted = 1",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let score_id = sqlx::query(
        r#"
        INSERT INTO scores
        (user_id, attempt_id, set_number, attempt_number, total_score, max_score,
         score_by_topic, topic_totals, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(attempt.id)
    .bind(attempt.set_number)
    .bind(attempt_number)
    .bind(i64::from(result.total))
    .bind(i64::from(result.max_score()))
    .bind(SqlJson(&result.per_topic))
    .bind(SqlJson(&result.topic_totals))
    .bind(chrono::Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store score for attempt {}: {:?}", attempt.id, e);
        AppError::InternalServerError(e.to_string())
    })?
    .last_insert_rowid();

    tx.commit().await?;

    tracing::info!(
        "User {} scored {}/{} on attempt {}",
        user_id,
        result.total,
        result.max_score(),
        attempt.id
    );

    Ok(Json(ScoreReport::build(
        score_id,
        attempt_number,
        attempt.set_number,
        &result,
        &state.remediation,
    )))
}

/// Fetches the attempt's questions, in the order they were handed out.
async fn load_attempt_questions(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    ids: &[i64],
) -> Result<Vec<Question>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    // Use QueryBuilder for dynamic IN clause
    let mut query_builder = sqlx::QueryBuilder::<Sqlite>::new(
        "SELECT id, set_number, topic, content, options, answer, created_at
        FROM questions WHERE id IN (",
    );

    let mut separated = query_builder.separated(",");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<Question> = query_builder
        .build_query_as()
        .fetch_all(&mut **tx)
        .await?;

    let mut by_id: HashMap<i64, Question> = rows.into_iter().map(|q| (q.id, q)).collect();
    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

/// Lists the caller's own score records, newest first.
pub async fn my_scores(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let scores = sqlx::query_as::<_, ScoreRecord>(
        r#"
        SELECT id, user_id, attempt_id, set_number, attempt_number, total_score, max_score,
               score_by_topic, topic_totals, created_at
        FROM scores
        WHERE user_id = ?
        ORDER BY id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(scores))
}
