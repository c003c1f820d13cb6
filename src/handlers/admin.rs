// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::auth::insert_user,
    models::{
        question::{CreateQuestionRequest, ImportQuestionSetRequest, QuestionDraft},
        score::ScoreEntry,
        user::{AdminCreateUserRequest, User},
    },
    utils::{extract::AppJson, jwt::Claims},
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, username, password, role, created_at
        FROM users
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Creates a new user with specific role.
/// Admin only.
pub async fn create_user(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = insert_user(
        &pool,
        &payload.name,
        &payload.username,
        &payload.password,
        &payload.role,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": user.id}))))
}

/// Deletes a user by ID, together with their attempts and scores.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!("Deleted user {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Lists every score record with its owner, newest first.
/// Admin only.
pub async fn list_scores(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let scores = sqlx::query_as::<_, ScoreEntry>(
        r#"
        SELECT
            s.id, s.user_id, u.name, u.username, s.set_number, s.attempt_number,
            s.total_score, s.max_score, s.score_by_topic, s.created_at
        FROM scores s
        JOIN users u ON s.user_id = u.id
        ORDER BY s.id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list scores: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(scores))
}

/// Deletes a score record by ID.
/// Admin only.
pub async fn delete_score(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM scores WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Score not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Overview row for the admin question-set list.
#[derive(Debug, Serialize)]
pub struct QuestionSetOverview {
    pub set_number: i64,
    pub question_count: i64,
    pub topics: Vec<String>,
}

#[derive(sqlx::FromRow)]
struct SetTopicRow {
    set_number: i64,
    topic: String,
    question_count: i64,
}

/// Lists question sets with their sizes and topics.
/// Admin only.
pub async fn list_question_sets(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, SetTopicRow>(
        r#"
        SELECT set_number, topic, COUNT(*) AS question_count
        FROM questions
        GROUP BY set_number, topic
        ORDER BY set_number, topic
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let mut sets: Vec<QuestionSetOverview> = Vec::new();
    for row in rows {
        match sets.last_mut() {
            Some(last) if last.set_number == row.set_number => {
                last.question_count += row.question_count;
                last.topics.push(row.topic);
            }
            _ => sets.push(QuestionSetOverview {
                set_number: row.set_number,
                question_count: row.question_count,
                topics: vec![row.topic],
            }),
        }
    }

    Ok(Json(sets))
}

async fn insert_question(
    conn: &mut sqlx::SqliteConnection,
    set_number: i64,
    question: QuestionDraft,
) -> Result<i64, AppError> {
    let options_json = serde_json::to_string(&question.options)?;

    let id = sqlx::query(
        r#"
        INSERT INTO questions
        (set_number, topic, content, options, answer, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(set_number)
    .bind(&question.topic)
    .bind(&question.content)
    .bind(options_json)
    .bind(&question.answer)
    .bind(chrono::Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .last_insert_rowid();

    Ok(id)
}

/// Replaces a whole question set, e.g. with the output of the question generator.
///
/// Every question is checked before anything is written; the delete and the
/// inserts run in one transaction so a set is never half-replaced.
/// Admin only.
pub async fn import_question_set(
    State(pool): State<SqlitePool>,
    Path(set_number): Path<i64>,
    AppJson(payload): AppJson<ImportQuestionSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    if set_number < 1 {
        return Err(AppError::BadRequest("Set number must be positive".to_string()));
    }
    payload.validate()?;

    let mut drafts = Vec::with_capacity(payload.questions.len());
    for (i, draft) in payload.questions.into_iter().enumerate() {
        let draft = draft.sanitized();
        draft
            .check()
            .map_err(|msg| AppError::BadRequest(format!("question {}: {}", i + 1, msg)))?;
        drafts.push(draft);
    }

    let mut tx = pool.begin().await?;

    let replaced = sqlx::query("DELETE FROM questions WHERE set_number = ?")
        .bind(set_number)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let mut ids = Vec::with_capacity(drafts.len());
    for draft in drafts {
        ids.push(insert_question(&mut tx, set_number, draft).await?);
    }

    tx.commit().await?;

    tracing::info!(
        "Question set {} imported: {} questions ({} replaced)",
        set_number,
        ids.len(),
        replaced
    );

    Ok(Json(serde_json::json!({
        "set_number": set_number,
        "imported": ids.len(),
        "replaced": replaced
    })))
}

/// Creates a new quiz question.
/// Admin only.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let draft = payload.question.sanitized();
    draft.check().map_err(AppError::BadRequest)?;

    let mut conn = pool.acquire().await?;
    let id = insert_question(&mut conn, payload.set_number, draft).await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Deletes a quiz question by ID.
/// Admin only.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
