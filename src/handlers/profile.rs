use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::user::{MeResponse, User},
    utils::jwt::Claims,
};

/// Get current user's profile with latest score and attempt count.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, username, password, role, created_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let latest_score = sqlx::query_scalar::<_, i64>(
        "SELECT total_score FROM scores WHERE user_id = ? ORDER BY id DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .unwrap_or(0);

    let attempt_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attempts WHERE user_id = ? AND submitted = 1",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(MeResponse {
        id: user.id,
        name: user.name,
        username: user.username,
        role: user.role,
        latest_score,
        attempt_count,
    }))
}
