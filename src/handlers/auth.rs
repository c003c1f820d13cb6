// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{CreateUserRequest, LoginRequest, User},
    utils::{
        extract::AppJson,
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Inserts a user row and returns it. Shared by registration and the admin panel.
pub async fn insert_user(
    pool: &SqlitePool,
    name: &str,
    username: &str,
    password: &str,
    role: &str,
) -> Result<User, AppError> {
    let hashed_password = hash_password(password)?;

    let id = sqlx::query(
        r#"
        INSERT INTO users (name, username, password, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(username)
    .bind(&hashed_password)
    .bind(role)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Username '{}' already exists", username))
        } else {
            tracing::error!("Failed to insert user: {:?}", e);
            AppError::from(e)
        }
    })?
    .last_insert_rowid();

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, username, password, role, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = insert_user(
        &pool,
        &payload.name,
        &payload.username,
        &payload.password,
        "user",
    )
    .await?;

    tracing::info!("Registered user {}", user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown users and wrong passwords get the same 401 so usernames cannot be probed.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, username, password, role, created_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(user.id, &user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user_id": user.id,
        "name": user.name,
        "role": user.role
    })))
}
