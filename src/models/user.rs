// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Profile data for the current user's dashboard.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub role: String,
    /// Total score of the most recent submission, 0 before the first one.
    pub latest_score: i64,
    pub attempt_count: i64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for Admin creating a user (can specify role).
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 3, max = 50, message = "Username length must be between 3 and 50 characters."))]
    pub username: String,
    #[validate(length(min = 4, max = 128, message = "Password length must be between 4 and 128 characters."))]
    pub password: String,
    #[validate(custom(function = validate_role))]
    pub role: String,
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    if role != "user" && role != "admin" {
        return Err(validator::ValidationError::new("invalid_role"));
    }
    Ok(())
}
