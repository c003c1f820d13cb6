// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Questions drawn per attempt unless `QUESTIONS_PER_ATTEMPT` says otherwise.
pub const DEFAULT_QUESTIONS_PER_ATTEMPT: i64 = 30;

/// Token lifetime in seconds unless `JWT_EXPIRATION` says otherwise.
pub const DEFAULT_JWT_EXPIRATION: u64 = 60 * 60 * 24;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub server_port: u16,
    pub questions_per_attempt: i64,
    /// Optional JSON file replacing the built-in remediation videos.
    pub remediation_catalog: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = parse_or("JWT_EXPIRATION", DEFAULT_JWT_EXPIRATION);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let server_port = parse_or("SERVER_PORT", 3000);

        let questions_per_attempt =
            parse_or("QUESTIONS_PER_ATTEMPT", DEFAULT_QUESTIONS_PER_ATTEMPT).max(1);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            server_port,
            questions_per_attempt,
            remediation_catalog: env::var("REMEDIATION_CATALOG").ok(),
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}

/// Reads an optional variable, falling back to `default` when it is unset.
/// A value that is set but unparsable is a startup error.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{} has an invalid value: {}", key, raw)),
        Err(_) => default,
    }
}
