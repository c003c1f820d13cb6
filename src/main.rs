// src/main.rs

use dotenvy::dotenv;
use quiz_backend::config::Config;
use quiz_backend::handlers::auth::insert_user;
use quiz_backend::routes;
use quiz_backend::scoring::RemediationCatalog;
use quiz_backend::state::AppState;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .expect("DATABASE_URL is not a valid SQLite URL")
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    // Initialize Database Pool with Retry (the file may be locked by a previous instance)
    let mut retry_count = 0;
    let pool = loop {
        match SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(connect_options.clone())
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to open database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // Seed Admin User
    if let Err(e) = seed_admin_user(&pool, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let remediation = match &config.remediation_catalog {
        Some(path) => RemediationCatalog::from_file(path)
            .unwrap_or_else(|e| panic!("Failed to load remediation catalog {}: {}", path, e)),
        None => RemediationCatalog::default(),
    };
    tracing::info!("Remediation catalog covers {} topics", remediation.topic_count());

    // Create AppState
    let state = AppState {
        pool,
        config: config.clone(),
        remediation: Arc::new(remediation),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}

async fn seed_admin_user(pool: &SqlitePool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let user_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        if user_exists.is_none() {
            tracing::info!("Seeding admin user: {}", username);
            insert_user(pool, "Administrator", username, password, "admin").await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
