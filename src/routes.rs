// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, profile, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, users, quiz, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, remediation catalog).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let user_routes = Router::new()
        .route("/me", get(profile::get_me))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let quiz_routes = Router::new()
        .route("/sets", get(quiz::list_sets))
        .route("/attempts", post(quiz::start_attempt))
        .route("/attempts/{id}/submit", post(quiz::submit_attempt))
        .route("/scores", get(quiz::my_scores))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/scores", get(admin::list_scores))
        .route("/scores/{id}", delete(admin::delete_score))
        .route("/question-sets", get(admin::list_question_sets))
        .route("/question-sets/{set_number}", put(admin::import_question_set))
        .route("/questions", post(admin::create_question))
        .route("/questions/{id}", delete(admin::delete_question))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
