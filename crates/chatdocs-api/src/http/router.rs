//! Axum router configuration with middleware.
//!
//! Middleware: CORS (single configured origin, with credentials), request
//! tracing, and a raised body limit for document uploads.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{any, delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Upper bound on a request body (multipart chatbot creation).
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/auth/users",
            get(handlers::auth::list_users).post(handlers::auth::add_user),
        )
        .route("/auth/users/{id}", delete(handlers::auth::delete_user))
        .route("/chatbots", post(handlers::chatbot::create_chatbot))
        .route("/chatbots/my", get(handlers::chatbot::list_my_chatbots))
        .route(
            "/chatbots/{id}",
            get(handlers::chatbot::get_chatbot).delete(handlers::chatbot::delete_chatbot),
        )
        .route(
            "/chatbots/delete/{id}",
            delete(handlers::chatbot::delete_chatbot),
        )
        .route(handlers::proxy::PROXY_PREFIX, any(handlers::proxy::forward))
        .route("/python-api/{*path}", any(handlers::proxy::forward))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Credentials cannot be combined with a wildcard origin.
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value).allow_credentials(true),
        Err(e) => {
            tracing::warn!(origin, error = %e, "Invalid CORS origin, cross-origin requests will be refused");
            layer
        }
    }
}

/// GET /health - No auth required.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
