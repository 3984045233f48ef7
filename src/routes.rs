// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, export, movies, stats, users},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public: health, auth, user list, leaderboard.
/// * Bearer-protected: movies, stats, export.
/// * Applies global middleware (Trace, CORS) and injects `AppState`.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let movie_routes = Router::new()
        .route("/", post(movies::add_movie))
        .route("/watchlist", get(movies::list_watchlist))
        .route("/watched", get(movies::list_watched))
        .route("/{id}", delete(movies::remove_movie))
        .route("/{id}/watched", post(movies::mark_watched))
        .route("/{id}/bonus", get(movies::bonus_preview))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let stats_routes = Router::new()
        .route("/total-points", get(stats::total_points))
        .route("/summary", get(stats::summary))
        .route("/daily", get(stats::daily))
        .route("/streak", get(stats::streak))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let export_routes = Router::new()
        .route("/csv", post(export::export_csv))
        .route("/sheets", post(export::export_sheets))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/api/health", get(stats::health))
        .route("/api/users", get(users::list_users))
        .route("/api/leaderboard", get(stats::leaderboard))
        .nest("/api/auth", auth_routes)
        .nest("/api/movies", movie_routes)
        .nest("/api/stats", stats_routes)
        .nest("/api/export", export_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
