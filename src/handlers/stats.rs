// src/handlers/stats.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    models::points::{LeaderboardParams, LeaderboardResponse, Period},
    services::{LedgerScope, aggregation},
    utils::{jwt::Claims, time},
};

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Total points the caller has earned.
pub async fn total_points(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let total = aggregation::total_points(&pool, claims.user_id()?).await?;
    Ok(Json(total))
}

/// Points and watchlist counts for the caller.
pub async fn summary(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let summary = aggregation::summary(&pool, claims.user_id()?).await?;
    Ok(Json(summary))
}

/// Movies watched and points earned today (server-local date).
pub async fn daily(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let scope = LedgerScope::resolve(config.stats_scope, claims.user_id()?);
    let stats = aggregation::daily_stats(&pool, time::now().date(), scope).await?;
    Ok(Json(stats))
}

/// Current run of consecutive watching days.
pub async fn streak(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let scope = LedgerScope::resolve(config.stats_scope, claims.user_id()?);
    let streak = aggregation::streak(&pool, scope).await?;
    Ok(Json(streak))
}

/// Public leaderboard. `period` defaults to `all_time`.
pub async fn leaderboard(
    State(pool): State<SqlitePool>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let period = match params.period.as_deref() {
        Some(raw) => raw.parse::<Period>().map_err(AppError::BadRequest)?,
        None => Period::default(),
    };

    let leaderboard = aggregation::leaderboard(&pool, period, time::now()).await?;

    Ok(Json(LeaderboardResponse {
        period,
        leaderboard,
    }))
}
