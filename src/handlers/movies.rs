// src/handlers/movies.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::movie::{CreateMovieRequest, DEFAULT_POSTER, MarkWatchedRequest, MovieCreatedResponse},
    services::{LedgerScope, bonus, library, watch},
    utils::{jwt::Claims, time},
};

/// Trims and drops control characters.
fn clean_title(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Adds a movie to the caller's watchlist.
pub async fn add_movie(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let title = clean_title(&payload.title);
    if title.is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".to_string()));
    }

    let poster = payload
        .poster
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_POSTER);

    let movie_id = library::add_movie(
        &pool,
        user_id,
        &title,
        payload.year,
        payload.rating,
        poster,
        time::now(),
    )
    .await?;

    tracing::info!(user_id, movie_id, "Movie added to watchlist");

    Ok((
        StatusCode::CREATED,
        Json(MovieCreatedResponse {
            success: true,
            movie_id,
            message: "Movie added to watchlist".to_string(),
        }),
    ))
}

/// Lists the caller's unwatched movies.
pub async fn list_watchlist(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let movies = library::watchlist(&pool, claims.user_id()?).await?;
    Ok(Json(json!({ "movies": movies })))
}

/// Lists the caller's watched movies with the points each one earned.
pub async fn list_watched(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let movies = library::watched(&pool, claims.user_id()?).await?;
    Ok(Json(json!({ "movies": movies })))
}

/// Removes a movie (and its watch event) from the caller's library.
pub async fn remove_movie(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    library::remove_movie(&pool, claims.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Marks a movie as watched and settles its bonus points.
///
/// * Body is optional, `date_watched` defaults to now.
/// * 404 if the movie is not the caller's, 409 if it was already watched.
pub async fn mark_watched(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    payload: Option<Json<MarkWatchedRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let now = time::now();

    let watched_at = match payload.and_then(|Json(req)| req.date_watched) {
        Some(raw) => time::parse_timestamp(&raw)?,
        None => now,
    };

    let scope = LedgerScope::resolve(config.stats_scope, user_id);
    let result = watch::mark_watched(&pool, user_id, id, watched_at, scope, now).await?;

    Ok(Json(result))
}

/// Shows the bonus the caller's watched movie qualifies for, without writing anything.
pub async fn bonus_preview(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let mut conn = pool.acquire().await?;

    let owned = sqlx::query_scalar::<_, i64>("SELECT id FROM movies WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    if owned.is_none() {
        return Err(AppError::NotFound("Movie not found".to_string()));
    }

    let scope = LedgerScope::resolve(config.stats_scope, user_id);
    let report = bonus::evaluate(&mut *conn, id, scope).await?;

    Ok(Json(report))
}
