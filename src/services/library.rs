// src/services/library.rs

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::movie::{Movie, WatchedMovie},
};

/// Inserts a movie into `user_id`'s watchlist and returns its id.
pub async fn add_movie(
    pool: &SqlitePool,
    user_id: i64,
    title: &str,
    year: Option<i64>,
    rating: Option<f64>,
    poster: &str,
    added_at: NaiveDateTime,
) -> Result<i64, AppError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO movies (user_id, title, year, rating, poster, added_date)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(year)
    .bind(rating)
    .bind(poster)
    .bind(added_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Movies of `user_id` that have no watch event yet, newest first.
pub async fn watchlist(pool: &SqlitePool, user_id: i64) -> Result<Vec<Movie>, AppError> {
    let movies = sqlx::query_as::<_, Movie>(
        r#"
        SELECT m.id, m.user_id, m.title, m.year, m.rating, m.poster, m.added_date
        FROM movies m
        WHERE m.user_id = ?
          AND NOT EXISTS (SELECT 1 FROM watched_movies w WHERE w.movie_id = m.id)
        ORDER BY m.added_date DESC, m.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(movies)
}

/// Watched movies of `user_id` with their points, most recently watched first.
pub async fn watched(pool: &SqlitePool, user_id: i64) -> Result<Vec<WatchedMovie>, AppError> {
    let movies = sqlx::query_as::<_, WatchedMovie>(
        r#"
        SELECT m.id, m.title, m.year, m.rating, m.poster, w.date_watched, w.points_earned
        FROM movies m
        JOIN watched_movies w ON m.id = w.movie_id
        WHERE m.user_id = ?
        ORDER BY w.date_watched DESC, w.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(movies)
}

/// Deletes one of `user_id`'s movies. Its watch event goes with it.
pub async fn remove_movie(pool: &SqlitePool, user_id: i64, movie_id: i64) -> Result<(), AppError> {
    let deleted = sqlx::query("DELETE FROM movies WHERE id = ? AND user_id = ?")
        .bind(movie_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Movie not found".to_string()));
    }

    Ok(())
}
