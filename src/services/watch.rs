// src/services/watch.rs

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::points::MarkWatchedResponse,
    services::{
        LedgerScope,
        bonus::{self, BASE_POINTS},
    },
};

/// Marks one of `user_id`'s movies as watched and settles its bonus.
///
/// The insert, the bonus evaluation and the bonus write share one transaction,
/// so the movie goes Unwatched -> Watched -> BonusApplied atomically.
/// A movie that already has a watch event is rejected with `Conflict`.
///
/// The transaction takes SQLite's write lock up front, so concurrent callers
/// wait on the busy timeout instead of failing the read-to-write upgrade.
pub async fn mark_watched(
    pool: &SqlitePool,
    user_id: i64,
    movie_id: i64,
    watched_at: NaiveDateTime,
    scope: LedgerScope,
    now: NaiveDateTime,
) -> Result<MarkWatchedResponse, AppError> {
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM movies WHERE id = ? AND user_id = ?")
        .bind(movie_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Movie not found".to_string()))?;

    let already_watched =
        sqlx::query_scalar::<_, i64>("SELECT id FROM watched_movies WHERE movie_id = ?")
            .bind(movie_id)
            .fetch_optional(&mut *tx)
            .await?;

    if already_watched.is_some() {
        return Err(AppError::Conflict("Movie already marked as watched".to_string()));
    }

    let watch_event_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO watched_movies (movie_id, date_watched, points_earned)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(movie_id)
    .bind(watched_at)
    .bind(BASE_POINTS)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return AppError::Conflict("Movie already marked as watched".to_string());
            }
        }
        AppError::from(e)
    })?;

    let report = bonus::evaluate(&mut *tx, movie_id, scope).await?;
    bonus::apply(&mut *tx, watch_event_id, movie_id, &report, now).await?;

    tx.commit().await?;

    tracing::info!(
        user_id,
        movie_id,
        watch_event_id,
        total = report.total_with_bonus,
        "Movie marked as watched"
    );

    Ok(MarkWatchedResponse {
        success: true,
        watch_event_id,
        points_earned: BASE_POINTS,
        bonus_points: report.bonus_points,
        total_points: report.total_with_bonus,
        bonus_reasons: report.reasons,
    })
}
