// src/services/bonus.rs

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqliteConnection;

use crate::{error::AppError, models::points::BonusReport, services::LedgerScope};

pub const BASE_POINTS: i64 = 50;
pub const SAME_DAY_BONUS: i64 = 50;
pub const WITHIN_WEEK_BONUS: i64 = 30;
pub const VOLUME_BONUS: i64 = 25;
/// Watch events on one calendar day needed before the volume bonus kicks in.
pub const VOLUME_THRESHOLD: i64 = 3;

const SECONDS_PER_DAY: i64 = 86_400;

impl BonusReport {
    /// Zero-bonus result for an event that could not be evaluated.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            bonus_points: 0,
            reasons: Vec::new(),
            total_with_bonus: BASE_POINTS,
            error: Some(reason.into()),
        }
    }
}

/// Applies the bonus rules to a single watch event.
///
/// * Same calendar day as added: +50 `watched_same_day`.
/// * Otherwise, at most 7 whole days after adding: +30 `watched_within_week`.
/// * Independently, `watched_that_day >= 3`: +25 `multiple_movies_day_<n>`.
///
/// `watched_that_day` counts every event on the watch date, this one included.
pub fn score(added: NaiveDateTime, watched: NaiveDateTime, watched_that_day: i64) -> BonusReport {
    let mut bonus = 0;
    let mut reasons = Vec::new();

    // Whole days, floored, so a watch date before the added date is negative.
    let whole_days = (watched - added).num_seconds().div_euclid(SECONDS_PER_DAY);

    if added.date() == watched.date() {
        bonus += SAME_DAY_BONUS;
        reasons.push("watched_same_day".to_string());
    } else if whole_days <= 7 {
        bonus += WITHIN_WEEK_BONUS;
        reasons.push("watched_within_week".to_string());
    }

    if watched_that_day >= VOLUME_THRESHOLD {
        bonus += VOLUME_BONUS;
        reasons.push(format!("multiple_movies_day_{}", watched_that_day));
    }

    BonusReport {
        bonus_points: bonus,
        reasons,
        total_with_bonus: BASE_POINTS + bonus,
        error: None,
    }
}

/// Helper struct for the movie/watch-event lookup.
#[derive(sqlx::FromRow)]
struct WatchDates {
    added_date: NaiveDateTime,
    date_watched: NaiveDateTime,
}

/// Counts watch events whose watch date falls on `day`.
pub async fn count_watched_on(
    conn: &mut SqliteConnection,
    day: NaiveDate,
    scope: LedgerScope,
) -> Result<i64, AppError> {
    let owner = scope.owner();
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM watched_movies w
        LEFT JOIN movies m ON m.id = w.movie_id
        WHERE date(w.date_watched) = ?
          AND (? IS NULL OR m.user_id = ?)
        "#,
    )
    .bind(day.format("%Y-%m-%d").to_string())
    .bind(owner)
    .bind(owner)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

/// Computes the bonus for the watch event of `movie_id` without writing anything.
///
/// A missing movie or watch event yields a zero-bonus report with `error` set.
/// Store failures still propagate.
pub async fn evaluate(
    conn: &mut SqliteConnection,
    movie_id: i64,
    scope: LedgerScope,
) -> Result<BonusReport, AppError> {
    let dates = sqlx::query_as::<_, WatchDates>(
        r#"
        SELECT m.added_date, w.date_watched
        FROM movies m
        JOIN watched_movies w ON m.id = w.movie_id
        WHERE m.id = ?
        "#,
    )
    .bind(movie_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(dates) = dates else {
        tracing::debug!(movie_id, "No watch event to score");
        return Ok(BonusReport::unavailable("Movie not found"));
    };

    let watched_that_day = count_watched_on(conn, dates.date_watched.date(), scope).await?;

    Ok(score(dates.added_date, dates.date_watched, watched_that_day))
}

/// Writes a computed bonus to the ledger.
///
/// Moves the watch event to the bonus-applied state and appends one `point_awards`
/// row. Nothing is written when the bonus is zero or the event was already applied,
/// and the return value says whether anything was written.
pub async fn apply(
    conn: &mut SqliteConnection,
    watch_event_id: i64,
    movie_id: i64,
    report: &BonusReport,
    now: NaiveDateTime,
) -> Result<bool, AppError> {
    if report.bonus_points <= 0 {
        return Ok(false);
    }

    let flipped = sqlx::query(
        r#"
        UPDATE watched_movies
        SET points_earned = ?, bonus_applied = 1
        WHERE id = ? AND bonus_applied = 0
        "#,
    )
    .bind(BASE_POINTS + report.bonus_points)
    .bind(watch_event_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if flipped == 0 {
        tracing::warn!(watch_event_id, "Bonus already applied, skipping");
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO point_awards (watch_event_id, movie_id, points, bonus_reason, date_earned)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(watch_event_id)
    .bind(movie_id)
    .bind(report.bonus_points)
    .bind(report.reasons.join(", "))
    .bind(now)
    .execute(&mut *conn)
    .await?;

    tracing::info!(
        watch_event_id,
        bonus = report.bonus_points,
        reasons = %report.reasons.join(", "),
        "Bonus applied"
    );

    Ok(true)
}
