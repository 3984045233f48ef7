// src/services/aggregation.rs

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::points::{
        DailyStats, LeaderboardEntry, LeaderboardRow, Period, StatsSummary, StreakReport,
        TotalPoints,
    },
    services::LedgerScope,
};

/// Longest leaderboard ever returned.
pub const LEADERBOARD_LIMIT: usize = 100;

/// Number of watch events and points earned on `day`.
pub async fn daily_stats(
    pool: &SqlitePool,
    day: NaiveDate,
    scope: LedgerScope,
) -> Result<DailyStats, AppError> {
    let owner = scope.owner();
    let stats = sqlx::query_as::<_, DailyStats>(
        r#"
        SELECT
            COUNT(w.id) AS movies_today,
            COALESCE(SUM(w.points_earned), 0) AS points_today
        FROM watched_movies w
        LEFT JOIN movies m ON m.id = w.movie_id
        WHERE date(w.date_watched) = ?
          AND (? IS NULL OR m.user_id = ?)
        "#,
    )
    .bind(day.format("%Y-%m-%d").to_string())
    .bind(owner)
    .bind(owner)
    .fetch_one(pool)
    .await?;

    Ok(stats)
}

/// Current run of consecutive watch days, ending at the most recent one.
pub async fn streak(pool: &SqlitePool, scope: LedgerScope) -> Result<StreakReport, AppError> {
    let owner = scope.owner();
    let days: Vec<Option<String>> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT date(w.date_watched) AS watched_day
        FROM watched_movies w
        LEFT JOIN movies m ON m.id = w.movie_id
        WHERE (? IS NULL OR m.user_id = ?)
        ORDER BY watched_day DESC
        "#,
    )
    .bind(owner)
    .bind(owner)
    .fetch_all(pool)
    .await?;

    let dates = days
        .into_iter()
        .flatten()
        .map(|day| {
            NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|e| AppError::BadRequest(format!("Unreadable watch date '{}': {}", day, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(compute_streak(&dates))
}

/// Counts the consecutive-day prefix of `dates`, newest first.
///
/// Input order and duplicates do not matter.
pub fn compute_streak(dates: &[NaiveDate]) -> StreakReport {
    let mut days = dates.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(&last_watched) = days.first() else {
        return StreakReport {
            streak: 0,
            last_watched: None,
        };
    };

    let mut streak = 1;
    for pair in days.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            streak += 1;
        } else {
            break;
        }
    }

    StreakReport {
        streak,
        last_watched: Some(last_watched),
    }
}

/// Ranks every user by points earned inside `period`.
///
/// Totals are recomputed from the watch events on each call.
pub async fn leaderboard(
    pool: &SqlitePool,
    period: Period,
    now: NaiveDateTime,
) -> Result<Vec<LeaderboardEntry>, AppError> {
    let since = period.lower_bound(now);

    // The period filter sits in the join so users without watch events keep a row.
    let rows = sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT
            u.id AS user_id,
            u.username,
            COALESCE(SUM(w.points_earned), 0) AS total_points,
            COUNT(DISTINCT w.movie_id) AS movies_watched
        FROM users u
        LEFT JOIN movies m ON m.user_id = u.id
        LEFT JOIN watched_movies w
            ON w.movie_id = m.id
           AND datetime(w.date_watched) >= datetime(?)
        GROUP BY u.id, u.username
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rank_leaderboard(rows))
}

/// Sorts by points, then movies watched (both descending), then username, and
/// numbers the result 1..N. Equal scores still get distinct ranks.
pub fn rank_leaderboard(mut rows: Vec<LeaderboardRow>) -> Vec<LeaderboardEntry> {
    rows.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| b.movies_watched.cmp(&a.movies_watched))
            .then_with(|| a.username.cmp(&b.username))
    });

    rows.into_iter()
        .take(LEADERBOARD_LIMIT)
        .zip(1..)
        .map(|(row, rank)| LeaderboardEntry {
            rank,
            user_id: row.user_id,
            username: row.username,
            total_points: row.total_points,
            movies_watched: row.movies_watched,
        })
        .collect()
}

/// Sum of points over one user's watch events.
pub async fn total_points(pool: &SqlitePool, user_id: i64) -> Result<TotalPoints, AppError> {
    let total = sqlx::query_as::<_, TotalPoints>(
        r#"
        SELECT COALESCE(SUM(w.points_earned), 0) AS total_points
        FROM watched_movies w
        JOIN movies m ON m.id = w.movie_id
        WHERE m.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// Points and watchlist counts for one user.
pub async fn summary(pool: &SqlitePool, user_id: i64) -> Result<StatsSummary, AppError> {
    let summary = sqlx::query_as::<_, StatsSummary>(
        r#"
        SELECT
            COALESCE(SUM(w.points_earned), 0) AS total_points,
            COUNT(m.id) AS total_movies,
            COUNT(w.id) AS watched_movies,
            COUNT(m.id) - COUNT(w.id) AS unwatched_movies
        FROM movies m
        LEFT JOIN watched_movies w ON w.movie_id = m.id
        WHERE m.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(summary)
}
