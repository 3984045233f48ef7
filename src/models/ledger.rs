// src/models/ledger.rs

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'watched_movies' table: one row per watched movie.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WatchEvent {
    pub id: i64,
    pub movie_id: i64,
    pub date_watched: NaiveDateTime,

    /// Base points, overwritten with base + bonus once the bonus is applied.
    pub points_earned: i64,

    /// Set exactly once, when a non-zero bonus has been written.
    pub bonus_applied: bool,
}

/// Represents the 'point_awards' table. Rows are append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PointAward {
    pub id: i64,
    pub watch_event_id: i64,
    pub movie_id: i64,

    /// Bonus amount only, the base points live on the watch event.
    pub points: i64,

    /// Comma-joined bonus tags.
    pub bonus_reason: String,

    pub date_earned: NaiveDateTime,
}
