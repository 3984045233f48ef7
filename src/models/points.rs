// src/models/points.rs

use std::str::FromStr;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Outcome of running the bonus rules against one watch event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusReport {
    pub bonus_points: i64,
    /// Bonus tags in the order the rules fired.
    pub reasons: Vec<String>,
    pub total_with_bonus: i64,
    /// Set when the event could not be evaluated. The bonus is then zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for marking a movie as watched.
#[derive(Debug, Serialize)]
pub struct MarkWatchedResponse {
    pub success: bool,
    pub watch_event_id: i64,
    pub points_earned: i64,
    pub bonus_points: i64,
    pub total_points: i64,
    pub bonus_reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DailyStats {
    pub movies_today: i64,
    pub points_today: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakReport {
    pub streak: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_watched: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TotalPoints {
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct StatsSummary {
    pub total_points: i64,
    pub total_movies: i64,
    pub watched_movies: i64,
    pub unwatched_movies: i64,
}

/// Leaderboard time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Week,
    Month,
    Year,
    #[default]
    AllTime,
}

impl Period {
    /// Earliest `date_watched` that still counts for this period.
    pub fn lower_bound(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            Period::Week => now - TimeDelta::days(7),
            Period::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(now - TimeDelta::days(30)),
            Period::Year => now
                .checked_sub_months(Months::new(12))
                .unwrap_or(now - TimeDelta::days(365)),
            Period::AllTime => DateTime::UNIX_EPOCH.naive_utc(),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            "all_time" => Ok(Period::AllTime),
            other => Err(format!(
                "Unknown period '{}', expected one of: week, month, year, all_time",
                other
            )),
        }
    }
}

/// Raw per-user aggregate as it comes out of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct LeaderboardRow {
    pub user_id: i64,
    pub username: String,
    pub total_points: i64,
    pub movies_watched: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: i64,
    pub username: String,
    pub total_points: i64,
    pub movies_watched: i64,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub period: Period,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Query parameters for the leaderboard.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub period: Option<String>,
}
