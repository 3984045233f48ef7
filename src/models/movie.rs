// src/models/movie.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

pub const DEFAULT_POSTER: &str = "/placeholder.svg";

/// Represents the 'movies' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,

    /// Owner. Only rows from before accounts existed have no owner.
    pub user_id: Option<i64>,

    pub title: String,
    pub year: Option<i64>,
    pub rating: Option<f64>,

    /// Absolute URL or site-relative path of the poster image.
    pub poster: Option<String>,

    pub added_date: NaiveDateTime,
}

/// A movie joined with its watch event.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WatchedMovie {
    pub id: i64,
    pub title: String,
    pub year: Option<i64>,
    pub rating: Option<f64>,
    pub poster: Option<String>,
    pub date_watched: NaiveDateTime,
    pub points_earned: i64,
}

/// DTO for adding a movie to the watchlist.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMovieRequest {
    #[validate(length(min = 1, max = 300, message = "Title length must be between 1 and 300 chars"))]
    pub title: String,

    #[validate(range(min = 1870, max = 2200))]
    pub year: Option<i64>,

    #[validate(range(min = 0.0, max = 10.0, message = "Rating must be between 0 and 10"))]
    pub rating: Option<f64>,

    #[validate(length(max = 500), custom(function = validate_poster))]
    pub poster: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovieCreatedResponse {
    pub success: bool,
    pub movie_id: i64,
    pub message: String,
}

/// DTO for marking a movie as watched. `date_watched` defaults to now.
#[derive(Debug, Default, Deserialize)]
pub struct MarkWatchedRequest {
    pub date_watched: Option<String>,
}

/// Accepts absolute URLs and site-relative paths such as `/placeholder.svg`.
/// Blank input is allowed and replaced with the placeholder by the handler.
fn validate_poster(poster: &str) -> Result<(), validator::ValidationError> {
    if poster.trim().is_empty() {
        return Ok(());
    }
    if poster.starts_with('/') && !poster.starts_with("//") {
        return Ok(());
    }
    if Url::parse(poster).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
