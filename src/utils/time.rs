// src/utils/time.rs

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use crate::error::AppError;

/// Server-local wall clock, the reference for "today" and default timestamps.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Parses a client-supplied timestamp into server-local time.
///
/// Accepts RFC 3339 (converted to local time), naive ISO-8601 with `T` or space
/// separator, and a bare date (midnight).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, AppError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| AppError::BadRequest(format!("Invalid date_watched '{}'", raw)))
}
