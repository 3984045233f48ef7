// src/handlers/export.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    services::{
        export::{self, CsvFileSink, ExportSink, SheetsSink},
        library,
    },
    utils::jwt::Claims,
};

/// Writes the caller's whole library to `<EXPORT_DIR>/movies_export_<username>.csv`.
pub async fn export_csv(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let watched = library::watched(&pool, user_id).await?;
    let watchlist = library::watchlist(&pool, user_id).await?;

    let name = format!("movies_export_{}", claims.username);
    let sheet = export::library_sheet(&name, &watched, &watchlist);

    let sink = CsvFileSink::new(&config.export_dir);
    export::export(&sink, std::slice::from_ref(&sheet)).await?;

    let filename = sink.location(&name);
    Ok(Json(json!({
        "success": true,
        "filename": filename,
        "message": format!("Exported {} movies to {}", sheet.rows.len() - 1, filename),
    })))
}

/// Writes the caller's library to the configured Google spreadsheet.
pub async fn export_sheets(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(http): State<reqwest::Client>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let sheets_config = config.sheets.clone().ok_or_else(|| {
        AppError::BadRequest(
            "Spreadsheet export is not configured: set SHEETS_SPREADSHEET_ID and SHEETS_ACCESS_TOKEN"
                .to_string(),
        )
    })?;

    let user_id = claims.user_id()?;
    let watched = library::watched(&pool, user_id).await?;
    let watchlist = library::watchlist(&pool, user_id).await?;

    let sink = SheetsSink::new(http, sheets_config);
    export::export(&sink, &export::workbook(&watched, &watchlist)).await?;

    let url = sink.location("Watched");
    Ok(Json(json!({
        "success": true,
        "url": url,
        "message": format!("Exported to {}", url),
    })))
}
