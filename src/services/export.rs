// src/services/export.rs

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::{Value, json};

use crate::{
    config::SheetsConfig,
    error::AppError,
    models::movie::{Movie, WatchedMovie},
};

pub type Row = Vec<Value>;

/// A named table of rows, written to a sink as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

/// Destination for exported sheets.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Replaces whatever the sink holds under `sheet.name` with `sheet.rows`.
    async fn write_sheet(&self, sheet: &Sheet) -> Result<(), AppError>;

    /// Human-readable location of `sheet_name` once written (path or URL).
    fn location(&self, sheet_name: &str) -> String;
}

/// Writes each sheet to `<dir>/<name>.csv`.
pub struct CsvFileSink {
    dir: PathBuf,
}

impl CsvFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, sheet_name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", sheet_name))
    }
}

#[async_trait]
impl ExportSink for CsvFileSink {
    async fn write_sheet(&self, sheet: &Sheet) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let bytes = render_csv(&sheet.rows)?;
        let path = self.path_for(&sheet.name);
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(path = %path.display(), rows = sheet.rows.len(), "CSV export written");
        Ok(())
    }

    fn location(&self, sheet_name: &str) -> String {
        let path = self.path_for(sheet_name);
        std::path::absolute(&path)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Writes sheets as tabs of a Google spreadsheet via the Sheets v4 values API.
///
/// Every tab must already exist in the spreadsheet.
pub struct SheetsSink {
    client: reqwest::Client,
    config: SheetsConfig,
}

impl SheetsSink {
    pub fn new(client: reqwest::Client, config: SheetsConfig) -> Self {
        Self { client, config }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.spreadsheet_id,
            range
        )
    }
}

#[async_trait]
impl ExportSink for SheetsSink {
    async fn write_sheet(&self, sheet: &Sheet) -> Result<(), AppError> {
        self.client
            .post(format!("{}:clear", self.values_url(&sheet.name)))
            .bearer_auth(&self.config.access_token)
            .json(&json!({}))
            .send()
            .await?
            .error_for_status()?;

        let range = format!("{}!A1", sheet.name);
        self.client
            .put(self.values_url(&range))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.config.access_token)
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": sheet.rows,
            }))
            .send()
            .await?
            .error_for_status()?;

        tracing::info!(sheet = %sheet.name, rows = sheet.rows.len(), "Spreadsheet tab updated");
        Ok(())
    }

    fn location(&self, _sheet_name: &str) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}",
            self.config.spreadsheet_id
        )
    }
}

/// Writes every sheet in order, stopping at the first failure.
pub async fn export(sink: &dyn ExportSink, sheets: &[Sheet]) -> Result<(), AppError> {
    for sheet in sheets {
        sink.write_sheet(sheet).await?;
    }
    Ok(())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn render_csv(rows: &[Row]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.write_record(row.iter().map(cell_text))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}

fn timestamp(value: NaiveDateTime) -> Value {
    Value::String(value.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Single flat sheet with every movie, watched ones first.
pub fn library_sheet(name: &str, watched: &[WatchedMovie], watchlist: &[Movie]) -> Sheet {
    let mut rows: Vec<Row> = vec![
        ["Title", "Year", "Rating", "Date", "Points", "Status"]
            .into_iter()
            .map(Value::from)
            .collect(),
    ];

    rows.extend(watched.iter().map(|m| {
        vec![
            json!(m.title),
            json!(m.year),
            json!(m.rating),
            timestamp(m.date_watched),
            json!(m.points_earned),
            json!("Watched"),
        ]
    }));

    rows.extend(watchlist.iter().map(|m| {
        vec![
            json!(m.title),
            json!(m.year),
            json!(m.rating),
            timestamp(m.added_date),
            json!(0),
            json!("Watchlist"),
        ]
    }));

    Sheet {
        name: name.to_string(),
        rows,
    }
}

/// Three-tab workbook: watched movies with a total row, the watchlist, and a summary.
pub fn workbook(watched: &[WatchedMovie], watchlist: &[Movie]) -> Vec<Sheet> {
    let total_points: i64 = watched.iter().map(|m| m.points_earned).sum();

    let mut watched_rows: Vec<Row> = vec![
        ["Title", "Year", "Rating", "Date Watched", "Points"]
            .into_iter()
            .map(Value::from)
            .collect(),
    ];
    watched_rows.extend(watched.iter().map(|m| {
        vec![
            json!(m.title),
            json!(m.year),
            json!(m.rating),
            timestamp(m.date_watched),
            json!(m.points_earned),
        ]
    }));
    watched_rows.push(vec![json!(""), json!(""), json!(""), json!("TOTAL"), json!(total_points)]);

    let mut watchlist_rows: Vec<Row> = vec![
        ["Title", "Year", "Rating", "Date Added"]
            .into_iter()
            .map(Value::from)
            .collect(),
    ];
    watchlist_rows.extend(watchlist.iter().map(|m| {
        vec![
            json!(m.title),
            json!(m.year),
            json!(m.rating),
            timestamp(m.added_date),
        ]
    }));

    let average = if watched.is_empty() {
        0.0
    } else {
        (total_points as f64 / watched.len() as f64 * 100.0).round() / 100.0
    };

    let summary_rows: Vec<Row> = vec![
        vec![json!("Statistic"), json!("Value")],
        vec![json!("Total Movies"), json!(watched.len() + watchlist.len())],
        vec![json!("Watched"), json!(watched.len())],
        vec![json!("To Watch"), json!(watchlist.len())],
        vec![json!("Total Points"), json!(total_points)],
        vec![json!("Average Points per Movie"), json!(average)],
    ];

    vec![
        Sheet {
            name: "Watched".to_string(),
            rows: watched_rows,
        },
        Sheet {
            name: "Watchlist".to_string(),
            rows: watchlist_rows,
        },
        Sheet {
            name: "Summary".to_string(),
            rows: summary_rows,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn watched(title: &str, points: i64) -> WatchedMovie {
        WatchedMovie {
            id: 1,
            title: title.to_string(),
            year: Some(1999),
            rating: Some(8.5),
            poster: None,
            date_watched: at("2024-05-02 21:30:00"),
            points_earned: points,
        }
    }

    fn queued(title: &str) -> Movie {
        Movie {
            id: 2,
            user_id: Some(1),
            title: title.to_string(),
            year: None,
            rating: None,
            poster: None,
            added_date: at("2024-05-01 09:00:00"),
        }
    }

    #[test]
    fn library_csv_layout() {
        let sheet = library_sheet("movies_export_ana", &[watched("The Matrix, Reloaded", 130)], &[queued("Heat")]);
        let text = String::from_utf8(render_csv(&sheet.rows).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Title,Year,Rating,Date,Points,Status");
        assert_eq!(lines[1], "\"The Matrix, Reloaded\",1999,8.5,2024-05-02T21:30:00,130,Watched");
        assert_eq!(lines[2], "Heat,,,2024-05-01T09:00:00,0,Watchlist");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn workbook_totals_and_average() {
        let sheets = workbook(&[watched("A", 100), watched("B", 75), watched("C", 50)], &[queued("D")]);
        let names: Vec<_> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Watched", "Watchlist", "Summary"]);

        let total_row = sheets[0].rows.last().unwrap();
        assert_eq!(total_row[3], json!("TOTAL"));
        assert_eq!(total_row[4], json!(225));

        let summary = &sheets[2].rows;
        assert_eq!(summary[1], vec![json!("Total Movies"), json!(4)]);
        assert_eq!(summary[5], vec![json!("Average Points per Movie"), json!(75.0)]);
    }

    #[test]
    fn workbook_average_is_rounded_and_zero_when_empty() {
        let sheets = workbook(&[watched("A", 100), watched("B", 100), watched("C", 75)], &[]);
        assert_eq!(sheets[2].rows[5][1], json!(91.67));

        let sheets = workbook(&[], &[]);
        assert_eq!(sheets[2].rows[5][1], json!(0.0));
        assert_eq!(sheets[0].rows.len(), 2);
    }

    #[tokio::test]
    async fn csv_sink_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvFileSink::new(dir.path().join("exports"));
        let sheet = library_sheet("movies_export_ana", &[], &[queued("Heat")]);

        export(&sink, std::slice::from_ref(&sheet)).await.unwrap();

        let written = std::fs::read_to_string(sink.path_for("movies_export_ana")).unwrap();
        assert!(written.starts_with("Title,Year,Rating,Date,Points,Status\n"));
        assert!(written.contains("Heat"));
        assert!(sink.location("movies_export_ana").ends_with("movies_export_ana.csv"));
    }
}
