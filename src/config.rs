// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Which slice of the ledger the streak, daily stats and volume bonus look at.
///
/// Historically every one of these scanned the whole ledger. Whether they should be
/// per-user is an open product decision, so it is a deployment setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope {
    Global,
    PerUser,
}

impl StatsScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "global" => Some(StatsScope::Global),
            "user" | "per_user" => Some(StatsScope::PerUser),
            _ => None,
        }
    }
}

/// Google Sheets target for the spreadsheet export.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub api_base: String,
    pub spreadsheet_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub export_dir: String,
    pub stats_scope: StatsScope,
    pub sheets: Option<SheetsConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://movies.db".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let export_dir = env::var("EXPORT_DIR")
            .unwrap_or_else(|_| "exports".to_string());

        let stats_scope = match env::var("STATS_SCOPE") {
            Ok(raw) => StatsScope::parse(&raw)
                .unwrap_or_else(|| panic!("STATS_SCOPE must be 'global' or 'user', got '{}'", raw)),
            Err(_) => StatsScope::Global,
        };

        let sheets = match (
            env::var("SHEETS_SPREADSHEET_ID"),
            env::var("SHEETS_ACCESS_TOKEN"),
        ) {
            (Ok(spreadsheet_id), Ok(access_token)) => Some(SheetsConfig {
                api_base: env::var("SHEETS_API_BASE")
                    .unwrap_or_else(|_| "https://sheets.googleapis.com/v4".to_string()),
                spreadsheet_id,
                access_token,
            }),
            _ => None,
        };

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            cors_origins,
            export_dir,
            stats_scope,
            sheets,
        }
    }
}
