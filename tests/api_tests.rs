// tests/api_tests.rs

use std::path::Path;

use movie_points::{
    config::{Config, SheetsConfig, StatsScope},
    db, routes,
    state::AppState,
};
use sqlx::SqlitePool;

struct TestApp {
    address: String,
    pool: SqlitePool,
    client: reqwest::Client,
}

fn test_config(export_dir: &Path, sheets: Option<SheetsConfig>) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        export_dir: export_dir.display().to_string(),
        stats_scope: StatsScope::Global,
        sheets,
    }
}

/// Spawns the app on a random port against a fresh in-memory database.
async fn spawn_app_with(config: Config) -> TestApp {
    let pool = db::memory_pool()
        .await
        .expect("Failed to create in-memory database");

    let state = AppState {
        pool: pool.clone(),
        config,
        http: reqwest::Client::new(),
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(&std::env::temp_dir(), None)).await
}

impl TestApp {
    /// Registers a fresh user and returns (username, token).
    async fn signup(&self) -> (String, String) {
        let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let password = "password123";

        let response = self
            .client
            .post(format!("{}/api/auth/register", self.address))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(response.status().as_u16(), 201);

        let login = self
            .client
            .post(format!("{}/api/auth/login", self.address))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json::<serde_json::Value>()
            .await
            .expect("Failed to parse login json");

        let token = login["token"].as_str().expect("Token not found").to_string();
        (username, token)
    }

    async fn add_movie(&self, token: &str, title: &str) -> i64 {
        let response = self
            .client
            .post(format!("{}/api/movies", self.address))
            .bearer_auth(token)
            .json(&serde_json::json!({ "title": title, "year": 1995, "rating": 8.3 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);

        let body: serde_json::Value = response.json().await.unwrap();
        body["movie_id"].as_i64().expect("movie_id missing")
    }

    async fn mark_watched(&self, token: &str, movie_id: i64, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/movies/{}/watched", self.address, movie_id))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get_json(&self, token: &str, path: &str) -> serde_json::Value {
        let response = self
            .client
            .get(format!("{}{}", self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200, "GET {}", path);
        response.json().await.unwrap()
    }
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = spawn_app().await;

    let health = app
        .client
        .get(format!("{}/api/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(health.status().as_u16(), 200);
    assert_eq!(health.json::<serde_json::Value>().await.unwrap()["status"], "ok");

    let missing = app
        .client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn register_login_and_duplicates() {
    let app = spawn_app().await;
    let (username, _token) = app.signup().await;

    let duplicate = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 409);

    let bad_password = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "username": username, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_password.status().as_u16(), 401);

    let users: Vec<serde_json::Value> = app
        .client
        .get(format!("{}/api/users", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], username);
    assert!(users[0].get("password").is_none());
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;

    // Username too short
    let response = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({ "username": "yo", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Whitespace is not allowed in usernames
    let response = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({ "username": "movie fan", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/api/movies/watchlist", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .get(format!("{}/api/stats/streak", app.address))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn watch_flow_awards_same_day_bonus_once() {
    let app = spawn_app().await;
    let (_, token) = app.signup().await;

    let movie_id = app.add_movie(&token, "Heat").await;

    let watchlist = app.get_json(&token, "/api/movies/watchlist").await;
    assert_eq!(watchlist["movies"].as_array().unwrap().len(), 1);
    assert_eq!(watchlist["movies"][0]["poster"], "/placeholder.svg");

    // Nothing to score until the movie is watched.
    let preview = app.get_json(&token, &format!("/api/movies/{}/bonus", movie_id)).await;
    assert_eq!(preview["bonus_points"], 0);
    assert_eq!(preview["error"], "Movie not found");

    let response = app.mark_watched(&token, movie_id, serde_json::json!({})).await;
    assert_eq!(response.status().as_u16(), 200);
    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["points_earned"], 50);
    assert_eq!(result["bonus_points"], 50);
    assert_eq!(result["total_points"], 100);
    assert_eq!(result["bonus_reasons"], serde_json::json!(["watched_same_day"]));

    // Second attempt is rejected and writes nothing.
    let again = app.mark_watched(&token, movie_id, serde_json::json!({})).await;
    assert_eq!(again.status().as_u16(), 409);

    let awards: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM point_awards WHERE movie_id = ?")
        .bind(movie_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(awards, 1);

    let watched = app.get_json(&token, "/api/movies/watched").await;
    assert_eq!(watched["movies"][0]["points_earned"], 100);
    assert!(app.get_json(&token, "/api/movies/watchlist").await["movies"]
        .as_array()
        .unwrap()
        .is_empty());

    let total = app.get_json(&token, "/api/stats/total-points").await;
    assert_eq!(total["total_points"], 100);

    let summary = app.get_json(&token, "/api/stats/summary").await;
    assert_eq!(summary["total_movies"], 1);
    assert_eq!(summary["watched_movies"], 1);
    assert_eq!(summary["unwatched_movies"], 0);

    let daily = app.get_json(&token, "/api/stats/daily").await;
    assert_eq!(daily["movies_today"], 1);
    assert_eq!(daily["points_today"], 100);
}

#[tokio::test]
async fn within_week_bonus_for_backdated_watchlist_entry() {
    let app = spawn_app().await;
    let (_, token) = app.signup().await;
    let movie_id = app.add_movie(&token, "Ronin").await;

    sqlx::query("UPDATE movies SET added_date = ? WHERE id = ?")
        .bind(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(18, 0, 0).unwrap())
        .bind(movie_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let response = app
        .mark_watched(&token, movie_id, serde_json::json!({ "date_watched": "2024-03-05T21:00:00" }))
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["bonus_points"], 30);
    assert_eq!(result["bonus_reasons"], serde_json::json!(["watched_within_week"]));

    let reason: String = sqlx::query_scalar("SELECT bonus_reason FROM point_awards WHERE movie_id = ?")
        .bind(movie_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(reason, "watched_within_week");
}

#[tokio::test]
async fn third_movie_of_the_day_gets_volume_bonus() {
    let app = spawn_app().await;
    let (_, token) = app.signup().await;

    let mut results = Vec::new();
    for title in ["One", "Two", "Three"] {
        let id = app.add_movie(&token, title).await;
        let response = app.mark_watched(&token, id, serde_json::json!({})).await;
        assert_eq!(response.status().as_u16(), 200);
        results.push(response.json::<serde_json::Value>().await.unwrap());
    }

    assert_eq!(results[1]["total_points"], 100);
    assert_eq!(results[2]["bonus_points"], 75);
    assert_eq!(results[2]["total_points"], 125);
    assert_eq!(
        results[2]["bonus_reasons"],
        serde_json::json!(["watched_same_day", "multiple_movies_day_3"])
    );

    let reason: String = sqlx::query_scalar(
        "SELECT bonus_reason FROM point_awards ORDER BY id DESC LIMIT 1",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(reason, "watched_same_day, multiple_movies_day_3");
}

#[tokio::test]
async fn cannot_touch_other_users_movies() {
    let app = spawn_app().await;
    let (_, owner) = app.signup().await;
    let (_, intruder) = app.signup().await;
    let movie_id = app.add_movie(&owner, "Thief").await;

    let response = app.mark_watched(&intruder, movie_id, serde_json::json!({})).await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .client
        .delete(format!("{}/api/movies/{}", app.address, movie_id))
        .bearer_auth(&intruder)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn bad_watch_date_is_rejected() {
    let app = spawn_app().await;
    let (_, token) = app.signup().await;
    let movie_id = app.add_movie(&token, "Collateral").await;

    let response = app
        .mark_watched(&token, movie_id, serde_json::json!({ "date_watched": "last tuesday" }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    // Still unwatched.
    let watchlist = app.get_json(&token, "/api/movies/watchlist").await;
    assert_eq!(watchlist["movies"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn removing_a_watched_movie_keeps_the_award_log() {
    let app = spawn_app().await;
    let (_, token) = app.signup().await;
    let movie_id = app.add_movie(&token, "Manhunter").await;
    app.mark_watched(&token, movie_id, serde_json::json!({})).await;

    let response = app
        .client
        .delete(format!("{}/api/movies/{}", app.address, movie_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let total = app.get_json(&token, "/api/stats/total-points").await;
    assert_eq!(total["total_points"], 0);

    let awards: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM point_awards")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(awards, 1);
}

#[tokio::test]
async fn empty_ledger_stats_are_zero() {
    let app = spawn_app().await;
    let (_, token) = app.signup().await;

    let daily = app.get_json(&token, "/api/stats/daily").await;
    assert_eq!(daily, serde_json::json!({ "movies_today": 0, "points_today": 0 }));

    let streak = app.get_json(&token, "/api/stats/streak").await;
    assert_eq!(streak, serde_json::json!({ "streak": 0 }));
}

#[tokio::test]
async fn streak_counts_consecutive_days() {
    let app = spawn_app().await;
    let (_, token) = app.signup().await;

    for date in ["2024-01-01T20:00:00", "2024-01-02T21:00:00", "2024-01-03T22:00:00"] {
        let id = app.add_movie(&token, date).await;
        let response = app.mark_watched(&token, id, serde_json::json!({ "date_watched": date })).await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let streak = app.get_json(&token, "/api/stats/streak").await;
    assert_eq!(streak, serde_json::json!({ "streak": 3, "last_watched": "2024-01-03" }));
}

#[tokio::test]
async fn leaderboard_lists_every_user() {
    let app = spawn_app().await;
    let (watcher, token) = app.signup().await;
    let (idle, _) = app.signup().await;

    let movie_id = app.add_movie(&token, "Heat").await;
    app.mark_watched(&token, movie_id, serde_json::json!({})).await;

    let board: serde_json::Value = app
        .client
        .get(format!("{}/api/leaderboard?period=week", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(board["period"], "week");
    let entries = board["leaderboard"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["username"], watcher);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["total_points"], 100);
    assert_eq!(entries[0]["movies_watched"], 1);
    assert_eq!(entries[1]["username"], idle);
    assert_eq!(entries[1]["total_points"], 0);

    let default_period: serde_json::Value = app
        .client
        .get(format!("{}/api/leaderboard", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(default_period["period"], "all_time");

    let bad = app
        .client
        .get(format!("{}/api/leaderboard?period=decade", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);
}

#[tokio::test]
async fn csv_export_writes_the_library() {
    let dir = tempfile::tempdir().unwrap();
    let app = spawn_app_with(test_config(dir.path(), None)).await;
    let (username, token) = app.signup().await;

    let watched_id = app.add_movie(&token, "Heat").await;
    app.mark_watched(&token, watched_id, serde_json::json!({})).await;
    app.add_movie(&token, "Thief").await;

    let response = app
        .client
        .post(format!("{}/api/export/csv", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);

    let path = dir.path().join(format!("movies_export_{}.csv", username));
    let csv = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Title,Year,Rating,Date,Points,Status");
    assert!(lines[1].starts_with("Heat,1995,8.3,"));
    assert!(lines[1].ends_with(",100,Watched"));
    assert!(lines[2].starts_with("Thief,1995,8.3,"));
    assert!(lines[2].ends_with(",0,Watchlist"));
}

#[tokio::test]
async fn sheets_export_requires_configuration() {
    let app = spawn_app().await;
    let (_, token) = app.signup().await;

    let response = app
        .client
        .post(format!("{}/api/export/sheets", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn blank_poster_falls_back_to_placeholder() {
    let app = spawn_app().await;
    let (_, token) = app.signup().await;

    let response = app
        .client
        .post(format!("{}/api/movies", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "Heat", "poster": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let watchlist = app.get_json(&token, "/api/movies/watchlist").await;
    assert_eq!(watchlist["movies"][0]["poster"], "/placeholder.svg");
}
