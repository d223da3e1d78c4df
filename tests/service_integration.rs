//! HTTP client, range orchestration, and service-backed CLI commands against
//! an in-process mock computation service.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use kp_transit::client::{ComputationService, HttpService, ServiceError};
use kp_transit::range::{run_range, RangeOptions};
use kp_transit_core::models::FULL_SWEEP_BUCKETS;
use kp_transit_core::request::{parse_date, CalculationRequest, Location};
use kp_transit_core::{KpError, ResultDocument, Sample, SearchCriteria, SearchField, SearchOutcome};

const LORDS: [&str; 9] = [
    "Ketu", "Venus", "Sun", "Moon", "Mars", "Rahu", "Jupiter", "Saturn", "Mercury",
];

// ─── Mock service ───────────────────────────────────────────────────

#[derive(Default)]
struct MockState {
    /// Dates answered with a 500.
    fail_dates: Vec<String>,
    /// Dates answered only after a long delay.
    slow_dates: Vec<String>,
    requests: Mutex<Vec<CalculationRequest>>,
    queries: Mutex<Vec<HashMap<String, String>>>,
}

fn sweep(date: &str) -> Vec<Sample> {
    (0..FULL_SWEEP_BUCKETS)
        .map(|i| Sample {
            degree: i as f64 * 0.5,
            ascendant_degree: i as f64 * 0.5,
            date: date.to_string(),
            time: format!("{:02}:{:02}:00", 6 + i / 60, i % 60),
            sign: if i < 360 { "Aries" } else { "Libra" }.to_string(),
            sign_lord: if i < 360 { "Mars" } else { "Venus" }.to_string(),
            nakshatra: format!("Nak{}", i / 27),
            nakshatra_lord: LORDS[(i / 27) % 9].to_string(),
            sub_lord: LORDS[(i / 3) % 9].to_string(),
            sub_sub_lord: LORDS[i % 9].to_string(),
            change_type: None,
        })
        .collect()
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "message": "mock ephemeris"}))
}

async fn calculate(
    State(state): State<Arc<MockState>>,
    Json(req): Json<CalculationRequest>,
) -> Response {
    state.requests.lock().unwrap().push(req.clone());

    if state.fail_dates.contains(&req.date) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "ephemeris failure").into_response();
    }
    if state.slow_dates.contains(&req.date) {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    let samples = if req.include_degree_buckets {
        sweep(&req.date)
    } else {
        Vec::new()
    };
    let mut doc = ResultDocument::new(req.latitude, req.longitude, req.date.clone(), samples);
    doc.sunrise = Some("06:00:00".to_string());
    doc.ascendant_sign = Some("Aries".to_string());
    doc.ascendant_nakshatra = Some("Nak0".to_string());
    Json(doc).into_response()
}

async fn search_astrological(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.queries.lock().unwrap().push(params.clone());

    let mut criteria = SearchCriteria::default();
    for field in SearchField::ALL {
        if let Some(v) = params.get(field.as_str()) {
            criteria = criteria.with(field, v.clone());
        }
    }
    if criteria.is_empty() {
        return (StatusCode::BAD_REQUEST, "at least one criterion").into_response();
    }
    let results: Vec<Sample> = sweep("2025-08-20")
        .into_iter()
        .filter(|s| {
            criteria.entries().all(|(f, v)| {
                f.value(s).to_lowercase().contains(&v.to_lowercase())
            })
        })
        .collect();
    Json(SearchOutcome {
        total_results: results.len(),
        search_criteria: criteria,
        results,
    })
    .into_response()
}

async fn start_mock(state: Arc<MockState>) -> String {
    let app = Router::new()
        .route("/health", get(health))
        .route("/calculate", post(calculate))
        .route("/search-astrological", get(search_astrological))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    wait_for_server(port).await;
    format!("http://127.0.0.1:{}", port)
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("Mock service did not become ready within 5 seconds");
}

fn client(base_url: &str, timeout: Duration) -> HttpService {
    HttpService::new(base_url, timeout).unwrap()
}

fn request(date: &str, buckets: bool) -> CalculationRequest {
    CalculationRequest::new(
        Location::new(19.076, 72.8777).unwrap(),
        parse_date(date).unwrap(),
        buckets,
    )
}

// ─── Client ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let base = start_mock(Arc::new(MockState::default())).await;
    let health = client(&base, Duration::from_secs(5)).health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.message.as_deref(), Some("mock ephemeris"));
}

#[tokio::test]
async fn test_calculate_full_sweep() {
    let state = Arc::new(MockState::default());
    let base = start_mock(state.clone()).await;

    let doc = client(&base, Duration::from_secs(5))
        .calculate(&request("2025-08-20", true))
        .await
        .unwrap();
    assert!(doc.is_full_sweep());
    assert_eq!(doc.samples()[1].degree, 0.5);
    assert_eq!(doc.sunrise.as_deref(), Some("06:00:00"));

    let seen = state.requests.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].date, "2025-08-20");
    assert!(seen[0].include_degree_buckets);
    assert_eq!(seen[0].latitude, 19.076);
}

#[tokio::test]
async fn test_calculate_without_buckets() {
    let base = start_mock(Arc::new(MockState::default())).await;
    let doc = client(&base, Duration::from_secs(5))
        .calculate(&request("2025-08-20", false))
        .await
        .unwrap();
    assert!(doc.samples().is_empty());
}

#[tokio::test]
async fn test_calculate_status_error() {
    let state = Arc::new(MockState {
        fail_dates: vec!["2025-01-03".to_string()],
        ..Default::default()
    });
    let base = start_mock(state).await;

    let err = client(&base, Duration::from_secs(5))
        .calculate(&request("2025-01-03", true))
        .await
        .unwrap_err();
    match &err {
        ServiceError::Status { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "ephemeris failure");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_calculate_unreachable_service() {
    let err = client("http://127.0.0.1:9", Duration::from_secs(2))
        .calculate(&request("2025-01-01", true))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Http(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_search_sends_only_non_blank_criteria() {
    let state = Arc::new(MockState::default());
    let base = start_mock(state.clone()).await;

    let criteria = SearchCriteria::default()
        .with(SearchField::SubSubLord, " mercury ")
        .with(SearchField::Sign, "")
        .with(SearchField::NakshatraLord, "ketu");
    let outcome = client(&base, Duration::from_secs(5))
        .search_astrological(&criteria)
        .await
        .unwrap();

    let queries = state.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].len(), 2);
    assert_eq!(queries[0]["sub_sub_lord"], "mercury");
    assert_eq!(queries[0]["nakshatra_lord"], "ketu");

    assert_eq!(outcome.total_results, outcome.results.len());
    assert!(outcome.total_results > 0);
    assert!(outcome
        .results
        .iter()
        .all(|s| s.sub_sub_lord == "Mercury" && s.nakshatra_lord == "Ketu"));
}

#[tokio::test]
async fn test_search_empty_criteria_never_sent() {
    let state = Arc::new(MockState::default());
    let base = start_mock(state.clone()).await;

    let err = client(&base, Duration::from_secs(5))
        .search_astrological(&SearchCriteria::default().with(SearchField::Sign, "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Input(KpError::EmptyCriteria)));
    assert!(state.queries.lock().unwrap().is_empty());
}

// ─── Range orchestration ────────────────────────────────────────────

fn dates(docs: &[ResultDocument]) -> Vec<&str> {
    docs.iter().map(|d| d.date.as_str()).collect()
}

#[tokio::test]
async fn test_range_skips_failed_day() {
    let state = Arc::new(MockState {
        fail_dates: vec!["2025-01-03".to_string()],
        ..Default::default()
    });
    let base = start_mock(state.clone()).await;
    let svc = client(&base, Duration::from_secs(5));

    let docs = run_range(
        &svc,
        Location::new(19.076, 72.8777).unwrap(),
        parse_date("2025-01-01").unwrap(),
        parse_date("2025-01-05").unwrap(),
        &RangeOptions::default(),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(
        dates(&docs),
        vec!["2025-01-01", "2025-01-02", "2025-01-04", "2025-01-05"]
    );
    assert!(docs.iter().all(|d| d.is_full_sweep()));

    let mut requested: Vec<String> = state
        .requests
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.date.clone())
        .collect();
    requested.sort();
    assert_eq!(
        requested,
        vec!["2025-01-01", "2025-01-02", "2025-01-03", "2025-01-04", "2025-01-05"]
    );
}

#[tokio::test]
async fn test_range_timeout_is_a_skip() {
    let state = Arc::new(MockState {
        slow_dates: vec!["2025-02-02".to_string()],
        ..Default::default()
    });
    let base = start_mock(state).await;
    let svc = client(&base, Duration::from_millis(500));

    let options = RangeOptions {
        include_degree_buckets: false,
        concurrency: 2,
    };
    let docs = run_range(
        &svc,
        Location::new(0.0, 0.0).unwrap(),
        parse_date("2025-02-01").unwrap(),
        parse_date("2025-02-03").unwrap(),
        &options,
        &CancellationToken::new(),
    )
    .await;
    assert_eq!(dates(&docs), vec!["2025-02-01", "2025-02-03"]);
}

// ─── CLI against the mock ───────────────────────────────────────────

fn kpt_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("kpt");
    path
}

async fn run_kpt(args: Vec<String>) -> (String, String, bool) {
    tokio::task::spawn_blocking(move || {
        let output = Command::new(kpt_binary())
            .args(&args)
            .output()
            .expect("failed to run kpt");
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.success(),
        )
    })
    .await
    .unwrap()
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_cli_health() {
    let base = start_mock(Arc::new(MockState::default())).await;
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("absent.toml");

    let (stdout, stderr, success) = run_kpt(args(&[
        "--config",
        config.to_str().unwrap(),
        "--service-url",
        &base,
        "health",
    ]))
    .await;
    assert!(success, "health failed: {}", stderr);
    assert!(stdout.contains(": healthy"));
}

#[tokio::test]
async fn test_cli_calculate_prints_history() {
    let base = start_mock(Arc::new(MockState::default())).await;
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("kpt.toml");
    std::fs::write(
        &config,
        format!("[service]\nbase_url = \"{}\"\n\n[history]\ncapacity = 2\n", base),
    )
    .unwrap();
    let out = tmp.path().join("out");

    let (stdout, stderr, success) = run_kpt(args(&[
        "--config",
        config.to_str().unwrap(),
        "calculate",
        "--lat",
        "19.076",
        "--lon",
        "72.8777",
        "--date",
        "2025-08-20",
        "--date",
        "2025-08-21",
        "--date",
        "2025-08-22",
        "--out-dir",
        out.to_str().unwrap(),
    ]))
    .await;
    assert!(success, "calculate failed: {}", stderr);
    assert!(stdout.contains("History (2 of 2 kept, newest first):"));
    let history: Vec<&str> = stdout
        .lines()
        .skip_while(|l| !l.starts_with("History"))
        .skip(1)
        .collect();
    assert_eq!(history.len(), 2);
    assert!(history[0].trim_start().starts_with("2025-08-22"));
    assert!(history[1].trim_start().starts_with("2025-08-21"));
    assert!(stdout.contains("720 buckets"));
    assert!(out
        .join("ascendant_changes_2025-08-20_19.076_72.8777.json")
        .exists());
}

#[tokio::test]
async fn test_cli_range_writes_days_and_skips_failures() {
    let state = Arc::new(MockState {
        fail_dates: vec!["2025-01-03".to_string()],
        ..Default::default()
    });
    let base = start_mock(state).await;
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("absent.toml");
    let out = tmp.path().join("range");

    let (stdout, stderr, success) = run_kpt(args(&[
        "--config",
        config.to_str().unwrap(),
        "--service-url",
        &base,
        "range",
        "--lat",
        "19.076",
        "--lon",
        "72.8777",
        "--start",
        "2025-01-01",
        "--end",
        "2025-01-05",
        "--no-buckets",
        "--progress",
        "json",
        "--out-dir",
        out.to_str().unwrap(),
    ]))
    .await;
    assert!(success, "range failed: {}", stderr);
    assert!(stdout.contains("2025-01-03  skipped: service returned 500: ephemeris failure"));

    let mut files: Vec<String> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            "ascendant_changes_2025-01-01_19.076_72.8777.json",
            "ascendant_changes_2025-01-02_19.076_72.8777.json",
            "ascendant_changes_2025-01-04_19.076_72.8777.json",
            "ascendant_changes_2025-01-05_19.076_72.8777.json",
        ]
    );

    let done = stderr
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .find(|v| v["event"] == "done")
        .expect("missing done event");
    assert_eq!(done["fetched"], 4);
    assert_eq!(done["skipped"], 1);
}

#[tokio::test]
async fn test_cli_remote_lookup() {
    let base = start_mock(Arc::new(MockState::default())).await;
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("absent.toml");

    let (stdout, stderr, success) = run_kpt(args(&[
        "--config",
        config.to_str().unwrap(),
        "--service-url",
        &base,
        "lookup",
        "--remote",
        "--sign",
        "libra",
        "--sub-sub-lord",
        "sun",
        "--json",
    ]))
    .await;
    assert!(success, "remote lookup failed: {}", stderr);
    let outcome: SearchOutcome = serde_json::from_str(&stdout).unwrap();
    // Libra covers buckets 360..720; sub-sub Sun every 9th bucket from 2.
    assert_eq!(outcome.total_results, 40);
    assert!(outcome.results.iter().all(|s| s.sign == "Libra" && s.sub_sub_lord == "Sun"));
}
