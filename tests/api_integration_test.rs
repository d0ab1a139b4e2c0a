// ==========================================
// HTTP API 集成测试
// ==========================================
// 测试目标: 通过 axum Router 验证接口状态码与响应体
// 下载器替换为内存实现，不访问网络
// ==========================================


use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gics_explorer::api::ApiError;
use gics_explorer::config::DefaultIngest;
use gics_explorer::importer::SourceFormat;
use gics_explorer::{build_router, logging, AppState};
use serde_json::{json, Value};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};
use test_helpers::{create_test_db, write_temp_file, StubFetcher, HEADERED_CSV};
use tower::ServiceExt;

const SAMPLE_URL: &str = "http://fixtures.local/gics.csv";

fn test_state(db_path: &str) -> AppState {
    let fetcher = StubFetcher::default().with(SAMPLE_URL, HEADERED_CSV);
    AppState::with_fetcher(db_path, Arc::new(fetcher)).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post_ingest(app: &Router, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/ingest-url")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health() {
    let db = create_test_db().unwrap();
    let app = build_router(test_state(&db.db_path));

    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ingest_url_then_versions_and_tree() {
    logging::init_test();
    let db = create_test_db().unwrap();
    let app = build_router(test_state(&db.db_path));

    let (status, body) = post_ingest(
        &app,
        json!({"url": SAMPLE_URL, "label": "sample", "effective_date": "2024-01-01"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let vid = body["version_id"].as_i64().unwrap();

    let (status, versions) = get_json(&app, "/api/versions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(versions[0]["id"], vid);
    assert_eq!(versions[0]["label"], "sample");
    assert_eq!(versions[0]["effective_date"], "2024-01-01");
    assert_eq!(versions[0]["source_url"], SAMPLE_URL);

    let (status, tree) = get_json(&app, &format!("/api/tree/{}", vid)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree[0]["code"], "10");
    assert_eq!(tree[0]["groups"][0]["code"], "1010");
    assert_eq!(tree[0]["groups"][0]["industries"][0]["subs"][0]["code"], "10101010");
    assert_eq!(tree[1]["code"], "15");
}

#[tokio::test]
async fn test_ingest_url_download_failure() {
    let db = create_test_db().unwrap();
    let app = build_router(test_state(&db.db_path));

    let (status, body) = post_ingest(
        &app,
        json!({"url": "http://fixtures.local/missing.xlsx", "label": "x", "effective_date": "2024-01-01"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("download failed"));
    assert_eq!(db.count("SELECT COUNT(*) FROM gics_version"), 0);
}

#[tokio::test]
async fn test_ingest_url_rejects_bad_date() {
    let db = create_test_db().unwrap();
    let app = build_router(test_state(&db.db_path));

    let (status, _) = post_ingest(
        &app,
        json!({"url": SAMPLE_URL, "label": "x", "effective_date": "March 2024"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(db.count("SELECT COUNT(*) FROM gics_version"), 0);
}

#[tokio::test]
async fn test_export_csv() {
    let db = create_test_db().unwrap();
    let app = build_router(test_state(&db.db_path));
    let (_, body) = post_ingest(
        &app,
        json!({"url": SAMPLE_URL, "label": "sample", "effective_date": "2024-01-01"}),
    )
    .await;
    let vid = body["version_id"].as_i64().unwrap();

    let request = Request::builder()
        .uri(format!("/api/export/{}/group", vid))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut reader = csv::Reader::from_reader(body.as_ref());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["code4", "name", "sector_code2"]);
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "1010");
    assert_eq!(&rows[1][2], "15");
}

#[tokio::test]
async fn test_export_unknown_level_and_version() {
    let db = create_test_db().unwrap();
    let app = build_router(test_state(&db.db_path));
    let (_, body) = post_ingest(
        &app,
        json!({"url": SAMPLE_URL, "label": "sample", "effective_date": "2024-01-01"}),
    )
    .await;
    let vid = body["version_id"].as_i64().unwrap();

    let (status, _) = get_json(&app, &format!("/api/export/{}/division", vid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/api/export/999/sector").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(&app, "/api/tree/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bootstrap_seeds_only_empty_store() {
    let db = create_test_db().unwrap();
    let state = test_state(&db.db_path);
    let default_ingest = DefaultIngest {
        url: SAMPLE_URL.to_string(),
        label: "default".to_string(),
        effective_date: chrono::NaiveDate::from_ymd_opt(2023, 3, 17).unwrap(),
    };

    let first = state.bootstrap_default_dataset(Some(&default_ingest)).await;
    assert!(first.is_some());

    let second = state.bootstrap_default_dataset(Some(&default_ingest)).await;
    assert!(second.is_none());
    assert_eq!(db.count("SELECT COUNT(*) FROM gics_version"), 1);
}

#[tokio::test]
async fn test_bootstrap_failure_does_not_panic() {
    let db = create_test_db().unwrap();
    let state = test_state(&db.db_path);
    let default_ingest = DefaultIngest {
        url: "http://fixtures.local/offline.xlsx".to_string(),
        label: "default".to_string(),
        effective_date: chrono::NaiveDate::from_ymd_opt(2023, 3, 17).unwrap(),
    };

    assert!(state.bootstrap_default_dataset(Some(&default_ingest)).await.is_none());
    assert_eq!(db.count("SELECT COUNT(*) FROM gics_version"), 0);
}

#[test]
fn test_ingest_file_with_format_override() {
    let db = create_test_db().unwrap();
    let state = test_state(&db.db_path);
    assert_eq!(state.get_db_path(), db.db_path);
    let (_file, path) = write_temp_file(HEADERED_CSV, ".dat").unwrap();

    // 扩展名无法识别
    let result = state
        .taxonomy_api
        .ingest_file(&path, None, "local", "2024-01-01", None);
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    let report = state
        .taxonomy_api
        .ingest_file(&path, Some(SourceFormat::Csv), "local", "2024-01-01", Some("file://local"))
        .unwrap();
    assert_eq!(report.records, 3);

    let versions = state.taxonomy_api.list_versions().unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].id, report.version_id);
    assert_eq!(versions[0].source_url.as_deref(), Some("file://local"));
}

#[tokio::test]
async fn test_reads_wait_off_the_async_runtime() {
    let db = create_test_db().unwrap();
    let fetcher = Arc::new(StubFetcher::default());
    let state = AppState::from_connection(db.conn.clone(), fetcher).unwrap();
    let app = build_router(state);

    // 另一线程占住连接锁，模拟进行中的导入
    let conn = db.conn.clone();
    let (locked_tx, locked_rx) = mpsc::channel();
    let holder = std::thread::spawn(move || {
        let _guard = conn.lock().unwrap();
        locked_tx.send(()).unwrap();
        std::thread::sleep(Duration::from_millis(400));
    });
    locked_rx.recv().unwrap();

    let start = Instant::now();
    let health = async {
        let (status, _) = get_json(&app, "/api/health").await;
        (status, start.elapsed())
    };
    let ((versions_status, versions), (health_status, health_elapsed)) =
        tokio::join!(get_json(&app, "/api/versions"), health);

    assert_eq!(health_status, StatusCode::OK);
    assert!(health_elapsed < Duration::from_millis(300));
    assert_eq!(versions_status, StatusCode::OK);
    assert_eq!(versions, json!([]));
    holder.join().unwrap();
}
