// ==========================================
// GICS 行业分类浏览系统 - HTTP 路由
// ==========================================
// 职责: axum 路由 → TaxonomyApi
// 接口:
// - GET  /api/health
// - GET  /api/versions
// - POST /api/ingest-url
// - GET  /api/tree/:version_id
// - GET  /api/export/:version_id/:level  (text/csv)
// 说明: SQLite 读取在阻塞线程池中执行，不占用异步工作线程
// ==========================================

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ApiError, ApiResult, TaxonomyApi};
use crate::app::state::AppState;
use crate::domain::{SectorNode, Version};
use std::sync::Arc;

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// URL 导入请求
#[derive(Debug, Deserialize)]
pub struct IngestUrlRequest {
    pub url: String,
    pub label: String,
    pub effective_date: String,
}

/// URL 导入响应
#[derive(Debug, Serialize)]
pub struct IngestUrlResponse {
    pub version_id: i64,
}

/// 构建应用路由
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/versions", get(list_versions))
        .route("/api/ingest-url", post(ingest_url))
        .route("/api/tree/:version_id", get(get_tree))
        .route("/api/export/:version_id/:level", get(export_level))
        .with_state(state)
}

/// 在阻塞线程池中执行同步查询
async fn run_blocking<T, F>(api: Arc<TaxonomyApi>, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&TaxonomyApi) -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&api))
        .await
        .map_err(|e| ApiError::InternalError(format!("查询任务异常终止: {}", e)))?
}

/// GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// GET /api/versions
pub async fn list_versions(State(state): State<AppState>) -> ApiResult<Json<Vec<Version>>> {
    let versions = run_blocking(state.taxonomy_api, |api| api.list_versions()).await?;
    Ok(Json(versions))
}

/// POST /api/ingest-url
pub async fn ingest_url(
    State(state): State<AppState>,
    Json(payload): Json<IngestUrlRequest>,
) -> ApiResult<Json<IngestUrlResponse>> {
    info!(
        url = %payload.url,
        label = %payload.label,
        effective_date = %payload.effective_date,
        "收到 URL 导入请求"
    );
    let report = state
        .taxonomy_api
        .ingest_url(&payload.url, &payload.label, &payload.effective_date)
        .await?;
    Ok(Json(IngestUrlResponse {
        version_id: report.version_id,
    }))
}

/// GET /api/tree/:version_id
pub async fn get_tree(
    State(state): State<AppState>,
    Path(version_id): Path<i64>,
) -> ApiResult<Json<Vec<SectorNode>>> {
    let tree = run_blocking(state.taxonomy_api, move |api| api.get_tree(version_id)).await?;
    Ok(Json(tree))
}

/// GET /api/export/:version_id/:level
pub async fn export_level(
    State(state): State<AppState>,
    Path((version_id, level)): Path<(i64, String)>,
) -> ApiResult<impl IntoResponse> {
    let body =
        run_blocking(state.taxonomy_api, move |api| api.export_csv(version_id, &level)).await?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body))
}
