// ==========================================
// GICS 行业分类浏览系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换 Repository/Import 错误为用户可读的错误消息
// HTTP: 实现 IntoResponse，响应体为 {"detail": "..."}
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("download failed: {0}")]
    SourceFetchFailed(String),

    #[error("数据源为空: {0}")]
    EmptySource(String),

    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::SourceFetchFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::EmptySource(_) | ApiError::ImportError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::DatabaseError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::SourceFetch { url, message } => {
                ApiError::SourceFetchFailed(format!("{}: {}", url, message))
            }
            ImportError::EmptySource(msg) => ApiError::EmptySource(msg),
            ImportError::InvalidEffectiveDate(raw) => {
                ApiError::InvalidInput(format!("effective_date 格式错误: {}", raw))
            }
            ImportError::UnsupportedFormat(ext) => {
                ApiError::InvalidInput(format!("不支持的文件格式: {}", ext))
            }
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件不存在: {}", path)),
            ImportError::Repository(repo_err) => ApiError::from(repo_err),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "请求处理失败");
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
