// ==========================================
// GICS 行业分类浏览系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 单元格/孤立实体问题在本地恢复，不进入错误类型
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 来源相关错误 =====
    #[error("数据源为空: {0}")]
    EmptySource(String),

    #[error("工作簿下载失败 ({url}): {message}")]
    SourceFetch { url: String, message: String },

    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.xlsm/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 参数错误 =====
    #[error("生效日期格式错误: 期望 YYYY-MM-DD，实际 {0}")]
    InvalidEffectiveDate(String),

    // ===== 存储错误 =====
    #[error("存储写入失败: {0}")]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<reqwest::Error>（下载失败，不重试）
impl From<reqwest::Error> for ImportError {
    fn from(err: reqwest::Error) -> Self {
        ImportError::SourceFetch {
            url: err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            message: err.to_string(),
        }
    }
}

// 实现 From<rusqlite::Error>（经由仓储层错误归类）
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Repository(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
