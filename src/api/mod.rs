// ==========================================
// GICS 行业分类浏览系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 HTTP 路由与命令行工具调用
// ==========================================

pub mod error;
pub mod taxonomy_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use taxonomy_api::{parse_effective_date, parse_level, write_csv, TaxonomyApi};
