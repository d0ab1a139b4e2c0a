// ==========================================
// GICS 行业分类浏览系统 - 应用层
// ==========================================
// 职责: HTTP 集成,连接 API 层与网络
// ==========================================

pub mod routes;
pub mod state;

// 重导出
pub use routes::build_router;
pub use state::AppState;
