// ==========================================
// GICS 行业分类浏览系统 - 核心库
// ==========================================
// 技术栈: axum + Rust + SQLite
// 系统定位: GICS 四级行业分类的导入、版本化存储与查询导出
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 运行配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    ExportTable, Industry, IndustryGroup, LeafRecord, NewVersion, Sector, SectorNode,
    SubIndustry, TaxonomyLevel, Version,
};

// 导入
pub use importer::{ImportError, IngestReport, TaxonomyImporter};

// API
pub use api::{ApiError, TaxonomyApi};

// 应用
pub use app::{build_router, AppState};
pub use config::AppConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "GICS 行业分类浏览系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
