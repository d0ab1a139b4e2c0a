// ==========================================
// GICS 行业分类浏览系统 - 配置层
// ==========================================
// 职责: 运行配置加载（环境变量 + 内置默认值）
// ==========================================

pub mod app_config;

// 重导出核心配置
pub use app_config::{env_keys, get_default_db_path, AppConfig, DefaultIngest};
