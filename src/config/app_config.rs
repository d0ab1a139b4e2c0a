// ==========================================
// GICS 行业分类浏览系统 - 应用配置
// ==========================================
// 职责: 从环境变量加载运行配置（数据库路径/监听地址/默认数据集）
// 说明: 未设置的项使用内置默认值；格式错误的值回退默认并告警
// ==========================================

use chrono::NaiveDate;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

/// 环境变量键
pub mod env_keys {
    pub const DB_PATH: &str = "GICS_DB_PATH";
    pub const BIND_ADDR: &str = "GICS_BIND_ADDR";
    pub const DEFAULT_INGEST_URL: &str = "GICS_DEFAULT_INGEST_URL";
    pub const DEFAULT_LABEL: &str = "GICS_DEFAULT_LABEL";
    pub const DEFAULT_EFFECTIVE_DATE: &str = "GICS_DEFAULT_EFFECTIVE_DATE";
    pub const LOG_FORMAT: &str = "GICS_LOG_FORMAT";
}

/// 默认数据集: MSCI 2023-03-17 生效的结构表
pub const DEFAULT_INGEST_URL: &str = "https://www.msci.com/documents/1296102/29559863/GICS_structure_and_definitions_effective_close_of_March_17_2023.xlsx";
pub const DEFAULT_LABEL: &str = "2023-03-17";
pub const DEFAULT_EFFECTIVE_DATE: &str = "2023-03-17";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// 启动时自动导入的默认数据集
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultIngest {
    pub url: String,
    pub label: String,
    pub effective_date: NaiveDate,
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: String,
    pub bind_addr: SocketAddr,
    /// None 表示关闭启动时的默认导入
    pub default_ingest: Option<DefaultIngest>,
}

impl AppConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path = get(env_keys::DB_PATH).unwrap_or_else(get_default_db_path);

        let bind_addr = match get(env_keys::BIND_ADDR) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(value = %raw, error = %e, "监听地址格式错误，使用默认值");
                default_bind_addr()
            }),
            None => default_bind_addr(),
        };

        // URL 显式设为空串时关闭默认导入
        let url = match lookup(env_keys::DEFAULT_INGEST_URL) {
            Some(v) => v.trim().to_string(),
            None => DEFAULT_INGEST_URL.to_string(),
        };

        let default_ingest = if url.is_empty() {
            None
        } else {
            let label = get(env_keys::DEFAULT_LABEL).unwrap_or_else(|| DEFAULT_LABEL.to_string());
            let raw_date = get(env_keys::DEFAULT_EFFECTIVE_DATE)
                .unwrap_or_else(|| DEFAULT_EFFECTIVE_DATE.to_string());
            match NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d") {
                Ok(effective_date) => Some(DefaultIngest {
                    url,
                    label,
                    effective_date,
                }),
                Err(e) => {
                    warn!(value = %raw_date, error = %e, "默认数据集生效日期格式错误，关闭默认导入");
                    None
                }
            }
        };

        Self {
            db_path,
            bind_addr,
            default_ingest,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

/// 默认数据库路径
///
/// 优先使用用户数据目录（gics-explorer/gics.db），拿不到时回退到当前目录
pub fn get_default_db_path() -> String {
    let path = match dirs::data_dir() {
        Some(data_dir) => data_dir.join("gics-explorer").join("gics.db"),
        None => PathBuf::from("./gics.db"),
    };
    path.to_string_lossy().to_string()
}
