// ==========================================
// GICS 行业分类浏览系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一建表入口（幂等），版本化分类表以 (code, version_id) 为主键
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::Path;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表语句
///
/// 说明：
/// - 下级表通过 (上级代码, version_id) 复合外键引用上级表，跨版本不会串联
/// - 父子顺序由导入流程保证，这里的外键只是兜底
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS gics_version (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL,
    effective_date TEXT NOT NULL,
    source_url TEXT,
    run_id TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS gics_sector (
    code2 TEXT NOT NULL,
    name TEXT NOT NULL,
    version_id INTEGER NOT NULL REFERENCES gics_version(id) ON DELETE CASCADE,
    PRIMARY KEY (code2, version_id)
);

CREATE TABLE IF NOT EXISTS gics_group (
    code4 TEXT NOT NULL,
    name TEXT NOT NULL,
    sector_code2 TEXT NOT NULL,
    version_id INTEGER NOT NULL REFERENCES gics_version(id) ON DELETE CASCADE,
    PRIMARY KEY (code4, version_id),
    FOREIGN KEY (sector_code2, version_id)
        REFERENCES gics_sector(code2, version_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS gics_industry (
    code6 TEXT NOT NULL,
    name TEXT NOT NULL,
    group_code4 TEXT NOT NULL,
    version_id INTEGER NOT NULL REFERENCES gics_version(id) ON DELETE CASCADE,
    PRIMARY KEY (code6, version_id),
    FOREIGN KEY (group_code4, version_id)
        REFERENCES gics_group(code4, version_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS gics_sub_industry (
    code8 TEXT NOT NULL,
    name TEXT NOT NULL,
    definition TEXT,
    industry_code6 TEXT NOT NULL,
    version_id INTEGER NOT NULL REFERENCES gics_version(id) ON DELETE CASCADE,
    PRIMARY KEY (code8, version_id),
    FOREIGN KEY (industry_code6, version_id)
        REFERENCES gics_industry(code6, version_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_gics_group_parent ON gics_group(version_id, sector_code2);
CREATE INDEX IF NOT EXISTS idx_gics_industry_parent ON gics_industry(version_id, group_code4);
CREATE INDEX IF NOT EXISTS idx_gics_sub_industry_parent ON gics_sub_industry(version_id, industry_code6);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
///
/// 数据库文件所在目录不存在时先创建
pub fn open_sqlite_connection(db_path: &str) -> RepositoryResult<Connection> {
    ensure_parent_directory(Path::new(db_path)).map_err(|e| {
        RepositoryError::DatabaseConnectionError(format!("无法创建数据库目录 {}: {}", db_path, e))
    })?;
    let conn = Connection::open(db_path)
        .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

fn ensure_parent_directory(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && parent != Path::new(".") => {
            std::fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}

/// 初始化 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
