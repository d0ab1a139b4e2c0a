// ==========================================
// GICS 行业分类浏览系统 - 分类数据仓储
// ==========================================
// 职责: 版本查询、分类树查询、按层级导出、导入事务
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化，表名/列名只来自 TaxonomyLevel 常量
// ==========================================

use crate::domain::{
    ExportTable, GroupNode, Industry, IndustryGroup, IndustryNode, Sector, SectorNode,
    SubIndustry, SubIndustryNode, TaxonomyLevel, Version,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::taxonomy_writer::SqliteTaxonomyWriter;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// VersionRepository - 版本仓储
// ==========================================
pub struct VersionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl VersionRepository {
    /// 创建新的VersionRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询所有版本（按ID升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Version>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, label, effective_date, source_url
               FROM gics_version
               ORDER BY id"#,
        )?;

        let versions = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<Version>, _>>()?;

        Ok(versions)
    }

    /// 版本总数（启动时判断是否需要默认导入）
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM gics_version", [], |row| row.get(0))?;
        Ok(count)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Version> {
        Ok(Version {
            id: row.get(0)?,
            label: row.get(1)?,
            effective_date: row.get(2)?,
            source_url: row.get(3)?,
        })
    }
}

// ==========================================
// TaxonomyRepository - 分类实体仓储
// ==========================================
pub struct TaxonomyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TaxonomyRepository {
    /// 创建新的TaxonomyRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在单个事务中执行一次导入
    ///
    /// # 说明
    /// - 闭包返回 Err 时事务不提交，版本行与所有实体一并回滚
    /// - 持有连接锁直到提交，同一连接上的导入天然串行
    pub fn in_ingest_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut SqliteTaxonomyWriter<'_>) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut writer = SqliteTaxonomyWriter::new(tx);
        let out = f(&mut writer)?;
        writer.commit()?;
        Ok(out)
    }

    /// 校验版本存在
    fn ensure_version(&self, version_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM gics_version WHERE id = ?",
                params![version_id],
                |row| row.get(0),
            )
            .optional()?;

        match exists {
            Some(_) => Ok(()),
            None => Err(RepositoryError::version_not_found(version_id)),
        }
    }

    // ===== 按层级查询（按代码排序） =====

    pub fn list_sectors(&self, version_id: i64) -> RepositoryResult<Vec<Sector>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT code2, name, version_id FROM gics_sector WHERE version_id = ? ORDER BY code2",
        )?;
        let rows = stmt
            .query_map(params![version_id], |row| {
                Ok(Sector {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    version_id: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_groups(&self, version_id: i64) -> RepositoryResult<Vec<IndustryGroup>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT code4, name, sector_code2, version_id
               FROM gics_group WHERE version_id = ? ORDER BY code4"#,
        )?;
        let rows = stmt
            .query_map(params![version_id], |row| {
                Ok(IndustryGroup {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    sector_code: row.get(2)?,
                    version_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_industries(&self, version_id: i64) -> RepositoryResult<Vec<Industry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT code6, name, group_code4, version_id
               FROM gics_industry WHERE version_id = ? ORDER BY code6"#,
        )?;
        let rows = stmt
            .query_map(params![version_id], |row| {
                Ok(Industry {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    group_code: row.get(2)?,
                    version_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_sub_industries(&self, version_id: i64) -> RepositoryResult<Vec<SubIndustry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT code8, name, definition, industry_code6, version_id
               FROM gics_sub_industry WHERE version_id = ? ORDER BY code8"#,
        )?;
        let rows = stmt
            .query_map(params![version_id], |row| {
                Ok(SubIndustry {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    definition: row.get(2)?,
                    industry_code: row.get(3)?,
                    version_id: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 某版本某层级的实体数量
    pub fn count_level(&self, version_id: i64, level: TaxonomyLevel) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE version_id = ?",
            level.table_name()
        );
        let count = conn.query_row(&sql, params![version_id], |row| row.get(0))?;
        Ok(count)
    }

    // ===== 树形查询 =====

    /// 构建分类树
    ///
    /// # 返回
    /// - `Ok(Vec<SectorNode>)`: 各层按代码排序（版本存在但为空时返回空树）
    /// - `Err(NotFound)`: 版本不存在
    pub fn build_tree(&self, version_id: i64) -> RepositoryResult<Vec<SectorNode>> {
        self.ensure_version(version_id)?;

        let mut subs_by_industry: HashMap<String, Vec<SubIndustryNode>> = HashMap::new();
        for sub in self.list_sub_industries(version_id)? {
            subs_by_industry
                .entry(sub.industry_code)
                .or_default()
                .push(SubIndustryNode {
                    code: sub.code,
                    name: sub.name,
                    definition: sub.definition,
                });
        }

        let mut industries_by_group: HashMap<String, Vec<IndustryNode>> = HashMap::new();
        for industry in self.list_industries(version_id)? {
            let subs = subs_by_industry.remove(&industry.code).unwrap_or_default();
            industries_by_group
                .entry(industry.group_code)
                .or_default()
                .push(IndustryNode {
                    code: industry.code,
                    name: industry.name,
                    subs,
                });
        }

        let mut groups_by_sector: HashMap<String, Vec<GroupNode>> = HashMap::new();
        for group in self.list_groups(version_id)? {
            let industries = industries_by_group.remove(&group.code).unwrap_or_default();
            groups_by_sector
                .entry(group.sector_code)
                .or_default()
                .push(GroupNode {
                    code: group.code,
                    name: group.name,
                    industries,
                });
        }

        let tree = self
            .list_sectors(version_id)?
            .into_iter()
            .map(|sector| SectorNode {
                groups: groups_by_sector.remove(&sector.code).unwrap_or_default(),
                code: sector.code,
                name: sector.name,
            })
            .collect();

        Ok(tree)
    }

    // ===== 导出查询 =====

    /// 按层级导出扁平数据（固定列顺序，按本层级代码排序）
    ///
    /// # 返回
    /// - `Err(NotFound)`: 版本不存在
    pub fn export_level(
        &self,
        version_id: i64,
        level: TaxonomyLevel,
    ) -> RepositoryResult<ExportTable> {
        self.ensure_version(version_id)?;

        let columns = level.export_columns();
        let sql = format!(
            "SELECT {} FROM {} WHERE version_id = ? ORDER BY {}",
            columns.join(", "),
            level.table_name(),
            columns[0]
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![version_id], |row| {
                (0..columns.len())
                    .map(|idx| row.get::<_, Option<String>>(idx))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ExportTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }
}
