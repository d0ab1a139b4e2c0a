// ==========================================
// GICS 行业分类浏览系统 - 分类写入接口
// ==========================================
// 职责: 版本化存储的最小写入契约 + SQLite 事务实现
// 红线: Writer 不含业务规则（父子校验由 Reconciler 负责）
// ==========================================

use crate::domain::{NewVersion, TaxonomyEntity};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Transaction};

// ==========================================
// TaxonomyWriter Trait
// ==========================================
// 用途: 一次导入内的写入通道
// 实现者: SqliteTaxonomyWriter（测试中另有内存实现）
pub trait TaxonomyWriter {
    /// 创建版本行，返回存储层分配的版本ID
    fn begin_version(&mut self, version: &NewVersion) -> RepositoryResult<i64>;

    /// 插入实体（已存在则忽略）
    ///
    /// # 返回
    /// - Ok(true): 新插入
    /// - Ok(false): 同版本内同代码已存在，未写入
    fn insert_if_absent(&mut self, entity: &TaxonomyEntity) -> RepositoryResult<bool>;
}

// ==========================================
// SqliteTaxonomyWriter - 事务内写入
// ==========================================
// 整个导入只持有一个事务: commit 之前 drop 即回滚
pub struct SqliteTaxonomyWriter<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> SqliteTaxonomyWriter<'conn> {
    pub fn new(tx: Transaction<'conn>) -> Self {
        Self { tx }
    }

    /// 提交事务
    pub fn commit(self) -> RepositoryResult<()> {
        self.tx
            .commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }
}

impl TaxonomyWriter for SqliteTaxonomyWriter<'_> {
    fn begin_version(&mut self, version: &NewVersion) -> RepositoryResult<i64> {
        self.tx.execute(
            r#"INSERT INTO gics_version (label, effective_date, source_url, run_id)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![
                &version.label,
                &version.effective_date,
                &version.source_url,
                &version.run_id,
            ],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    fn insert_if_absent(&mut self, entity: &TaxonomyEntity) -> RepositoryResult<bool> {
        let changed = match entity {
            TaxonomyEntity::Sector(s) => self.tx.execute(
                "INSERT OR IGNORE INTO gics_sector (code2, name, version_id) VALUES (?1, ?2, ?3)",
                params![&s.code, &s.name, s.version_id],
            )?,
            TaxonomyEntity::Group(g) => self.tx.execute(
                r#"INSERT OR IGNORE INTO gics_group (code4, name, sector_code2, version_id)
                   VALUES (?1, ?2, ?3, ?4)"#,
                params![&g.code, &g.name, &g.sector_code, g.version_id],
            )?,
            TaxonomyEntity::Industry(i) => self.tx.execute(
                r#"INSERT OR IGNORE INTO gics_industry (code6, name, group_code4, version_id)
                   VALUES (?1, ?2, ?3, ?4)"#,
                params![&i.code, &i.name, &i.group_code, i.version_id],
            )?,
            TaxonomyEntity::SubIndustry(s) => self.tx.execute(
                r#"INSERT OR IGNORE INTO gics_sub_industry
                       (code8, name, definition, industry_code6, version_id)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
                params![&s.code, &s.name, &s.definition, &s.industry_code, s.version_id],
            )?,
        };
        Ok(changed > 0)
    }
}
