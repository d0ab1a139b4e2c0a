// ==========================================
// GICS 行业分类浏览系统 - 层级校验入库
// ==========================================
// 职责: 叶子记录流 → 去重 + 父子校验 → 版本化写入
// 规则:
// - 每条记录按 板块 → 行业组 → 行业 → 子行业 顺序处理
// - 代码/名称缺失或代码非法: 跳过该层级（继续处理下级）
// - 上级代码缺失或本次导入中未被接受: 记录告警，跳过该层级及其全部下级
// - 同版本同代码先写入者生效，后续重复静默忽略
// 红线: 单行问题只告警不中断；只有空输入/存储失败会中断整个导入
// ==========================================

use crate::domain::{
    Industry, IndustryGroup, LeafRecord, LevelEntry, NewVersion, Sector, SubIndustry,
    TaxonomyEntity, TaxonomyLevel,
};
use crate::importer::cell_normalizer::is_valid_code;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::taxonomy_writer::TaxonomyWriter;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

// ==========================================
// 结果类型
// ==========================================

/// 孤立实体告警
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanWarning {
    pub level: TaxonomyLevel,
    pub code: String,
    pub parent_level: TaxonomyLevel,
    /// 记录中声明的上级代码（缺失时为 None）
    pub parent_code: Option<String>,
}

impl fmt::Display for OrphanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} skipped: missing {} {}",
            self.level,
            self.code,
            self.parent_level,
            self.parent_code.as_deref().unwrap_or("<absent>")
        )
    }
}

/// 各层级新写入数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub sectors: usize,
    pub groups: usize,
    pub industries: usize,
    pub sub_industries: usize,
}

impl LevelCounts {
    fn bump(&mut self, level: TaxonomyLevel) {
        match level {
            TaxonomyLevel::Sector => self.sectors += 1,
            TaxonomyLevel::Group => self.groups += 1,
            TaxonomyLevel::Industry => self.industries += 1,
            TaxonomyLevel::SubIndustry => self.sub_industries += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.sectors + self.groups + self.industries + self.sub_industries
    }
}

/// 一次入库的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub version_id: i64,
    pub inserted: LevelCounts,
    /// 被忽略的重复代码次数
    pub duplicates: usize,
    pub warnings: Vec<OrphanWarning>,
}

// ==========================================
// ReconcilePass - 单次导入的状态
// ==========================================
// 已接受代码集合只在本次导入内有效
struct ReconcilePass {
    version_id: i64,
    accepted: HashMap<TaxonomyLevel, HashSet<String>>,
    inserted: LevelCounts,
    duplicates: usize,
    warnings: Vec<OrphanWarning>,
}

impl ReconcilePass {
    fn new(version_id: i64) -> Self {
        Self {
            version_id,
            accepted: HashMap::new(),
            inserted: LevelCounts::default(),
            duplicates: 0,
            warnings: Vec::new(),
        }
    }

    fn is_accepted(&self, level: TaxonomyLevel, code: &str) -> bool {
        self.accepted
            .get(&level)
            .map(|codes| codes.contains(code))
            .unwrap_or(false)
    }

    fn accept(&mut self, level: TaxonomyLevel, code: &str) {
        self.accepted
            .entry(level)
            .or_default()
            .insert(code.to_string());
    }

    fn into_outcome(self) -> ReconcileOutcome {
        ReconcileOutcome {
            version_id: self.version_id,
            inserted: self.inserted,
            duplicates: self.duplicates,
            warnings: self.warnings,
        }
    }
}

/// 单个层级的处理结论
enum Step {
    /// 已接受（新写入或重复）
    Accepted,
    /// 字段缺失/非法，跳过本层级
    Skipped,
    /// 上级未被接受，停止下探
    Orphaned,
}

// ==========================================
// HierarchyReconciler
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct HierarchyReconciler;

impl HierarchyReconciler {
    /// 创建版本并写入全部记录
    ///
    /// # 返回
    /// - Ok(ReconcileOutcome): 版本ID + 写入统计 + 孤立告警
    /// - Err(EmptySource): 无任何记录（不会创建版本）
    /// - Err(Repository): 存储失败（由调用方回滚事务）
    pub fn reconcile<W>(
        &self,
        writer: &mut W,
        version: &NewVersion,
        records: &[LeafRecord],
    ) -> ImportResult<ReconcileOutcome>
    where
        W: TaxonomyWriter + ?Sized,
    {
        if records.is_empty() {
            return Err(ImportError::EmptySource(format!(
                "版本 {} 没有可入库的记录",
                version.label
            )));
        }

        let version_id = writer.begin_version(version)?;
        debug!(version_id, records = records.len(), "版本已创建，开始逐条入库");

        let mut pass = ReconcilePass::new(version_id);
        for record in records {
            self.reconcile_record(writer, &mut pass, record)?;
        }

        Ok(pass.into_outcome())
    }

    fn reconcile_record<W>(
        &self,
        writer: &mut W,
        pass: &mut ReconcilePass,
        record: &LeafRecord,
    ) -> ImportResult<()>
    where
        W: TaxonomyWriter + ?Sized,
    {
        let chain: [(TaxonomyLevel, &LevelEntry, Option<&str>); 4] = [
            (TaxonomyLevel::Sector, &record.sector, None),
            (TaxonomyLevel::Group, &record.group, record.sector.code.as_deref()),
            (TaxonomyLevel::Industry, &record.industry, record.group.code.as_deref()),
            (
                TaxonomyLevel::SubIndustry,
                &record.sub_industry,
                record.industry.code.as_deref(),
            ),
        ];

        for (level, entry, parent_code) in chain {
            let step = self.reconcile_level(
                writer,
                pass,
                level,
                entry,
                parent_code,
                record.definition.as_deref(),
            )?;
            if let Step::Orphaned = step {
                break;
            }
        }

        Ok(())
    }

    fn reconcile_level<W>(
        &self,
        writer: &mut W,
        pass: &mut ReconcilePass,
        level: TaxonomyLevel,
        entry: &LevelEntry,
        parent_code: Option<&str>,
        definition: Option<&str>,
    ) -> ImportResult<Step>
    where
        W: TaxonomyWriter + ?Sized,
    {
        let (code, name) = match entry.complete() {
            Some((code, name)) if is_valid_code(code, level.code_width()) => (code, name),
            _ => return Ok(Step::Skipped),
        };

        if let Some(parent_level) = level.parent() {
            let parent_ok = parent_code
                .map(|p| pass.is_accepted(parent_level, p))
                .unwrap_or(false);
            if !parent_ok {
                warn!(
                    level = %level,
                    code = %code,
                    parent_level = %parent_level,
                    parent_code = parent_code.unwrap_or("<absent>"),
                    "跳过孤立实体: missing {}",
                    parent_level
                );
                pass.warnings.push(OrphanWarning {
                    level,
                    code: code.to_string(),
                    parent_level,
                    parent_code: parent_code.map(|p| p.to_string()),
                });
                return Ok(Step::Orphaned);
            }
        }

        // 显式存在性检查: 同版本同代码先写入者生效
        if pass.is_accepted(level, code) {
            pass.duplicates += 1;
            return Ok(Step::Accepted);
        }

        let entity = build_entity(
            level,
            code,
            name,
            parent_code.unwrap_or_default(),
            definition,
            pass.version_id,
        );
        if writer.insert_if_absent(&entity)? {
            pass.inserted.bump(level);
        } else {
            pass.duplicates += 1;
        }
        pass.accept(level, code);

        Ok(Step::Accepted)
    }
}

fn build_entity(
    level: TaxonomyLevel,
    code: &str,
    name: &str,
    parent_code: &str,
    definition: Option<&str>,
    version_id: i64,
) -> TaxonomyEntity {
    let code = code.to_string();
    let name = name.to_string();
    let parent = parent_code.to_string();
    match level {
        TaxonomyLevel::Sector => TaxonomyEntity::Sector(Sector {
            code,
            name,
            version_id,
        }),
        TaxonomyLevel::Group => TaxonomyEntity::Group(IndustryGroup {
            code,
            name,
            sector_code: parent,
            version_id,
        }),
        TaxonomyLevel::Industry => TaxonomyEntity::Industry(Industry {
            code,
            name,
            group_code: parent,
            version_id,
        }),
        TaxonomyLevel::SubIndustry => TaxonomyEntity::SubIndustry(SubIndustry {
            code,
            name,
            definition: definition.map(|d| d.to_string()),
            industry_code: parent,
            version_id,
        }),
    }
}
