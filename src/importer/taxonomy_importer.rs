// ==========================================
// GICS 行业分类浏览系统 - 分类导入器
// ==========================================
// 职责: 整合导入流程，从文件/字节到版本化存储
// 流程: 读取 → 形态识别 → 解析为叶子记录 → 层级校验 → 单事务落库
// 红线: 一次导入要么完整提交，要么不留下任何版本
// ==========================================

use crate::domain::{LeafRecord, NewVersion};
use crate::importer::carry_forward::CarryForwardParser;
use crate::importer::column_mapping::ColumnMappingParser;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{SourceFormat, Workbook};
use crate::importer::reconciler::{HierarchyReconciler, LevelCounts, OrphanWarning};
use crate::repository::TaxonomyRepository;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 结果类型
// ==========================================

/// 工作簿形态（决定使用哪个解析器）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    /// 官方发布的层级排版（逐行承接）
    CarryForward,
    /// 带表头的扁平表（按列名映射）
    ColumnMapping,
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserKind::CarryForward => write!(f, "carry_forward"),
            ParserKind::ColumnMapping => write!(f, "column_mapping"),
        }
    }
}

/// 一次导入的汇总报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub version_id: i64,
    pub run_id: String,
    pub label: String,
    pub parser: ParserKind,
    pub records: usize,              // 解析出的叶子记录数
    pub inserted: LevelCounts,       // 各层级新写入数
    pub duplicates: usize,           // 被忽略的重复代码次数
    pub warnings: Vec<OrphanWarning>, // 孤立实体告警
    pub elapsed_ms: u64,
}

// ==========================================
// TaxonomyImporter
// ==========================================
pub struct TaxonomyImporter {
    repo: Arc<TaxonomyRepository>,
    carry_forward: CarryForwardParser,
    column_mapping: ColumnMappingParser,
    reconciler: HierarchyReconciler,
}

impl TaxonomyImporter {
    /// 创建导入器（使用默认列布局）
    pub fn new(repo: Arc<TaxonomyRepository>) -> Self {
        Self {
            repo,
            carry_forward: CarryForwardParser::default(),
            column_mapping: ColumnMappingParser,
            reconciler: HierarchyReconciler,
        }
    }

    /// 从本地文件导入（格式由扩展名决定）
    ///
    /// # 返回
    /// - Err(FileNotFound / UnsupportedFormat): 文件问题
    /// - Err(EmptySource): 没有任何可入库记录，未创建版本
    pub fn import_from_path(&self, path: &Path, version: NewVersion) -> ImportResult<IngestReport> {
        let format = SourceFormat::from_path(path)?;
        let workbook = format.reader().read_path(path)?;
        info!(
            file = %path.display(),
            sheets = workbook.sheets.len(),
            rows = workbook.total_rows(),
            "文件读取完成"
        );
        self.import_workbook(&workbook, version)
    }

    /// 从内存字节导入（远程下载的工作簿走这里）
    pub fn import_from_bytes(
        &self,
        bytes: &[u8],
        format: SourceFormat,
        version: NewVersion,
    ) -> ImportResult<IngestReport> {
        let workbook = format.reader().read_bytes(bytes)?;
        debug!(
            bytes = bytes.len(),
            sheets = workbook.sheets.len(),
            rows = workbook.total_rows(),
            "字节流解析完成"
        );
        self.import_workbook(&workbook, version)
    }

    /// 从已解析的工作簿导入
    pub fn import_workbook(
        &self,
        workbook: &Workbook,
        version: NewVersion,
    ) -> ImportResult<IngestReport> {
        let (parser, records) = self.parse_workbook(workbook);
        self.import_records(&records, parser, version)
    }

    /// 形态识别 + 解析
    ///
    /// 任一工作表的表头能识别出代码列 → 列映射（全部工作表）
    /// 否则 → 第一个工作表按逐行承接解析
    pub fn parse_workbook(&self, workbook: &Workbook) -> (ParserKind, Vec<LeafRecord>) {
        let sheets = workbook.headered_sheets();
        if self.column_mapping.recognizes(&sheets) {
            let records = self.column_mapping.parse(&sheets);
            debug!(parser = %ParserKind::ColumnMapping, records = records.len(), "解析完成");
            return (ParserKind::ColumnMapping, records);
        }

        let records = workbook
            .raw_grid()
            .map(|grid| self.carry_forward.parse(&grid.rows))
            .unwrap_or_default();
        debug!(parser = %ParserKind::CarryForward, records = records.len(), "解析完成");
        (ParserKind::CarryForward, records)
    }

    /// 叶子记录入库（整个导入在单个事务中完成）
    #[instrument(skip(self, records, version), fields(run_id = %version.run_id, label = %version.label))]
    pub fn import_records(
        &self,
        records: &[LeafRecord],
        parser: ParserKind,
        version: NewVersion,
    ) -> ImportResult<IngestReport> {
        let start_time = Instant::now();
        info!(records = records.len(), parser = %parser, "开始导入分类数据");

        if records.is_empty() {
            warn!("没有解析出任何叶子记录，放弃导入");
            return Err(ImportError::EmptySource(format!(
                "版本 {} 的数据源中没有可识别的分类记录",
                version.label
            )));
        }

        let outcome = self.repo.in_ingest_transaction(|writer| {
            self.reconciler.reconcile(writer, &version, records)
        })?;

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            version_id = outcome.version_id,
            sectors = outcome.inserted.sectors,
            groups = outcome.inserted.groups,
            industries = outcome.inserted.industries,
            sub_industries = outcome.inserted.sub_industries,
            duplicates = outcome.duplicates,
            orphans = outcome.warnings.len(),
            elapsed_ms,
            "分类数据导入完成"
        );

        Ok(IngestReport {
            version_id: outcome.version_id,
            run_id: version.run_id,
            label: version.label,
            parser,
            records: records.len(),
            inserted: outcome.inserted,
            duplicates: outcome.duplicates,
            warnings: outcome.warnings,
            elapsed_ms,
        })
    }
}
