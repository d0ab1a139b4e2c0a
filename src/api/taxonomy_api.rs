// ==========================================
// GICS 行业分类浏览系统 - 分类 API
// ==========================================
// 职责: 版本列表、分类树、按层级导出、文件/URL 导入
// 说明: HTTP 路由与命令行工具共用本层
// ==========================================

use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{ExportTable, NewVersion, SectorNode, TaxonomyLevel, Version};
use crate::importer::error::ImportError;
use crate::importer::file_parser::SourceFormat;
use crate::importer::importer_trait::{TabularSourceReader, WorkbookFetcher};
use crate::importer::taxonomy_importer::{IngestReport, TaxonomyImporter};
use crate::repository::{TaxonomyRepository, VersionRepository};

// ==========================================
// TaxonomyApi - 分类 API
// ==========================================

/// 分类API
///
/// 职责：
/// 1. 版本查询
/// 2. 分类树与层级导出
/// 3. 导入入口（本地文件 / 远程 URL）
pub struct TaxonomyApi {
    version_repo: Arc<VersionRepository>,
    taxonomy_repo: Arc<TaxonomyRepository>,
    importer: Arc<TaxonomyImporter>,
    fetcher: Arc<dyn WorkbookFetcher>,
}

impl TaxonomyApi {
    /// 创建新的TaxonomyApi实例
    ///
    /// # 参数
    /// - version_repo: 版本仓储
    /// - taxonomy_repo: 分类实体仓储
    /// - importer: 分类导入器
    /// - fetcher: 远程工作簿下载器
    pub fn new(
        version_repo: Arc<VersionRepository>,
        taxonomy_repo: Arc<TaxonomyRepository>,
        importer: Arc<TaxonomyImporter>,
        fetcher: Arc<dyn WorkbookFetcher>,
    ) -> Self {
        Self {
            version_repo,
            taxonomy_repo,
            importer,
            fetcher,
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 全部版本（按ID升序）
    pub fn list_versions(&self) -> ApiResult<Vec<Version>> {
        Ok(self.version_repo.list_all()?)
    }

    /// 版本数量
    pub fn count_versions(&self) -> ApiResult<i64> {
        Ok(self.version_repo.count()?)
    }

    /// 分类树
    ///
    /// # 返回
    /// - Err(NotFound): 版本不存在
    pub fn get_tree(&self, version_id: i64) -> ApiResult<Vec<SectorNode>> {
        let tree = self.taxonomy_repo.build_tree(version_id)?;
        debug!(version_id, sectors = tree.len(), "分类树查询完成");
        Ok(tree)
    }

    /// 按层级导出
    ///
    /// # 参数
    /// - level: sector / group / industry / subindustry
    ///
    /// # 返回
    /// - Err(InvalidInput): 层级名称无法识别
    /// - Err(NotFound): 版本不存在
    pub fn export_level(&self, version_id: i64, level: &str) -> ApiResult<ExportTable> {
        let level = parse_level(level)?;
        Ok(self.taxonomy_repo.export_level(version_id, level)?)
    }

    /// 按层级导出为 CSV 文本（首行为列名）
    pub fn export_csv(&self, version_id: i64, level: &str) -> ApiResult<String> {
        let table = self.export_level(version_id, level)?;
        let mut buf = Vec::new();
        write_csv(&table, &mut buf)?;
        String::from_utf8(buf).map_err(|e| ApiError::InternalError(e.to_string()))
    }

    // ==========================================
    // 导入接口
    // ==========================================

    /// 从本地文件导入
    ///
    /// # 参数
    /// - path: .xlsx/.xls/.xlsm/.ods/.csv 文件
    /// - format: 指定格式时忽略扩展名
    /// - label: 版本标签
    /// - effective_date: YYYY-MM-DD
    /// - source_url: 记录在版本上的来源地址（可选）
    pub fn ingest_file(
        &self,
        path: &Path,
        format: Option<SourceFormat>,
        label: &str,
        effective_date: &str,
        source_url: Option<&str>,
    ) -> ApiResult<IngestReport> {
        let version = new_version(label, effective_date, source_url)?;
        let report = match format {
            Some(format) => {
                let workbook = format.reader().read_path(path)?;
                self.importer.import_workbook(&workbook, version)?
            }
            None => self.importer.import_from_path(path, version)?,
        };
        Ok(report)
    }

    /// 从远程 URL 下载并导入
    ///
    /// # 返回
    /// - Err(SourceFetchFailed): 下载失败（不重试，不创建版本）
    #[instrument(skip(self))]
    pub async fn ingest_url(
        &self,
        url: &str,
        label: &str,
        effective_date: &str,
    ) -> ApiResult<IngestReport> {
        let version = new_version(label, effective_date, Some(url))?;
        info!(run_id = %version.run_id, "开始下载工作簿");

        let bytes = self.fetcher.fetch(url).await?;
        info!(bytes = bytes.len(), "工作簿下载完成");

        let format = SourceFormat::from_url(url);
        let importer = self.importer.clone();
        let report = tokio::task::spawn_blocking(move || {
            importer.import_from_bytes(&bytes, format, version)
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("导入任务异常终止: {}", e)))??;

        Ok(report)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 解析层级名称
pub fn parse_level(raw: &str) -> ApiResult<TaxonomyLevel> {
    TaxonomyLevel::from_str(raw).map_err(|_| ApiError::InvalidInput(format!("invalid level: {}", raw)))
}

/// 解析生效日期（YYYY-MM-DD）
pub fn parse_effective_date(raw: &str) -> Result<NaiveDate, ImportError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ImportError::InvalidEffectiveDate(raw.to_string()))
}

fn new_version(label: &str, effective_date: &str, source_url: Option<&str>) -> ApiResult<NewVersion> {
    let label = label.trim();
    if label.is_empty() {
        return Err(ApiError::InvalidInput("版本标签不能为空".to_string()));
    }
    let effective_date = parse_effective_date(effective_date)?;
    Ok(NewVersion::new(label, effective_date, source_url))
}

/// 把导出表写成 CSV（空值写为空串）
pub fn write_csv<W: io::Write>(table: &ExportTable, out: W) -> ApiResult<()> {
    let to_api = |e: csv::Error| ApiError::InternalError(format!("CSV 写入失败: {}", e));

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&table.columns).map_err(to_api)?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
            .map_err(to_api)?;
    }
    writer
        .flush()
        .map_err(|e| ApiError::InternalError(format!("CSV 写入失败: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("subindustry").unwrap(), TaxonomyLevel::SubIndustry);
        assert!(matches!(parse_level("division"), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_effective_date() {
        assert_eq!(
            parse_effective_date("2023-03-17").unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 17).unwrap()
        );
        assert!(matches!(
            parse_effective_date("17/03/2023"),
            Err(ImportError::InvalidEffectiveDate(_))
        ));
    }

    #[test]
    fn test_blank_label_rejected() {
        assert!(matches!(
            new_version("  ", "2024-01-01", None),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_write_csv_quotes_and_nulls() {
        let table = ExportTable {
            columns: vec!["code8".into(), "name".into(), "definition".into(), "industry_code6".into()],
            rows: vec![vec![
                Some("10101010".into()),
                Some("Oil, Gas & Drilling".into()),
                None,
                Some("101010".into()),
            ]],
        };
        let mut buf = Vec::new();
        write_csv(&table, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "code8,name,definition,industry_code6\n10101010,\"Oil, Gas & Drilling\",,101010\n"
        );
    }
}
