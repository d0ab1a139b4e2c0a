// ==========================================
// GICS 行业分类浏览系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::api::TaxonomyApi;
use crate::config::DefaultIngest;
use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::importer::importer_trait::WorkbookFetcher;
use crate::importer::source_fetcher::HttpWorkbookFetcher;
use crate::importer::taxonomy_importer::{IngestReport, TaxonomyImporter};
use crate::importer::ImportError;
use crate::repository::{RepositoryError, RepositoryResult, TaxonomyRepository, VersionRepository};

/// 应用状态
///
/// 包含API实例和共享资源；克隆只复制 Arc
#[derive(Clone)]
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 分类API
    pub taxonomy_api: Arc<TaxonomyApi>,
}

impl AppState {
    /// 创建新的AppState实例（HTTP 下载器）
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并初始化 schema
    /// 2. 初始化Repository
    /// 3. 创建导入器与API实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let fetcher = HttpWorkbookFetcher::new().map_err(|e: ImportError| {
            RepositoryError::InternalError(format!("下载器初始化失败: {}", e))
        })?;
        Self::with_fetcher(db_path, Arc::new(fetcher))
    }

    /// 使用指定下载器创建（测试可注入本地实现）
    pub fn with_fetcher(db_path: &str, fetcher: Arc<dyn WorkbookFetcher>) -> RepositoryResult<Self> {
        info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        let mut state = Self::from_connection(Arc::new(Mutex::new(conn)), fetcher)?;
        state.db_path = db_path.to_string();
        Ok(state)
    }

    /// 从已有连接创建
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA 并建表（幂等）
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        fetcher: Arc<dyn WorkbookFetcher>,
    ) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let version_repo = Arc::new(VersionRepository::new(conn.clone()));
        let taxonomy_repo = Arc::new(TaxonomyRepository::new(conn));

        // ==========================================
        // 初始化API层
        // ==========================================
        let importer = Arc::new(TaxonomyImporter::new(taxonomy_repo.clone()));
        let taxonomy_api = Arc::new(TaxonomyApi::new(
            version_repo,
            taxonomy_repo,
            importer,
            fetcher,
        ));

        info!("AppState初始化完成");

        Ok(Self {
            db_path: String::from(":memory:"),
            taxonomy_api,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }

    /// 启动时的默认数据集导入
    ///
    /// 仅当库中没有任何版本时执行；失败只记录日志，不影响服务启动
    pub async fn bootstrap_default_dataset(
        &self,
        default_ingest: Option<&DefaultIngest>,
    ) -> Option<IngestReport> {
        let ingest = match default_ingest {
            Some(ingest) => ingest,
            None => {
                info!("未配置默认数据集，跳过启动导入");
                return None;
            }
        };

        match self.taxonomy_api.count_versions() {
            Ok(0) => {}
            Ok(count) => {
                info!(versions = count, "已有分类数据，跳过默认导入");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "读取版本数量失败，跳过默认导入");
                return None;
            }
        }

        info!(url = %ingest.url, label = %ingest.label, "库中无分类数据，开始导入默认数据集");
        let effective = ingest.effective_date.format("%Y-%m-%d").to_string();
        match self
            .taxonomy_api
            .ingest_url(&ingest.url, &ingest.label, &effective)
            .await
        {
            Ok(report) => {
                info!(version_id = report.version_id, "默认数据集导入完成");
                Some(report)
            }
            Err(e) => {
                error!(url = %ingest.url, error = %e, "默认数据集导入失败（服务继续启动）");
                None
            }
        }
    }
}
