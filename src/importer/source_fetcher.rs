// ==========================================
// GICS 行业分类浏览系统 - 远程工作簿下载
// ==========================================
// 职责: 通过 HTTP GET 下载工作簿字节（不重试，不缓存）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::WorkbookFetcher;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// 默认下载超时（秒）
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

// ==========================================
// HttpWorkbookFetcher - reqwest 实现
// ==========================================
#[derive(Debug, Clone)]
pub struct HttpWorkbookFetcher {
    client: reqwest::Client,
}

impl HttpWorkbookFetcher {
    /// 创建下载器
    ///
    /// # 返回
    /// - Err(InternalError): HTTP 客户端构建失败（TLS 初始化等）
    pub fn new() -> ImportResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> ImportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gics-explorer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ImportError::InternalError(format!("HTTP 客户端初始化失败: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WorkbookFetcher for HttpWorkbookFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> ImportResult<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "工作簿下载完成");
        Ok(bytes.to_vec())
    }
}
