// ==========================================
// GICS 行业分类浏览系统 - 导入接口定义
// ==========================================
// 职责: 定义导入管道的外部协作者接口（不包含实现）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::Workbook;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// TabularSourceReader Trait
// ==========================================
// 用途: 把字节流读成原始单元格网格（不解释表头）
// 实现者: ExcelReader, CsvReader
pub trait TabularSourceReader: Send + Sync {
    /// 从内存字节解析工作簿
    fn read_bytes(&self, bytes: &[u8]) -> ImportResult<Workbook>;

    /// 从本地文件解析工作簿
    ///
    /// # 返回
    /// - Err(FileNotFound): 文件不存在
    /// - Err(FileReadError): 读取失败
    fn read_path(&self, path: &Path) -> ImportResult<Workbook> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        self.read_bytes(&bytes)
    }
}

// ==========================================
// WorkbookFetcher Trait
// ==========================================
// 用途: 下载远程工作簿（网络 I/O 只发生在这里）
// 实现者: HttpWorkbookFetcher
#[async_trait]
pub trait WorkbookFetcher: Send + Sync {
    /// 下载 url 对应的完整内容
    ///
    /// # 返回
    /// - Ok(Vec<u8>): 响应体
    /// - Err(SourceFetch): 传输失败或非 2xx 状态（不重试）
    async fn fetch(&self, url: &str) -> ImportResult<Vec<u8>>;
}
