// ==========================================
// GICS 行业分类浏览系统 - 导入层
// ==========================================
// 职责: 外部工作簿 → 叶子记录 → 版本化存储
// 支持: Excel (.xlsx/.xls/.xlsm/.ods), CSV, 远程 URL
// ==========================================

// 模块声明
pub mod carry_forward;
pub mod cell_normalizer;
pub mod column_mapping;
pub mod error;
pub mod file_parser;
pub mod importer_trait;
pub mod reconciler;
pub mod source_fetcher;
pub mod taxonomy_importer;

// 重导出核心类型
pub use carry_forward::{CarryForwardLayout, CarryForwardParser};
pub use column_mapping::{CanonicalField, ColumnMap, ColumnMappingParser};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvReader, ExcelReader, SourceFormat, Workbook};
pub use reconciler::{HierarchyReconciler, LevelCounts, OrphanWarning, ReconcileOutcome};
pub use source_fetcher::HttpWorkbookFetcher;
pub use taxonomy_importer::{IngestReport, ParserKind, TaxonomyImporter};

// 重导出 Trait 接口
pub use importer_trait::{TabularSourceReader, WorkbookFetcher};
