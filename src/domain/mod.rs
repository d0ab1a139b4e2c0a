// ==========================================
// GICS 行业分类浏览系统 - 领域模型层
// ==========================================
// 职责: 定义分类实体、叶子记录、树视图
// 红线: 不含数据访问逻辑,不含解析逻辑
// ==========================================

pub mod record;
pub mod taxonomy;
pub mod tree;

// 重导出核心类型
pub use record::{LeafRecord, LevelEntry, RecordKey};
pub use taxonomy::{
    Industry, IndustryGroup, NewVersion, Sector, SubIndustry, TaxonomyEntity, TaxonomyLevel,
    Version,
};
pub use tree::{ExportTable, GroupNode, IndustryNode, SectorNode, SubIndustryNode};
