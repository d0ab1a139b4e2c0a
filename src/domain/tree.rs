// ==========================================
// GICS 行业分类浏览系统 - 分类树视图
// ==========================================
// 用途: 树形查询结果（板块 → 行业组 → 行业 → 子行业，各层按代码排序）
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorNode {
    pub code: String,
    pub name: String,
    pub groups: Vec<GroupNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNode {
    pub code: String,
    pub name: String,
    pub industries: Vec<IndustryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryNode {
    pub code: String,
    pub name: String,
    pub subs: Vec<SubIndustryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubIndustryNode {
    pub code: String,
    pub name: String,
    pub definition: Option<String>,
}

/// 导出结果: 表头 + 按本层级代码排序的数据行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}
