// ==========================================
// GICS 行业分类浏览系统 - 分类实体领域模型
// ==========================================
// 职责: 版本 / 板块 / 行业组 / 行业 / 子行业 实体定义
// 红线: 所有实体按 version_id 隔离，入库后不可修改
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// Version - 导入版本
// ==========================================
// 用途: 每次导入生成一个版本，只追加、不更新
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: i64,                    // 版本ID（存储层自增分配）
    pub label: String,              // 版本标签
    pub effective_date: NaiveDate,  // 生效日期
    pub source_url: Option<String>, // 来源地址（本地文件导入时为空）
}

/// 新建版本的元信息（版本ID由存储层分配）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVersion {
    pub label: String,
    pub effective_date: NaiveDate,
    pub source_url: Option<String>,
    pub run_id: String, // 导入批次追踪ID
}

impl NewVersion {
    pub fn new(label: &str, effective_date: NaiveDate, source_url: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            effective_date,
            source_url: source_url.map(|s| s.to_string()),
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

// ==========================================
// 四级分类实体
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub code: String, // 2 位代码
    pub name: String,
    pub version_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryGroup {
    pub code: String,        // 4 位代码
    pub name: String,
    pub sector_code: String, // 上级板块代码
    pub version_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    pub code: String,       // 6 位代码
    pub name: String,
    pub group_code: String, // 上级行业组代码
    pub version_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubIndustry {
    pub code: String, // 8 位代码
    pub name: String,
    pub definition: Option<String>,
    pub industry_code: String, // 上级行业代码
    pub version_id: i64,
}

/// 写入存储层的实体（insert-if-absent 的统一入参）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyEntity {
    Sector(Sector),
    Group(IndustryGroup),
    Industry(Industry),
    SubIndustry(SubIndustry),
}

impl TaxonomyEntity {
    pub fn level(&self) -> TaxonomyLevel {
        match self {
            TaxonomyEntity::Sector(_) => TaxonomyLevel::Sector,
            TaxonomyEntity::Group(_) => TaxonomyLevel::Group,
            TaxonomyEntity::Industry(_) => TaxonomyLevel::Industry,
            TaxonomyEntity::SubIndustry(_) => TaxonomyLevel::SubIndustry,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            TaxonomyEntity::Sector(s) => &s.code,
            TaxonomyEntity::Group(g) => &g.code,
            TaxonomyEntity::Industry(i) => &i.code,
            TaxonomyEntity::SubIndustry(s) => &s.code,
        }
    }

    pub fn version_id(&self) -> i64 {
        match self {
            TaxonomyEntity::Sector(s) => s.version_id,
            TaxonomyEntity::Group(g) => g.version_id,
            TaxonomyEntity::Industry(i) => i.version_id,
            TaxonomyEntity::SubIndustry(s) => s.version_id,
        }
    }
}

// ==========================================
// TaxonomyLevel - 分类层级
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyLevel {
    Sector,
    Group,
    Industry,
    SubIndustry,
}

impl TaxonomyLevel {
    /// 代码固定宽度
    pub fn code_width(self) -> usize {
        match self {
            TaxonomyLevel::Sector => 2,
            TaxonomyLevel::Group => 4,
            TaxonomyLevel::Industry => 6,
            TaxonomyLevel::SubIndustry => 8,
        }
    }

    pub fn parent(self) -> Option<TaxonomyLevel> {
        match self {
            TaxonomyLevel::Sector => None,
            TaxonomyLevel::Group => Some(TaxonomyLevel::Sector),
            TaxonomyLevel::Industry => Some(TaxonomyLevel::Group),
            TaxonomyLevel::SubIndustry => Some(TaxonomyLevel::Industry),
        }
    }

    /// 存储表名
    pub fn table_name(self) -> &'static str {
        match self {
            TaxonomyLevel::Sector => "gics_sector",
            TaxonomyLevel::Group => "gics_group",
            TaxonomyLevel::Industry => "gics_industry",
            TaxonomyLevel::SubIndustry => "gics_sub_industry",
        }
    }

    /// 导出列（固定顺序，第一列为本层级代码）
    pub fn export_columns(self) -> &'static [&'static str] {
        match self {
            TaxonomyLevel::Sector => &["code2", "name"],
            TaxonomyLevel::Group => &["code4", "name", "sector_code2"],
            TaxonomyLevel::Industry => &["code6", "name", "group_code4"],
            TaxonomyLevel::SubIndustry => &["code8", "name", "definition", "industry_code6"],
        }
    }

    /// 表格中出现的层级表头字样（用于识别混在数据区的表头行）
    pub fn header_labels(self) -> &'static [&'static str] {
        match self {
            TaxonomyLevel::Sector => &["sector"],
            TaxonomyLevel::Group => &["industry group", "group"],
            TaxonomyLevel::Industry => &["industry"],
            TaxonomyLevel::SubIndustry => &["sub-industry", "sub industry", "subindustry"],
        }
    }

    pub fn is_header_label(self, text: &str) -> bool {
        let lowered = text.trim().to_lowercase();
        self.header_labels().iter().any(|label| *label == lowered)
    }

    /// 导出接口使用的层级名
    pub fn as_str(self) -> &'static str {
        match self {
            TaxonomyLevel::Sector => "sector",
            TaxonomyLevel::Group => "group",
            TaxonomyLevel::Industry => "industry",
            TaxonomyLevel::SubIndustry => "subindustry",
        }
    }
}

impl fmt::Display for TaxonomyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxonomyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sector" => Ok(TaxonomyLevel::Sector),
            "group" | "industry_group" => Ok(TaxonomyLevel::Group),
            "industry" => Ok(TaxonomyLevel::Industry),
            "subindustry" | "sub_industry" | "sub-industry" => Ok(TaxonomyLevel::SubIndustry),
            other => Err(format!("未知层级: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!("subindustry".parse::<TaxonomyLevel>(), Ok(TaxonomyLevel::SubIndustry));
        assert_eq!(" Group ".parse::<TaxonomyLevel>(), Ok(TaxonomyLevel::Group));
        assert!("segment".parse::<TaxonomyLevel>().is_err());
    }

    #[test]
    fn test_level_parent_chain() {
        assert_eq!(TaxonomyLevel::Sector.parent(), None);
        assert_eq!(TaxonomyLevel::SubIndustry.parent(), Some(TaxonomyLevel::Industry));
        assert_eq!(TaxonomyLevel::Industry.code_width(), 6);
    }

    #[test]
    fn test_header_label_case_insensitive() {
        assert!(TaxonomyLevel::Group.is_header_label("Industry Group"));
        assert!(TaxonomyLevel::SubIndustry.is_header_label(" SUB-INDUSTRY "));
        assert!(!TaxonomyLevel::Sector.is_header_label("Energy"));
    }
}
