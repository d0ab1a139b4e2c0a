// ==========================================
// GICS 行业分类浏览系统 - 叶子记录
// ==========================================
// 职责: 解析器输出的统一记录形态（子行业 + 完整祖先链）
// 说明: 两条解析路径都产出 LeafRecord，由同一个 Reconciler 消费
// ==========================================

use serde::{Deserialize, Serialize};

/// 单个层级的 (代码, 名称)，两者都可能缺失
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelEntry {
    pub code: Option<String>,
    pub name: Option<String>,
}

impl LevelEntry {
    pub fn new(code: Option<String>, name: Option<String>) -> Self {
        Self { code, name }
    }

    /// 便捷构造（测试与夹具常用）
    pub fn of(code: &str, name: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            name: Some(name.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.name.is_none()
    }

    /// 代码与名称均存在时返回二者
    pub fn complete(&self) -> Option<(&str, &str)> {
        match (&self.code, &self.name) {
            (Some(code), Some(name)) => Some((code.as_str(), name.as_str())),
            _ => None,
        }
    }
}

// ==========================================
// LeafRecord - 叶子记录
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeafRecord {
    pub sector: LevelEntry,
    pub group: LevelEntry,
    pub industry: LevelEntry,
    pub sub_industry: LevelEntry,
    pub definition: Option<String>,
}

/// 去重键: 每个层级的 (code, name, parent_code)
pub type RecordKey = [(Option<String>, Option<String>, Option<String>); 4];

impl LeafRecord {
    pub fn is_empty(&self) -> bool {
        self.sector.is_empty()
            && self.group.is_empty()
            && self.industry.is_empty()
            && self.sub_industry.is_empty()
            && self.definition.is_none()
    }

    /// 祖先链代码 (sector, group, industry)
    pub fn ancestor_codes(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        (
            self.sector.code.as_deref(),
            self.group.code.as_deref(),
            self.industry.code.as_deref(),
        )
    }

    pub fn dedup_key(&self) -> RecordKey {
        [
            (self.sector.code.clone(), self.sector.name.clone(), None),
            (
                self.group.code.clone(),
                self.group.name.clone(),
                self.sector.code.clone(),
            ),
            (
                self.industry.code.clone(),
                self.industry.name.clone(),
                self.group.code.clone(),
            ),
            (
                self.sub_industry.code.clone(),
                self.sub_industry.name.clone(),
                self.industry.code.clone(),
            ),
        ]
    }
}
