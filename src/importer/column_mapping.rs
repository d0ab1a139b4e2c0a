// ==========================================
// GICS 行业分类浏览系统 - 列映射解析器
// ==========================================
// 职责: 异构表头 → 标准字段映射 + 逐行还原上级代码
// 适用: 每行都有完整字段（不依赖合并单元格）但表头写法不一的来源
// ==========================================
// 规则:
// - 表头标准化: 小写，空白/连字符折叠为下划线
// - 每个标准字段取第一个匹配且未被占用的表头
// - 缺失的上级代码按"最近一次出现的值"回填（latch-and-carry）
// - 按 (code, name, parent_code) 组合键去重
// ==========================================

use crate::domain::{LeafRecord, LevelEntry, RecordKey, TaxonomyLevel};
use crate::importer::cell_normalizer::{cell, pad};
use crate::importer::file_parser::HeaderedSheet;
use std::collections::{HashMap, HashSet};

// ==========================================
// CanonicalField - 标准字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    SectorCode,
    SectorName,
    GroupCode,
    GroupName,
    IndustryCode,
    IndustryName,
    SubIndustryCode,
    SubIndustryName,
    Definition,
}

impl CanonicalField {
    /// 匹配顺序（子行业优先，避免 "subindustry_code" 被行业字段误认）
    pub const MATCH_ORDER: [CanonicalField; 9] = [
        CanonicalField::SubIndustryCode,
        CanonicalField::SubIndustryName,
        CanonicalField::SectorCode,
        CanonicalField::SectorName,
        CanonicalField::GroupCode,
        CanonicalField::GroupName,
        CanonicalField::IndustryCode,
        CanonicalField::IndustryName,
        CanonicalField::Definition,
    ];

    /// 已标准化表头是否匹配本字段
    pub fn matches(self, header: &str) -> bool {
        let has = |needle: &str| header.contains(needle);
        match self {
            CanonicalField::SubIndustryCode => has("sub") && has("code"),
            CanonicalField::SubIndustryName => has("sub") && has("name"),
            CanonicalField::SectorCode => has("sector") && has("code"),
            CanonicalField::SectorName => has("sector") && has("name"),
            CanonicalField::GroupCode => has("group") && has("code"),
            CanonicalField::GroupName => has("group") && has("name"),
            CanonicalField::IndustryCode => {
                has("industry") && has("code") && !has("sub") && !has("group")
            }
            CanonicalField::IndustryName => {
                has("industry") && has("name") && !has("sub") && !has("group")
            }
            CanonicalField::Definition => has("defin") || has("description"),
        }
    }

    pub fn is_code(self) -> bool {
        matches!(
            self,
            CanonicalField::SectorCode
                | CanonicalField::GroupCode
                | CanonicalField::IndustryCode
                | CanonicalField::SubIndustryCode
        )
    }
}

/// 表头标准化: 小写，连续的空白/连字符/下划线折叠为单个下划线
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars() {
        if c.is_whitespace() || c == '-' || c == '_' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.extend(c.to_lowercase());
    }
    out
}

// ==========================================
// ColumnMap - 字段 → 列号
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<CanonicalField, usize>,
}

impl ColumnMap {
    /// 识别表头
    ///
    /// 每个字段取第一个匹配且未分配的表头，任何表头最多分配给一个字段
    pub fn detect(headers: &[String]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut assigned: HashSet<usize> = HashSet::new();
        let mut columns = HashMap::new();

        for field in CanonicalField::MATCH_ORDER {
            let hit = normalized
                .iter()
                .enumerate()
                .find(|(idx, header)| !assigned.contains(idx) && field.matches(header));
            if let Some((idx, _)) = hit {
                assigned.insert(idx);
                columns.insert(field, idx);
            }
        }

        Self { columns }
    }

    pub fn column(&self, field: CanonicalField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// 至少识别出一个代码字段
    pub fn has_code_field(&self) -> bool {
        self.columns.keys().any(|f| f.is_code())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn entry(
        &self,
        row: &[String],
        code: CanonicalField,
        name: CanonicalField,
        level: TaxonomyLevel,
    ) -> LevelEntry {
        LevelEntry::new(
            self.column(code)
                .and_then(|idx| cell(row, idx))
                .and_then(|v| pad(&v, level.code_width())),
            self.column(name).and_then(|idx| cell(row, idx)),
        )
    }

    /// 按映射读取一行（不做回填）
    pub fn read_row(&self, row: &[String]) -> LeafRecord {
        LeafRecord {
            sector: self.entry(
                row,
                CanonicalField::SectorCode,
                CanonicalField::SectorName,
                TaxonomyLevel::Sector,
            ),
            group: self.entry(
                row,
                CanonicalField::GroupCode,
                CanonicalField::GroupName,
                TaxonomyLevel::Group,
            ),
            industry: self.entry(
                row,
                CanonicalField::IndustryCode,
                CanonicalField::IndustryName,
                TaxonomyLevel::Industry,
            ),
            sub_industry: self.entry(
                row,
                CanonicalField::SubIndustryCode,
                CanonicalField::SubIndustryName,
                TaxonomyLevel::SubIndustry,
            ),
            definition: self
                .column(CanonicalField::Definition)
                .and_then(|idx| cell(row, idx)),
        }
    }
}

// ==========================================
// ParentLatch - 上级代码回填状态
// ==========================================
/// 单个上级层级的回填状态
///
/// - last: 整个流中最近一次出现的上级条目
/// - by_child: 某个下级代码最近一次搭配的上级条目
#[derive(Debug, Clone, Default)]
struct ParentLatch {
    last: Option<LevelEntry>,
    by_child: HashMap<String, LevelEntry>,
}

impl ParentLatch {
    /// 回填缺失的上级条目，并记录本行观察到的值
    fn carry(&mut self, parent: &mut LevelEntry, child_code: Option<&str>) {
        if parent.code.is_none() {
            let latched = child_code
                .and_then(|c| self.by_child.get(c))
                .or(self.last.as_ref());
            if let Some(latched) = latched {
                *parent = latched.clone();
            }
        } else if parent.name.is_none() {
            // 代码存在但名称缺失: 同代码时沿用最近名称
            if let Some(last) = &self.last {
                if last.code == parent.code {
                    parent.name = last.name.clone();
                }
            }
        }

        if parent.code.is_some() {
            self.last = Some(parent.clone());
            if let Some(child) = child_code {
                self.by_child.insert(child.to_string(), parent.clone());
            }
        }
    }
}

// ==========================================
// ColumnMappingParser
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ColumnMappingParser;

impl ColumnMappingParser {
    /// 任一工作表能识别出代码字段即视为列映射形态
    pub fn recognizes(&self, sheets: &[HeaderedSheet]) -> bool {
        sheets
            .iter()
            .any(|sheet| ColumnMap::detect(&sheet.headers).has_code_field())
    }

    /// 解析所有工作表（按顺序拼接为单一流，工作表边界无特殊含义）
    pub fn parse(&self, sheets: &[HeaderedSheet]) -> Vec<LeafRecord> {
        let mut sector_latch = ParentLatch::default();
        let mut group_latch = ParentLatch::default();
        let mut industry_latch = ParentLatch::default();
        let mut seen: HashSet<RecordKey> = HashSet::new();
        let mut records = Vec::new();

        for sheet in sheets {
            let map = ColumnMap::detect(&sheet.headers);
            if map.is_empty() {
                continue;
            }

            for row in &sheet.rows {
                let mut record = map.read_row(row);
                if record.is_empty() {
                    continue;
                }

                // 自下而上回填: 先用下级代码定位上级，再逐级向上
                let sub_code = record.sub_industry.code.clone();
                if sub_code.is_some() || !record.industry.is_empty() {
                    industry_latch.carry(&mut record.industry, sub_code.as_deref());
                }
                let industry_code = record.industry.code.clone();
                if industry_code.is_some() || !record.group.is_empty() {
                    group_latch.carry(&mut record.group, industry_code.as_deref());
                }
                let group_code = record.group.code.clone();
                if group_code.is_some() || !record.sector.is_empty() {
                    sector_latch.carry(&mut record.sector, group_code.as_deref());
                }

                if seen.insert(record.dedup_key()) {
                    records.push(record);
                }
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sheet(headers: &[&str], rows: &[&[&str]]) -> HeaderedSheet {
        HeaderedSheet {
            name: "Sheet1".to_string(),
            headers: strings(headers),
            rows: rows.iter().map(|r| strings(r)).collect(),
        }
    }

    const FULL_HEADERS: [&str; 8] = [
        "sector code",
        "sector name",
        "group-code",
        "group name",
        "industry code",
        "industry name",
        "subindustry code",
        "subindustry name",
    ];

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Sector Code"), "sector_code");
        assert_eq!(normalize_header("group-code"), "group_code");
        assert_eq!(normalize_header("  Sub - Industry   Name "), "sub_industry_name");
        assert_eq!(normalize_header("SECTORCODE"), "sectorcode");
    }

    #[test]
    fn test_detect_varied_headers() {
        let map = ColumnMap::detect(&strings(&FULL_HEADERS));
        assert_eq!(map.column(CanonicalField::SectorCode), Some(0));
        assert_eq!(map.column(CanonicalField::GroupCode), Some(2));
        assert_eq!(map.column(CanonicalField::IndustryCode), Some(4));
        assert_eq!(map.column(CanonicalField::IndustryName), Some(5));
        assert_eq!(map.column(CanonicalField::SubIndustryCode), Some(6));
        assert_eq!(map.column(CanonicalField::SubIndustryName), Some(7));
        assert_eq!(map.column(CanonicalField::Definition), None);
    }

    #[test]
    fn test_detect_compact_and_official_headers() {
        let map = ColumnMap::detect(&strings(&[
            "sectorcode",
            "sectorname",
            "Industry Group Code",
            "Industry Group Name",
            "industrycode",
            "industryname",
            "Sub-Industry Code",
            "Sub-Industry Name",
            "Sub-Industry Definition",
        ]));
        assert_eq!(map.column(CanonicalField::GroupCode), Some(2));
        assert_eq!(map.column(CanonicalField::IndustryCode), Some(4));
        assert_eq!(map.column(CanonicalField::SubIndustryCode), Some(6));
        assert_eq!(map.column(CanonicalField::Definition), Some(8));
        assert_eq!(map.len(), 9);
    }

    #[test]
    fn test_header_assigned_once() {
        let map = ColumnMap::detect(&strings(&["sector code", "sector code", "sector name"]));
        assert_eq!(map.column(CanonicalField::SectorCode), Some(0));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_parse_pads_and_dedups() {
        let sheets = vec![sheet(
            &FULL_HEADERS,
            &[
                &["1", "Energy", "101", "Equip", "10101", "Drilling", "1010101", "Drill Sub"],
                &["1", "Energy", "101", "Equip", "10101", "Drilling", "1010101", "Drill Sub"],
            ],
        )];
        let records = ColumnMappingParser.parse(&sheets);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sector, LevelEntry::of("01", "Energy"));
        assert_eq!(records[0].group, LevelEntry::of("0101", "Equip"));
        assert_eq!(records[0].industry, LevelEntry::of("010101", "Drilling"));
        assert_eq!(records[0].sub_industry, LevelEntry::of("01010101", "Drill Sub"));
    }

    #[test]
    fn test_parse_distinct_name_is_distinct_record() {
        let sheets = vec![sheet(
            &["sector code", "sector name"],
            &[&["10", "Energy"], &["10", "Energy Sector"]],
        )];
        let records = ColumnMappingParser.parse(&sheets);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parent_backfilled_from_previous_row() {
        let sheets = vec![sheet(
            &FULL_HEADERS,
            &[
                &["10", "Energy", "1010", "Energy", "101010", "Equipment", "10101010", "Drilling"],
                &["", "", "", "", "", "", "10101020", "Equipment & Services"],
                &["", "", "", "", "101020", "Oil Gas", "10102010", "Integrated"],
            ],
        )];
        let records = ColumnMappingParser.parse(&sheets);

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].ancestor_codes(), (Some("10"), Some("1010"), Some("101010")));
        assert_eq!(records[1].industry.name.as_deref(), Some("Equipment"));
        assert_eq!(records[2].ancestor_codes(), (Some("10"), Some("1010"), Some("101020")));
    }

    #[test]
    fn test_child_specific_parent_preferred() {
        let sheets = vec![sheet(
            &["group code", "group name", "industry code", "industry name"],
            &[
                &["1010", "Energy", "101010", "Equipment"],
                &["1510", "Materials", "151010", "Chemicals"],
                // 101010 再次出现但缺少上级: 取其自身最近的上级 1010，而非全局最近的 1510
                &["", "", "101010", "Equipment"],
            ],
        )];
        let records = ColumnMappingParser.parse(&sheets);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].group.code.as_deref(), Some("1010"));
    }

    #[test]
    fn test_missing_parent_stays_missing() {
        let sheets = vec![sheet(&["group code", "group name"], &[&["202", "No Sector"]])];
        let records = ColumnMappingParser.parse(&sheets);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].group, LevelEntry::of("0202", "No Sector"));
        assert!(records[0].sector.is_empty());
    }

    #[test]
    fn test_sheets_concatenated_into_one_stream() {
        let sheets = vec![
            sheet(&FULL_HEADERS, &[&["10", "Energy", "1010", "Energy", "101010", "Equipment", "10101010", "Drilling"]]),
            sheet(&["Sub-Industry Code", "Sub-Industry Name"], &[&["10101020", "Services"]]),
        ];
        let records = ColumnMappingParser.parse(&sheets);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].ancestor_codes(), (Some("10"), Some("1010"), Some("101010")));
    }

    #[test]
    fn test_recognizes_only_code_headers() {
        let parser = ColumnMappingParser;
        assert!(parser.recognizes(&[sheet(&["Group Code"], &[])]));
        assert!(!parser.recognizes(&[sheet(&["Global Industry Classification Standard"], &[])]));
        assert!(!parser.recognizes(&[sheet(&["sector name"], &[])]));
    }
}
