// ==========================================
// GICS 行业分类浏览系统 - 逐行承接解析器
// ==========================================
// 职责: 从"仅首行填写代码/名称"的合并单元格式表格中还原完整祖先链
// 实现: 显式累加器 CarryForwardState，在行序列上做 fold
// ==========================================
// 规则:
// - sector/group/industry 三个"当前槽位"跨行保持
// - 有效代码 → 覆盖槽位代码（名称存在时一并覆盖）
// - 仅有名称 + 槽位已有代码 + 名称不是表头字样 → 只更新名称
// - 出现新的子行业代码 → 结算上一条待定记录，按当前祖先链开启新记录
// - 无子行业代码的行，其说明列文本追加到待定记录的 definition
// ==========================================

use crate::domain::{LeafRecord, LevelEntry, TaxonomyLevel};
use crate::importer::cell_normalizer::{cell, pad};

// ==========================================
// CarryForwardLayout - 列布局
// ==========================================
/// 各字段所在列（0 起）
///
/// 默认布局对应官方结构表: A/B 板块, C/D 行业组, E/F 行业, G/H 子行业；
/// 子行业说明写在子行业名称列的后续行里
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarryForwardLayout {
    pub sector_code: usize,
    pub sector_name: usize,
    pub group_code: usize,
    pub group_name: usize,
    pub industry_code: usize,
    pub industry_name: usize,
    pub sub_code: usize,
    pub sub_name: usize,
    pub definition: usize,
}

impl Default for CarryForwardLayout {
    fn default() -> Self {
        Self {
            sector_code: 0,
            sector_name: 1,
            group_code: 2,
            group_name: 3,
            industry_code: 4,
            industry_name: 5,
            sub_code: 6,
            sub_name: 7,
            definition: 7,
        }
    }
}

impl CarryForwardLayout {
    fn columns(&self, level: TaxonomyLevel) -> (usize, usize) {
        match level {
            TaxonomyLevel::Sector => (self.sector_code, self.sector_name),
            TaxonomyLevel::Group => (self.group_code, self.group_name),
            TaxonomyLevel::Industry => (self.industry_code, self.industry_name),
            TaxonomyLevel::SubIndustry => (self.sub_code, self.sub_name),
        }
    }

    /// 说明列与子行业名称列是否共用
    fn shares_definition_column(&self) -> bool {
        self.definition == self.sub_name
    }
}

// ==========================================
// CarryForwardState - 跨行累加器
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarryForwardState {
    pub sector: LevelEntry,
    pub group: LevelEntry,
    pub industry: LevelEntry,
    /// 尚未结算的子行业记录
    pub pending: Option<LeafRecord>,
    /// 已结算的记录（按首次出现顺序）
    pub emitted: Vec<LeafRecord>,
}

impl CarryForwardState {
    /// 处理一行，返回新的累加器
    pub fn step(mut self, row: &[String], layout: &CarryForwardLayout) -> Self {
        for level in [TaxonomyLevel::Sector, TaxonomyLevel::Group, TaxonomyLevel::Industry] {
            let (code_col, name_col) = layout.columns(level);
            let code = cell(row, code_col).and_then(|v| pad(&v, level.code_width()));
            let name = cell(row, name_col);
            let slot = self.slot_mut(level);
            update_slot(slot, level, code, name);
        }

        let (sub_code_col, sub_name_col) = layout.columns(TaxonomyLevel::SubIndustry);
        let sub_code = cell(row, sub_code_col)
            .and_then(|v| pad(&v, TaxonomyLevel::SubIndustry.code_width()));

        match sub_code {
            Some(code) => {
                // 新子行业: 结算上一条，按当前祖先链快照开启新记录
                if let Some(done) = self.pending.take() {
                    self.emitted.push(done);
                }
                let definition = if layout.shares_definition_column() {
                    None
                } else {
                    cell(row, layout.definition)
                };
                self.pending = Some(LeafRecord {
                    sector: self.sector.clone(),
                    group: self.group.clone(),
                    industry: self.industry.clone(),
                    sub_industry: LevelEntry::new(Some(code), cell(row, sub_name_col)),
                    definition,
                });
            }
            None => {
                let text = cell(row, layout.definition)
                    .filter(|t| !TaxonomyLevel::SubIndustry.is_header_label(t));
                if let (Some(text), Some(pending)) = (text, self.pending.as_mut()) {
                    append_definition(pending, &text);
                }
            }
        }

        self
    }

    /// 结算最后一条待定记录，输出全部叶子记录
    pub fn finish(mut self) -> Vec<LeafRecord> {
        if let Some(done) = self.pending.take() {
            self.emitted.push(done);
        }
        self.emitted
    }

    fn slot_mut(&mut self, level: TaxonomyLevel) -> &mut LevelEntry {
        match level {
            TaxonomyLevel::Sector => &mut self.sector,
            TaxonomyLevel::Group => &mut self.group,
            _ => &mut self.industry,
        }
    }
}

fn update_slot(
    slot: &mut LevelEntry,
    level: TaxonomyLevel,
    code: Option<String>,
    name: Option<String>,
) {
    match (code, name) {
        (Some(code), name) => {
            slot.code = Some(code);
            if name.is_some() {
                slot.name = name;
            }
        }
        (None, Some(name)) if slot.code.is_some() && !level.is_header_label(&name) => {
            slot.name = Some(name);
        }
        // 其余情况沿用上一行的值
        _ => {}
    }
}

fn append_definition(record: &mut LeafRecord, text: &str) {
    match record.definition.as_mut() {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(text);
        }
        None => record.definition = Some(text.to_string()),
    }
}

// ==========================================
// CarryForwardParser
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CarryForwardParser {
    layout: CarryForwardLayout,
}

impl CarryForwardParser {
    pub fn new(layout: CarryForwardLayout) -> Self {
        Self { layout }
    }

    /// 解析原始网格（自上而下），每个子行业代码输出一条叶子记录
    pub fn parse(&self, rows: &[Vec<String>]) -> Vec<LeafRecord> {
        rows.iter()
            .fold(CarryForwardState::default(), |state, row| {
                state.step(row, &self.layout)
            })
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn parse(rows: &[Vec<String>]) -> Vec<LeafRecord> {
        CarryForwardParser::default().parse(rows)
    }

    #[test]
    fn test_ancestor_chain_carried_forward() {
        let rows = vec![
            row(&["1", "Energy", "101", "Equip", "10101", "Drilling", "", ""]),
            row(&["", "", "", "", "", "", "1010101", "Drill Sub"]),
        ];
        let records = parse(&rows);

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].ancestor_codes(),
            (Some("01"), Some("0101"), Some("010101"))
        );
        assert_eq!(records[0].sub_industry, LevelEntry::of("01010101", "Drill Sub"));
        assert_eq!(records[0].sector.name.as_deref(), Some("Energy"));
    }

    #[test]
    fn test_definition_accumulates_across_rows() {
        let rows = vec![
            row(&["10", "Energy", "1010", "Energy", "101010", "Energy Equipment", "10101010", "Oil & Gas Drilling"]),
            row(&["", "", "", "", "", "", "", "Drilling contractors"]),
            row(&["", "", "", "", "", "", "", "or owners of drilling rigs"]),
            row(&["", "", "", "", "", "", "", "that contract their services."]),
            row(&["", "", "", "", "", "", "10101020", "Oil & Gas Equipment"]),
        ];
        let records = parse(&rows);

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].definition.as_deref(),
            Some("Drilling contractors or owners of drilling rigs that contract their services.")
        );
        assert_eq!(records[1].definition, None);
    }

    #[test]
    fn test_new_parent_applies_to_following_subs_only() {
        let rows = vec![
            row(&["10", "Energy", "1010", "Energy", "101010", "Equipment", "10101010", "Drilling"]),
            row(&["", "", "", "", "101020", "Oil Gas", "10102010", "Integrated"]),
            row(&["15", "Materials", "1510", "Materials", "151010", "Chemicals", "15101010", "Commodity"]),
        ];
        let records = parse(&rows);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].ancestor_codes(), (Some("10"), Some("1010"), Some("101010")));
        assert_eq!(records[1].ancestor_codes(), (Some("10"), Some("1010"), Some("101020")));
        assert_eq!(records[2].ancestor_codes(), (Some("15"), Some("1510"), Some("151010")));
    }

    #[test]
    fn test_name_only_row_updates_name() {
        let rows = vec![
            row(&["10", "Energ", "", "", "", "", "", ""]),
            row(&["", "Energy", "", "", "", "", "", ""]),
            row(&["", "", "1010", "Equip", "101010", "Drilling", "10101010", "Sub"]),
        ];
        let records = parse(&rows);

        assert_eq!(records[0].sector, LevelEntry::of("10", "Energy"));
    }

    #[test]
    fn test_header_row_mid_sheet_ignored() {
        let rows = vec![
            row(&["10", "Energy", "1010", "Equip", "101010", "Drilling", "", ""]),
            row(&["", "Sector", "", "Industry Group", "", "Industry", "", "Sub-Industry"]),
            row(&["", "", "", "", "", "", "10101010", "Drill Sub"]),
        ];
        let records = parse(&rows);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sector, LevelEntry::of("10", "Energy"));
        assert_eq!(records[0].group, LevelEntry::of("1010", "Equip"));
        assert_eq!(records[0].industry, LevelEntry::of("101010", "Drilling"));
    }

    #[test]
    fn test_name_without_code_before_any_code_ignored() {
        let rows = vec![
            row(&["GICS Structure", "Some Title", "", "", "", "", "", ""]),
            row(&["", "", "", "", "", "", "10101010", "Drill Sub"]),
        ];
        let records = parse(&rows);

        assert_eq!(records.len(), 1);
        assert!(records[0].sector.is_empty());
    }

    #[test]
    fn test_malformed_code_keeps_previous_state() {
        let rows = vec![
            row(&["10", "Energy", "1010", "Equip", "101010", "Drilling", "", ""]),
            row(&["1X", "", "12345", "", "", "", "", ""]),
            row(&["", "", "", "", "", "", "10101010", "Drill Sub"]),
        ];
        let records = parse(&rows);

        assert_eq!(records[0].ancestor_codes(), (Some("10"), Some("1010"), Some("101010")));
    }

    #[test]
    fn test_empty_rows_contribute_nothing() {
        let rows = vec![row(&["", "", "", ""]), row(&[]), row(&["nan", "None"])];
        assert!(parse(&rows).is_empty());
    }

    #[test]
    fn test_definition_before_any_sub_dropped() {
        let rows = vec![
            row(&["10", "Energy", "1010", "Equip", "101010", "Drilling", "", "stray text"]),
            row(&["", "", "", "", "", "", "10101010", "Drill Sub"]),
        ];
        let records = parse(&rows);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].definition, None);
    }

    #[test]
    fn test_separate_definition_column() {
        let layout = CarryForwardLayout {
            definition: 8,
            ..Default::default()
        };
        let rows = vec![
            row(&["10", "Energy", "1010", "Equip", "101010", "Drilling", "10101010", "Drill Sub", "First part"]),
            row(&["", "", "", "", "", "", "", "", "second part"]),
        ];
        let records = CarryForwardParser::new(layout).parse(&rows);

        assert_eq!(records[0].definition.as_deref(), Some("First part second part"));
    }

    #[test]
    fn test_step_is_testable_row_by_row() {
        let layout = CarryForwardLayout::default();
        let state = CarryForwardState::default()
            .step(&row(&["10", "Energy"]), &layout);
        assert_eq!(state.sector, LevelEntry::of("10", "Energy"));
        assert!(state.pending.is_none());

        let state = state.step(&row(&["", "", "", "", "", "", "10101010", "Sub"]), &layout);
        assert!(state.pending.is_some());
        assert_eq!(state.finish().len(), 1);
    }
}
