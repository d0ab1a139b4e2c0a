// ==========================================
// GICS 行业分类浏览系统 - 文件解析器实现
// ==========================================
// 职责: 字节流 → 原始单元格网格（所有单元格转为文本）
// 支持: Excel (.xlsx/.xls/.xlsm/.ods) / CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::TabularSourceReader;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;

// ==========================================
// 解析结果
// ==========================================

/// 单个工作表的原始网格
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// 首行作为表头拆出后的工作表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderedSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// 工作簿（按工作表顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    pub sheets: Vec<SheetGrid>,
}

impl Workbook {
    /// 第一个工作表的原始网格（供逐行承接解析器使用）
    pub fn raw_grid(&self) -> Option<&SheetGrid> {
        self.sheets.first()
    }

    /// 每个工作表以首行作为表头（供列映射解析器使用）
    ///
    /// 完全空白的数据行被丢弃；没有任何行的工作表被跳过
    pub fn headered_sheets(&self) -> Vec<HeaderedSheet> {
        self.sheets
            .iter()
            .filter_map(|sheet| {
                let mut rows = sheet.rows.iter();
                let headers = rows.next()?.iter().map(|h| h.trim().to_string()).collect();
                let rows = rows
                    .filter(|row| !is_blank_row(row))
                    .cloned()
                    .collect();
                Some(HeaderedSheet {
                    name: sheet.name.clone(),
                    headers,
                    rows,
                })
            })
            .collect()
    }

    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.rows.len()).sum()
    }
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|v| v.trim().is_empty())
}

// ==========================================
// SourceFormat - 来源格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Excel,
    Csv,
}

impl SourceFormat {
    /// 根据扩展名判断格式
    pub fn from_extension(ext: &str) -> ImportResult<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(SourceFormat::Excel),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> ImportResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    /// 根据 URL 判断格式（忽略查询串；无法识别时按 Excel 处理）
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        match path.rsplit_once('.') {
            Some((_, ext)) if ext.eq_ignore_ascii_case("csv") => SourceFormat::Csv,
            _ => SourceFormat::Excel,
        }
    }

    pub fn reader(self) -> Box<dyn TabularSourceReader> {
        match self {
            SourceFormat::Excel => Box::new(ExcelReader),
            SourceFormat::Csv => Box::new(CsvReader),
        }
    }
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvReader;

impl TabularSourceReader for CsvReader {
    fn read_bytes(&self, bytes: &[u8]) -> ImportResult<Workbook> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Workbook {
            sheets: vec![SheetGrid {
                name: "csv".to_string(),
                rows,
            }],
        })
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelReader;

impl TabularSourceReader for ExcelReader {
    fn read_bytes(&self, bytes: &[u8]) -> ImportResult<Workbook> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name)?;
            let rows = range
                .rows()
                .map(|row| row.iter().map(cell_to_text).collect())
                .collect();
            sheets.push(SheetGrid {
                name: sheet_name,
                rows,
            });
        }

        Ok(Workbook { sheets })
    }
}

/// 单元格 → 文本
///
/// 整数值的浮点单元格输出为不带小数点的整数（代码列常被存为数值）
pub fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}
