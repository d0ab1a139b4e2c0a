// ==========================================
// GICS 行业分类浏览系统 - 单元格清洗
// ==========================================
// 职责: TRIM / NULL 标准化 / 定宽代码补零
// 红线: 非数字内容不做任何强制转换，直接视为缺失
// ==========================================

/// 清洗原始单元格
///
/// # 规则
/// - 去除首尾空白（含不间断空格 U+00A0）
/// - 空串、"nan"、"none"（大小写不敏感）视为缺失
pub fn clean(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{a0}');
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "nan" || lowered == "none" {
        return None;
    }
    Some(trimmed.to_string())
}

/// 清洗并补零为定宽代码
///
/// # 返回
/// - Some(code): 纯数字且长度不超过 width，左侧补零至 width
/// - None: 缺失、含非数字字符、或超长
pub fn pad(raw: &str, width: usize) -> Option<String> {
    let value = clean(raw)?;
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if value.len() > width {
        return None;
    }
    Some(format!("{:0>width$}", value, width = width))
}

/// 判断是否为合法的定宽代码（已补零）
pub fn is_valid_code(code: &str, width: usize) -> bool {
    code.len() == width && code.chars().all(|c| c.is_ascii_digit())
}

/// 按列号读取并清洗（越界视为缺失）
pub fn cell(row: &[String], idx: usize) -> Option<String> {
    row.get(idx).and_then(|v| clean(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_basic() {
        assert_eq!(clean("  Energy  "), Some("Energy".to_string()));
        assert_eq!(clean("\u{a0}Energy\u{a0}"), Some("Energy".to_string()));
        assert_eq!(clean(""), None);
        assert_eq!(clean("   "), None);
    }

    #[test]
    fn test_clean_null_markers() {
        assert_eq!(clean("nan"), None);
        assert_eq!(clean("NaN"), None);
        assert_eq!(clean(" None "), None);
        assert_eq!(clean("Nonexistent"), Some("Nonexistent".to_string()));
    }

    #[test]
    fn test_pad_shorter_values() {
        for width in [2usize, 4, 6, 8] {
            for len in 1..=width {
                let raw = "7".repeat(len);
                let padded = pad(&raw, width).unwrap();
                assert_eq!(padded.len(), width);
                assert!(padded.ends_with(&raw));
                assert!(padded[..width - len].chars().all(|c| c == '0'));
            }
        }
    }

    #[test]
    fn test_pad_examples() {
        assert_eq!(pad("1", 2), Some("01".to_string()));
        assert_eq!(pad(" 101 ", 4), Some("0101".to_string()));
        assert_eq!(pad("1010101", 8), Some("01010101".to_string()));
        assert_eq!(pad("10101010", 8), Some("10101010".to_string()));
    }

    #[test]
    fn test_pad_rejects_invalid() {
        assert_eq!(pad("abc", 2), None);
        assert_eq!(pad("10.0", 2), None);
        assert_eq!(pad("-1", 2), None);
        assert_eq!(pad("123", 2), None);
        assert_eq!(pad("nan", 2), None);
        assert_eq!(pad("", 4), None);
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("0101", 4));
        assert!(!is_valid_code("101", 4));
        assert!(!is_valid_code("01a1", 4));
    }

    #[test]
    fn test_cell_out_of_range() {
        let row = vec!["10".to_string()];
        assert_eq!(cell(&row, 0), Some("10".to_string()));
        assert_eq!(cell(&row, 5), None);
    }
}
