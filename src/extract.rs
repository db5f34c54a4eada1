//! Row Extractor Module
//!
//! シートの各行から順番、製品名、画像ファイル名の列を取り出す。

use unicode_normalization::UnicodeNormalization;

use crate::error::GuideError;
use crate::parser::{Tab, Workbook};
use crate::types::RowRecord;

/// 見出しとして読み飛ばす行数
const HEADER_ROWS: usize = 2;

/// 順番の列（B列）
const SEQUENCE_COL: usize = 1;

/// 製品名の列（C列）
const LABEL_COL: usize = 2;

/// 画像ファイル名の開始列（D列）
const FIRST_ASSET_COL: usize = 3;

/// シートの行を[`RowRecord`]として列挙する
///
/// 呼び出すたびに不変のワークブックから新しいイテレータを生成するため、
/// 何度でも最初からやり直せます。
///
/// # 戻り値
///
/// * `Ok(Rows)` - 行のイテレータ
/// * `Err(GuideError::TabNotFound | GuideError::TabLoad)` - シートが使用できない場合
///
/// # 使用例
///
/// ```rust
/// use huskguide::{extract_rows, Tab, Workbook};
///
/// let row = |cells: &[&str]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();
/// let tab = Tab::new("파일명 리스트(단색)", vec![
///     row(&["", "순번", "제품명"]),
///     row(&["", "", ""]),
///     row(&["", "1", "Mug", "img1.png", "", "img2.png"]),
/// ]);
/// let workbook = Workbook::from_tabs(vec![tab]);
///
/// let records: Vec<_> = extract_rows(&workbook, "파일명 리스트(단색)").unwrap().collect();
/// assert_eq!(records[0].sequence, "01");
/// assert_eq!(records[0].assets, vec!["img1.png", "img2.png"]);
/// ```
pub fn extract_rows<'a>(workbook: &'a Workbook, tab_name: &str) -> Result<Rows<'a>, GuideError> {
    let tab = workbook.tab(tab_name)?;
    Ok(Rows::new(tab))
}

/// シート行のイテレータ
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    tab: &'a Tab,
    next_row: usize,
}

impl<'a> Rows<'a> {
    fn new(tab: &'a Tab) -> Self {
        Self {
            tab,
            next_row: HEADER_ROWS,
        }
    }
}

impl Iterator for Rows<'_> {
    type Item = RowRecord;

    fn next(&mut self) -> Option<RowRecord> {
        while let Some(cells) = self.tab.rows().get(self.next_row) {
            let index = self.next_row;
            self.next_row += 1;

            if let Some(record) = row_record(index, cells) {
                return Some(record);
            }
        }
        None
    }
}

/// 1行を解析（対象外の行は`None`）
fn row_record(index: usize, cells: &[String]) -> Option<RowRecord> {
    let cell = |col: usize| cells.get(col).map(|s| s.trim()).unwrap_or("");

    let sequence = cell(SEQUENCE_COL);
    if sequence.is_empty() {
        return None;
    }

    let label = cell(LABEL_COL);
    if label.is_empty() {
        return None;
    }

    let assets: Vec<String> = cells
        .iter()
        .skip(FIRST_ASSET_COL)
        .map(|value| value.nfkc().collect::<String>().trim().to_string())
        .filter(|asset| !asset.is_empty())
        .collect();
    if assets.is_empty() {
        return None;
    }

    Some(RowRecord {
        source_row: index as u32 + 1,
        sequence: format_sequence(sequence),
        label: label.to_string(),
        assets,
    })
}

/// 順番を整形する
///
/// 整数として解釈できる場合は2桁にゼロ埋めし、それ以外はそのまま返します。
///
/// # 使用例
///
/// ```rust
/// use huskguide::format_sequence;
///
/// assert_eq!(format_sequence("7"), "07");
/// assert_eq!(format_sequence("123"), "123");
/// assert_eq!(format_sequence("A-1"), "A-1");
/// ```
pub fn format_sequence(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(number) => format!("{:02}", number),
        Err(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TAB: &str = "파일명 리스트(단색)";

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn workbook(data_rows: Vec<Vec<String>>) -> Workbook {
        let mut rows = vec![row(&["", "순번", "제품명", "이미지"]), row(&[""])];
        rows.extend(data_rows);
        Workbook::from_tabs(vec![Tab::new(TAB, rows)])
    }

    fn collect(workbook: &Workbook) -> Vec<RowRecord> {
        extract_rows(workbook, TAB).unwrap().collect()
    }

    #[test]
    fn test_numeric_sequence_is_zero_padded() {
        let wb = workbook(vec![row(&["", "7", "Mug", "a.png"])]);
        let records = collect(&wb);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, "07");
        assert_eq!(records[0].source_row, 3);
    }

    #[test]
    fn test_non_numeric_sequence_passes_through() {
        let wb = workbook(vec![row(&["", "abc", "Mug", "a.png"])]);
        assert_eq!(collect(&wb)[0].sequence, "abc");
    }

    #[test]
    fn test_empty_sequence_drops_row() {
        let wb = workbook(vec![row(&["", "  ", "Mug", "a.png"])]);
        assert!(collect(&wb).is_empty());
    }

    #[test]
    fn test_empty_label_drops_row() {
        let wb = workbook(vec![row(&["", "1", " ", "a.png"])]);
        assert!(collect(&wb).is_empty());
    }

    #[test]
    fn test_all_empty_assets_drop_row() {
        let wb = workbook(vec![row(&["", "1", "Mug", "", "   ", ""])]);
        assert!(collect(&wb).is_empty());
    }

    #[test]
    fn test_assets_are_normalized_and_gaps_skipped() {
        let wb = workbook(vec![row(&["", "2", " Cup ", " ｉｍｇ１.png ", "", "img2.png"])]);
        let records = collect(&wb);
        assert_eq!(records[0].label, "Cup");
        assert_eq!(records[0].assets, vec!["img1.png", "img2.png"]);
    }

    #[test]
    fn test_header_rows_are_never_extracted() {
        let rows = vec![
            row(&["", "1", "Header", "h.png"]),
            row(&["", "2", "Header", "h.png"]),
        ];
        let wb = Workbook::from_tabs(vec![Tab::new(TAB, rows)]);
        assert!(collect(&wb).is_empty());
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let wb = workbook(vec![row(&["", "1"]), Vec::new(), row(&["", "3", "Pen", "p.png"])]);
        let records = collect(&wb);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_row, 5);
    }

    #[test]
    fn test_extraction_is_restartable() {
        let wb = workbook(vec![
            row(&["", "1", "Mug", "a.png"]),
            row(&["", "2", "Cup", "b.png"]),
        ]);
        let first = collect(&wb);
        let second = collect(&wb);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_missing_tab_is_an_error() {
        let wb = workbook(Vec::new());
        assert!(matches!(
            extract_rows(&wb, "파일명 리스트(별색)"),
            Err(GuideError::TabNotFound(_))
        ));
    }

    #[test]
    fn test_format_sequence_edge_cases() {
        assert_eq!(format_sequence("007"), "07");
        assert_eq!(format_sequence("-3"), "-3");
        assert_eq!(format_sequence(" 12 "), "12");
        assert_eq!(format_sequence("1.5"), "1.5");
    }

    proptest! {
        #[test]
        fn prop_small_numbers_have_two_digits(n in 0i64..100) {
            let formatted = format_sequence(&n.to_string());
            prop_assert_eq!(formatted.len(), 2);
            prop_assert_eq!(formatted.parse::<i64>().unwrap(), n);
        }
    }
}
