//! Change Detector Module
//!
//! 変更を示す黄色（`FFFF00`）で塗りつぶされたセルを含む行を検出する。

use crate::parser::Workbook;
use crate::types::ChangedRowSet;

/// 変更マーカーとして扱う塗りつぶし色（RGB部分）
pub const SENTINEL_RGB: &str = "FFFF00";

/// データ行の開始行（1始まり、1〜2行目は見出し）
pub const FIRST_DATA_ROW: u32 = 3;

/// 塗りつぶし色が変更マーカーかどうかを判定
///
/// 6桁（RGB）または8桁（ARGB）の16進文字列で、末尾が`FFFF00`のものを
/// 大文字小文字を区別せずに一致とみなします。
///
/// # 使用例
///
/// ```rust
/// use huskguide::is_sentinel_color;
///
/// assert!(is_sentinel_color("FFFF00"));
/// assert!(is_sentinel_color("ffffff00"));
/// assert!(!is_sentinel_color("FFFF0000"));
/// ```
pub fn is_sentinel_color(rgb: &str) -> bool {
    let rgb = rgb.trim();
    matches!(rgb.len(), 6 | 8)
        && rgb.chars().all(|ch| ch.is_ascii_hexdigit())
        && rgb.to_ascii_uppercase().ends_with(SENTINEL_RGB)
}

/// シート内の変更行を検出
///
/// 3行目以降のセルを対象に、変更マーカー色で塗りつぶされたセルを
/// 1つ以上含む行番号（1始まり）を返します。
///
/// # 戻り値
///
/// 変更行の集合。シートが存在しない、または読み込めない場合は警告を出して空集合を返します。
pub fn find_changed_rows(workbook: &Workbook, tab_name: &str) -> ChangedRowSet {
    let tab = match workbook.tab(tab_name) {
        Ok(tab) => tab,
        Err(e) => {
            log::warn!("Change detection skipped for '{}': {}", tab_name, e);
            return ChangedRowSet::new();
        }
    };

    let changed: ChangedRowSet = tab
        .fills()
        .filter(|(coord, _)| coord.physical_row() >= FIRST_DATA_ROW)
        .filter(|(_, rgb)| is_sentinel_color(rgb))
        .map(|(coord, _)| coord.physical_row())
        .collect();

    log::debug!("'{}': {} changed row(s)", tab_name, changed.len());
    changed
}
