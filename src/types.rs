//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::collections::BTreeSet;

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列から座標を生成（例: "B3" -> (2, 1)）
    ///
    /// 列文字または行番号が欠けている場合は`None`を返します。
    pub fn from_a1(reference: &str) -> Option<Self> {
        let mut col: u32 = 0;
        let mut row_str = String::new();
        let mut seen_col = false;

        for ch in reference.chars() {
            if ch.is_ascii_alphabetic() && row_str.is_empty() {
                let val = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
                col = col.checked_mul(26)?.checked_add(val)?;
                seen_col = true;
            } else if ch.is_ascii_digit() {
                row_str.push(ch);
            } else if ch != '$' {
                return None;
            }
        }

        if !seen_col || row_str.is_empty() {
            return None;
        }

        let row = row_str.parse::<u32>().ok()?.checked_sub(1)?;
        Some(Self::new(row, col - 1))
    }

    /// 1始まりの物理行番号
    pub fn physical_row(&self) -> u32 {
        self.row + 1
    }
}

/// 変更行の集合（1始まりの物理行番号、3行目以降のみ）
pub type ChangedRowSet = BTreeSet<u32>;

/// スプレッドシートの1行から抽出された製品データ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    /// 1始まりの物理行番号
    pub source_row: u32,
    /// 順番（数値なら2桁ゼロ埋め、それ以外はそのまま）
    pub sequence: String,
    /// 製品名
    pub label: String,
    /// 画像ファイル名（NFKC正規化済み、空要素なし）
    pub assets: Vec<String>,
}

/// 変換ログの1レコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// 元のシート名
    pub tab_name: String,
    /// 順番
    pub sequence: String,
    /// 製品名
    pub label: String,
    /// 画像の枚数
    pub asset_count: usize,
    /// カンマ区切りの画像ファイル名
    pub asset_list: String,
    /// 生成したフラグメントのパス
    pub artifact_path: String,
}

impl LogRecord {
    /// ログテーブルの列見出し
    pub const HEADERS: [&'static str; 6] = [
        "시트명",
        "순번",
        "제품명",
        "이미지_개수",
        "이미지_파일목록",
        "HTML_파일경로",
    ];

    /// 各列の表示文字列（見出しと同じ順序）
    pub fn columns(&self) -> [String; 6] {
        [
            self.tab_name.clone(),
            self.sequence.clone(),
            self.label.clone(),
            self.asset_count.to_string(),
            self.asset_list.clone(),
            self.artifact_path.clone(),
        ]
    }
}
