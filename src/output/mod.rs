//! Log Output Module
//!
//! Strategy Patternによるログテーブル出力形式の抽象化を提供するモジュール。

mod formatters;

use std::collections::BTreeSet;
use std::path::Path;

use crate::api::LogFormat;
use crate::error::GuideError;
use crate::types::LogRecord;

pub use formatters::*;

/// ログテーブルのフォーマッター（Strategy Pattern）
///
/// 各出力形式（XLSX, CSV）をenumとして表現します。
#[derive(Debug, Clone, Copy)]
pub enum LogFormatter {
    Xlsx,
    Csv,
}

impl LogFormatter {
    /// 出力形式からフォーマッターを生成
    pub fn from_format(format: LogFormat) -> Self {
        match format {
            LogFormat::Xlsx => LogFormatter::Xlsx,
            LogFormat::Csv => LogFormatter::Csv,
        }
    }

    /// ログテーブルをファイルに書き出す
    ///
    /// # 引数
    ///
    /// * `records` - 書き出すレコード（見出し行の次から順に並ぶ）
    /// * `highlight_rows` - ハイライトする行番号（1始まり、見出し行が1）
    /// * `path` - 出力先
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 出力に成功した場合
    /// * `Err(GuideError)` - 書き込みに失敗した場合
    pub fn write(
        &self,
        records: &[LogRecord],
        highlight_rows: &BTreeSet<u32>,
        path: &Path,
    ) -> Result<(), GuideError> {
        match self {
            LogFormatter::Xlsx => XlsxLogFormatter.write(records, highlight_rows, path),
            LogFormatter::Csv => CsvLogFormatter.write(records, path),
        }
    }
}
