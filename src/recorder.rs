//! Log Recorder Module
//!
//! 実行中に生成したフラグメントのログを蓄積し、全体ログとカテゴリ別ログとして保存する。
//! カテゴリ別ログでは、元シートの変更行に対応する行をハイライトします。

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::api::{Category, LogFormat};
use crate::detect::FIRST_DATA_ROW;
use crate::error::GuideError;
use crate::output::LogFormatter;
use crate::types::{ChangedRowSet, LogRecord};

/// 元シートの行番号とログの行番号の差
const LOG_ROW_OFFSET: u32 = 1;

/// ログの最初のデータ行（1始まり、1行目は見出し）
const FIRST_LOG_ROW: u32 = 2;

/// 元シートの変更行をログの行番号に変換
///
/// `log_row = source_row - 1`で対応付け、見出し行に当たるものは除外します。
///
/// # 使用例
///
/// ```rust
/// use huskguide::{log_rows_for, ChangedRowSet};
///
/// let changed: ChangedRowSet = [3, 5].into_iter().collect();
/// assert_eq!(log_rows_for(&changed).into_iter().collect::<Vec<_>>(), vec![2, 4]);
/// ```
pub fn log_rows_for(changed: &ChangedRowSet) -> BTreeSet<u32> {
    changed
        .iter()
        .filter(|row| **row >= FIRST_DATA_ROW)
        .map(|row| row - LOG_ROW_OFFSET)
        .filter(|row| *row >= FIRST_LOG_ROW)
        .collect()
}

/// 処理順に並んだシートごとの変更行
pub type TabChanges = [(String, ChangedRowSet)];

/// カテゴリ別ログでハイライトする行
///
/// カテゴリごとに最初に処理されたシートの変更行を使います。
/// そのカテゴリのシートが処理されていない場合は`None`です。
pub fn highlight_rows(changes: &TabChanges, category: Category) -> Option<BTreeSet<u32>> {
    changes
        .iter()
        .find(|(tab_name, _)| Category::from_tab_name(tab_name) == category)
        .map(|(_, changed)| log_rows_for(changed))
}

/// 変換ログの記録係
#[derive(Debug, Default)]
pub struct LogRecorder {
    records: Vec<LogRecord>,
}

impl LogRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// レコードを追加
    pub fn record(&mut self, record: LogRecord) {
        self.records.push(record);
    }

    /// 記録したすべてのレコード（追加順）
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// カテゴリに属するレコード
    ///
    /// 所属はレコードのシート名から[`Category::from_tab_name`]で判定します。
    pub fn partition(&self, category: Category) -> Vec<LogRecord> {
        self.records
            .iter()
            .filter(|record| Category::from_tab_name(&record.tab_name) == category)
            .cloned()
            .collect()
    }

    /// ログを保存する
    ///
    /// `html_log_all_<timestamp>`と、空でないカテゴリごとの`log_<slug>_<timestamp>`を
    /// `dir`に書き出します。カテゴリ別ログは、そのカテゴリのシートが`changes`に
    /// 含まれる場合のみ書き出します。
    ///
    /// # 戻り値
    ///
    /// 書き出したファイルのパス（レコードがない場合は空）
    pub fn persist(
        &self,
        dir: &Path,
        timestamp: &str,
        format: LogFormat,
        changes: &TabChanges,
    ) -> Result<Vec<PathBuf>, GuideError> {
        if self.records.is_empty() {
            log::info!("No log records to write");
            return Ok(Vec::new());
        }

        let formatter = LogFormatter::from_format(format);
        let mut written = Vec::new();

        let all_path = dir.join(format!("html_log_all_{}.{}", timestamp, format.extension()));
        formatter.write(&self.records, &BTreeSet::new(), &all_path)?;
        log::info!("Wrote log: {}", all_path.display());
        written.push(all_path);

        for category in Category::ALL {
            let partition = self.partition(category);
            if partition.is_empty() {
                continue;
            }
            let Some(highlight) = highlight_rows(changes, category) else {
                continue;
            };

            let path = dir.join(format!(
                "log_{}_{}.{}",
                category.log_slug(),
                timestamp,
                format.extension()
            ));
            formatter.write(&partition, &highlight, &path)?;
            log::info!("Wrote {} log: {}", category.folder_name(), path.display());
            written.push(path);
        }

        Ok(written)
    }
}
