//! Builder Module
//!
//! Fluent Builder APIを提供し、`Guide`インスタンスを段階的に構築する。
//! `Guide::run`が1回の実行（読み込み、フラグメント生成、ログ保存、結合、アーカイブ）を担います。

use std::path::{Path, PathBuf};

use crate::api::{Category, LogFormat};
use crate::archive::create_archive;
use crate::detect::find_changed_rows;
use crate::error::GuideError;
use crate::extract::extract_rows;
use crate::merge::merge_fragments;
use crate::parser::Workbook;
use crate::recorder::LogRecorder;
use crate::render::{Fragment, FragmentRenderer, DEFAULT_ASSET_BASE_URL, DEFAULT_TOOLTIP_BASE_URL};
use crate::sanitize::sanitize_filename;
use crate::types::ChangedRowSet;

/// タイムスタンプの書式
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 実行設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct GuideConfig {
    /// 出力ルート（実行ごとに`<output_root>/<timestamp>/`を作成）
    pub output_root: PathBuf,

    /// アーカイブの保存先（`None`の場合はアーカイブしない）
    pub archive_dir: Option<PathBuf>,

    /// 画像ファイルの配置先URL
    pub asset_base_url: String,

    /// ツールチップ画像の配置先URL
    pub tooltip_base_url: String,

    /// ログの出力形式
    pub log_format: LogFormat,

    /// HTMLエスケープを行うか
    pub escape_markup: bool,

    /// タイムスタンプの固定値（`None`の場合は現在時刻）
    pub timestamp: Option<String>,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("output"),
            archive_dir: Some(default_archive_dir()),
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
            tooltip_base_url: DEFAULT_TOOLTIP_BASE_URL.to_string(),
            log_format: LogFormat::default(),
            escape_markup: false,
            timestamp: None,
        }
    }
}

/// ユーザーのダウンロードフォルダ
///
/// `HOME`（Windowsでは`USERPROFILE`）が取得できない場合はカレントディレクトリです。
fn default_archive_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use huskguide::{GuideBuilder, LogFormat};
///
/// # fn main() -> Result<(), huskguide::GuideError> {
/// let guide = GuideBuilder::new()
///     .with_output_root("output")
///     .with_log_format(LogFormat::Csv)
///     .build()?;
/// let summary = guide.run("guide.xlsx")?;
/// println!("{} fragment(s)", summary.fragment_count);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GuideBuilder {
    /// 内部設定（構築中）
    config: GuideConfig,
}

impl Default for GuideBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GuideBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 出力ルート: `output`
    /// - アーカイブ: `~/Downloads`に作成
    /// - ログ形式: XLSX
    /// - HTMLエスケープ: しない
    pub fn new() -> Self {
        Self {
            config: GuideConfig::default(),
        }
    }

    /// 出力ルートディレクトリを指定する
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_root = root.into();
        self
    }

    /// アーカイブの保存先を指定する（アーカイブを有効にする）
    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.archive_dir = Some(dir.into());
        self
    }

    /// アーカイブを作成しない
    pub fn without_archive(mut self) -> Self {
        self.config.archive_dir = None;
        self
    }

    /// 画像ファイルの配置先URLを指定する
    pub fn with_asset_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.asset_base_url = url.into();
        self
    }

    /// ツールチップ画像の配置先URLを指定する
    pub fn with_tooltip_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.tooltip_base_url = url.into();
        self
    }

    /// ログの出力形式を指定する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use huskguide::{GuideBuilder, LogFormat};
    ///
    /// let builder = GuideBuilder::new().with_log_format(LogFormat::Csv);
    /// ```
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.config.log_format = format;
        self
    }

    /// 製品名と画像ファイル名をHTMLエスケープするかどうかを指定する
    ///
    /// 既定では無効で、値はそのままテンプレートに差し込まれます。
    pub fn with_escape_markup(mut self, escape: bool) -> Self {
        self.config.escape_markup = escape;
        self
    }

    /// 出力ディレクトリ名やファイル名に使うタイムスタンプを固定する
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.config.timestamp = Some(timestamp.into());
        self
    }

    /// 設定を検証し、`Guide`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `GuideError::Config(String)`: 設定の検証に失敗した場合
    ///   * 出力ルートが空
    ///   * 配置先URLが空、または`http://`/`https://`で始まらない
    ///   * タイムスタンプが空、またはファイル名に使えない文字を含む
    pub fn build(self) -> Result<Guide, GuideError> {
        // 1. 出力ルートの検証
        if self.config.output_root.as_os_str().is_empty() {
            return Err(GuideError::Config("Output root must not be empty".to_string()));
        }

        // 2. URLの検証
        for (name, url) in [
            ("asset base URL", &self.config.asset_base_url),
            ("tooltip base URL", &self.config.tooltip_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(GuideError::Config(format!(
                    "Invalid {}: '{}' (expected http:// or https://)",
                    name, url
                )));
            }
        }

        // 3. タイムスタンプの検証
        if let Some(ref timestamp) = self.config.timestamp {
            if timestamp.is_empty() || sanitize_filename(timestamp) != *timestamp {
                return Err(GuideError::Config(format!(
                    "Invalid timestamp: '{}'",
                    timestamp
                )));
            }
        }

        Ok(Guide::new(self.config))
    }
}

/// 1回の実行の状態
///
/// 実行が所有し、各段階に`&mut`で渡します。
#[derive(Debug)]
pub struct RunContext {
    /// 実行ごとの出力ディレクトリ
    pub output_dir: PathBuf,
    /// ファイル名に使うタイムスタンプ
    pub timestamp: String,
    /// ログの記録係
    pub recorder: LogRecorder,
    /// シートごとの変更行（処理順）
    pub changed_rows: Vec<(String, ChangedRowSet)>,
    /// 処理できなかったシート
    pub skipped_tabs: Vec<String>,
}

impl RunContext {
    pub fn new(output_dir: PathBuf, timestamp: impl Into<String>) -> Self {
        Self {
            output_dir,
            timestamp: timestamp.into(),
            recorder: LogRecorder::new(),
            changed_rows: Vec::new(),
            skipped_tabs: Vec::new(),
        }
    }
}

/// 実行結果
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// 実行ごとの出力ディレクトリ
    pub output_dir: PathBuf,
    /// 生成したフラグメントの数
    pub fragment_count: usize,
    /// 生成した結合フラグメント
    pub merged_files: Vec<PathBuf>,
    /// 保存したログファイル
    pub log_files: Vec<PathBuf>,
    /// 処理できなかったシート
    pub skipped_tabs: Vec<String>,
    /// 作成したアーカイブ
    pub archive_path: Option<PathBuf>,
}

/// 製品ガイド生成のファサード
///
/// `GuideBuilder`で構築された設定に基づいて実行します。
#[derive(Debug)]
pub struct Guide {
    config: GuideConfig,
    renderer: FragmentRenderer,
}

impl Guide {
    pub(crate) fn new(config: GuideConfig) -> Self {
        Self {
            renderer: FragmentRenderer::new(
                config.asset_base_url.clone(),
                config.tooltip_base_url.clone(),
            )
            .with_escape_markup(config.escape_markup),
            config,
        }
    }

    /// ワークブックを変換する
    ///
    /// # 処理フロー
    ///
    /// 1. 入力ファイルの確認
    /// 2. ワークブックの読み込みと対象シートの選別
    /// 3. シートごとに変更行の検出、行の抽出、フラグメントの書き出し
    /// 4. ログの保存
    /// 5. 단색/별색フラグメントの結合
    /// 6. アーカイブの作成
    ///
    /// シート単位の失敗は警告を出してそのシートだけをスキップします。
    /// それ以外の失敗は実行全体のエラーになりますが、書き出し済みのファイルは残ります。
    pub fn run(&self, input: impl AsRef<Path>) -> Result<RunSummary, GuideError> {
        let input = input.as_ref();
        if !input.is_file() {
            return Err(GuideError::InputSelection(input.display().to_string()));
        }

        log::info!("Reading {}", input.display());
        let workbook = Workbook::open_path(input)?;
        self.run_workbook(&workbook)
    }

    /// 読み込み済みのワークブックを変換する
    pub fn run_workbook(&self, workbook: &Workbook) -> Result<RunSummary, GuideError> {
        let tab_names: Vec<&str> = workbook
            .tab_names()
            .into_iter()
            .filter(|name| Category::match_keyword(name).is_some())
            .collect();
        if tab_names.is_empty() {
            return Err(GuideError::NoCategoryTabs);
        }

        let timestamp = self.timestamp();
        let output_dir = self.config.output_root.join(&timestamp);
        std::fs::create_dir_all(&output_dir)?;
        let mut ctx = RunContext::new(output_dir, timestamp);

        let mut fragment_count = 0;
        for tab_name in tab_names {
            match self.process_tab(workbook, tab_name, &mut ctx) {
                Ok(count) => {
                    log::info!("'{}': {} fragment(s)", tab_name, count);
                    fragment_count += count;
                }
                Err(e) => {
                    log::warn!("Skipping sheet '{}': {}", tab_name, e);
                    ctx.skipped_tabs.push(tab_name.to_string());
                }
            }
        }

        let log_files = ctx.recorder.persist(
            &ctx.output_dir,
            &ctx.timestamp,
            self.config.log_format,
            &ctx.changed_rows,
        )?;
        let merged_files = merge_fragments(&ctx.output_dir, &self.renderer)?;

        let archive_path = match &self.config.archive_dir {
            Some(dir) => Some(create_archive(&ctx.output_dir, dir, &ctx.timestamp)?),
            None => None,
        };

        Ok(RunSummary {
            output_dir: ctx.output_dir,
            fragment_count,
            merged_files,
            log_files,
            skipped_tabs: ctx.skipped_tabs,
            archive_path,
        })
    }

    /// 1シート分の処理
    fn process_tab(
        &self,
        workbook: &Workbook,
        tab_name: &str,
        ctx: &mut RunContext,
    ) -> Result<usize, GuideError> {
        let category = Category::from_tab_name(tab_name);
        let rows = extract_rows(workbook, tab_name)?;

        ctx.changed_rows
            .push((tab_name.to_string(), find_changed_rows(workbook, tab_name)));

        let mut count = 0;
        for record in rows {
            let fragment = Fragment::from_record(&record, category);
            let log_record = self.renderer.write(&fragment, &ctx.output_dir, tab_name)?;
            ctx.recorder.record(log_record);
            count += 1;
        }
        Ok(count)
    }

    fn timestamp(&self) -> String {
        match &self.config.timestamp {
            Some(timestamp) => timestamp.clone(),
            None => chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Tab;
    use crate::types::CellCoord;
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn tab(name: &str, data_rows: Vec<Vec<String>>) -> Tab {
        let mut rows = vec![row(&["", "순번", "제품명", "이미지"]), row(&[""])];
        rows.extend(data_rows);
        Tab::new(name, rows)
    }

    fn guide(dir: &TempDir) -> Guide {
        GuideBuilder::new()
            .with_output_root(dir.path().join("output"))
            .without_archive()
            .with_log_format(LogFormat::Csv)
            .with_timestamp("20250101_120000")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let builder = GuideBuilder::new();
        assert_eq!(builder.config.output_root, PathBuf::from("output"));
        assert!(builder.config.archive_dir.is_some());
        assert_eq!(builder.config.asset_base_url, DEFAULT_ASSET_BASE_URL);
        assert_eq!(builder.config.log_format, LogFormat::Xlsx);
        assert!(!builder.config.escape_markup);
        assert!(builder.config.timestamp.is_none());
    }

    #[test]
    fn test_builder_method_chaining() {
        let builder = GuideBuilder::new()
            .with_output_root("out")
            .with_archive_dir("zips")
            .with_asset_base_url("https://cdn.example.com/a")
            .with_tooltip_base_url("https://cdn.example.com/t")
            .with_log_format(LogFormat::Csv)
            .with_escape_markup(true)
            .with_timestamp("20250101_000000");

        assert_eq!(builder.config.output_root, PathBuf::from("out"));
        assert_eq!(builder.config.archive_dir, Some(PathBuf::from("zips")));
        assert_eq!(builder.config.log_format, LogFormat::Csv);
        assert!(builder.config.escape_markup);
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_without_archive() {
        let builder = GuideBuilder::new().without_archive();
        assert!(builder.config.archive_dir.is_none());
    }

    #[test]
    fn test_build_with_invalid_url() {
        let result = GuideBuilder::new().with_asset_base_url("ftp://x").build();
        match result {
            Err(GuideError::Config(msg)) => assert!(msg.contains("asset base URL")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_build_with_invalid_timestamp() {
        assert!(GuideBuilder::new().with_timestamp("").build().is_err());
        assert!(GuideBuilder::new().with_timestamp("2025/01/01").build().is_err());
    }

    #[test]
    fn test_build_with_empty_output_root() {
        assert!(GuideBuilder::new().with_output_root("").build().is_err());
    }

    #[test]
    fn test_run_missing_input_is_input_selection_error() {
        let dir = TempDir::new().unwrap();
        let result = guide(&dir).run(dir.path().join("missing.xlsx"));
        assert!(matches!(result, Err(GuideError::InputSelection(_))));
    }

    #[test]
    fn test_run_without_keyword_tabs() {
        let dir = TempDir::new().unwrap();
        let workbook = Workbook::from_tabs(vec![tab("Sheet1", Vec::new())]);
        let result = guide(&dir).run_workbook(&workbook);
        assert!(matches!(result, Err(GuideError::NoCategoryTabs)));
    }

    #[test]
    fn test_run_workbook_writes_fragments_and_logs() {
        let dir = TempDir::new().unwrap();
        let workbook = Workbook::from_tabs(vec![
            tab(
                "파일명 리스트(단색)",
                vec![row(&["", "1", "Mug", "img1.png", "img2.png"])],
            )
            .with_fill(CellCoord::new(2, 2), "FFFFFF00"),
            tab("Sheet1", vec![row(&["", "1", "Ignored", "x.png"])]),
        ]);

        let summary = guide(&dir).run_workbook(&workbook).unwrap();
        assert_eq!(summary.fragment_count, 1);
        assert_eq!(
            summary.output_dir,
            dir.path().join("output").join("20250101_120000")
        );
        assert!(summary.output_dir.join("단색").join("01_Mug.txt").is_file());
        assert_eq!(summary.log_files.len(), 2);
        assert!(summary.merged_files.is_empty());
        assert!(summary.skipped_tabs.is_empty());
        assert!(summary.archive_path.is_none());
    }

    #[test]
    fn test_highlight_follows_first_processed_tab() {
        let dir = TempDir::new().unwrap();
        let guide = GuideBuilder::new()
            .with_output_root(dir.path().join("output"))
            .without_archive()
            .with_timestamp("20250101_120000")
            .build()
            .unwrap();
        let workbook = Workbook::from_tabs(vec![
            tab("단색 B", vec![row(&["", "1", "Mug", "a.png"])])
                .with_fill(CellCoord::new(2, 2), "FFFFFF00"),
            tab(
                "단색 A",
                vec![row(&["", "2", "Cup", "b.png"]), row(&["", "3", "Pen", "c.png"])],
            )
            .with_fill(CellCoord::new(3, 2), "FFFFFF00"),
        ]);

        let summary = guide.run_workbook(&workbook).unwrap();
        let mono_log = summary
            .log_files
            .iter()
            .find(|p| p.to_string_lossy().contains("log_mono_"))
            .unwrap();
        let log = Workbook::open_path(mono_log).unwrap();
        let mut rows: Vec<u32> = log
            .tab("Sheet1")
            .unwrap()
            .fills()
            .map(|(coord, _)| coord.physical_row())
            .collect();
        rows.sort_unstable();
        rows.dedup();
        // 단색 B の3行目 -> ログの2行目
        assert_eq!(rows, vec![2]);
    }

    #[test]
    fn test_run_context_tracks_changed_rows() {
        let dir = TempDir::new().unwrap();
        let guide = guide(&dir);
        let workbook = Workbook::from_tabs(vec![tab(
            "☆파일명 리스트(별색)",
            vec![row(&["", "1", "Mug", "a.png"])],
        )
        .with_fill(CellCoord::new(2, 1), "FFFF00")]);

        let mut ctx = RunContext::new(dir.path().to_path_buf(), "t");
        let count = guide
            .process_tab(&workbook, "☆파일명 리스트(별색)", &mut ctx)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(ctx.changed_rows.len(), 1);
        assert_eq!(ctx.changed_rows[0].0, "☆파일명 리스트(별색)");
        assert!(ctx.changed_rows[0].1.contains(&3));
        assert_eq!(ctx.recorder.records().len(), 1);
        assert!(dir.path().join("별색").join("01_Mug.txt").is_file());
    }
}
