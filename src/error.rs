//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// huskguideクレート全体で使用するエラー型
///
/// ワークブックの読み込み、フラグメント生成、ログ保存、アーカイブ作成の
/// すべての段階で発生するエラーを統一的に扱います。
///
/// # エラーの分類
///
/// - 入力選択エラー（`InputSelection`）: 処理開始前に致命的
/// - シート単位のエラー（`TabNotFound`, `TabLoad`）: 該当シートのみスキップ
/// - それ以外: 実行全体のエラーとして呼び出し元へ伝播
///
/// # 使用例
///
/// ```rust,no_run
/// use huskguide::GuideError;
/// use std::fs::File;
///
/// fn open_input(path: &str) -> Result<File, GuideError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(file)
/// }
/// ```
#[derive(Error, Debug)]
pub enum GuideError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// calamineがワークブックの解析に失敗したエラー
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// UTF-8文字列の変換エラー
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// 数値の解析エラー
    #[error("Number parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// ZIPアーカイブの読み書きエラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// ワークブック内部XMLの解析エラー
    #[error("XML parse error: {0}")]
    Xml(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `GuideBuilder::build()`や設定ファイルの読み込み時に発生します。
    #[error("Configuration error: {0}")]
    Config(String),

    /// フラグメント記録（JSON）のシリアライズ／デシリアライズエラー
    #[error("Fragment record error: {0}")]
    Json(#[from] serde_json::Error),

    /// ログテーブル（XLSX）の書き込みエラー
    #[error("Failed to write log table: {0}")]
    LogWrite(#[from] rust_xlsxwriter::XlsxError),

    /// 入力ファイルが選択されていない、または存在しない
    #[error("No input workbook selected: {0}")]
    InputSelection(String),

    /// 指定したシートがワークブックに存在しない
    #[error("Sheet '{0}' not found")]
    TabNotFound(String),

    /// シートの読み込みに失敗した
    #[error("Failed to load sheet '{tab}': {message}")]
    TabLoad {
        /// 読み込みに失敗したシート名
        tab: String,
        /// 失敗の詳細
        message: String,
    },

    /// カテゴリキーワード（단색／별색／일반）を含むシートが一つもない
    #[error("Workbook has no sheet whose name contains a category keyword")]
    NoCategoryTabs,

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb、パストラバーサル、入力サイズ上限などの違反時に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
