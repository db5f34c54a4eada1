//! Fragment Renderer Module
//!
//! 抽出した行をカテゴリのテーマで装飾したHTMLフラグメントに変換し、
//! カテゴリフォルダに書き出す。

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::{Category, Theme};
use crate::error::GuideError;
use crate::sanitize::sanitize_filename;
use crate::types::{LogRecord, RowRecord};

/// 画像ファイルの配置先（既定値）
pub const DEFAULT_ASSET_BASE_URL: &str =
    "https://huskb2bstorage.blob.core.windows.net/shopicus/dev_1/guide/03_make/page";

/// ツールチップ画像の配置先（既定値）
pub const DEFAULT_TOOLTIP_BASE_URL: &str =
    "https://huskb2bstorage.blob.core.windows.net/shopicus/dev_1/guide/test";

/// レンダリング済みフラグメントの拡張子
pub const FRAGMENT_EXTENSION: &str = "txt";

/// フラグメント記録（構造化データ）の拡張子
pub const RECORD_EXTENSION: &str = "fragment.json";

/// 1製品分のフラグメント
///
/// レンダリング結果とは別にJSONとして保存され、結合処理はこの構造を読み込みます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// カテゴリ
    pub category: Category,
    /// 順番
    pub sequence: String,
    /// 製品名
    pub label: String,
    /// 画像ファイル名（行の順序どおり）
    pub assets: Vec<String>,
}

impl Fragment {
    /// 抽出済みの行からフラグメントを生成
    pub fn from_record(record: &RowRecord, category: Category) -> Self {
        Self {
            category,
            sequence: record.sequence.clone(),
            label: record.label.clone(),
            assets: record.assets.clone(),
        }
    }

    /// 出力ファイル名の語幹（`<順番>_<製品名>`）
    pub fn stem(&self) -> String {
        format!("{}_{}", self.sequence, sanitize_filename(&self.label))
    }
}

/// フラグメントのレンダラー
///
/// テンプレートへの差し込みは単純な文字列連結です。`escape_markup`が無効の場合、
/// 製品名や画像ファイル名に含まれるHTMLの特殊文字はそのまま出力されます。
#[derive(Debug, Clone)]
pub struct FragmentRenderer {
    asset_base_url: String,
    tooltip_base_url: String,
    escape_markup: bool,
}

impl Default for FragmentRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_BASE_URL, DEFAULT_TOOLTIP_BASE_URL)
    }
}

impl FragmentRenderer {
    /// 配置先URLを指定してレンダラーを生成
    pub fn new(asset_base_url: impl Into<String>, tooltip_base_url: impl Into<String>) -> Self {
        Self {
            asset_base_url: asset_base_url.into(),
            tooltip_base_url: tooltip_base_url.into(),
            escape_markup: false,
        }
    }

    /// 製品名と画像ファイル名をHTMLエスケープするかどうかを設定
    pub fn with_escape_markup(mut self, escape: bool) -> Self {
        self.escape_markup = escape;
        self
    }

    /// フラグメントをHTML文字列にレンダリング
    ///
    /// 同じ入力に対しては常にバイト単位で同一の結果を返します。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use huskguide::{Category, Fragment, FragmentRenderer};
    ///
    /// let fragment = Fragment {
    ///     category: Category::Plain,
    ///     sequence: "01".to_string(),
    ///     label: "Mug".to_string(),
    ///     assets: vec!["img1.png".to_string(), "img2.png".to_string()],
    /// };
    /// let html = FragmentRenderer::default().render(&fragment);
    /// assert!(html.contains("img1.png?ver=1"));
    /// assert!(html.contains("img2.png?ver=2"));
    /// assert!(html.contains("#4DA3FF"));
    /// ```
    pub fn render(&self, fragment: &Fragment) -> String {
        let mut html = String::from(
            r#"
        <div style="width:100%; max-width:720px; margin:0 auto; padding:0 16px;
        display:flex; flex-direction:column; align-items:center; gap:20px;">
"#,
        );
        html.push_str(&format!(
            r#"
            <div style="border:4px solid {}; border-radius:12px; width:100%;
                display:flex; flex-direction:column; align-items:center; padding-bottom:30px; position:relative;">
"#,
            fragment.category.theme().border_color
        ));
        self.push_heading(&mut html, fragment.category.theme(), &fragment.label);
        self.push_assets(&mut html, &fragment.assets);
        html.push_str(
            r#"
            </div>
        </div>
"#,
        );
        html
    }

    /// ツールチップ画像と見出し
    pub(crate) fn push_heading(&self, html: &mut String, theme: &Theme, label: &str) {
        html.push_str(&format!(
            r#"
                <img src="{}/{}"
                    alt="{}"
                    style="position:absolute; top:15px; left:50%; transform:translateX(-50%);
                    width:130px; height:auto; z-index:10;">

                <h2 style="margin-top:75px; margin-bottom:30px;
                    font-size:20px; font-weight:600;">{}</h2>
"#,
            self.tooltip_base_url,
            theme.tooltip_file,
            theme.tooltip_alt,
            self.text(label)
        ));
    }

    /// 画像ブロック（`?ver=`は1始まり）
    pub(crate) fn push_assets(&self, html: &mut String, assets: &[String]) {
        for (i, asset) in assets.iter().enumerate() {
            html.push_str(&format!(
                r#"
                <div style="margin-top:30px;">
                    <img src="{}/{}?ver={}"
                        style="width:100%; max-width:450px;"
                        class="e-rte-image e-imginline">
                </div>
"#,
                self.asset_base_url,
                self.attribute(asset),
                i + 1
            ));
        }
    }

    fn text<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.escape_markup {
            htmlize::escape_text(value)
        } else {
            Cow::Borrowed(value)
        }
    }

    fn attribute<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.escape_markup {
            htmlize::escape_attribute(value)
        } else {
            Cow::Borrowed(value)
        }
    }

    /// フラグメントをカテゴリフォルダに書き出す
    ///
    /// `<output_dir>/<カテゴリ>/<順番>_<製品名>.txt`とフラグメント記録を作成し、
    /// ログ用のレコードを返します。カテゴリフォルダは必要に応じて作成します。
    /// 同じ名前のファイルは上書きされます。
    ///
    /// # 引数
    ///
    /// * `fragment` - 書き出すフラグメント
    /// * `output_dir` - 実行ごとの出力ディレクトリ
    /// * `tab_name` - 元のシート名（ログ用）
    pub fn write(
        &self,
        fragment: &Fragment,
        output_dir: &Path,
        tab_name: &str,
    ) -> Result<LogRecord, GuideError> {
        let folder = output_dir.join(fragment.category.folder_name());
        fs::create_dir_all(&folder)?;

        let stem = fragment.stem();
        let artifact_path = folder.join(format!("{}.{}", stem, FRAGMENT_EXTENSION));
        fs::write(&artifact_path, self.render(fragment))?;
        fs::write(
            record_path(&folder, &stem),
            serde_json::to_vec_pretty(fragment)?,
        )?;

        Ok(LogRecord {
            tab_name: tab_name.to_string(),
            sequence: fragment.sequence.clone(),
            label: fragment.label.clone(),
            asset_count: fragment.assets.len(),
            asset_list: fragment.assets.join(", "),
            artifact_path: artifact_path.to_string_lossy().into_owned(),
        })
    }
}

/// フラグメント記録のパス
pub(crate) fn record_path(folder: &Path, stem: &str) -> PathBuf {
    folder.join(format!("{}.{}", stem, RECORD_EXTENSION))
}
