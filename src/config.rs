//! Settings File Module
//!
//! JSON形式の設定ファイルを読み込む。すべての項目は省略可能で、
//! 指定された項目だけが[`GuideBuilder`]の既定値を上書きします。
//! コマンドライン引数は設定ファイルより優先されます。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::LogFormat;
use crate::builder::GuideBuilder;
use crate::error::GuideError;

/// 設定ファイルの内容
///
/// ```json
/// {
///   "output_root": "output",
///   "archive_dir": "/home/me/Downloads",
///   "archive": true,
///   "log_format": "csv",
///   "escape_markup": false
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuideSettings {
    /// 出力ルートディレクトリ
    #[serde(default)]
    pub output_root: Option<PathBuf>,

    /// アーカイブの保存先
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,

    /// アーカイブを作成するかどうか
    #[serde(default)]
    pub archive: Option<bool>,

    /// 画像ファイルの配置先URL
    #[serde(default)]
    pub asset_base_url: Option<String>,

    /// ツールチップ画像の配置先URL
    #[serde(default)]
    pub tooltip_base_url: Option<String>,

    /// ログの出力形式
    #[serde(default)]
    pub log_format: Option<LogFormat>,

    /// 製品名と画像ファイル名をHTMLエスケープするかどうか
    #[serde(default)]
    pub escape_markup: Option<bool>,
}

impl GuideSettings {
    /// 設定ファイルを読み込む
    ///
    /// # 戻り値
    ///
    /// * `Ok(GuideSettings)` - 読み込みに成功した場合
    /// * `Err(GuideError::Config)` - ファイルが読めない、またはJSONとして不正な場合
    pub fn load(path: &Path) -> Result<Self, GuideError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GuideError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
            .map_err(|e| GuideError::Config(format!("{}: {}", path.display(), e)))
    }

    /// JSON文字列から設定を読み込む
    pub fn from_json(json: &str) -> Result<Self, GuideError> {
        serde_json::from_str(json).map_err(|e| GuideError::Config(e.to_string()))
    }

    /// 指定された項目をビルダーに適用する
    pub fn apply(&self, mut builder: GuideBuilder) -> GuideBuilder {
        if let Some(root) = &self.output_root {
            builder = builder.with_output_root(root);
        }
        if let Some(dir) = &self.archive_dir {
            builder = builder.with_archive_dir(dir);
        }
        if self.archive == Some(false) {
            builder = builder.without_archive();
        }
        if let Some(url) = &self.asset_base_url {
            builder = builder.with_asset_base_url(url);
        }
        if let Some(url) = &self.tooltip_base_url {
            builder = builder.with_tooltip_base_url(url);
        }
        if let Some(format) = self.log_format {
            builder = builder.with_log_format(format);
        }
        if let Some(escape) = self.escape_markup {
            builder = builder.with_escape_markup(escape);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_settings() {
        let settings = GuideSettings::from_json("{}").unwrap();
        assert_eq!(settings, GuideSettings::default());
    }

    #[test]
    fn test_parse_all_fields() {
        let settings = GuideSettings::from_json(
            r#"{
                "output_root": "out",
                "archive_dir": "zips",
                "archive": false,
                "asset_base_url": "https://cdn.example.com/page",
                "tooltip_base_url": "https://cdn.example.com/tooltip",
                "log_format": "csv",
                "escape_markup": true
            }"#,
        )
        .unwrap();
        assert_eq!(settings.output_root, Some(PathBuf::from("out")));
        assert_eq!(settings.archive, Some(false));
        assert_eq!(settings.log_format, Some(LogFormat::Csv));
        assert_eq!(settings.escape_markup, Some(true));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = GuideSettings::from_json(r#"{"output_dir": "out"}"#);
        assert!(matches!(result, Err(GuideError::Config(_))));
    }

    #[test]
    fn test_unknown_log_format_is_rejected() {
        let result = GuideSettings::from_json(r#"{"log_format": "pdf"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huskguide.json");
        std::fs::write(&path, r#"{"escape_markup": true}"#).unwrap();
        let settings = GuideSettings::load(&path).unwrap();
        assert_eq!(settings.escape_markup, Some(true));
    }

    #[test]
    fn test_load_missing_file() {
        let result = GuideSettings::load(Path::new("no_such_settings.json"));
        match result {
            Err(GuideError::Config(msg)) => assert!(msg.contains("no_such_settings.json")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }
}
