//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// 製品カテゴリ
///
/// フラグメントの配色、ツールチップ画像、出力フォルダを決定します。
/// シート名に含まれるキーワードから[`Category::from_tab_name`]で解決されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// 단색（単色印刷）
    Plain,

    /// 별색（特色印刷）
    Spot,

    /// 일반（一般）。どのキーワードにも一致しないシートの既定値
    Standard,
}

/// カテゴリごとの表示テーマ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// 枠線の色（CSSカラー）
    pub border_color: &'static str,
    /// ツールチップ画像のファイル名
    pub tooltip_file: &'static str,
    /// ツールチップ画像の代替テキスト
    pub tooltip_alt: &'static str,
}

const PLAIN_THEME: Theme = Theme {
    border_color: "#4DA3FF",
    tooltip_file: "단색_툴팁.png",
    tooltip_alt: "단색 제작가이드",
};

const SPOT_THEME: Theme = Theme {
    border_color: "#24CF7F",
    tooltip_file: "별색_툴팁.png",
    tooltip_alt: "별색 제작가이드",
};

const STANDARD_THEME: Theme = Theme {
    border_color: "#FFC107",
    tooltip_file: "일반_툴팁.png",
    tooltip_alt: "일반 제작가이드",
};

impl Category {
    /// 解決順に並べた全カテゴリ
    pub const ALL: [Category; 3] = [Category::Plain, Category::Spot, Category::Standard];

    /// シート名に含まれるカテゴリキーワード
    pub fn keyword(self) -> &'static str {
        match self {
            Category::Plain => "단색",
            Category::Spot => "별색",
            Category::Standard => "일반",
        }
    }

    /// 出力フォルダ名（キーワードと同じ）
    pub fn folder_name(self) -> &'static str {
        self.keyword()
    }

    /// ログファイル名に使う識別子
    pub fn log_slug(self) -> &'static str {
        match self {
            Category::Plain => "mono",
            Category::Spot => "spot",
            Category::Standard => "normal",
        }
    }

    /// カテゴリの表示テーマ
    pub fn theme(self) -> &'static Theme {
        match self {
            Category::Plain => &PLAIN_THEME,
            Category::Spot => &SPOT_THEME,
            Category::Standard => &STANDARD_THEME,
        }
    }

    /// シート名からカテゴリを解決する
    ///
    /// `☆`を取り除いた後、단색 → 별색 → 일반 の順にキーワードを検査します。
    /// いずれにも一致しない場合は[`Category::Standard`]です。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use huskguide::Category;
    ///
    /// assert_eq!(Category::from_tab_name("☆파일명 리스트(단색)"), Category::Plain);
    /// assert_eq!(Category::from_tab_name("파일명 리스트(별색)"), Category::Spot);
    /// assert_eq!(Category::from_tab_name("Sheet1"), Category::Standard);
    /// ```
    pub fn from_tab_name(tab_name: &str) -> Self {
        Self::match_keyword(tab_name).unwrap_or(Category::Standard)
    }

    /// シート名がいずれかのカテゴリキーワードを含む場合、そのカテゴリを返す
    ///
    /// 処理対象シートの選別に使用します。
    pub fn match_keyword(tab_name: &str) -> Option<Self> {
        let title = tab_name.replace('☆', "");
        let title = title.trim();
        Self::ALL
            .into_iter()
            .find(|category| title.contains(category.keyword()))
    }
}

/// ログテーブルの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum LogFormat {
    /// XLSX形式（デフォルト）
    ///
    /// 列幅の自動調整と変更行のハイライトを行います。
    #[default]
    Xlsx,

    /// CSV形式（UTF-8、BOM付き）
    ///
    /// ハイライトは表現できないため行いません。
    Csv,
}

impl LogFormat {
    /// ファイル拡張子
    pub fn extension(self) -> &'static str {
        match self {
            LogFormat::Xlsx => "xlsx",
            LogFormat::Csv => "csv",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tab_name_keywords() {
        assert_eq!(Category::from_tab_name("파일명 리스트(단색)"), Category::Plain);
        assert_eq!(Category::from_tab_name("파일명 리스트(별색)"), Category::Spot);
        assert_eq!(Category::from_tab_name("파일명 리스트(일반)"), Category::Standard);
    }

    #[test]
    fn test_from_tab_name_default() {
        assert_eq!(Category::from_tab_name("Sheet1"), Category::Standard);
        assert_eq!(Category::match_keyword("Sheet1"), None);
    }

    #[test]
    fn test_plain_wins_over_spot() {
        // 両方のキーワードを含む場合は단색が優先
        assert_eq!(Category::from_tab_name("단색/별색 비교"), Category::Plain);
    }

    #[test]
    fn test_star_is_ignored() {
        assert_eq!(Category::match_keyword("☆별색☆"), Some(Category::Spot));
    }

    #[test]
    fn test_themes_are_distinct() {
        assert_eq!(Category::Plain.theme().border_color, "#4DA3FF");
        assert_eq!(Category::Spot.theme().border_color, "#24CF7F");
        assert_eq!(Category::Standard.theme().border_color, "#FFC107");
        assert_eq!(Category::Spot.theme().tooltip_file, "별색_툴팁.png");
    }

    #[test]
    fn test_log_slug_and_extension() {
        assert_eq!(Category::Plain.log_slug(), "mono");
        assert_eq!(Category::Standard.log_slug(), "normal");
        assert_eq!(LogFormat::default(), LogFormat::Xlsx);
        assert_eq!(LogFormat::Csv.extension(), "csv");
    }
}
