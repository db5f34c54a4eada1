//! Filename Sanitizer
//!
//! 任意のテキストをファイル名として安全なトークンに変換する。

/// ファイル名に使用できない文字
const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// 禁止文字を`_`に置き換え、前後の空白を取り除く
///
/// # 使用例
///
/// ```rust
/// use huskguide::sanitize_filename;
///
/// assert_eq!(sanitize_filename(" A/B: C? "), "A_B_ C_");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|ch| if FORBIDDEN.contains(&ch) { '_' } else { ch })
        .collect::<String>()
        .trim()
        .to_string()
}
