//! Fragment Merger Module
//!
//! 단색と별색の両フォルダに存在する製品について、2列の比較フラグメントを生成する。
//! フラグメントの内容はレンダリング済みのテキストではなく、
//! 一緒に保存されたフラグメント記録（JSON）から読み込みます。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::Category;
use crate::error::GuideError;
use crate::render::{Fragment, FragmentRenderer, FRAGMENT_EXTENSION, RECORD_EXTENSION};
use crate::sanitize::sanitize_filename;

/// 結合フラグメントの出力フォルダ名
pub const COMBINED_FOLDER: &str = "combined";

/// 左右に並べた2つのフラグメント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedFragment {
    /// 順番（左側のファイル名から取得）
    pub sequence: String,
    /// ファイル名の製品名部分
    pub label: String,
    /// 左側（단색）
    pub left: Fragment,
    /// 右側（별색）
    pub right: Fragment,
}

impl MergedFragment {
    /// 出力ファイル名の語幹
    pub fn stem(&self) -> String {
        format!("{}_{}", self.sequence, sanitize_filename(&self.label))
    }

    /// 2列のHTMLにレンダリング
    pub fn render(&self, renderer: &FragmentRenderer) -> String {
        format!(
            r#"
        <div style="width:100%; max-width:1420px; margin:0 auto; padding:0 16px;
        display:flex; justify-content:space-between; gap:30px; position:relative;">
{}
            <div style="position:absolute; top:0; left:50%; transform:translateX(-50%);
                width:1px; height:100%; background:#dcdcdc;"></div>
{}
        </div>
"#,
            block(renderer, &self.left),
            block(renderer, &self.right)
        )
    }
}

/// テーマ付きの片側ブロック
fn block(renderer: &FragmentRenderer, fragment: &Fragment) -> String {
    let theme = fragment.category.theme();
    let mut html = format!(
        r#"
    <div style="flex:1; text-align:center; display:flex; flex-direction:column; align-items:center;">
        <div style="border:4px solid {}; border-radius:12px; width:100%; padding-bottom:30px; position:relative;">
"#,
        theme.border_color
    );
    renderer.push_heading(&mut html, theme, &fragment.label);
    renderer.push_assets(&mut html, &fragment.assets);
    html.push_str(
        r#"
        </div>
    </div>
"#,
    );
    html
}

/// フラグメント記録のファイル名から`(順番, 製品名)`を取り出す
///
/// 最初の`_`で分割します。`_`を含まない場合は`None`です。
fn split_stem(file_name: &str) -> Option<(String, String)> {
    let stem = file_name.strip_suffix(&format!(".{}", RECORD_EXTENSION))?;
    let (sequence, label) = stem.split_once('_')?;
    Some((sequence.to_string(), label.to_string()))
}

/// フォルダ内のフラグメント記録を`(順番, 製品名, ファイル名)`で列挙
fn list_records(folder: &Path) -> Result<Vec<(String, String, String)>, GuideError> {
    let mut records = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !file_name.ends_with(RECORD_EXTENSION) {
            continue;
        }
        match split_stem(&file_name) {
            Some((sequence, label)) => records.push((sequence, label, file_name)),
            None => log::warn!("Skipping fragment record with malformed name: {}", file_name),
        }
    }
    Ok(records)
}

fn load_record(folder: &Path, file_name: &str) -> Result<Fragment, GuideError> {
    let bytes = fs::read(folder.join(file_name))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// 단색と별색で対になるフラグメントを探す
///
/// 左側の順番で並べた結合候補を返します。片方にしかない製品は含まれません。
/// どちらかのフォルダが存在しない場合は警告を出して空の一覧を返します。
pub fn pair_fragments(output_dir: &Path) -> Result<Vec<MergedFragment>, GuideError> {
    let left_dir = output_dir.join(Category::Plain.folder_name());
    let right_dir = output_dir.join(Category::Spot.folder_name());

    if !left_dir.is_dir() || !right_dir.is_dir() {
        log::warn!(
            "Merge skipped: '{}' or '{}' folder is missing",
            Category::Plain.folder_name(),
            Category::Spot.folder_name()
        );
        return Ok(Vec::new());
    }

    let mut left_records = list_records(&left_dir)?;
    left_records.sort_by(|a, b| a.0.cmp(&b.0));

    // 同じ製品名が複数ある場合はファイル名順で最初のもの
    let mut right_records = list_records(&right_dir)?;
    right_records.sort_by(|a, b| a.2.cmp(&b.2));
    let mut right_by_label: HashMap<String, String> = HashMap::new();
    for (_, label, file_name) in right_records {
        right_by_label.entry(label).or_insert(file_name);
    }

    let mut pairs = Vec::new();
    for (sequence, label, file_name) in left_records {
        let Some(right_file) = right_by_label.get(&label) else {
            log::debug!("No {} counterpart for '{}'", Category::Spot.folder_name(), label);
            continue;
        };

        pairs.push(MergedFragment {
            left: load_record(&left_dir, &file_name)?,
            right: load_record(&right_dir, right_file)?,
            sequence,
            label,
        });
    }

    Ok(pairs)
}

/// 結合フラグメントを`<output_dir>/combined/`に書き出す
///
/// # 戻り値
///
/// 書き出したファイルのパス（結合対象がない場合は空）
pub fn merge_fragments(
    output_dir: &Path,
    renderer: &FragmentRenderer,
) -> Result<Vec<PathBuf>, GuideError> {
    let pairs = pair_fragments(output_dir)?;
    if pairs.is_empty() {
        return Ok(Vec::new());
    }

    let combined_dir = output_dir.join(COMBINED_FOLDER);
    fs::create_dir_all(&combined_dir)?;

    let mut written = Vec::with_capacity(pairs.len());
    for merged in &pairs {
        let path = combined_dir.join(format!("{}.{}", merged.stem(), FRAGMENT_EXTENSION));
        fs::write(&path, merged.render(renderer))?;
        written.push(path);
    }

    log::info!("Merged {} fragment pair(s)", written.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::record_path;
    use tempfile::TempDir;

    fn write_record(output_dir: &Path, fragment: &Fragment) {
        let folder = output_dir.join(fragment.category.folder_name());
        fs::create_dir_all(&folder).unwrap();
        fs::write(
            record_path(&folder, &fragment.stem()),
            serde_json::to_vec(fragment).unwrap(),
        )
        .unwrap();
    }

    fn fragment(category: Category, sequence: &str, label: &str) -> Fragment {
        Fragment {
            category,
            sequence: sequence.to_string(),
            label: label.to_string(),
            assets: vec![format!("{}_{}.png", label, category.log_slug())],
        }
    }

    #[test]
    fn test_split_stem_uses_first_underscore() {
        assert_eq!(
            split_stem("01_Mug_Large.fragment.json"),
            Some(("01".to_string(), "Mug_Large".to_string()))
        );
        assert_eq!(split_stem("Mug.fragment.json"), None);
        assert_eq!(split_stem("01_Mug.txt"), None);
    }

    #[test]
    fn test_merge_only_labels_present_in_both() {
        let dir = TempDir::new().unwrap();
        write_record(dir.path(), &fragment(Category::Plain, "02", "Mug"));
        write_record(dir.path(), &fragment(Category::Plain, "01", "Cup"));
        write_record(dir.path(), &fragment(Category::Plain, "03", "Pen"));
        write_record(dir.path(), &fragment(Category::Spot, "05", "Mug"));
        write_record(dir.path(), &fragment(Category::Spot, "01", "Cup"));
        write_record(dir.path(), &fragment(Category::Spot, "09", "Bag"));

        let written = merge_fragments(dir.path(), &FragmentRenderer::default()).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["01_Cup.txt", "02_Mug.txt"]);

        let combined = dir.path().join(COMBINED_FOLDER);
        assert!(!combined.join("03_Pen.txt").exists());
        assert!(!combined.join("09_Bag.txt").exists());
    }

    #[test]
    fn test_merged_fragment_has_both_blocks_and_divider() {
        let dir = TempDir::new().unwrap();
        write_record(dir.path(), &fragment(Category::Plain, "01", "Mug"));
        write_record(dir.path(), &fragment(Category::Spot, "04", "Mug"));

        let written = merge_fragments(dir.path(), &FragmentRenderer::default()).unwrap();
        let html = fs::read_to_string(&written[0]).unwrap();

        let left = html.find("#4DA3FF").unwrap();
        let divider = html.find("background:#dcdcdc").unwrap();
        let right = html.find("#24CF7F").unwrap();
        assert!(left < divider && divider < right);
        assert!(html.contains("max-width:1420px"));
        assert!(html.contains("Mug_mono.png?ver=1"));
        assert!(html.contains("Mug_spot.png?ver=1"));
    }

    #[test]
    fn test_duplicate_right_label_picks_first_file_name() {
        let dir = TempDir::new().unwrap();
        write_record(dir.path(), &fragment(Category::Plain, "01", "Mug"));
        for sequence in ["07", "03", "11"] {
            let mut spot = fragment(Category::Spot, sequence, "Mug");
            spot.assets = vec![format!("spot_{}.png", sequence)];
            write_record(dir.path(), &spot);
        }

        let pairs = pair_fragments(dir.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].right.sequence, "03");
        assert_eq!(pairs[0].right.assets, vec!["spot_03.png"]);
    }

    #[test]
    fn test_missing_folder_skips_merge() {
        let dir = TempDir::new().unwrap();
        write_record(dir.path(), &fragment(Category::Plain, "01", "Mug"));

        let written = merge_fragments(dir.path(), &FragmentRenderer::default()).unwrap();
        assert!(written.is_empty());
        assert!(!dir.path().join(COMBINED_FOLDER).exists());
    }

    #[test]
    fn test_rendered_text_is_not_read() {
        let dir = TempDir::new().unwrap();
        write_record(dir.path(), &fragment(Category::Plain, "01", "Mug"));
        write_record(dir.path(), &fragment(Category::Spot, "01", "Mug"));
        // レンダリング済みテキストだけのファイルは結合対象外
        fs::write(dir.path().join("단색").join("02_Cup.txt"), "<h2>Cup</h2>").unwrap();
        fs::write(dir.path().join("별색").join("02_Cup.txt"), "<h2>Cup</h2>").unwrap();

        let pairs = pair_fragments(dir.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].label, "Mug");
    }
}
