//! Archive Module
//!
//! 実行ごとの出力ディレクトリをZIPアーカイブにまとめる。

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::GuideError;
use crate::render::RECORD_EXTENSION;

/// アーカイブのファイル名
pub fn archive_file_name(timestamp: &str) -> String {
    format!("husk_guide_output_{}.zip", timestamp)
}

fn zip_error(e: zip::result::ZipError) -> GuideError {
    GuideError::Zip(format!("{}", e))
}

/// 出力ディレクトリをZIPに圧縮する
///
/// ディレクトリ構造を保ったまま、`/`区切りの相対パスで格納します。
/// フラグメント記録（`*.fragment.json`）は含めません。
///
/// # 引数
///
/// * `source_dir` - 圧縮するディレクトリ
/// * `archive_dir` - アーカイブの保存先（存在しない場合は作成）
/// * `timestamp` - ファイル名に使うタイムスタンプ
///
/// # 戻り値
///
/// 作成したアーカイブのパス
pub fn create_archive(
    source_dir: &Path,
    archive_dir: &Path,
    timestamp: &str,
) -> Result<PathBuf, GuideError> {
    fs::create_dir_all(archive_dir)?;
    let archive_path = archive_dir.join(archive_file_name(timestamp));

    let mut writer = ZipWriter::new(BufWriter::new(File::create(&archive_path)?));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut file_count = 0usize;
    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if path == archive_path {
            continue;
        }

        let relative = path
            .strip_prefix(source_dir)
            .map_err(|e| GuideError::Zip(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer
                .add_directory(format!("{}/", name), options)
                .map_err(zip_error)?;
        } else if entry.file_type().is_file() {
            if name.ends_with(RECORD_EXTENSION) {
                continue;
            }
            writer.start_file(name, options).map_err(zip_error)?;
            io::copy(&mut File::open(path)?, &mut writer)?;
            file_count += 1;
        }
    }

    writer.finish().map_err(zip_error)?;
    log::info!(
        "Archived {} file(s) to {}",
        file_count,
        archive_path.display()
    );
    Ok(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    #[test]
    fn test_archive_contains_tree_without_records() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("단색")).unwrap();
        fs::write(source.path().join("단색").join("01_Mug.txt"), "<div>Mug</div>").unwrap();
        fs::write(source.path().join("단색").join("01_Mug.fragment.json"), "{}").unwrap();
        fs::write(source.path().join("html_log_all_x.csv"), "a,b").unwrap();

        let path = create_archive(source.path(), target.path(), "20250101_120000").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "husk_guide_output_20250101_120000.zip"
        );

        let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"단색/".to_string()));
        assert!(names.contains(&"단색/01_Mug.txt".to_string()));
        assert!(names.contains(&"html_log_all_x.csv".to_string()));
        assert!(!names.iter().any(|n| n.ends_with(".fragment.json")));

        let mut content = String::new();
        archive
            .by_name("단색/01_Mug.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<div>Mug</div>");
    }

    #[test]
    fn test_archive_inside_source_is_not_included() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("a.txt"), "a").unwrap();

        let path = create_archive(source.path(), source.path(), "t").unwrap();
        let archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names, vec!["a.txt"]);
    }
}
