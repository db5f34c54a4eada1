//! Security Module
//!
//! 入力ワークブック（ZIPアーカイブ）を扱う際のセキュリティ制限を提供するモジュール。
//! ZIP bomb攻撃やパストラバーサル攻撃への対策を含みます。

use crate::error::GuideError;

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 1GB (1_073_741_824 bytes)
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一ファイルの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_file_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 2GB (2_147_483_648 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1_073_741_824, // 1GB
            max_file_count: 10_000,
            max_file_size: 104_857_600,         // 100MB
            max_input_file_size: 2_147_483_648, // 2GB
        }
    }
}

impl SecurityConfig {
    /// 入力ファイルのサイズを検証
    pub fn check_input_size(&self, len: usize) -> Result<(), GuideError> {
        if len as u64 > self.max_input_file_size {
            return Err(GuideError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                len, self.max_input_file_size
            )));
        }
        Ok(())
    }

    /// アーカイブ内のエントリ一覧（名前とサイズ）を検証
    ///
    /// ファイル数、単一ファイルサイズ、展開後の合計サイズ、パスを検査します。
    pub fn check_entries<'a, I>(&self, entries: I) -> Result<(), GuideError>
    where
        I: ExactSizeIterator<Item = (&'a str, u64)>,
    {
        if entries.len() > self.max_file_count {
            return Err(GuideError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                entries.len(),
                self.max_file_count
            )));
        }

        let mut total_decompressed_size = 0u64;
        for (name, size) in entries {
            validate_zip_path(name)
                .map_err(|e| GuideError::SecurityViolation(format!("Invalid ZIP path: {}", e)))?;

            if size > self.max_file_size {
                return Err(GuideError::SecurityViolation(format!(
                    "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                    name, size, self.max_file_size
                )));
            }

            total_decompressed_size = total_decompressed_size.checked_add(size).ok_or_else(|| {
                GuideError::SecurityViolation(
                    "Total decompressed size calculation overflow".to_string(),
                )
            })?;

            if total_decompressed_size > self.max_decompressed_size {
                return Err(GuideError::SecurityViolation(format!(
                    "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                    total_decompressed_size, self.max_decompressed_size
                )));
            }
        }

        Ok(())
    }
}

/// ファイルパスの検証
///
/// パストラバーサル攻撃を防ぐため、ファイルパスを検証します。
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // 絶対パスを拒否（Windows形式の`C:\`やUnix形式の`/`で始まるパス）
    if path.starts_with('/') || path.starts_with("C:\\") || path.starts_with("c:\\") {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}
