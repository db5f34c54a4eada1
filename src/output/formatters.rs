//! Log Formatters Implementation
//!
//! 各ログ出力形式の実装を提供するモジュール。

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook};
use unicode_width::UnicodeWidthStr;

use crate::detect::SENTINEL_RGB;
use crate::error::GuideError;
use crate::types::LogRecord;

/// 最初のデータ行（1始まり、見出し行の次）
const FIRST_LOG_DATA_ROW: u32 = 2;

/// 列の数
const COLUMN_COUNT: usize = LogRecord::HEADERS.len();

/// XLSX形式のフォーマッター
///
/// 見出しは太字、列幅は内容に合わせて調整し、指定行を黄色で塗りつぶします。
pub struct XlsxLogFormatter;

impl XlsxLogFormatter {
    pub fn write(
        &self,
        records: &[LogRecord],
        highlight_rows: &BTreeSet<u32>,
        path: &Path,
    ) -> Result<(), GuideError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        let header_format = Format::new().set_bold();
        let highlight_format = Format::new()
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(sentinel_rgb()));

        for (col, header) in LogRecord::HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (index, record) in records.iter().enumerate() {
            let row = index as u32 + 1;
            let format = if highlight_rows.contains(&(row + 1)) {
                Some(&highlight_format)
            } else {
                None
            };

            for (col, value) in record.columns().iter().enumerate() {
                let col = col as u16;
                match (col, format) {
                    // 이미지_개수は数値として書き込む
                    (3, Some(format)) => {
                        sheet.write_number_with_format(row, col, record.asset_count as f64, format)?
                    }
                    (3, None) => sheet.write_number(row, col, record.asset_count as f64)?,
                    (_, Some(format)) => sheet.write_string_with_format(row, col, value, format)?,
                    (_, None) => sheet.write_string(row, col, value)?,
                };
            }
        }

        for (col, width) in column_widths(records).into_iter().enumerate() {
            sheet.set_column_width(col as u16, width)?;
        }

        let skipped = highlight_rows
            .iter()
            .filter(|row| **row < FIRST_LOG_DATA_ROW || **row > records.len() as u32 + 1)
            .count();
        if skipped > 0 {
            log::debug!("{} highlight row(s) fall outside the log table", skipped);
        }

        workbook.save(path)?;
        Ok(())
    }
}

/// CSV形式のフォーマッター
///
/// UTF-8（BOM付き）で書き出します。ハイライトは表現できません。
pub struct CsvLogFormatter;

impl CsvLogFormatter {
    pub fn write(&self, records: &[LogRecord], path: &Path) -> Result<(), GuideError> {
        let mut writer = BufWriter::new(File::create(path)?);

        write!(writer, "\u{FEFF}")?;
        write_csv_row(&mut writer, LogRecord::HEADERS.iter().copied())?;
        for record in records {
            let columns = record.columns();
            write_csv_row(&mut writer, columns.iter().map(String::as_str))?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn write_csv_row<'a, W: Write>(
    writer: &mut W,
    values: impl Iterator<Item = &'a str>,
) -> Result<(), GuideError> {
    let mut first = true;
    for value in values {
        if !first {
            write!(writer, ",")?;
        }
        first = false;
        write!(writer, "{}", escape_csv(value))?;
    }
    writeln!(writer)?;
    Ok(())
}

fn sentinel_rgb() -> u32 {
    u32::from_str_radix(SENTINEL_RGB, 16).unwrap_or(0xFFFF00)
}

/// 列幅を計算
///
/// 見出しと値の最大表示幅に2を足し、1.2倍した値です。
/// 全角文字（ハングルなど）は幅2として数えます。
pub fn column_widths(records: &[LogRecord]) -> [f64; COLUMN_COUNT] {
    let mut max_widths = LogRecord::HEADERS.map(UnicodeWidthStr::width);
    for record in records {
        for (max, value) in max_widths.iter_mut().zip(record.columns().iter()) {
            *max = (*max).max(value.width());
        }
    }
    max_widths.map(|width| (width as f64 + 2.0) * 1.2)
}

/// CSV文字列をエスケープ
///
/// ダブルクォート、改行、カンマを含む場合はダブルクォートで囲み、
/// 内部のダブルクォートは2つにエスケープします。
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
