//! Workbook Module
//!
//! calamineを使用して入力ワークブックを一度だけ読み込み、
//! シートごとのセル文字列と塗りつぶし色を保持する不変のモデルを提供します。

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::GuideError;
use crate::parser::XlsxStyleIndex;
use crate::security::SecurityConfig;
use crate::types::CellCoord;

/// ワークブック内の1シート
///
/// セルは絶対座標で保持します（列Aが空でも列Bはインデックス1）。
/// 空セルは空文字列です。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tab {
    name: String,
    rows: Vec<Vec<String>>,
    fills: HashMap<CellCoord, String>,
}

impl Tab {
    /// セル文字列の行列からシートを生成
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use huskguide::{CellCoord, Tab};
    ///
    /// let tab = Tab::new("파일명 리스트(단색)", vec![vec!["".into(), "1".into()]])
    ///     .with_fill(CellCoord::new(0, 1), "FFFFFF00");
    /// assert_eq!(tab.cell(0, 1), "1");
    /// assert_eq!(tab.fill(CellCoord::new(0, 1)), Some("FFFFFF00"));
    /// ```
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
            fills: HashMap::new(),
        }
    }

    /// セルの塗りつぶし色（16進文字列）を設定
    pub fn with_fill(mut self, coord: CellCoord, rgb: impl Into<String>) -> Self {
        self.fills.insert(coord, rgb.into());
        self
    }

    /// シート名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 全行（0始まり）
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// セル文字列（範囲外は空文字列）
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// セルの塗りつぶし色
    pub fn fill(&self, coord: CellCoord) -> Option<&str> {
        self.fills.get(&coord).map(String::as_str)
    }

    /// 塗りつぶし色を持つすべてのセル
    pub fn fills(&self) -> impl Iterator<Item = (CellCoord, &str)> {
        self.fills.iter().map(|(coord, rgb)| (*coord, rgb.as_str()))
    }
}

/// 読み込み済みシート、または読み込みに失敗したシート
#[derive(Debug, Clone)]
enum TabSlot {
    Loaded(Tab),
    Failed { name: String, message: String },
}

impl TabSlot {
    fn name(&self) -> &str {
        match self {
            TabSlot::Loaded(tab) => tab.name(),
            TabSlot::Failed { name, .. } => name,
        }
    }
}

/// 入力ワークブック
///
/// シートの並び順を保持した不変のモデルです。シート単位の読み込み失敗は
/// 記録され、[`Workbook::tab`]の呼び出し時に`GuideError::TabLoad`として返されます。
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    tabs: Vec<TabSlot>,
}

impl Workbook {
    /// ファイルパスからワークブックを開く
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, GuideError> {
        let file = std::fs::File::open(path)?;
        Self::open(file)
    }

    /// ワークブックを開き、全シートを読み込む
    ///
    /// XLSXとXLSの両方を受け付けます。塗りつぶし色はXLSXの場合のみ取得します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(Workbook)` - ワークブック全体の読み込みに成功した場合（個々のシートは失敗していてもよい）
    /// * `Err(GuideError)` - ファイル自体が読めない、または壊れている場合
    pub fn open<R: Read>(mut reader: R) -> Result<Self, GuideError> {
        let mut buffer = Vec::new();
        let bytes_read = reader.read_to_end(&mut buffer)?;
        SecurityConfig::default().check_input_size(bytes_read)?;

        let mut sheets = open_workbook_auto_from_rs(Cursor::new(buffer.as_slice()))?;

        let styles = match sheets {
            Sheets::Xlsx(_) => Some(XlsxStyleIndex::new(&buffer)?),
            _ => {
                log::debug!("Workbook is not XLSX; cell fills are unavailable");
                None
            }
        };
        let is_1904 = styles.as_ref().is_some_and(XlsxStyleIndex::is_1904);

        let names = sheets.sheet_names().to_vec();
        let mut tabs = Vec::with_capacity(names.len());

        for name in names {
            // 塗りつぶし色が読めなくてもセル値は使う
            let loaded = load_tab(&mut sheets, &name, is_1904).map(|tab| match &styles {
                Some(index) => match index.sheet_fills(&buffer, &name) {
                    Ok(fills) => Tab { fills, ..tab },
                    Err(e) => {
                        log::warn!("Cell fills of sheet '{}' are unavailable: {}", name, e);
                        tab
                    }
                },
                None => tab,
            });

            match loaded {
                Ok(tab) => tabs.push(TabSlot::Loaded(tab)),
                Err(e) => {
                    log::warn!("Sheet '{}' could not be loaded: {}", name, e);
                    tabs.push(TabSlot::Failed {
                        name,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(Self { tabs })
    }

    /// 読み込み済みのシートからワークブックを生成
    pub fn from_tabs(tabs: Vec<Tab>) -> Self {
        Self {
            tabs: tabs.into_iter().map(TabSlot::Loaded).collect(),
        }
    }

    /// すべてのシート名（ワークブック内の順序）
    pub fn tab_names(&self) -> Vec<&str> {
        self.tabs.iter().map(TabSlot::name).collect()
    }

    /// シートを取得
    ///
    /// # 戻り値
    ///
    /// * `Ok(&Tab)` - シートが存在し、読み込みに成功している場合
    /// * `Err(GuideError::TabNotFound)` - シートが存在しない場合
    /// * `Err(GuideError::TabLoad)` - シートの読み込みに失敗していた場合
    pub fn tab(&self, name: &str) -> Result<&Tab, GuideError> {
        match self.tabs.iter().find(|slot| slot.name() == name) {
            Some(TabSlot::Loaded(tab)) => Ok(tab),
            Some(TabSlot::Failed { name, message }) => Err(GuideError::TabLoad {
                tab: name.clone(),
                message: message.clone(),
            }),
            None => Err(GuideError::TabNotFound(name.to_string())),
        }
    }
}

/// calamineでシートのセル値を読み込み、絶対座標の文字列行列に変換
fn load_tab<RS>(sheets: &mut Sheets<RS>, name: &str, is_1904: bool) -> Result<Tab, GuideError>
where
    RS: Read + std::io::Seek,
{
    let range = sheets.worksheet_range(name)?;
    Ok(Tab::new(name, absolute_rows(&range, is_1904)))
}

fn absolute_rows(range: &Range<Data>, is_1904: bool) -> Vec<Vec<String>> {
    let Some((last_row, last_col)) = range.end() else {
        return Vec::new();
    };

    (0..=last_row)
        .map(|row| {
            (0..=last_col)
                .map(|col| {
                    range
                        .get_value((row, col))
                        .map(|data| cell_text(data, is_1904))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

/// セル値を文字列として表現する
///
/// すべてのセルをテキストとして扱うため、整数値の浮動小数点数は小数部なしで、
/// 論理値は`True`/`False`、日付は`YYYY-MM-DD HH:MM:SS`で表します。
pub(crate) fn cell_text(data: &Data, is_1904: bool) -> String {
    match data {
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::String(s) => s.clone(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                float_text(dt.as_f64())
            } else {
                serial_to_datetime(dt.as_f64(), is_1904).unwrap_or_else(|| float_text(dt.as_f64()))
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

fn float_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Excelシリアル値を日時文字列に変換
fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<String> {
    // 1900年システムはExcelのうるう年バグにより1899-12-30起算
    let epoch = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };

    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    let datetime = epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::days(days as i64))?
        .checked_add_signed(Duration::seconds(seconds))?;

    Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}
