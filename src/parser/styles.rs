//! XML Style Parser Module
//!
//! XLSX内部のXMLファイルから、calamineで取得できないセルの塗りつぶし色を抽出するモジュール。
//! シート名とワークシートXMLの対応付け、1904年エポック判定も提供します。

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::GuideError;
use crate::security::SecurityConfig;
use crate::types::CellCoord;

/// XLSXスタイルインデックス
///
/// ワークブックレベルの情報（シートの配置、セルスタイルごとの塗りつぶし色）を
/// 一度だけ解析して保持します。シートごとのセル色は[`XlsxStyleIndex::sheet_fills`]で
/// 必要になった時点で解析します。
#[derive(Debug, Clone)]
pub(crate) struct XlsxStyleIndex {
    /// シート名 -> ワークシートXMLのパス（例: "xl/worksheets/sheet1.xml"）
    sheet_parts: HashMap<String, String>,
    /// cellXfsのインデックス -> 塗りつぶしの前景色（ARGB/RGB文字列、大文字）
    xf_fill_colors: Vec<Option<String>>,
    /// 1904年エポックを使用するかどうか
    is_1904: bool,
}

impl XlsxStyleIndex {
    /// XLSXのバイト列からスタイルインデックスを構築
    ///
    /// # 戻り値
    ///
    /// * `Ok(XlsxStyleIndex)` - 解析に成功した場合
    /// * `Err(GuideError)` - ZIPやXMLが壊れている、またはセキュリティ制限に違反した場合
    pub fn new(xlsx: &[u8]) -> Result<Self, GuideError> {
        let mut archive = open_archive(xlsx)?;

        let security_config = SecurityConfig::default();
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive
                .by_index(i)
                .map_err(|e| GuideError::Zip(format!("{}", e)))?;
            entries.push((file.name().to_string(), file.size()));
        }
        security_config.check_entries(entries.iter().map(|(name, size)| (name.as_str(), *size)))?;

        let (sheet_ids, is_1904) = match read_part(&mut archive, "xl/workbook.xml")? {
            Some(xml) => parse_workbook(&xml)?,
            None => (Vec::new(), false),
        };
        let relationships = match read_part(&mut archive, "xl/_rels/workbook.xml.rels")? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };
        let xf_fill_colors = match read_part(&mut archive, "xl/styles.xml")? {
            Some(xml) => parse_styles(&xml)?,
            None => Vec::new(),
        };

        let sheet_parts = sheet_ids
            .into_iter()
            .filter_map(|(name, rel_id)| {
                relationships
                    .get(&rel_id)
                    .map(|target| (name, resolve_target(target)))
            })
            .collect();

        Ok(Self {
            sheet_parts,
            xf_fill_colors,
            is_1904,
        })
    }

    /// 1904年エポックを使用するかどうかを取得
    pub fn is_1904(&self) -> bool {
        self.is_1904
    }

    /// シート内で塗りつぶし色を持つセルを解析
    ///
    /// # 引数
    ///
    /// * `xlsx` - `new()`に渡したものと同じXLSXのバイト列
    /// * `sheet_name` - シート名
    ///
    /// # 戻り値
    ///
    /// * `Ok(HashMap<CellCoord, String>)` - 座標 -> 前景色（大文字の16進文字列）
    /// * `Err(GuideError)` - シートが見つからない、またはXMLが壊れている場合
    pub fn sheet_fills(
        &self,
        xlsx: &[u8],
        sheet_name: &str,
    ) -> Result<HashMap<CellCoord, String>, GuideError> {
        let part = self
            .sheet_parts
            .get(sheet_name)
            .ok_or_else(|| GuideError::TabNotFound(sheet_name.to_string()))?;

        let mut archive = open_archive(xlsx)?;
        let xml = read_part(&mut archive, part)?.ok_or_else(|| GuideError::TabLoad {
            tab: sheet_name.to_string(),
            message: format!("worksheet part '{}' is missing", part),
        })?;

        let cell_styles = parse_cell_styles(&xml)?;

        Ok(cell_styles
            .into_iter()
            .filter_map(|(coord, style_id)| {
                self.xf_fill_colors
                    .get(style_id as usize)
                    .and_then(|color| color.clone())
                    .map(|color| (coord, color))
            })
            .collect())
    }
}

fn open_archive(xlsx: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, GuideError> {
    ZipArchive::new(Cursor::new(xlsx)).map_err(|e| GuideError::Zip(format!("{}", e)))
}

/// ZIP内のパートを読み込む（存在しない場合は`None`）
fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<Vec<u8>>, GuideError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(GuideError::Zip(format!("{}", e))),
    };

    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(Some(content))
}

/// リレーションシップのターゲットをZIP内の絶対パスに変換
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn xml_error(e: impl std::fmt::Display) -> GuideError {
    GuideError::Xml(e.to_string())
}

/// 要素の属性値を取得（XMLエスケープを解除）
fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, GuideError> {
    for attr in element.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned()));
        }
    }
    Ok(None)
}

/// xl/workbook.xml の解析
///
/// `<sheet name="..." r:id="..."/>`の並びと`<workbookPr date1904="1"/>`を取得します。
fn parse_workbook(xml: &[u8]) -> Result<(Vec<(String, String)>, bool), GuideError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();
    let mut is_1904 = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"sheet" => {
                    let mut name = None;
                    let mut rel_id = None;
                    for attr in e.attributes() {
                        let attr = attr.map_err(xml_error)?;
                        if attr.key.as_ref() == b"name" {
                            name = Some(attr.unescape_value().map_err(xml_error)?.into_owned());
                        } else if attr.key.local_name().as_ref() == b"id" {
                            // r:id（名前空間プレフィックスはファイルにより異なる）
                            rel_id = Some(std::str::from_utf8(&attr.value)?.to_string());
                        }
                    }
                    if let (Some(name), Some(rel_id)) = (name, rel_id) {
                        sheets.push((name, rel_id));
                    }
                }
                b"workbookPr" => {
                    if let Some(value) = attribute(&e, b"date1904")? {
                        is_1904 = value == "1" || value == "true";
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, is_1904))
}

/// xl/_rels/workbook.xml.rels の解析（Id -> Target）
fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>, GuideError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    if let (Some(id), Some(target)) =
                        (attribute(&e, b"Id")?, attribute(&e, b"Target")?)
                    {
                        relationships.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// xl/styles.xml の解析
///
/// `<fills>`の各`<fill>`から`<fgColor rgb="..."/>`を取り出し、
/// `<cellXfs>`の各`<xf fillId="..."/>`に対応付けます。
fn parse_styles(xml: &[u8]) -> Result<Vec<Option<String>>, GuideError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut fills: Vec<Option<String>> = Vec::new();
    let mut xf_fill_ids: Vec<usize> = Vec::new();
    let mut in_fills = false;
    let mut in_fill = false;
    let mut in_cell_xfs = false;
    let mut current_color: Option<String> = None;

    loop {
        let (element, is_empty) = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => (Some(e), false),
            Ok(Event::Empty(e)) => (Some(e), true),
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"fills" => in_fills = false,
                    b"fill" if in_fill => {
                        fills.push(current_color.take());
                        in_fill = false;
                    }
                    b"cellXfs" => in_cell_xfs = false,
                    _ => {}
                }
                (None, false)
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => (None, false),
        };

        if let Some(ref e) = element {
            match e.local_name().as_ref() {
                b"fills" if !is_empty => in_fills = true,
                b"fill" if in_fills => {
                    if is_empty {
                        fills.push(None);
                    } else {
                        in_fill = true;
                        current_color = None;
                    }
                }
                b"fgColor" if in_fill => {
                    current_color = attribute(e, b"rgb")?.map(|rgb| rgb.to_ascii_uppercase());
                }
                b"cellXfs" if !is_empty => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let fill_id = match attribute(e, b"fillId")? {
                        Some(id) => id.parse::<usize>()?,
                        None => 0,
                    };
                    xf_fill_ids.push(fill_id);
                }
                _ => {}
            }
        }
        drop(element);
        buf.clear();
    }

    Ok(xf_fill_ids
        .into_iter()
        .map(|fill_id| fills.get(fill_id).cloned().flatten())
        .collect())
}

/// ワークシートXMLから、スタイルを持つセルの座標とスタイルIDを解析
fn parse_cell_styles(xml: &[u8]) -> Result<Vec<(CellCoord, u32)>, GuideError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut styles = Vec::new();
    let mut current_row: Option<u32> = None;
    let mut next_col: u32 = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    // <row r="15">（r省略時は直前の行の次）
                    current_row = Some(match attribute(&e, b"r")? {
                        Some(r) => r.parse::<u32>()?.saturating_sub(1),
                        None => current_row.map_or(0, |row| row + 1),
                    });
                    next_col = 0;
                }
                b"c" => {
                    // <c r="A1" s="2" t="s">
                    let coord = match attribute(&e, b"r")? {
                        Some(reference) => CellCoord::from_a1(&reference).ok_or_else(|| {
                            GuideError::Xml(format!("Invalid cell reference: {}", reference))
                        })?,
                        None => CellCoord::new(current_row.unwrap_or(0), next_col),
                    };
                    next_col = coord.col + 1;

                    if let Some(style) = attribute(&e, b"s")? {
                        styles.push((coord, style.parse::<u32>()?));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(styles)
}
