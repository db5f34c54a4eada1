//! Parser Module
//!
//! calamineによるセル値の読み込みと、XLSX内部XMLからの塗りつぶし色の抽出。

mod styles;
mod workbook;

pub(crate) use styles::XlsxStyleIndex;
pub use workbook::{Tab, Workbook};
