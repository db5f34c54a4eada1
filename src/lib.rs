//! huskguide - Product-guide spreadsheet to HTML fragment generator
//!
//! This crate reads a product-guide workbook (XLSX or XLS), renders one themed
//! HTML fragment per product row into a folder per category (단색 / 별색 / 일반),
//! merges the 단색 and 별색 fragments of the same product side by side, writes
//! conversion logs with changed rows highlighted, and zips the run directory.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use huskguide::GuideBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let guide = GuideBuilder::new().build()?;
//!     let summary = guide.run("파일명 리스트.xlsx")?;
//!
//!     println!("{} fragment(s) in {}", summary.fragment_count, summary.output_dir.display());
//!     if let Some(archive) = summary.archive_path {
//!         println!("archive: {}", archive.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Workbook Layout
//!
//! Only sheets whose name contains 단색, 별색 or 일반 are processed. In each sheet
//! rows 1-2 are a header, column B holds the sequence, column C the product name
//! and columns D onward the image file names. Cells filled with `#FFFF00` mark
//! changed rows.
//!
//! # Using the Stages Directly
//!
//! ```rust
//! use huskguide::{extract_rows, Category, Fragment, FragmentRenderer, Tab, Workbook};
//!
//! let row = |cells: &[&str]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();
//! let workbook = Workbook::from_tabs(vec![Tab::new(
//!     "파일명 리스트(단색)",
//!     vec![row(&[]), row(&[]), row(&["", "1", "Mug", "img1.png"])],
//! )]);
//!
//! let renderer = FragmentRenderer::default();
//! for record in extract_rows(&workbook, "파일명 리스트(단색)").unwrap() {
//!     let fragment = Fragment::from_record(&record, Category::Plain);
//!     assert!(renderer.render(&fragment).contains("img1.png?ver=1"));
//! }
//! ```

mod api;
mod archive;
mod builder;
mod config;
mod detect;
mod error;
mod extract;
mod merge;
mod output;
mod parser;
mod recorder;
mod render;
mod sanitize;
mod security;
mod types;

// 公開API
pub use api::{Category, LogFormat, Theme};
pub use archive::{archive_file_name, create_archive};
pub use builder::{Guide, GuideBuilder, RunContext, RunSummary, TIMESTAMP_FORMAT};
pub use config::GuideSettings;
pub use detect::{find_changed_rows, is_sentinel_color, FIRST_DATA_ROW, SENTINEL_RGB};
pub use error::GuideError;
pub use extract::{extract_rows, format_sequence, Rows};
pub use merge::{merge_fragments, pair_fragments, MergedFragment, COMBINED_FOLDER};
pub use parser::{Tab, Workbook};
pub use recorder::{highlight_rows, log_rows_for, LogRecorder, TabChanges};
pub use render::{
    Fragment, FragmentRenderer, DEFAULT_ASSET_BASE_URL, DEFAULT_TOOLTIP_BASE_URL,
    FRAGMENT_EXTENSION, RECORD_EXTENSION,
};
pub use sanitize::sanitize_filename;
pub use types::{CellCoord, ChangedRowSet, LogRecord, RowRecord};
