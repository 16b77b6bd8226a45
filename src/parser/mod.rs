//! Parser Module
//!
//! calamineを使用したExcelファイル解析。
//! XLSXはストリーミング処理により、行幅に比例するメモリでセルデータを抽出します。

mod cell;
mod workbook;

pub use workbook::{Rows, SpreadsheetDecoder, Workbook};
