//! Workbook Module
//!
//! calamineのラッパーとして、形式判定・ワークブックのオープン・
//! 先頭シートの行ストリームを提供します。

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xls, Xlsx};
use tracing::{debug, warn};

use crate::api::SpreadsheetFormat;
use crate::error::DecodeError;
use crate::formatter::CellFormatter;
use crate::parser::cell::RowBuilder;
use crate::types::{CellValue, Row};

/// スプレッドシートデコーダー
///
/// ファイル名の拡張子とマジックバイトから形式を決定し、`Workbook`を開きます。
///
/// # 形式判定
///
/// 1. 拡張子が`.xls` / `.xlsx` / `.xlsm`以外なら`DecodeError::UnsupportedFormat`
/// 2. 内容のシグネチャ（OLE2 / ZIP）がどちらにも一致しなければ`DecodeError::CorruptFile`
/// 3. シグネチャが拡張子と異なるサポート形式を示す場合は、シグネチャ側の形式で開く
pub struct SpreadsheetDecoder;

impl SpreadsheetDecoder {
    /// ワークブックを開き、先頭シートを選択する
    ///
    /// # 引数
    ///
    /// * `bytes` - ファイル内容
    /// * `file_name` - 元のファイル名（拡張子を形式判定に使用）
    ///
    /// # 戻り値
    ///
    /// * `Ok(Workbook)` - オープンに成功した場合
    /// * `Err(DecodeError)` - 形式が未対応、またはコンテナが破損している場合
    pub fn open<'a>(bytes: &'a [u8], file_name: &str) -> Result<Workbook<'a>, DecodeError> {
        let expected = SpreadsheetFormat::from_file_name(file_name).ok_or_else(|| {
            DecodeError::UnsupportedFormat {
                file_name: file_name.to_string(),
            }
        })?;

        let format = match SpreadsheetFormat::sniff(bytes) {
            Some(sniffed) if sniffed == expected => sniffed,
            Some(sniffed) => {
                warn!(
                    file_name,
                    ?expected,
                    ?sniffed,
                    "File extension does not match content signature, decoding by signature"
                );
                sniffed
            }
            None => {
                return Err(DecodeError::corrupt(format!(
                    "content of '{}' is not a {:?} container",
                    file_name, expected
                )))
            }
        };

        let inner = match format {
            SpreadsheetFormat::Xlsx => {
                let mut workbook: Xlsx<Cursor<&'a [u8]>> = Xlsx::new(Cursor::new(bytes))?;
                let sheet = first_sheet(workbook.sheet_names())?;
                // シートXMLの欠損はここで検出する
                workbook.worksheet_cells_reader(&sheet)?;
                WorkbookInner::Xlsx { workbook, sheet }
            }
            SpreadsheetFormat::Xls => {
                let mut workbook: Xls<Cursor<&'a [u8]>> = Xls::new(Cursor::new(bytes))?;
                let sheet = first_sheet(workbook.sheet_names())?;
                let range = workbook.worksheet_range(&sheet)?;
                WorkbookInner::Xls { range, sheet }
            }
        };

        let workbook = Workbook { format, inner };
        debug!(
            file_name,
            format = ?workbook.format,
            sheet = workbook.sheet_name(),
            "Opened workbook"
        );
        Ok(workbook)
    }
}

fn first_sheet(names: Vec<String>) -> Result<String, DecodeError> {
    names
        .into_iter()
        .next()
        .ok_or_else(|| DecodeError::corrupt("workbook contains no sheets"))
}

/// 開かれたワークブック（先頭シートのみ対象）
///
/// 形式ごとの差異はオープン時に解決され、`rows()`は形式に依存しない`Row`を返します。
pub struct Workbook<'a> {
    format: SpreadsheetFormat,
    inner: WorkbookInner<'a>,
}

enum WorkbookInner<'a> {
    /// XLSXはシートXMLをセル単位でストリーミングする
    Xlsx {
        workbook: Xlsx<Cursor<&'a [u8]>>,
        sheet: String,
    },
    /// XLSはcalamineがシート全体を読み込むため、読み込み済みの範囲を保持する
    Xls { range: Range<Data>, sheet: String },
}

impl<'a> Workbook<'a> {
    /// 判定された形式
    pub fn format(&self) -> SpreadsheetFormat {
        self.format
    }

    /// 対象シート名
    pub fn sheet_name(&self) -> &str {
        match &self.inner {
            WorkbookInner::Xlsx { sheet, .. } | WorkbookInner::Xls { sheet, .. } => sheet,
        }
    }

    /// 先頭シートの行を前方向に1回だけ走査するイテレーターを返す
    ///
    /// 呼び出すたびに新しくデコードをやり直します。
    /// イテレーターは最初のエラーを返した後は`None`を返し続けます。
    pub fn rows(&mut self) -> Result<Rows<'_>, DecodeError> {
        let formatter = CellFormatter::new();

        let inner: Box<dyn Iterator<Item = Result<Row, DecodeError>> + '_> = match &mut self.inner
        {
            WorkbookInner::Xlsx { workbook, sheet } => {
                let mut reader = workbook.worksheet_cells_reader(sheet)?;
                let mut current: Option<RowBuilder> = None;
                let mut finished = false;

                Box::new(std::iter::from_fn(move || {
                    if finished {
                        return None;
                    }
                    loop {
                        let cell = match reader.next_cell() {
                            Ok(cell) => cell,
                            Err(e) => {
                                finished = true;
                                return Some(Err(DecodeError::from(e)));
                            }
                        };

                        let Some(cell) = cell else {
                            finished = true;
                            return current
                                .take()
                                .and_then(|builder| builder.finish(&formatter))
                                .map(Ok);
                        };

                        let (row, col) = cell.get_position();
                        let value = CellValue::from(cell.get_value());

                        if let Some(builder) = current.as_mut().filter(|b| b.index() == row) {
                            builder.push(col, value);
                            continue;
                        }

                        // 行が変わったので前の行を確定する（空行なら読み進める）
                        let mut next = RowBuilder::new(row);
                        next.push(col, value);
                        let completed = current.replace(next);
                        if let Some(row) = completed.and_then(|builder| builder.finish(&formatter)) {
                            return Some(Ok(row));
                        }
                    }
                }))
            }
            WorkbookInner::Xls { range, .. } => {
                let (start_row, start_col) = range.start().unwrap_or((0, 0));
                Box::new(range.rows().enumerate().filter_map(move |(offset, cells)| {
                    let mut builder = RowBuilder::new(start_row + offset as u32);
                    for (col, data) in cells.iter().enumerate() {
                        builder.push(start_col + col as u32, CellValue::from(data));
                    }
                    builder.finish(&formatter).map(Ok)
                }))
            }
        };

        Ok(Rows {
            inner,
            failed: false,
        })
    }

    /// 行数を数える（行は保持しない）
    ///
    /// 進捗率の分母に使用します。シート内の破損はここで検出されます。
    pub fn count_rows(&mut self) -> Result<usize, DecodeError> {
        let mut count = 0;
        for row in self.rows()? {
            row?;
            count += 1;
        }
        Ok(count)
    }
}

/// 先頭シートの行イテレーター
pub struct Rows<'w> {
    inner: Box<dyn Iterator<Item = Result<Row, DecodeError>> + 'w>,
    failed: bool,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.inner.next();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
