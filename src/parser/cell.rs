//! calamineのセル型から内部表現への変換と、行の組み立て。

use calamine::{Data, DataRef, ExcelDateTime};
use chrono::{NaiveDateTime, Timelike};

use crate::formatter::CellFormatter;
use crate::types::{CellValue, Row};

impl From<&DataRef<'_>> for CellValue {
    fn from(value: &DataRef<'_>) -> Self {
        #[allow(unreachable_patterns)]
        match value {
            DataRef::Int(i) => CellValue::Int(*i),
            DataRef::Float(f) => CellValue::Float(*f),
            DataRef::String(s) => CellValue::String(s.clone()),
            DataRef::SharedString(s) => CellValue::String((*s).to_string()),
            DataRef::Bool(b) => CellValue::Bool(*b),
            DataRef::DateTime(dt) => date_time_value(dt),
            DataRef::DateTimeIso(s) | DataRef::DurationIso(s) => CellValue::Iso(s.clone()),
            DataRef::Error(e) => CellValue::Error(e.to_string()),
            DataRef::Empty => CellValue::Empty,
            _ => CellValue::Empty,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(value: &Data) -> Self {
        #[allow(unreachable_patterns)]
        match value {
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::String(s) => CellValue::String(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => date_time_value(dt),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Iso(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
            Data::Empty => CellValue::Empty,
            _ => CellValue::Empty,
        }
    }
}

/// 日付・時刻・経過時間のセルを変換する
///
/// エポック（1900 / 1904）の補正はcalamine側で行われます。
/// 範囲外のシリアル値は数値のまま残します。
fn date_time_value(value: &ExcelDateTime) -> CellValue {
    let converted = if value.is_duration() {
        value.as_duration().map(CellValue::Duration)
    } else {
        value
            .as_datetime()
            .map(|dt| CellValue::DateTime(round_to_second(dt)))
    };
    converted.unwrap_or(CellValue::Float(value.as_f64()))
}

/// シリアル値の浮動小数点誤差（例: 09:29:59.999）を秒単位に丸める
fn round_to_second(value: NaiveDateTime) -> NaiveDateTime {
    let truncated = value.with_nanosecond(0).unwrap_or(value);
    if value.nanosecond() >= 500_000_000 {
        truncated
            .checked_add_signed(chrono::Duration::seconds(1))
            .unwrap_or(truncated)
    } else {
        truncated
    }
}

/// 物理セルを列位置に従って1行に組み立てるビルダー
///
/// 欠損している列は空セルで埋め、末尾の空セルは`finish`で取り除きます。
#[derive(Debug)]
pub(crate) struct RowBuilder {
    index: u32,
    cells: Vec<CellValue>,
}

impl RowBuilder {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            cells: Vec::new(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// `col`（A列=0の絶対位置）にセルを配置する
    pub fn push(&mut self, col: u32, value: CellValue) {
        let col = col as usize;
        if col >= self.cells.len() {
            self.cells.resize(col + 1, CellValue::Empty);
        }
        self.cells[col] = value;
    }

    /// 行を確定する
    ///
    /// # 戻り値
    ///
    /// * `Some(Row)` - 空でないセルを1つ以上含む場合
    /// * `None` - すべて空セルの場合（物理的に空の行として読み飛ばす）
    pub fn finish(mut self, formatter: &CellFormatter) -> Option<Row> {
        while self.cells.last().is_some_and(CellValue::is_empty) {
            self.cells.pop();
        }
        if self.cells.is_empty() {
            return None;
        }
        let cells = self
            .cells
            .iter()
            .map(|value| formatter.format_cell(value))
            .collect();
        Some(Row::new(self.index, cells))
    }
}
