//! Formatter Module
//!
//! セル値を正規のテキスト表現に変換するモジュール。
//! 数値・日付の型情報はここで文字列に落とし込み、以降の層はすべてテキストとして扱います。

use chrono::{Duration, NaiveDateTime, Timelike};

use crate::types::CellValue;

/// セルフォーマッター
///
/// セル値のフォーマット処理のファサードとして機能します。
#[derive(Debug, Default)]
pub(crate) struct CellFormatter {
    /// 日付フォーマッター
    date_formatter: DateFormatter,

    /// 数値フォーマッター
    number_formatter: NumberFormatter,
}

impl CellFormatter {
    /// 新しいCellFormatterインスタンスを生成
    pub fn new() -> Self {
        Self {
            date_formatter: DateFormatter,
            number_formatter: NumberFormatter,
        }
    }

    /// セル値をフォーマット
    ///
    /// 空セルは空文字列になります。
    pub fn format_cell(&self, value: &CellValue) -> String {
        match value {
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => self.number_formatter.format(*f),
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(dt) => self.date_formatter.format(dt),
            CellValue::Duration(d) => self.date_formatter.format_duration(d),
            CellValue::Iso(s) => s.clone(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

/// 日付フォーマッター
///
/// 出力形式はISO 8601に固定します。
/// 時刻成分が0時ちょうどの場合は日付のみ（`%Y-%m-%d`）を出力します。
#[derive(Debug, Default)]
pub(crate) struct DateFormatter;

impl DateFormatter {
    pub fn format(&self, value: &NaiveDateTime) -> String {
        if value.num_seconds_from_midnight() == 0 && value.nanosecond() == 0 {
            value.format("%Y-%m-%d").to_string()
        } else {
            value.format("%Y-%m-%dT%H:%M:%S").to_string()
        }
    }

    /// 経過時間を `H:MM:SS` 形式でフォーマット（時は24を超えてもそのまま）
    pub fn format_duration(&self, value: &Duration) -> String {
        let total = value.num_seconds();
        let sign = if total < 0 { "-" } else { "" };
        let total = total.unsigned_abs();
        format!(
            "{}{}:{:02}:{:02}",
            sign,
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }
}

/// 数値フォーマッター
///
/// Rustの最短往復表現（`Display`）を使用します。整数値の浮動小数点数は
/// 小数部なしで出力され（`30.0` → `30`）、負のゼロは`0`に揃えます。
#[derive(Debug, Default)]
pub(crate) struct NumberFormatter;

impl NumberFormatter {
    pub fn format(&self, value: f64) -> String {
        if value == 0.0 {
            return "0".to_string();
        }
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_number_formatter() {
        let formatter = NumberFormatter;
        assert_eq!(formatter.format(123.45), "123.45");
        assert_eq!(formatter.format(30.0), "30");
        assert_eq!(formatter.format(0.0), "0");
        assert_eq!(formatter.format(-0.0), "0");
        assert_eq!(formatter.format(-123.45), "-123.45");
        assert_eq!(formatter.format(0.1), "0.1");
    }

    #[test]
    fn test_date_formatter_date_only() {
        let formatter = DateFormatter;
        assert_eq!(formatter.format(&datetime(2025, 1, 2, 0, 0, 0)), "2025-01-02");
        assert_eq!(formatter.format(&datetime(1900, 1, 1, 0, 0, 0)), "1900-01-01");
    }

    #[test]
    fn test_date_formatter_with_time() {
        let formatter = DateFormatter;
        assert_eq!(
            formatter.format(&datetime(2024, 3, 15, 9, 30, 5)),
            "2024-03-15T09:30:05"
        );
    }

    #[test]
    fn test_duration_formatter() {
        let formatter = DateFormatter;
        assert_eq!(formatter.format_duration(&Duration::seconds(0)), "0:00:00");
        assert_eq!(
            formatter.format_duration(&Duration::seconds(3 * 3600 + 7 * 60 + 9)),
            "3:07:09"
        );
        assert_eq!(formatter.format_duration(&Duration::hours(30)), "30:00:00");
        assert_eq!(formatter.format_duration(&Duration::seconds(-90)), "-0:01:30");
    }

    #[test]
    fn test_format_cell_variants() {
        let formatter = CellFormatter::new();
        assert_eq!(formatter.format_cell(&CellValue::Int(42)), "42");
        assert_eq!(formatter.format_cell(&CellValue::Float(12.5)), "12.5");
        assert_eq!(
            formatter.format_cell(&CellValue::String("a|b".to_string())),
            "a|b"
        );
        assert_eq!(formatter.format_cell(&CellValue::Bool(true)), "TRUE");
        assert_eq!(formatter.format_cell(&CellValue::Bool(false)), "FALSE");
        assert_eq!(
            formatter.format_cell(&CellValue::Error("#DIV/0!".to_string())),
            "#DIV/0!"
        );
        assert_eq!(
            formatter.format_cell(&CellValue::Iso("2024-01-01T10:00:00".to_string())),
            "2024-01-01T10:00:00"
        );
        assert_eq!(formatter.format_cell(&CellValue::Empty), "");
        assert_eq!(
            formatter.format_cell(&CellValue::DateTime(datetime(2024, 3, 15, 0, 0, 0))),
            "2024-03-15"
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// 数値の文字列表現は元の値に往復できる
            #[test]
            fn test_number_rendering_round_trips(value in -1.0e12f64..1.0e12) {
                let rendered = NumberFormatter.format(value);
                let parsed: f64 = rendered.parse().unwrap();
                prop_assert_eq!(parsed, if value == 0.0 { 0.0 } else { value });
            }

            /// 日付のみの文字列は辞書順と時系列順が一致する
            #[test]
            fn test_date_rendering_monotonic(a in 0i64..60000, b in 0i64..60000) {
                let epoch = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
                let da = epoch + Duration::days(a);
                let db = epoch + Duration::days(b);
                let sa = DateFormatter.format(&da);
                let sb = DateFormatter.format(&db);
                prop_assert_eq!(a.cmp(&b), sa.cmp(&sb));
            }
        }
    }
}
