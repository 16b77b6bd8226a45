//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// サポートするスプレッドシート形式
///
/// ワークブックを開く時点で一度だけ決定され、以降の行処理は形式に依存しません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum SpreadsheetFormat {
    /// Excel 97-2003 バイナリ形式（OLE2 複合ドキュメント）
    ///
    /// 拡張子: `.xls`
    Xls,

    /// Office Open XML 形式（ZIP コンテナ）
    ///
    /// 拡張子: `.xlsx`, `.xlsm`
    Xlsx,
}

impl SpreadsheetFormat {
    /// 拡張子から期待される形式を判定する（大文字小文字を区別しない）
    ///
    /// # 戻り値
    ///
    /// * `Some(SpreadsheetFormat)` - サポート対象の拡張子の場合
    /// * `None` - それ以外の場合
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "xls" => Some(SpreadsheetFormat::Xls),
            "xlsx" | "xlsm" => Some(SpreadsheetFormat::Xlsx),
            _ => None,
        }
    }

    /// 先頭のマジックバイトから形式を判定する
    ///
    /// * OLE2: `D0 CF 11 E0 A1 B1 1A E1`
    /// * ZIP: `50 4B 03 04`
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

        if bytes.starts_with(&OLE2_MAGIC) {
            Some(SpreadsheetFormat::Xls)
        } else if bytes.starts_with(&ZIP_MAGIC) {
            Some(SpreadsheetFormat::Xlsx)
        } else {
            None
        }
    }
}

/// 取り込み処理の状態
///
/// `Created → Decoding → Persisting → Completed` の順に遷移し、
/// どの状態からでも失敗（`IngestFailure`）に抜けることがあります。
/// 失敗時には、失敗が発生した状態が`IngestFailure::failed_in`に記録されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngestionState {
    /// ファイルエンティティ作成・進捗0%登録
    Created,

    /// ワークブックのオープンと行数の事前カウント
    Decoding,

    /// 行の正規化と永続化のループ
    Persisting,

    /// 完了（進捗100%）
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_name() {
        assert_eq!(
            SpreadsheetFormat::from_file_name("report.xlsx"),
            Some(SpreadsheetFormat::Xlsx)
        );
        assert_eq!(
            SpreadsheetFormat::from_file_name("REPORT.XLS"),
            Some(SpreadsheetFormat::Xls)
        );
        assert_eq!(
            SpreadsheetFormat::from_file_name("macro.xlsm"),
            Some(SpreadsheetFormat::Xlsx)
        );
        assert_eq!(SpreadsheetFormat::from_file_name("data.csv"), None);
        assert_eq!(SpreadsheetFormat::from_file_name("xlsx"), None);
        assert_eq!(SpreadsheetFormat::from_file_name(""), None);
    }

    #[test]
    fn test_sniff() {
        let ole = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0x00];
        assert_eq!(SpreadsheetFormat::sniff(&ole), Some(SpreadsheetFormat::Xls));
        assert_eq!(
            SpreadsheetFormat::sniff(b"PK\x03\x04rest"),
            Some(SpreadsheetFormat::Xlsx)
        );
        assert_eq!(SpreadsheetFormat::sniff(b"name,age\n"), None);
        assert_eq!(SpreadsheetFormat::sniff(b"PK"), None);
        assert_eq!(SpreadsheetFormat::sniff(&[]), None);
    }
}
