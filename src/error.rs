//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。
//!
//! コンポーネントごとにエラー型を分け、最上位の`IngestError`へ`#[from]`で集約します。

use thiserror::Error;

use crate::api::IngestionState;
use crate::types::FileId;

/// スプレッドシートのデコード中に発生するエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// 拡張子がサポート対象外（`.xls` / `.xlsx` / `.xlsm` 以外）
    #[error("Unsupported file format: '{file_name}'")]
    UnsupportedFormat {
        /// アップロードされた元のファイル名
        file_name: String,
    },

    /// コンテナ（ZIP / OLE2）またはシートストリームの解析に失敗した
    ///
    /// calamine由来のエラーはメッセージ文字列として保持します。
    #[error("Corrupt spreadsheet file: {reason}")]
    CorruptFile {
        /// 失敗の詳細
        reason: String,
    },
}

impl DecodeError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        DecodeError::CorruptFile {
            reason: reason.into(),
        }
    }
}

impl From<calamine::XlsxError> for DecodeError {
    fn from(err: calamine::XlsxError) -> Self {
        DecodeError::corrupt(err.to_string())
    }
}

impl From<calamine::XlsError> for DecodeError {
    fn from(err: calamine::XlsError) -> Self {
        DecodeError::corrupt(err.to_string())
    }
}

impl From<calamine::Error> for DecodeError {
    fn from(err: calamine::Error) -> Self {
        DecodeError::corrupt(err.to_string())
    }
}

/// 行の正規化（ヘッダーとの突き合わせ）で発生するエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// ヘッダー行に（トリム後）同一のフィールド名が複数存在する
    #[error("Duplicate header name '{name}' at columns {first} and {second}")]
    DuplicateHeaderName {
        /// 重複したフィールド名（トリム後）
        name: String,
        /// 最初に出現した列インデックス
        first: usize,
        /// 重複して出現した列インデックス
        second: usize,
    },

    /// データ行のセル数がヘッダーの列数を超えている
    #[error("Row {row} has {width} cells but the header has only {header_width}")]
    RowWiderThanHeader {
        /// シート上の行インデックス（0始まり）
        row: u32,
        /// 行のセル数
        width: usize,
        /// ヘッダーの列数
        header_width: usize,
    },
}

/// 進捗トラッカーの誤用
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressError {
    /// `start`されていない、またはクリア済みのファイルに対する更新
    #[error("No progress entry for file '{0}'")]
    UnknownFile(String),

    /// 0..=100 の範囲外の値
    #[error("Progress value {0} is out of range (0..=100)")]
    OutOfRange(u32),
}

/// 外部ストア（コラボレーター）のエラー
///
/// 中身は不透明なまま呼び出し元へ伝播します。リトライは行いません。
#[derive(Error, Debug)]
#[error("Storage failure: {0}")]
pub struct StorageError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl StorageError {
    /// 任意のエラーをラップする
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StorageError(err.into())
    }
}

/// sheetingestクレート全体で使用するエラー型
///
/// # エラーの種類
///
/// - `EmptyInput`: 0バイトのアップロード
/// - `InputTooLarge`: 設定されたサイズ上限を超える入力
/// - `Decode`: 形式判定・ワークブック解析のエラー
/// - `Normalize`: ヘッダー重複・列数超過
/// - `Progress`: 進捗トラッカーの誤用
/// - `Storage`: ストアのエラー（不透明）
/// - `Config`: 設定の検証に失敗したエラー
/// - `Io`: ファイル読み込みなどのI/Oエラー
#[derive(Error, Debug)]
pub enum IngestError {
    /// 0バイトの入力
    #[error("Input file '{file_name}' is empty")]
    EmptyInput {
        /// アップロードされた元のファイル名
        file_name: String,
    },

    /// 入力サイズが上限を超えている
    #[error("Input file size exceeds maximum: {size} bytes (max: {max} bytes)")]
    InputTooLarge {
        /// 入力サイズ
        size: u64,
        /// 許容される最大サイズ
        max: u64,
    },

    /// デコードエラー
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// 正規化エラー
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// 進捗トラッカーのエラー
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// ストアのエラー
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// 設定の検証に失敗したエラー
    ///
    /// `PipelineBuilder::build()`時、または設定JSONの読み込み時に発生します。
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 取り込み失敗の報告
///
/// 部分的に永続化された状態はロールバックされません。`rows_persisted`件の
/// 行レコードとファイルエンティティ（作成済みの場合）はストアに残り、進捗は
/// `last_progress`のまま保持されます。完全に元へ戻したい場合は呼び出し側が
/// `IngestionPipeline::delete_file`を呼び出してください。
#[derive(Error, Debug)]
#[error("Ingestion failed in state {failed_in:?} after {rows_persisted} rows: {error}")]
pub struct IngestFailure {
    /// 失敗の原因
    #[source]
    pub error: IngestError,
    /// 作成済みのファイルID（入力検証で失敗した場合は`None`）
    pub file_id: Option<FileId>,
    /// 失敗までに永続化された行数
    pub rows_persisted: usize,
    /// 最後に記録された進捗（ファイル未作成の場合は`None`）
    pub last_progress: Option<u8>,
    /// 失敗が発生した状態
    pub failed_in: IngestionState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_decode_error_from_calamine() {
        let error: DecodeError = calamine::Error::Msg("Invalid file format").into();
        match error {
            DecodeError::CorruptFile { reason } => {
                assert!(reason.contains("Invalid file format"));
            }
            _ => panic!("Expected CorruptFile"),
        }
    }

    #[test]
    fn test_decode_error_into_ingest_error() {
        let error: IngestError = DecodeError::UnsupportedFormat {
            file_name: "notes.txt".to_string(),
        }
        .into();

        assert!(matches!(
            error,
            IngestError::Decode(DecodeError::UnsupportedFormat { .. })
        ));
        assert_eq!(error.to_string(), "Unsupported file format: 'notes.txt'");
    }

    #[test]
    fn test_normalize_error_display() {
        let error = NormalizeError::RowWiderThanHeader {
            row: 4,
            width: 5,
            header_width: 3,
        };
        assert_eq!(
            error.to_string(),
            "Row 4 has 5 cells but the header has only 3"
        );

        let error = NormalizeError::DuplicateHeaderName {
            name: "age".to_string(),
            first: 1,
            second: 3,
        };
        assert!(error.to_string().contains("'age'"));
    }

    #[test]
    fn test_progress_error_display() {
        assert_eq!(
            ProgressError::OutOfRange(101).to_string(),
            "Progress value 101 is out of range (0..=100)"
        );
        assert!(ProgressError::UnknownFile("7".to_string())
            .to_string()
            .contains("'7'"));
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "db went away");
        let error: IngestError = StorageError::new(io_err).into();

        assert_eq!(error.to_string(), "Storage failure: db went away");
        // transparentなのでsource()はラップされた元のエラーを指す
        let source = std::error::Error::source(&error);
        assert_eq!(source.map(|s| s.to_string()), Some("db went away".to_string()));
    }

    #[test]
    fn test_io_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), IngestError> {
            let _file = std::fs::File::open("nonexistent_file.xlsx")?;
            Ok(())
        }

        match io_operation() {
            Err(IngestError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            _ => panic!("Expected Io error from ? operator"),
        }
    }

    #[test]
    fn test_ingest_failure_display() {
        let failure = IngestFailure {
            error: IngestError::EmptyInput {
                file_name: "empty.xlsx".to_string(),
            },
            file_id: None,
            rows_persisted: 0,
            last_progress: None,
            failed_in: IngestionState::Created,
        };

        let msg = failure.to_string();
        assert!(msg.contains("Created"));
        assert!(msg.contains("empty.xlsx"));
    }
}
