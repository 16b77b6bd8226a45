//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// デコード直後のセル値（書式適用前）
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    /// 整数
    Int(i64),

    /// 浮動小数点数
    Float(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// 日時（エポック補正済み）
    DateTime(NaiveDateTime),

    /// 経過時間
    Duration(chrono::Duration),

    /// ISO 8601 文字列としてそのまま保持された日時・期間
    Iso(String),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// デコードされた1行
///
/// セルはA列を0とする絶対列位置に並び、欠損セルは空文字列で埋められています。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// シート上の行インデックス（0始まり）
    pub index: u32,
    /// 各セルの正規化済みテキスト
    pub cells: Vec<String>,
}

impl Row {
    /// 新しい行を生成
    pub fn new(index: u32, cells: Vec<String>) -> Self {
        Self { index, cells }
    }

    /// セル数
    pub fn width(&self) -> usize {
        self.cells.len()
    }
}

/// ファイルエンティティの識別子
///
/// `FileStore::save`が採番します。進捗トラッカーのキーには`to_string()`した値を使います。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// アップロードされたファイルのメタデータ（親エンティティ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// 元のファイル名
    pub file_name: String,
    /// アップロード日時
    pub uploaded_at: DateTime<Utc>,
    /// 最終アクセス日時
    pub accessed_at: DateTime<Utc>,
}

impl FileRecord {
    /// 現在時刻でファイルレコードを生成
    pub fn new(file_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            file_name: file_name.into(),
            uploaded_at: now,
            accessed_at: now,
        }
    }
}

/// 1データ行ぶんのレコード（子エンティティ）
///
/// `values`のキーはヘッダーのフィールド名で、ヘッダー順に並びます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRecord {
    /// 親ファイルのID
    pub file_id: FileId,
    /// 列名 → セルテキスト
    pub values: IndexMap<String, String>,
}

impl RowRecord {
    /// 新しい行レコードを生成
    pub fn new(file_id: FileId, values: IndexMap<String, String>) -> Self {
        Self { file_id, values }
    }

    /// `values`をJSONオブジェクトとして取得（ヘッダー順を保持）
    pub fn values_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

/// 取り込み対象のアップロード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// 元のファイル名（形式判定に使用）
    pub file_name: String,
    /// ファイル内容
    pub content: Vec<u8>,
}

impl Upload {
    /// ファイル名と内容からアップロードを生成
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }

    /// ディスク上のファイルを読み込んでアップロードを生成
    ///
    /// ファイル名にはパスの最後の要素を使用します。
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, content })
    }
}
