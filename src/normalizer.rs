//! Normalizer Module
//!
//! 先頭行をヘッダーとして、各データ行を「列名 → セルテキスト」の対応に変換します。

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::NormalizeError;
use crate::types::Row;

/// ヘッダー（フィールド名の並び）
///
/// フィールド名は先頭行の値をそのまま（トリムせずに）保持します。
/// 重複判定のみトリム後の値で行います。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    names: Vec<String>,
}

impl Header {
    /// 先頭行からヘッダーを構築する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Header)` - フィールド名がすべて一意の場合
    /// * `Err(NormalizeError::DuplicateHeaderName)` - トリム後に同一の名前がある場合
    pub fn from_row(row: &Row) -> Result<Self, NormalizeError> {
        Self::from_names(row.cells.clone())
    }

    pub(crate) fn from_names(names: Vec<String>) -> Result<Self, NormalizeError> {
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            if let Some(&first) = seen.get(name.trim()) {
                return Err(NormalizeError::DuplicateHeaderName {
                    name: name.trim().to_string(),
                    first,
                    second: index,
                });
            }
            seen.insert(name.trim(), index);
        }
        Ok(Self { names })
    }

    /// 空のヘッダー（シートに行が1つもない場合）
    pub fn empty() -> Self {
        Self { names: Vec::new() }
    }

    /// フィールド名（列順）
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 列数
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// データ行を正規化する
    ///
    /// ヘッダーより短い行は不足分を空文字列で埋め、長い行はエラーにします。
    /// 出力はヘッダー順に並びます。
    pub fn normalize(&self, row: Row) -> Result<IndexMap<String, String>, NormalizeError> {
        if row.width() > self.width() {
            return Err(NormalizeError::RowWiderThanHeader {
                row: row.index,
                width: row.width(),
                header_width: self.width(),
            });
        }

        let mut cells = row.cells.into_iter();
        Ok(self
            .names
            .iter()
            .map(|name| (name.clone(), cells.next().unwrap_or_default()))
            .collect())
    }
}
