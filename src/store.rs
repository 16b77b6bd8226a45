//! Store Module
//!
//! 永続化層（外部コラボレーター）のインターフェースと、インメモリ実装。
//!
//! 実際の永続化層（RDBなど）は`FileStore` / `RecordStore`を実装して差し込みます。
//! 各メソッドは独立した作業単位として扱われ、ファイル全体にまたがるトランザクションは張りません。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use dashmap::DashMap;

use crate::error::StorageError;
use crate::types::{FileId, FileRecord, RowRecord};

/// ストア操作の戻り値
pub type StoreResult<T> = Result<T, StorageError>;

/// ファイルエンティティのストア
pub trait FileStore: Send + Sync {
    /// ファイルレコードを保存し、採番したIDを返す
    fn save(&self, record: FileRecord) -> StoreResult<FileId>;

    /// 指定IDのファイルが存在するか
    fn exists_by_id(&self, id: FileId) -> StoreResult<bool>;

    /// 指定IDのファイルを削除する
    fn delete_by_id(&self, id: FileId) -> StoreResult<()>;

    /// 指定IDのファイルを取得する
    fn find_by_id(&self, id: FileId) -> StoreResult<Option<FileRecord>>;
}

/// 行レコードのストア
pub trait RecordStore: Send + Sync {
    /// 行レコードを1件保存する
    fn save(&self, record: RowRecord) -> StoreResult<()>;

    /// 指定ファイルの行レコードをすべて削除し、削除件数を返す
    fn delete_all_by_file_id(&self, file_id: FileId) -> StoreResult<usize>;

    /// 指定ファイルの行レコード数
    fn count_by_file_id(&self, file_id: FileId) -> StoreResult<usize>;
}

/// インメモリのファイルストア
///
/// IDは1から順に採番します。
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    next_id: AtomicU64,
    files: RwLock<BTreeMap<FileId, FileRecord>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みのファイル数
    pub fn len(&self) -> usize {
        self.files.read().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::new("in-memory store lock poisoned")
}

impl FileStore for MemoryFileStore {
    fn save(&self, record: FileRecord) -> StoreResult<FileId> {
        let id = FileId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.files.write().map_err(poisoned)?.insert(id, record);
        Ok(id)
    }

    fn exists_by_id(&self, id: FileId) -> StoreResult<bool> {
        Ok(self.files.read().map_err(poisoned)?.contains_key(&id))
    }

    fn delete_by_id(&self, id: FileId) -> StoreResult<()> {
        self.files.write().map_err(poisoned)?.remove(&id);
        Ok(())
    }

    fn find_by_id(&self, id: FileId) -> StoreResult<Option<FileRecord>> {
        Ok(self.files.read().map_err(poisoned)?.get(&id).cloned())
    }
}

/// インメモリの行レコードストア
///
/// ファイルごとに保存順を保持します。
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    rows: DashMap<FileId, Vec<RowRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定ファイルの行レコード（保存順）
    pub fn rows_for(&self, file_id: FileId) -> Vec<RowRecord> {
        self.rows
            .get(&file_id)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// 全ファイル合計の行レコード数
    pub fn total_len(&self) -> usize {
        self.rows.iter().map(|entry| entry.value().len()).sum()
    }
}

impl RecordStore for MemoryRecordStore {
    fn save(&self, record: RowRecord) -> StoreResult<()> {
        self.rows.entry(record.file_id).or_default().push(record);
        Ok(())
    }

    fn delete_all_by_file_id(&self, file_id: FileId) -> StoreResult<usize> {
        Ok(self
            .rows
            .remove(&file_id)
            .map(|(_, rows)| rows.len())
            .unwrap_or(0))
    }

    fn count_by_file_id(&self, file_id: FileId) -> StoreResult<usize> {
        Ok(self.rows.get(&file_id).map(|rows| rows.len()).unwrap_or(0))
    }
}
