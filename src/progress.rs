//! Progress Module
//!
//! ファイルIDごとの進捗率（0〜100%）を保持するプロセス全体のレジストリ。
//!
//! 内部はシャーディングされた並行マップ（`DashMap`）で、ロックはキー単位に分散します。
//! 無関係なファイルの取り込み同士が単一のロックで直列化されることはありません。

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::trace;

use crate::error::ProgressError;

/// 進捗率の上限
pub const MAX_PERCENT: u8 = 100;

/// 進捗トラッカー
///
/// ライフサイクルは `start`（0%で登録）→ `update` → `clear` です。
/// 更新頻度の制御は呼び出し側（パイプライン）の責務で、トラッカー自身は制限しません。
///
/// # 使用例
///
/// ```rust
/// use sheetingest::ProgressTracker;
///
/// let tracker = ProgressTracker::new();
/// tracker.start("42");
/// tracker.update("42", 40).unwrap();
/// assert_eq!(tracker.read("42"), Some(40));
/// tracker.clear("42");
/// assert_eq!(tracker.read("42"), None);
/// ```
#[derive(Debug, Default)]
pub struct ProgressTracker {
    entries: DashMap<String, u8>,
}

impl ProgressTracker {
    /// 空のトラッカーを生成
    pub fn new() -> Self {
        Self::default()
    }

    /// プロセス全体で共有されるトラッカー
    pub fn global() -> Arc<ProgressTracker> {
        static GLOBAL: OnceLock<Arc<ProgressTracker>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ProgressTracker::new())))
    }

    /// エントリを0%で登録する（既存のエントリも0%に戻す）
    pub fn start(&self, file_id: &str) {
        self.entries.insert(file_id.to_string(), 0);
        trace!(file_id, "Progress started");
    }

    /// 進捗率を更新する
    ///
    /// # 戻り値
    ///
    /// * `Err(ProgressError::OutOfRange)` - 100を超える値
    /// * `Err(ProgressError::UnknownFile)` - `start`されていない、またはクリア済み
    pub fn update(&self, file_id: &str, percent: u32) -> Result<(), ProgressError> {
        let percent = u8::try_from(percent)
            .ok()
            .filter(|p| *p <= MAX_PERCENT)
            .ok_or(ProgressError::OutOfRange(percent))?;

        match self.entries.get_mut(file_id) {
            Some(mut entry) => {
                *entry = percent;
                trace!(file_id, percent, "Progress updated");
                Ok(())
            }
            None => Err(ProgressError::UnknownFile(file_id.to_string())),
        }
    }

    /// 現在の進捗率を取得する（未登録なら`None`）
    pub fn read(&self, file_id: &str) -> Option<u8> {
        self.entries.get(file_id).map(|entry| *entry)
    }

    /// エントリを削除する（未登録でもエラーにしない）
    pub fn clear(&self, file_id: &str) {
        if self.entries.remove(file_id).is_some() {
            trace!(file_id, "Progress cleared");
        }
    }

    /// 登録中のエントリ数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// エントリが1つもないかどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `processed / total` を切り捨てのパーセントで返す
///
/// `total == 0`（ヘッダーのみのファイル）は除算せずに100%とします。
pub(crate) fn percent_of(processed: usize, total: usize) -> u32 {
    if total == 0 {
        return u32::from(MAX_PERCENT);
    }
    let percent = (processed.min(total) as u128 * 100) / total as u128;
    percent as u32
}
