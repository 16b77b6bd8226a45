//! Builder Module
//!
//! Fluent Builder APIを提供し、`IngestionPipeline`インスタンスを段階的に構築する。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::pipeline::IngestionPipeline;
use crate::progress::ProgressTracker;
use crate::store::{FileStore, RecordStore};

/// 進捗を更新する行数間隔のデフォルト値
pub const DEFAULT_PROGRESS_CADENCE: usize = 10;

/// 入力ファイルの最大サイズのデフォルト値（2GB）
pub const DEFAULT_MAX_INPUT_FILE_SIZE: u64 = 2_147_483_648;

/// 取り込み処理の設定
///
/// JSONから読み込む場合、省略したフィールドはデフォルト値になります。
///
/// ```rust
/// use sheetingest::IngestConfig;
///
/// let config = IngestConfig::from_json_str(r#"{ "progress_cadence": 50 }"#).unwrap();
/// assert_eq!(config.progress_cadence, 50);
/// assert_eq!(config.max_input_file_size, 2_147_483_648);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// 何行ごとに進捗を更新するか（最終行では必ず更新する）
    pub progress_cadence: usize,

    /// 入力ファイルの最大サイズ（バイト）
    pub max_input_file_size: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            progress_cadence: DEFAULT_PROGRESS_CADENCE,
            max_input_file_size: DEFAULT_MAX_INPUT_FILE_SIZE,
        }
    }
}

impl IngestConfig {
    /// JSON文字列から設定を読み込む
    pub fn from_json_str(json: &str) -> Result<Self, IngestError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| IngestError::Config(format!("Invalid configuration JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定値を検証する
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.progress_cadence == 0 {
            return Err(IngestError::Config(
                "progress_cadence must be at least 1".to_string(),
            ));
        }
        if self.max_input_file_size == 0 {
            return Err(IngestError::Config(
                "max_input_file_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fluent Builder APIを提供する構造体
///
/// ストアは必須、それ以外の設定にはデフォルト値があります。
/// 進捗トラッカーを指定しない場合はプロセス全体で共有される`ProgressTracker::global()`を使います。
///
/// # 使用例
///
/// ```rust
/// use std::sync::Arc;
/// use sheetingest::{MemoryFileStore, MemoryRecordStore, PipelineBuilder, ProgressTracker};
///
/// # fn main() -> Result<(), sheetingest::IngestError> {
/// let pipeline = PipelineBuilder::new(
///     Arc::new(MemoryFileStore::new()),
///     Arc::new(MemoryRecordStore::new()),
/// )
/// .with_progress_tracker(Arc::new(ProgressTracker::new()))
/// .with_progress_cadence(25)
/// .build()?;
/// # Ok(())
/// # }
/// ```
pub struct PipelineBuilder {
    file_store: Arc<dyn FileStore>,
    record_store: Arc<dyn RecordStore>,
    tracker: Option<Arc<ProgressTracker>>,
    config: IngestConfig,
}

impl PipelineBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 進捗更新間隔: 10行
    /// - 入力ファイルの最大サイズ: 2GB
    /// - 進捗トラッカー: `ProgressTracker::global()`
    ///
    /// 進捗はファイルIDの文字列をキーに記録されます。同じトラッカー（既定の
    /// グローバルトラッカーを含む）を使う複数のパイプラインは、同じ`FileStore`
    /// （同一のID空間）も共有してください。ID空間が別のストアを使う場合は、
    /// `with_progress_tracker`でパイプラインごとにトラッカーを分けます。
    pub fn new(file_store: Arc<dyn FileStore>, record_store: Arc<dyn RecordStore>) -> Self {
        Self {
            file_store,
            record_store,
            tracker: None,
            config: IngestConfig::default(),
        }
    }

    /// 進捗を書き込むトラッカーを指定する
    pub fn with_progress_tracker(mut self, tracker: Arc<ProgressTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// 進捗を更新する行数間隔を指定する
    pub fn with_progress_cadence(mut self, cadence: usize) -> Self {
        self.config.progress_cadence = cadence;
        self
    }

    /// 入力ファイルの最大サイズ（バイト）を指定する
    pub fn with_max_input_file_size(mut self, max: u64) -> Self {
        self.config.max_input_file_size = max;
        self
    }

    /// 設定をまとめて置き換える
    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// 設定を検証し、`IngestionPipeline`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `IngestError::Config` - 進捗更新間隔が0、または最大サイズが0の場合
    pub fn build(self) -> Result<IngestionPipeline, IngestError> {
        self.config.validate()?;
        let tracker = self.tracker.unwrap_or_else(ProgressTracker::global);
        Ok(IngestionPipeline::new(
            self.file_store,
            self.record_store,
            tracker,
            self.config,
        ))
    }
}
