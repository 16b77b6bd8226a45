//! Pipeline Module
//!
//! アップロード1件をファイルエンティティと行レコードへ変換する取り込みパイプライン。
//!
//! # 処理フロー
//!
//! ```text
//! Upload ─▶ 入力検証 ─▶ Created ─▶ Decoding ─▶ Persisting ─▶ Completed
//!                         │           │            │
//!                         └───────────┴────────────┴──▶ IngestFailure
//! ```
//!
//! 失敗時のロールバックは行いません。作成済みのファイルエンティティと
//! 永続化済みの行レコードはストアに残り、進捗は最後に記録された値のままです。

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::api::IngestionState;
use crate::builder::IngestConfig;
use crate::error::{IngestError, IngestFailure};
use crate::normalizer::Header;
use crate::parser::SpreadsheetDecoder;
use crate::progress::{percent_of, ProgressTracker, MAX_PERCENT};
use crate::store::{FileStore, RecordStore};
use crate::types::{FileId, FileRecord, RowRecord, Upload};

/// 取り込み成功時の報告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// 作成されたファイルID
    pub file_id: FileId,
    /// ヘッダーのフィールド名（列順）
    pub header: Vec<String>,
    /// 永続化した行レコード数
    pub rows_persisted: usize,
    /// データ行の総数（ヘッダー行を除く）
    pub total_rows: usize,
}

/// 取り込みパイプライン
///
/// `PipelineBuilder`で構築します。ストアとトラッカーは`Arc`で共有されるため、
/// 1つのパイプラインを複数スレッドから同時に使用できます。
pub struct IngestionPipeline {
    file_store: Arc<dyn FileStore>,
    record_store: Arc<dyn RecordStore>,
    tracker: Arc<ProgressTracker>,
    config: IngestConfig,
}

/// 1回の取り込みの途中経過（失敗報告用）
struct RunState {
    state: IngestionState,
    file_id: Option<FileId>,
    rows_persisted: usize,
}

impl RunState {
    fn new() -> Self {
        Self {
            state: IngestionState::Created,
            file_id: None,
            rows_persisted: 0,
        }
    }

    fn enter(&mut self, state: IngestionState) {
        debug!(from = ?self.state, to = ?state, "State transition");
        self.state = state;
    }
}

impl IngestionPipeline {
    pub(crate) fn new(
        file_store: Arc<dyn FileStore>,
        record_store: Arc<dyn RecordStore>,
        tracker: Arc<ProgressTracker>,
        config: IngestConfig,
    ) -> Self {
        Self {
            file_store,
            record_store,
            tracker,
            config,
        }
    }

    /// 進捗トラッカー
    pub fn tracker(&self) -> &Arc<ProgressTracker> {
        &self.tracker
    }

    /// 適用中の設定
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// アップロードを取り込む
    ///
    /// # 引数
    ///
    /// * `upload` - 元のファイル名とファイル内容
    ///
    /// # 戻り値
    ///
    /// * `Ok(IngestReport)` - すべての行を永続化し、進捗が100%になった場合
    /// * `Err(IngestFailure)` - 失敗した場合（部分的な状態は残る）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use sheetingest::{MemoryFileStore, MemoryRecordStore, PipelineBuilder, Upload};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let pipeline = PipelineBuilder::new(
    ///     Arc::new(MemoryFileStore::new()),
    ///     Arc::new(MemoryRecordStore::new()),
    /// )
    /// .build()?;
    ///
    /// let report = pipeline.ingest(&Upload::from_path("people.xlsx")?)?;
    /// println!("{} rows", report.rows_persisted);
    /// # Ok(())
    /// # }
    /// ```
    #[tracing::instrument(skip_all, fields(file_name = %upload.file_name))]
    pub fn ingest(&self, upload: &Upload) -> Result<IngestReport, IngestFailure> {
        let mut run = RunState::new();

        match self.run(upload, &mut run) {
            Ok(report) => {
                info!(
                    file_id = %report.file_id,
                    rows = report.rows_persisted,
                    "Ingestion completed"
                );
                Ok(report)
            }
            Err(error) => {
                let last_progress = run
                    .file_id
                    .and_then(|id| self.tracker.read(&id.to_string()));
                warn!(
                    state = ?run.state,
                    rows_persisted = run.rows_persisted,
                    ?last_progress,
                    %error,
                    "Ingestion failed"
                );
                Err(IngestFailure {
                    error,
                    file_id: run.file_id,
                    rows_persisted: run.rows_persisted,
                    last_progress,
                    failed_in: run.state,
                })
            }
        }
    }

    fn run(&self, upload: &Upload, run: &mut RunState) -> Result<IngestReport, IngestError> {
        self.validate_input(upload)?;

        // Created
        let file_id = self.file_store.save(FileRecord::new(&upload.file_name))?;
        run.file_id = Some(file_id);
        let key = file_id.to_string();
        self.tracker.start(&key);
        info!(%file_id, size = upload.content.len(), "Ingestion started");

        // Decoding
        run.enter(IngestionState::Decoding);
        let mut workbook = SpreadsheetDecoder::open(&upload.content, &upload.file_name)?;
        let total = workbook.count_rows()?.saturating_sub(1);
        debug!(%file_id, total, "Counted data rows");

        // Persisting
        run.enter(IngestionState::Persisting);
        let mut rows = workbook.rows()?;
        let header = match rows.next().transpose()? {
            Some(row) => Header::from_row(&row)?,
            None => Header::empty(),
        };

        let cadence = self.config.progress_cadence;
        for row in rows {
            let values = header.normalize(row?)?;
            self.record_store.save(RowRecord::new(file_id, values))?;
            run.rows_persisted += 1;

            let processed = run.rows_persisted;
            trace!(%file_id, processed, "Row persisted");
            if processed % cadence == 0 || processed == total {
                let percent = percent_of(processed, total);
                self.tracker.update(&key, percent)?;
                debug!(%file_id, processed, percent, "Progress updated");
            }
        }

        // Completed
        self.tracker.update(&key, u32::from(MAX_PERCENT))?;
        run.enter(IngestionState::Completed);

        Ok(IngestReport {
            file_id,
            header: header.names().to_vec(),
            rows_persisted: run.rows_persisted,
            total_rows: total,
        })
    }

    /// ファイルエンティティを作成する前の入力検証
    fn validate_input(&self, upload: &Upload) -> Result<(), IngestError> {
        if upload.content.is_empty() {
            return Err(IngestError::EmptyInput {
                file_name: upload.file_name.clone(),
            });
        }

        let size = upload.content.len() as u64;
        if size > self.config.max_input_file_size {
            return Err(IngestError::InputTooLarge {
                size,
                max: self.config.max_input_file_size,
            });
        }

        Ok(())
    }

    /// 複数のアップロードを並列に取り込む
    ///
    /// 各アップロードは独立して処理され、結果は入力と同じ順序で返ります。
    pub fn ingest_batch(&self, uploads: &[Upload]) -> Vec<Result<IngestReport, IngestFailure>> {
        info!(count = uploads.len(), "Batch ingestion started");
        uploads.par_iter().map(|upload| self.ingest(upload)).collect()
    }

    /// ファイルと配下の行レコードを削除し、進捗をクリアする
    ///
    /// 削除順は 行レコード → ファイル（存在する場合のみ）→ 進捗 です。
    /// 存在しないファイルの削除は何もせずに成功します。
    #[tracing::instrument(skip_all, fields(file_id = %file_id))]
    pub fn delete_file(&self, file_id: FileId) -> Result<(), IngestError> {
        let removed = self.record_store.delete_all_by_file_id(file_id)?;

        if self.file_store.exists_by_id(file_id)? {
            self.file_store.delete_by_id(file_id)?;
        }

        self.tracker.clear(&file_id.to_string());
        info!(rows = removed, "File deleted");
        Ok(())
    }

    /// 現在の進捗率（未登録またはクリア済みなら`None`）
    pub fn progress(&self, file_id: FileId) -> Option<u8> {
        self.tracker.read(&file_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PipelineBuilder;
    use crate::error::DecodeError;
    use crate::store::{MemoryFileStore, MemoryRecordStore};

    struct Fixture {
        files: Arc<MemoryFileStore>,
        records: Arc<MemoryRecordStore>,
        pipeline: IngestionPipeline,
    }

    fn fixture() -> Fixture {
        let files = Arc::new(MemoryFileStore::new());
        let records = Arc::new(MemoryRecordStore::new());
        let pipeline = PipelineBuilder::new(files.clone(), records.clone())
            .with_progress_tracker(Arc::new(ProgressTracker::new()))
            .with_max_input_file_size(1024)
            .build()
            .unwrap();
        Fixture {
            files,
            records,
            pipeline,
        }
    }

    #[test]
    fn test_empty_input_creates_nothing() {
        let fx = fixture();
        let failure = fx.pipeline.ingest(&Upload::new("empty.xlsx", Vec::new())).unwrap_err();

        assert!(matches!(failure.error, IngestError::EmptyInput { .. }));
        assert_eq!(failure.file_id, None);
        assert_eq!(failure.last_progress, None);
        assert_eq!(failure.failed_in, IngestionState::Created);
        assert!(fx.files.is_empty());
        assert!(fx.pipeline.tracker().is_empty());
    }

    #[test]
    fn test_too_large_input_creates_nothing() {
        let fx = fixture();
        let failure = fx
            .pipeline
            .ingest(&Upload::new("big.xlsx", vec![0u8; 2048]))
            .unwrap_err();

        assert!(matches!(
            failure.error,
            IngestError::InputTooLarge {
                size: 2048,
                max: 1024
            }
        ));
        assert!(fx.files.is_empty());
    }

    #[test]
    fn test_corrupt_input_keeps_file_entity() {
        let fx = fixture();
        let failure = fx
            .pipeline
            .ingest(&Upload::new("broken.xlsx", b"not a workbook".to_vec()))
            .unwrap_err();

        assert!(matches!(
            failure.error,
            IngestError::Decode(DecodeError::CorruptFile { .. })
        ));
        assert_eq!(failure.failed_in, IngestionState::Decoding);
        assert_eq!(failure.rows_persisted, 0);
        assert_eq!(failure.last_progress, Some(0));

        let file_id = failure.file_id.unwrap();
        assert!(fx.files.exists_by_id(file_id).unwrap());
        assert_eq!(fx.pipeline.progress(file_id), Some(0));
        assert_eq!(fx.records.total_len(), 0);
    }

    #[test]
    fn test_unsupported_extension_fails_while_decoding() {
        let fx = fixture();
        let failure = fx
            .pipeline
            .ingest(&Upload::new("notes.txt", b"hello".to_vec()))
            .unwrap_err();

        assert!(matches!(
            failure.error,
            IngestError::Decode(DecodeError::UnsupportedFormat { .. })
        ));
        assert_eq!(failure.failed_in, IngestionState::Decoding);
    }

    #[test]
    fn test_delete_unknown_file_is_noop() {
        let fx = fixture();
        assert!(fx.pipeline.delete_file(FileId(999)).is_ok());
        assert!(fx.pipeline.delete_file(FileId(999)).is_ok());
    }

    #[test]
    fn test_delete_after_failure_cleans_up() {
        let fx = fixture();
        let failure = fx
            .pipeline
            .ingest(&Upload::new("broken.xlsx", b"garbage".to_vec()))
            .unwrap_err();
        let file_id = failure.file_id.unwrap();

        fx.pipeline.delete_file(file_id).unwrap();
        assert!(!fx.files.exists_by_id(file_id).unwrap());
        assert_eq!(fx.pipeline.progress(file_id), None);
    }

    #[test]
    fn test_pipeline_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IngestionPipeline>();
    }

    fn people_upload(name: &str, rows: u32) -> Upload {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "name").unwrap();
        for row in 1..=rows {
            worksheet.write_string(row, 0, format!("person{}", row)).unwrap();
        }
        Upload::new(name, workbook.save_to_buffer().unwrap())
    }

    #[test]
    fn test_pipelines_sharing_tracker_and_file_store_keep_separate_progress() {
        let tracker = Arc::new(ProgressTracker::new());
        let files = Arc::new(MemoryFileStore::new());
        let build = || {
            PipelineBuilder::new(files.clone(), Arc::new(MemoryRecordStore::new()))
                .with_progress_tracker(tracker.clone())
                .build()
                .unwrap()
        };
        let first = build();
        let second = build();

        let report = first.ingest(&people_upload("a.xlsx", 3)).unwrap();
        let failure = second
            .ingest(&Upload::new("broken.xlsx", b"garbage".to_vec()))
            .unwrap_err();

        assert_ne!(failure.file_id, Some(report.file_id));
        assert_eq!(first.progress(report.file_id), Some(100));
        assert_eq!(second.progress(failure.file_id.unwrap()), Some(0));
    }

    #[test]
    fn test_pipelines_with_own_trackers_do_not_collide() {
        let build = || {
            PipelineBuilder::new(
                Arc::new(MemoryFileStore::new()),
                Arc::new(MemoryRecordStore::new()),
            )
            .with_progress_tracker(Arc::new(ProgressTracker::new()))
            .build()
            .unwrap()
        };
        let first = build();
        let second = build();

        let report = first.ingest(&people_upload("a.xlsx", 3)).unwrap();
        let failure = second
            .ingest(&Upload::new("broken.xlsx", b"garbage".to_vec()))
            .unwrap_err();

        // 別々のストアなのでIDは重複するが、トラッカーが別なので上書きされない
        assert_eq!(failure.file_id, Some(report.file_id));
        assert_eq!(first.progress(report.file_id), Some(100));
        assert_eq!(second.progress(report.file_id), Some(0));
    }

    // 実ファイルを使ったテストは統合テスト（tests/）で実装します。
}
