//! sheetingest - Streaming Excel ingestion into header-keyed row records
//!
//! This crate ingests spreadsheet uploads (XLS/XLSX), converts the first sheet
//! into header-keyed text records, persists each row through a pluggable store,
//! and reports incremental progress per file while the ingestion is in flight.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sheetingest::{MemoryFileStore, MemoryRecordStore, PipelineBuilder, Upload};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let records = Arc::new(MemoryRecordStore::new());
//!
//!     // Create a pipeline with default settings
//!     let pipeline = PipelineBuilder::new(Arc::new(MemoryFileStore::new()), records.clone())
//!         .build()?;
//!
//!     // Ingest an Excel file from disk
//!     let report = pipeline.ingest(&Upload::from_path("people.xlsx")?)?;
//!
//!     for record in records.rows_for(report.file_id) {
//!         println!("{}", record.values_json());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sheetingest::{MemoryFileStore, MemoryRecordStore, PipelineBuilder, ProgressTracker};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracker = Arc::new(ProgressTracker::new());
//!
//!     let pipeline = PipelineBuilder::new(
//!         Arc::new(MemoryFileStore::new()),
//!         Arc::new(MemoryRecordStore::new()),
//!     )
//!     .with_progress_tracker(tracker)          // Private tracker instead of the global one
//!     .with_progress_cadence(100)              // Push progress every 100 rows
//!     .with_max_input_file_size(64 << 20)      // Reject uploads over 64MB
//!     .build()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Decoding Without Persistence
//!
//! ```rust,no_run
//! use sheetingest::{Header, SpreadsheetDecoder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("people.xlsx")?;
//!     let mut workbook = SpreadsheetDecoder::open(&bytes, "people.xlsx")?;
//!
//!     let mut rows = workbook.rows()?;
//!     if let Some(first) = rows.next() {
//!         let header = Header::from_row(&first?)?;
//!         for row in rows {
//!             println!("{:?}", header.normalize(row?)?);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod error;
mod formatter;
mod normalizer;
mod parser;
mod pipeline;
mod progress;
mod store;
mod types;

// 公開API
pub use api::{IngestionState, SpreadsheetFormat};
pub use builder::{
    IngestConfig, PipelineBuilder, DEFAULT_MAX_INPUT_FILE_SIZE, DEFAULT_PROGRESS_CADENCE,
};
pub use error::{
    DecodeError, IngestError, IngestFailure, NormalizeError, ProgressError, StorageError,
};
pub use normalizer::Header;
pub use parser::{Rows, SpreadsheetDecoder, Workbook};
pub use pipeline::{IngestReport, IngestionPipeline};
pub use progress::{ProgressTracker, MAX_PERCENT};
pub use store::{FileStore, MemoryFileStore, MemoryRecordStore, RecordStore, StoreResult};
pub use types::{FileId, FileRecord, Row, RowRecord, Upload};
