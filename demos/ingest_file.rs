//! Ingest File Demo
//!
//! Ingests one spreadsheet into in-memory stores and prints every persisted
//! record as a JSON line. Set `RUST_LOG=sheetingest=debug` to see progress.

use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use sheetingest::{
    IngestConfig, IngestError, MemoryFileStore, MemoryRecordStore, PipelineBuilder, Upload,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input.xlsx|input.xls> [options]", args[0]);
        eprintln!("\nOptions:");
        eprintln!("  --cadence <n>       Push progress every n rows (default 10)");
        eprintln!("  --config <json>     Pipeline configuration as JSON");
        eprintln!("\nExamples:");
        eprintln!("  {} people.xlsx", args[0]);
        eprintln!("  {} people.xlsx --cadence 100", args[0]);
        eprintln!(
            "  {} people.xlsx --config '{{\"max_input_file_size\": 1048576}}'",
            args[0]
        );
        process::exit(1);
    }

    let input_path = &args[1];

    // Parse options
    let mut config = IngestConfig::default();
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--cadence" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --cadence requires a value");
                    process::exit(1);
                }
                config.progress_cadence = args[i + 1].parse::<usize>().unwrap_or_else(|_| {
                    eprintln!("Error: Invalid cadence: {}", args[i + 1]);
                    process::exit(1);
                });
                i += 2;
            }
            "--config" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --config requires a value");
                    process::exit(1);
                }
                config = IngestConfig::from_json_str(&args[i + 1]).unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                });
                i += 2;
            }
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
    }

    if let Err(e) = ingest(input_path, config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn ingest(input_path: &str, config: IngestConfig) -> Result<(), Box<dyn std::error::Error>> {
    let records = Arc::new(MemoryRecordStore::new());
    let pipeline = PipelineBuilder::new(Arc::new(MemoryFileStore::new()), records.clone())
        .with_config(config)
        .build()?;

    let upload = Upload::from_path(input_path)?;

    let report = match pipeline.ingest(&upload) {
        Ok(report) => report,
        Err(failure) => {
            eprintln!(
                "Ingestion failed in {:?} after {} rows (progress {:?})",
                failure.failed_in, failure.rows_persisted, failure.last_progress
            );
            return Err(failure.into());
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in records.rows_for(report.file_id) {
        writeln!(out, "{}", record.values_json()).map_err(IngestError::from)?;
    }

    eprintln!(
        "Ingested {} rows with header {:?} (progress {:?}%)",
        report.rows_persisted,
        report.header,
        pipeline.progress(report.file_id)
    );

    Ok(())
}
