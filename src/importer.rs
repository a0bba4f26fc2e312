use crate::config::ImportConfig;
use crate::errors::PipelineError;
use crate::file_processor::{read_points, write_debug_dump};
use crate::influx::PointSink;
use crate::locator::locate_files;
use crate::metrics::ImportSummary;
use crate::writer::{create_database, BatchWriter};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::fs;

/// Drains every matching file under the import directory into `sink`.
///
/// Files are handled one after another; within a file, chunks are written in
/// order. The first decode or write error ends the run.
pub async fn run_import<S: PointSink>(
    sink: &mut S,
    config: &ImportConfig,
) -> Result<ImportSummary, PipelineError> {
    let mut summary = ImportSummary::new();
    let database = config.database_name();
    let delimiter = config.delimiter_byte()?;

    if config.database.drop || config.database.create {
        create_database(sink, database, config.database.drop).await?;
    }

    let files = locate_files(&config.import.path, &config.import.pattern)?;
    summary.files_found = files.len() as u64;
    info!(
        "Found {} file(s) matching '{}' in {}",
        files.len(),
        config.import.pattern,
        config.import.path.display()
    );

    if config.debug.active {
        fs::create_dir_all(&config.debug.path).map_err(|e| PipelineError::DebugDirectory {
            path: config.debug.path.clone(),
            source: e,
        })?;
    }

    let writer = BatchWriter::new(&config.import.location);

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    for file in &files {
        info!("read File: {}", file.display());
        progress.set_message(file.display().to_string());

        let decoded = read_points(file, delimiter)?;
        summary.record_rows(
            decoded.points.len() as u64,
            decoded.defaulted_timestamps,
            decoded.defaulted_fields,
        );

        if decoded.points.is_empty() {
            warn!("No rows in {}, skipping", file.display());
            summary.record_empty_file();
            progress.inc(1);
            continue;
        }

        if config.debug.active {
            let dump = write_debug_dump(&config.debug.path, file, &decoded.points)?;
            info!("Wrote debug dump {}", dump.display());
        }

        let result = writer.write(sink, database, &decoded.points).await?;
        summary.record_write(result.chunks_written as u64, result.points_written as u64);
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(summary)
}
