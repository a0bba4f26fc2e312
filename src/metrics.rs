use log::info;
use std::time::{Duration, Instant};

/// Run totals, owned by the import driver and returned to the caller.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub files_found: u64,
    pub files_imported: u64,
    pub files_empty: u64,
    pub rows_parsed: u64,
    pub defaulted_timestamps: u64,
    pub defaulted_fields: u64,
    pub chunks_written: u64,
    pub points_written: u64,
    start_time: Instant,
}

impl Default for ImportSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSummary {
    pub fn new() -> Self {
        Self {
            files_found: 0,
            files_imported: 0,
            files_empty: 0,
            rows_parsed: 0,
            defaulted_timestamps: 0,
            defaulted_fields: 0,
            chunks_written: 0,
            points_written: 0,
            start_time: Instant::now(),
        }
    }

    pub fn record_empty_file(&mut self) {
        self.files_empty += 1;
    }

    pub fn record_rows(&mut self, rows: u64, defaulted_timestamps: u64, defaulted_fields: u64) {
        self.rows_parsed += rows;
        self.defaulted_timestamps += defaulted_timestamps;
        self.defaulted_fields += defaulted_fields;
    }

    pub fn record_write(&mut self, chunks: u64, points: u64) {
        self.files_imported += 1;
        self.chunks_written += chunks;
        self.points_written += points;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn throughput(&self) -> f64 {
        let duration_secs = self.elapsed().as_secs_f64();
        if duration_secs > 0.0 {
            self.points_written as f64 / duration_secs
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        info!("========== Import Summary ==========");
        info!("Total Duration: {:.2?}", self.elapsed());
        info!("Files Found: {}", self.files_found);
        info!("Files Imported: {}", self.files_imported);
        info!("Files Without Rows: {}", self.files_empty);
        info!("Rows Parsed: {}", self.rows_parsed);
        info!("Defaulted Timestamps: {}", self.defaulted_timestamps);
        info!("Defaulted Fields: {}", self.defaulted_fields);
        info!("Chunks Written: {}", self.chunks_written);
        info!("Points Written: {}", self.points_written);
        info!("Throughput: {:.2} points/sec", self.throughput());
        info!("====================================");
    }
}
