use crate::errors::PipelineError;
use crate::influx::PointSink;
use crate::models::{BatchPoints, MeasurementPoint, LOCATION_TAG};
use log::{debug, info};
use std::collections::BTreeMap;

/// Largest number of points sent in one write; larger payloads are rejected by the server.
pub const MAX_POINTS_PER_WRITE: usize = 200_000;

/// Totals for one file's write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteResult {
    pub chunks_written: usize,
    pub points_written: usize,
}

/// Splits a file's points into bounded chunks and writes them in order.
pub struct BatchWriter {
    tags: BTreeMap<String, String>,
    chunk_size: usize,
}

impl BatchWriter {
    /// Writer tagging every point with `location=<location>`.
    pub fn new(location: &str) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(LOCATION_TAG.to_string(), location.to_string());
        Self {
            tags,
            chunk_size: MAX_POINTS_PER_WRITE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Writes `points` as `ceil(len / chunk_size)` sequential writes.
    /// The first failing chunk aborts the rest.
    pub async fn write<S: PointSink>(
        &self,
        sink: &mut S,
        database: &str,
        points: &[MeasurementPoint],
    ) -> Result<WriteResult, PipelineError> {
        let mut result = WriteResult::default();
        for (index, chunk) in points.chunks(self.chunk_size).enumerate() {
            let start = index * self.chunk_size;
            let end = start + chunk.len();
            info!("write points {} to {}", start, end);

            let batch = BatchPoints {
                database,
                retention_policy: "",
                tags: &self.tags,
                points: chunk,
            };
            sink.write(&batch, start).await?;

            result.chunks_written += 1;
            result.points_written += chunk.len();
        }
        Ok(result)
    }
}

/// Optionally drops, then creates `database`.
///
/// The drop is best effort since the database may not exist yet. A failing
/// create is returned; the server reports an existing database as success.
pub async fn create_database<S: PointSink>(
    sink: &mut S,
    database: &str,
    drop: bool,
) -> Result<(), PipelineError> {
    if drop {
        let command = format!("DROP DATABASE {}", quote_identifier(database));
        match sink.query(&command, database).await {
            Ok(()) => info!("Dropped database '{}'", database),
            Err(e) => debug!("Ignoring drop failure for '{}': {}", database, e),
        }
    }
    let command = format!("CREATE DATABASE {}", quote_identifier(database));
    sink.query(&command, database).await?;
    info!("Created database '{}'", database);
    Ok(())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}
