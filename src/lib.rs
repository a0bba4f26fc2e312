//! Batch importer for solar controller CSV exports.
//!
//! Files matching a pattern in one directory are decoded row by row into
//! `solar` points and written to an InfluxDB database in bounded chunks.

pub mod config;
pub mod errors;
pub mod file_processor;
pub mod importer;
pub mod influx;
pub mod locator;
pub mod metrics;
pub mod models;
pub mod parsers;
pub mod utils;
pub mod writer;

pub use config::{Cli, ImportConfig};
pub use errors::{ConfigError, ParseError, PipelineError};
pub use importer::run_import;
pub use influx::{InfluxClient, PointSink};
pub use models::{MeasurementPoint, ParseOutcome};
pub use writer::{BatchWriter, MAX_POINTS_PER_WRITE};
