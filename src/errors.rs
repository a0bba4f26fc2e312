use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse JSON configuration in {path}: {source}")]
    JsonParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Configuration file not found at {path}")]
    NotFound { path: PathBuf },
    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration loading failed: {0}")]
    Config(#[from] ConfigError),
    #[error("Connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },
    #[error("Cannot list import directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("Decoding failed: {0}")]
    FileDecode(#[from] ParseError),
    #[error("Write of points {start}..{end} to database '{database}' failed: {message}")]
    Write {
        database: String,
        start: usize,
        end: usize,
        message: String,
    },
    #[error("Query '{command}' failed: {message}")]
    Query { command: String, message: String },
    #[error("Cannot create debug directory {path}: {source}")]
    DebugDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write debug dump {path}: {source}")]
    DebugDump {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading data file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error reading CSV headers in {path}: {source}")]
    HeaderReadError {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Unrecognised column layout in {path}: headers {headers:?}")]
    UnknownSchema { path: PathBuf, headers: Vec<String> },
    #[error("Malformed record in {path} at row {row}: {source}")]
    RecordError {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },
}

impl ParseError {
    /// Re-anchors an error produced while decoding an anonymous reader onto a file path.
    pub fn with_path(self, file_path: &std::path::Path) -> Self {
        let path = file_path.to_path_buf();
        match self {
            ParseError::IoError { source, .. } => ParseError::IoError { path, source },
            ParseError::HeaderReadError { source, .. } => ParseError::HeaderReadError { path, source },
            ParseError::UnknownSchema { headers, .. } => ParseError::UnknownSchema { path, headers },
            ParseError::RecordError { row, source, .. } => ParseError::RecordError { path, row, source },
        }
    }
}
