use crate::errors::ConfigError;
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up when `--config-file` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "./config.json";

/// Database used when the configured name is empty.
pub const FALLBACK_DATABASE: &str = "mydb";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8086,
            user: "admin".to_string(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub name: String,
    /// Drop and recreate the database before importing
    pub drop: bool,
    /// Create the database (without dropping) before importing
    pub create: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "winsol".to_string(),
            drop: false,
            create: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ImportSection {
    pub path: PathBuf,
    pub pattern: String,
    pub delimiter: String,
    pub location: String,
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            pattern: "E*.csv".to_string(),
            delimiter: ";".to_string(),
            location: "Wullersdorf".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    pub active: bool,
    pub path: PathBuf,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            active: false,
            path: PathBuf::from("."),
        }
    }
}

/// Everything the importer needs, resolved once at start-up and passed down.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub import: ImportSection,
    pub debug: DebugConfig,
}

impl ImportConfig {
    /// Name of the target database, falling back when configured empty.
    pub fn database_name(&self) -> &str {
        let name = self.database.name.trim();
        if name.is_empty() {
            FALLBACK_DATABASE
        } else {
            name
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    /// The delimiter as a single byte.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        match self.import.delimiter.as_bytes() {
            [b] => Ok(*b),
            _ => Err(ConfigError::InvalidValue {
                field: "import.delimiter".to_string(),
                message: format!(
                    "expected a single ASCII character, got '{}'",
                    self.import.delimiter
                ),
            }),
        }
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(v) = &cli.server_host {
            self.server.host = v.clone();
        }
        if let Some(v) = cli.server_port {
            self.server.port = v;
        }
        if let Some(v) = &cli.server_user {
            self.server.user = v.clone();
        }
        if let Some(v) = &cli.server_password {
            self.server.password = v.clone();
        }
        if let Some(v) = cli.server_timeout {
            self.server.timeout_secs = v;
        }
        if let Some(v) = &cli.database_name {
            self.database.name = v.clone();
        }
        if cli.database_drop {
            self.database.drop = true;
        }
        if cli.database_create {
            self.database.create = true;
        }
        if let Some(v) = &cli.import_path {
            self.import.path = v.clone();
        }
        if let Some(v) = &cli.import_pattern {
            self.import.pattern = v.clone();
        }
        if let Some(v) = &cli.import_delimiter {
            self.import.delimiter = v.clone();
        }
        if let Some(v) = &cli.import_location {
            self.import.location = v.clone();
        }
        if cli.debug_active {
            self.debug.active = true;
        }
        if let Some(v) = &cli.debug_path {
            self.debug.path = v.clone();
        }
    }
}

/// Command line flags. Every flag can also come from a `WINSOL_*` environment variable
/// and overrides the config file.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Imports solar controller CSV exports into InfluxDB", long_about = None)]
pub struct Cli {
    /// JSON config file
    #[arg(long = "config-file", env = "WINSOL_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
    /// InfluxDB server name
    #[arg(long = "server.host", env = "WINSOL_SERVER_HOST")]
    pub server_host: Option<String>,
    /// InfluxDB port
    #[arg(long = "server.port", env = "WINSOL_SERVER_PORT")]
    pub server_port: Option<u16>,
    /// InfluxDB user
    #[arg(long = "server.user", env = "WINSOL_SERVER_USER")]
    pub server_user: Option<String>,
    /// InfluxDB password
    #[arg(long = "server.password", env = "WINSOL_SERVER_PASSWORD", hide_env_values = true)]
    pub server_password: Option<String>,
    /// HTTP timeout in seconds
    #[arg(long = "server.timeout", env = "WINSOL_SERVER_TIMEOUT")]
    pub server_timeout: Option<u64>,
    /// Database name
    #[arg(long = "database.name", env = "WINSOL_DATABASE_NAME")]
    pub database_name: Option<String>,
    /// Drop and recreate the database
    #[arg(long = "database.drop", env = "WINSOL_DATABASE_DROP")]
    pub database_drop: bool,
    /// Create the database if needed
    #[arg(long = "database.create", env = "WINSOL_DATABASE_CREATE")]
    pub database_create: bool,
    /// Import directory
    #[arg(long = "import.path", env = "WINSOL_IMPORT_PATH")]
    pub import_path: Option<PathBuf>,
    /// File name pattern, e.g. E*.csv or *.csv
    #[arg(long = "import.pattern", env = "WINSOL_IMPORT_PATTERN")]
    pub import_pattern: Option<String>,
    /// Column delimiter
    #[arg(long = "import.delimiter", env = "WINSOL_IMPORT_DELIMITER")]
    pub import_delimiter: Option<String>,
    /// Value of the location tag
    #[arg(long = "import.location", env = "WINSOL_IMPORT_LOCATION")]
    pub import_location: Option<String>,
    /// Dump decoded points as CSV
    #[arg(long = "debug.active", env = "WINSOL_DEBUG_ACTIVE")]
    pub debug_active: bool,
    /// Directory for debug dumps
    #[arg(long = "debug.path", env = "WINSOL_DEBUG_PATH")]
    pub debug_path: Option<PathBuf>,
}

/// Function to load the configuration from the JSON file
pub fn load_config(path: &Path) -> Result<ImportConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|e| ConfigError::JsonParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Defaults, then the config file, then flags/environment.
///
/// A missing default config file is skipped; a missing file named explicitly is an error.
pub fn resolve(cli: &Cli) -> Result<ImportConfig, ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => {
            info!("Loading config file {}", path.display());
            load_config(path)?
        }
        None => match load_config(Path::new(DEFAULT_CONFIG_FILE)) {
            Ok(config) => {
                info!("Loaded config file {}", DEFAULT_CONFIG_FILE);
                config
            }
            Err(ConfigError::NotFound { .. }) => {
                warn!("No config file at {}, using defaults", DEFAULT_CONFIG_FILE);
                ImportConfig::default()
            }
            Err(e) => return Err(e),
        },
    };
    config.apply(cli);
    config.delimiter_byte()?;
    Ok(config)
}
