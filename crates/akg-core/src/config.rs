//! AKG Configuration Management
//!
//! Handles configuration from environment variables and TOML config files,
//! with sensible defaults for local runs against public DBpedia.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Background ontology used by the validator
    pub ontology: OntologyConfig,

    /// Remote SPARQL endpoint
    pub fetcher: FetcherConfig,

    /// Extraction worker pool
    pub pool: PoolConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        // Ontology
        if let Ok(path) = std::env::var("AKG_ONTOLOGY_PATH") {
            self.ontology.path = PathBuf::from(path);
        }
        if let Ok(depth) = std::env::var("AKG_MAX_DEPTH") {
            self.ontology.max_depth = parse_var("AKG_MAX_DEPTH", depth)?;
        }

        // Fetcher
        if let Ok(url) = std::env::var("AKG_SPARQL_ENDPOINT") {
            self.fetcher.endpoint = url;
        }
        if let Ok(secs) = std::env::var("AKG_QUERY_TIMEOUT_SECS") {
            self.fetcher.query_timeout_secs = parse_var("AKG_QUERY_TIMEOUT_SECS", secs)?;
        }

        // Pool
        if let Ok(capacity) = std::env::var("AKG_POOL_CAPACITY") {
            self.pool.capacity = parse_var("AKG_POOL_CAPACITY", capacity)?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(self)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pool.capacity".to_string(),
                value: "0".to_string(),
            });
        }
        if self.ontology.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ontology.max_depth".to_string(),
                value: "0".to_string(),
            });
        }
        if self.fetcher.query_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "fetcher.query_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.fetcher.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingRequired("fetcher.endpoint".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Background ontology configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyConfig {
    /// N-Triples or Turtle file loaded once at startup
    pub path: PathBuf,

    /// Maximum ancestry traversal depth
    pub max_depth: u32,

    /// Memoized ancestry sub-graphs (0 disables the cache)
    pub cache_capacity: u64,
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("graph.nt"),
            max_depth: 10,
            cache_capacity: 0,
        }
    }
}

/// Remote SPARQL endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// SPARQL endpoint URL
    pub endpoint: String,

    /// `default-graph-uri` request parameter
    pub default_graph: Option<String>,

    /// Language of the abstracts to keep
    pub language: String,

    /// Optional LIMIT on the number of bindings per category
    pub limit: Option<usize>,

    /// Client-side timeout for one query, in seconds (must be positive)
    pub query_timeout_secs: u64,

    /// Server-side execution timeout passed to the endpoint, in milliseconds
    pub endpoint_timeout_ms: u64,
}

impl FetcherConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://dbpedia.org/sparql".to_string(),
            default_graph: Some("http://dbpedia.org".to_string()),
            language: "en".to_string(),
            limit: None,
            query_timeout_secs: 60,
            endpoint_timeout_ms: 30_000,
        }
    }
}

/// Extraction worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of concurrently running extraction workers
    pub capacity: usize,

    /// Slot acquisition timeout in seconds (0 waits indefinitely)
    pub acquire_timeout_secs: u64,
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Option<Duration> {
        (self.acquire_timeout_secs > 0).then(|| Duration::from_secs(self.acquire_timeout_secs))
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            acquire_timeout_secs: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
