//! Error types for esmon


use thiserror::Error;

/// Main error type for esmon operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Upstream fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP listener errors
    #[error("Server error: {0}")]
    Server(String),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

/// Errors raised by a single upstream read.
///
/// All of them are local to one fetch: the aggregator logs them and moves on
/// to the next fetch of the cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// Upstream answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Response body could not be decoded
    #[error("Decode error for {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// Url of the request that failed
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }

    /// Whether the upstream could not be reached or stopped answering
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }
}

/// Configuration and bootstrap errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("Invalid config {path}: {message}")]
    Parse { path: String, message: String },

    /// No cluster hosts configured
    #[error("No cluster hosts configured")]
    NoHosts,

    /// Value out of range
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Result type for esmon operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Result type for upstream reads
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
