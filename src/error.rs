use thiserror::Error;

/// Main error type for the scout library
#[derive(Error, Debug)]
pub enum ScoutError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// YAML config errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream data broke an invariant (negative quantity, inclusion rate out of range, ...)
    #[error("Contract violation in {context}: {field} = {value}")]
    ContractViolation {
        field: String,
        value: String,
        context: String,
    },

    /// Caller passed an unusable argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider errors
    #[error("Provider '{provider}' error: {message}")]
    Provider { provider: String, message: String },

    /// Provider asked us to slow down
    #[error("Provider '{provider}' rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// Missing user, commander or deck
    #[error("Not found: {0}")]
    NotFound(String),

    /// Collection import errors
    #[error("Import error at line {line}: {message}")]
    Import { line: usize, message: String },

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl ScoutError {
    /// Build a contract violation naming the offending field and where it came from
    pub fn contract(
        field: impl Into<String>,
        value: impl ToString,
        context: impl Into<String>,
    ) -> Self {
        ScoutError::ContractViolation {
            field: field.into(),
            value: value.to_string(),
            context: context.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ScoutError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl From<String> for ScoutError {
    fn from(s: String) -> Self {
        ScoutError::Other(s)
    }
}

impl From<&str> for ScoutError {
    fn from(s: &str) -> Self {
        ScoutError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ScoutError>;
