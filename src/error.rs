use thiserror::Error;

/// Configuration-related errors with structured variants.
///
/// These are the only fatal errors in the system: a venue loop that hits
/// one halts and latches its circuit breaker open.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors surfaced by a venue adapter when placing or cancelling orders.
///
/// The coordinator's retry policy keys off the variant: `Transport`
/// failures may be retried once before any position is open, `Rejected`
/// never is.
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("order rejected by venue: {0}")]
    Rejected(String),
}

impl ExecutionError {
    /// True for connectivity-level failures eligible for the pre-position
    /// retry.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, ExecutionError::Transport(_))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("venue error: {0}")]
    Venue(String),
}

pub type Result<T> = std::result::Result<T, Error>;
