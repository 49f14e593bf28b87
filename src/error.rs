use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Source Errors
    #[error("Source {source_name} unavailable: {reason}")]
    SourceUnavailable {
        source_name: String,
        reason: String,
    },

    #[error("Source {source_name} timed out after {timeout_ms}ms")]
    Timeout {
        source_name: String,
        timeout_ms: u64,
    },

    #[error("No fetcher registered for source: {0}")]
    NoFetcherForSource(String),

    #[error("Selector matched nothing: {0}")]
    SelectorNotFound(String),

    #[error("All sources exhausted")]
    AllSourcesExhausted,

    // Rate Errors
    #[error("Unparseable rate text: {0:?}")]
    ParseError(String),

    #[error("Rate {rate} outside sane bounds")]
    ValidationError { rate: f64 },

    // Persistence Errors
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    // Monitoring Errors
    #[error("Invalid update interval: {0} minutes")]
    InvalidInterval(f64),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // IO Errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::SourceUnavailable { .. } => "source_unavailable",
            Error::Timeout { .. } => "timeout",
            Error::NoFetcherForSource(_) => "no_fetcher",
            Error::SelectorNotFound(_) => "selector_not_found",
            Error::AllSourcesExhausted => "all_sources_exhausted",
            Error::ParseError(_) => "parse",
            Error::ValidationError { .. } => "validation",
            Error::PersistenceError(_) => "persistence",
            Error::SerializationError(_) => "serialization",
            Error::DeserializationError(_) => "deserialization",
            Error::InvalidInterval(_) => "invalid_interval",
            Error::ConfigError(_) => "config",
            Error::IoError(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
