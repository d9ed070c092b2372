use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Price feed unavailable or rejected the request. The instrument is
    /// skipped for the cycle; no partial state change.
    #[error("Price feed error: {0}")]
    Feed(String),

    #[error("HTTP error: {0}")]
    Http(String),

    /// Fewer bars than the indicator warmup requires. Treated as "no
    /// signals this cycle", not fatal.
    #[error("Insufficient history: need {required} bars, got {got}")]
    InsufficientHistory { required: usize, got: usize },

    /// A stored timestamp could not be normalized to the naive
    /// representation used for boundary comparison.
    #[error("Timezone inconsistency: {0}")]
    Timezone(String),

    #[error("Ledger error: {0}")]
    Database(#[from] sqlx::Error),

    /// A resolved trade could not be written back; surfaced so the caller
    /// can retry rather than double-count on the next cycle.
    #[error("Ledger write rejected: {0}")]
    LedgerWrite(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
