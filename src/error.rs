use thiserror::Error;

/// Errors surfaced by the non-session parts of the crate.
///
/// Session operations themselves never fail; see [`crate::typing`] and
/// [`crate::arcade`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An embedded or custom corpus is missing or has an empty tier.
    #[error("corpus error: {message}")]
    Corpus { message: String },

    #[error("logging error: {message}")]
    Logging { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
