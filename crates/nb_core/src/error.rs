use thiserror::Error;
use crate::types::ArticleId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed article at position {index}: {reason}")]
    MalformedData { index: usize, reason: String },

    #[error("Unknown article: {0}")]
    UnknownArticle(ArticleId),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Error::MalformedData { index, reason: reason.into() }
    }

    /// Folds any error raised while fetching into `FetchFailed`.
    ///
    /// Validation errors pass through untouched so callers can tell a bad
    /// batch apart from a transport problem.
    pub fn into_fetch_failure(self) -> Self {
        match self {
            e @ (Error::FetchFailed(_) | Error::MalformedData { .. }) => e,
            other => Error::FetchFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
