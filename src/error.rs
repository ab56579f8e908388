//! Error types shared across the quiz.

use thiserror::Error;

/// Failures while obtaining questions from the trivia API.
///
/// None of these are fatal: the session falls back to its empty state and the
/// detail only reaches the log.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("trivia api request failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("trivia api still rate limiting after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("trivia api reported response code {0}")]
    Api(u8),
    #[error("trivia api returned no questions")]
    NoResults,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("malformed trivia api body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures reading or writing persisted session state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("stored value for `{key}` is not valid: {value}")]
    Corrupt { key: &'static str, value: String },
}
