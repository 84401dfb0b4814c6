use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Error types produced while generating or answering questions.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Network level failure that survived the retry policy
    #[error("HTTP error: {0}")]
    Http(String),
    /// Missing or rejected credentials
    #[error("Auth error: {0}")]
    Auth(String),
    /// Final response status was not a success
    #[error("Endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// Response body could not be interpreted
    #[error("Response format error: {message}. Raw response: {raw_response}")]
    ResponseFormat {
        message: String,
        raw_response: String,
    },
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    Json(String),
    /// Reading or writing a record file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Invalid request parameters or endpoint configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// The batch was cancelled before the call could complete
    #[error("Cancelled")]
    Cancelled,
    /// A single work item failed and the batch stopped
    #[error("Item {id} failed: {source}")]
    ItemFailed {
        id: String,
        #[source]
        source: Box<QuizError>,
    },
}

impl QuizError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QuizError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for QuizError {
    fn from(err: reqwest::Error) -> Self {
        QuizError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for QuizError {
    fn from(err: serde_json::Error) -> Self {
        QuizError::Json(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}
