//! Error types for the document service boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single request to the document service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never completed (connection refused, reset, DNS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// A success response whose body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The file chosen for upload could not be read locally.
    #[error("could not read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Rejection at the file-selection boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("{0} is not a PDF file")]
    NotPdf(String),

    #[error("{0} does not name a file")]
    NoFileName(String),
}
