use std::io;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Config(String),
    #[error("places api returned {status} for {operation}")]
    ExternalApi { operation: String, status: String },
    #[error("place record is missing its provider identifier (name: {name:?})")]
    MissingIdentifier { name: String },
    #[error("batch {batch} failed to commit after {committed} documents were written")]
    PersistenceBatch {
        batch: usize,
        committed: usize,
        #[source]
        source: Box<AppError>,
    },
    #[error("cannot derive a document key from {0:?}")]
    InvalidDocumentKey(String),
}
