use thiserror::Error;

/// Errors surfaced by [`EntityStore`](super::EntityStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The collection or the record does not exist.
    #[error("record not found")]
    NotFound,

    /// The collection name is empty or contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Maps a missing file to `NotFound` and keeps everything else as I/O.
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound
        } else {
            StoreError::Io(err)
        }
    }
}
