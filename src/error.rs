/// Machine-distinguishable error category, stable across message changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DataFetch,
    Encoding,
    Storage,
    Publish,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::DataFetch => "data_fetch_error",
            Self::Encoding => "encoding_error",
            Self::Storage => "storage_error",
            Self::Publish => "publish_error",
        }
    }
}

/// Failure from the data store seam (fetch or write-back).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError(e.to_string())
    }
}

/// Failure from the blob storage seam.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The target bucket does not exist. Recoverable by creating it.
    #[error("bucket not found: {0}")]
    MissingBucket(String),

    #[error("storage request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for BlobError {
    fn from(e: reqwest::Error) -> Self {
        BlobError::Request(e.to_string())
    }
}

/// Pipeline error taxonomy. Every variant carries the proposal id so the
/// caller can surface it without re-threading context.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("proposal {0} not found")]
    NotFound(i64),

    #[error("failed to load proposal {id}: {source}")]
    DataFetch { id: i64, source: StoreError },

    #[error("failed to encode document for proposal {id}: {reason}")]
    Encoding { id: i64, reason: String },

    #[error("failed to store document for proposal {id}: {source}")]
    Storage { id: i64, source: BlobError },

    /// Upload succeeded but the pointer write-back failed. The blob exists
    /// at `path` and the proposal record is not linked to it.
    #[error("document for proposal {id} stored at {path} but the record update failed: {source}")]
    Publish {
        id: i64,
        path: String,
        source: StoreError,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DataFetch { .. } => ErrorKind::DataFetch,
            Self::Encoding { .. } => ErrorKind::Encoding,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Publish { .. } => ErrorKind::Publish,
        }
    }

    pub fn proposal_id(&self) -> i64 {
        match self {
            Self::NotFound(id)
            | Self::DataFetch { id, .. }
            | Self::Encoding { id, .. }
            | Self::Storage { id, .. }
            | Self::Publish { id, .. } => *id,
        }
    }
}
