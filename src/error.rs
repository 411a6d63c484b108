use std::path::PathBuf;

/// Failures raised by the data layer (index, pairing, dataset, sampling, eval).
#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("malformed manifest {}: {reason}", .path.display())]
    MalformedManifest { path: PathBuf, reason: String },

    #[error("unreadable image {}: {reason}", .path.display())]
    UnreadableImage { path: PathBuf, reason: String },

    #[error("planned {planned} pairs exceeds budget of {budget}")]
    PairBudgetExceeded { planned: u64, budget: u64 },

    #[error("pair table names unknown id: {0}")]
    UnknownId(String),

    #[error("invalid label: {0}")]
    InvalidLabel(String),

    #[error("index {index} out of range for {len} pairs")]
    OutOfRange { index: usize, len: usize },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DataError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedManifest {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::MissingFile(path.into());
        }
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type DataResult<T> = std::result::Result<T, DataError>;
