use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress data is not loaded")]
    NotLoaded,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The save file exists but could not be read or parsed. `ProgressStore::open`
    /// recovers from this by substituting a fresh default progress.
    #[error("progress file {path:?} is unreadable: {reason}")]
    StorageUnreadable { path: PathBuf, reason: String },

    #[error("failed to write progress file {path:?}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn is_not_loaded(&self) -> bool {
        matches!(self, StoreError::NotLoaded)
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StoreError::InvalidArgument(_))
    }
}
