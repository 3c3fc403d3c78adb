use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::store::error::StoreError;
use crate::store::schema::Progress;

/// File-backed storage for a single progress document.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!("Progress file: {path:?}");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the progress document.
    ///
    /// Returns `Ok(None)` when no file exists yet and
    /// [`StoreError::StorageUnreadable`] when the file cannot be read or does
    /// not match the schema.
    pub fn load_progress(&self) -> Result<Option<Progress>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.unreadable(e)),
        };

        let (progress, migrated) = Progress::from_json(&content).map_err(|e| self.unreadable(e))?;
        if migrated {
            info!("Migrated legacy progress keys in {:?}", self.path);
        }
        Ok(Some(progress))
    }

    /// Write the document atomically: stage to a `.tmp` sibling, then rename.
    pub fn save_progress(&self, progress: &Progress) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(progress)
            .map_err(|e| self.write_failed(io::Error::other(e)))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let write = || -> io::Result<()> {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            self.write_failed(e)
        })?;
        debug!("Progress saved to {:?}", self.path);
        Ok(())
    }

    /// Remove the progress file. A missing file is not an error.
    pub fn delete_progress(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Progress file {:?} deleted", self.path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.write_failed(e)),
        }
    }

    fn unreadable(&self, reason: impl ToString) -> StoreError {
        StoreError::StorageUnreadable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn write_failed(&self, source: io::Error) -> StoreError {
        StoreError::StorageWrite {
            path: self.path.clone(),
            source,
        }
    }
}
