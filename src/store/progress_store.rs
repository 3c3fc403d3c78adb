use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};

use crate::store::error::StoreError;
use crate::store::json_store::JsonStore;
use crate::store::schema::{MAX_LEVEL, Progress, Settings};

/// Owns the in-memory progress and writes every change through to disk.
///
/// If a write fails the in-memory change stays applied and the error is
/// returned; call [`ProgressStore::save`] to retry.
pub struct ProgressStore {
    json: JsonStore,
    progress: Option<Progress>,
    recovered: bool,
}

impl ProgressStore {
    /// Load progress from `json`, falling back to defaults when the file is
    /// missing or unreadable. Never fails.
    pub fn open(json: JsonStore) -> Self {
        let (progress, recovered) = match json.load_progress() {
            Ok(Some(progress)) => {
                info!("Progress loaded from {:?}", json.path());
                (progress, false)
            }
            Ok(None) => {
                info!("No progress file at {:?}, starting fresh", json.path());
                (Progress::default(), false)
            }
            Err(e) => {
                warn!("{e}; starting with fresh progress");
                (Progress::default(), true)
            }
        };

        Self {
            json,
            progress: Some(progress),
            recovered,
        }
    }

    /// Wrap already-loaded progress without touching the disk.
    pub fn with_progress(json: JsonStore, progress: Progress) -> Self {
        Self {
            json,
            progress: Some(progress),
            recovered: false,
        }
    }

    /// True if `open` found a save file it could not read and replaced it with
    /// defaults.
    pub fn recovered_from_corruption(&self) -> bool {
        self.recovered
    }

    pub fn is_loaded(&self) -> bool {
        self.progress.is_some()
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    pub fn json_store(&self) -> &JsonStore {
        &self.json
    }

    fn loaded(&self) -> Result<&Progress, StoreError> {
        self.progress.as_ref().ok_or(StoreError::NotLoaded)
    }

    fn loaded_mut(&mut self) -> Result<&mut Progress, StoreError> {
        self.progress.as_mut().ok_or(StoreError::NotLoaded)
    }

    pub fn unlocked_levels(&self) -> Result<Vec<u32>, StoreError> {
        Ok((1..=self.loaded()?.unlocked_level).collect())
    }

    pub fn unlocked_level(&self) -> Result<u32, StoreError> {
        Ok(self.loaded()?.unlocked_level)
    }

    pub fn is_level_unlocked(&self, level: u32) -> Result<bool, StoreError> {
        Ok(level <= self.loaded()?.unlocked_level)
    }

    /// Record a finished level: mark it completed, keep the best score,
    /// unlock the next level when playing at the frontier, stamp the time and
    /// persist.
    pub fn complete_level(&mut self, level: i64, score: i64) -> Result<(), StoreError> {
        self.loaded()?;
        if level < 1 {
            return Err(StoreError::InvalidArgument(format!(
                "level must be greater than or equal to 1, got {level}"
            )));
        }
        if score < 0 {
            return Err(StoreError::InvalidArgument(format!(
                "score cannot be negative, got {score}"
            )));
        }
        let level = to_level(level)?;
        let score = to_u32("score", score)?;

        let progress = self.loaded_mut()?;
        if !progress.completed_levels.contains(&level) {
            progress.completed_levels.push(level);
            debug!("Level {level} added to completed levels");
        }

        let previous = progress.best_score(level);
        if score > previous {
            progress.performance_score.insert(level, score);
            debug!("Score for level {level} raised from {previous} to {score}");
        }

        if level >= progress.unlocked_level {
            progress.unlocked_level = level + 1;
            debug!("Unlocked level is now {}", progress.unlocked_level);
        }

        progress.timestamps.last_played =
            Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        self.save()?;
        info!("Level {level} completed with score {score}");
        Ok(())
    }

    /// Overwrite the stored score for `level`, even with a lower value.
    pub fn set_performance_score(&mut self, level: i64, score: i64) -> Result<(), StoreError> {
        self.loaded()?;
        if level < 1 || score < 0 {
            return Err(StoreError::InvalidArgument(format!(
                "invalid level {level} or score {score}"
            )));
        }
        let level = to_level(level)?;
        let score = to_u32("score", score)?;

        self.loaded_mut()?.performance_score.insert(level, score);
        self.save()?;
        info!("Score for level {level} set to {score}");
        Ok(())
    }

    pub fn performance_score(&self, level: u32) -> Result<u32, StoreError> {
        Ok(self.loaded()?.best_score(level))
    }

    pub fn completed_levels(&self) -> Result<&[u32], StoreError> {
        Ok(&self.loaded()?.completed_levels)
    }

    pub fn update_settings(&mut self, sounds: bool) -> Result<(), StoreError> {
        self.loaded_mut()?.settings.sounds = sounds;
        self.save()?;
        info!("Settings updated: sounds = {sounds}");
        Ok(())
    }

    pub fn settings(&self) -> Result<Settings, StoreError> {
        Ok(self.loaded()?.settings.clone())
    }

    pub fn last_played(&self) -> Result<Option<&str>, StoreError> {
        Ok(self.loaded()?.timestamps.last_played.as_deref())
    }

    /// Replace all progress with defaults, on disk and in memory.
    pub fn reset_progress(&mut self) -> Result<(), StoreError> {
        let fresh = Progress::default();
        self.json.save_progress(&fresh)?;
        self.progress = Some(fresh);
        self.recovered = false;
        info!("Progress has been reset");
        Ok(())
    }

    /// Remove the save file and unload progress. Queries fail with
    /// [`StoreError::NotLoaded`] until the next reset.
    pub fn delete_progress(&mut self) -> Result<(), StoreError> {
        self.json.delete_progress()?;
        self.progress = None;
        info!("Progress file has been deleted");
        Ok(())
    }

    /// Persist the current in-memory progress.
    pub fn save(&self) -> Result<(), StoreError> {
        self.json.save_progress(self.loaded()?)
    }
}

/// Levels above [`MAX_LEVEL`] are rejected so the next level always exists.
fn to_level(level: i64) -> Result<u32, StoreError> {
    match u32::try_from(level) {
        Ok(level) if level <= MAX_LEVEL => Ok(level),
        _ => Err(StoreError::InvalidArgument(format!(
            "level {level} is above the last level {MAX_LEVEL}"
        ))),
    }
}

fn to_u32(name: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidArgument(format!("{name} {value} is out of range")))
}
