use chrono::{DateTime, Utc};
use log::{error, info};
use rand::Rng;
use thiserror::Error;

use crate::assets::{FsImageProvider, ImageProvider};
use crate::config::Config;
use crate::session::round::{PuzzleRound, RoundError};
use crate::store::error::StoreError;
use crate::store::json_store::JsonStore;
use crate::store::progress_store::ProgressStore;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("level {0} is locked")]
    LevelLocked(u32),

    #[error("level {0} has not been solved yet")]
    RoundUnsolved(u32),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Round(#[from] RoundError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelEntry {
    pub level: u32,
    pub unlocked: bool,
    pub completed: bool,
    pub best_score: u32,
}

pub struct App {
    pub config: Config,
    pub store: ProgressStore,
    images: Box<dyn ImageProvider>,
}

impl App {
    pub fn new(config: Config, store: ProgressStore, images: Box<dyn ImageProvider>) -> Self {
        Self {
            config,
            store,
            images,
        }
    }

    /// Open the save file and image directory named by `config`.
    pub fn from_config(config: Config) -> Self {
        let store = ProgressStore::open(JsonStore::new(config.save_file.clone()));
        let images = Box::new(FsImageProvider::new(config.asset_dir.clone()));
        Self::new(config, store, images)
    }

    pub fn level_menu(&self) -> Result<Vec<LevelEntry>, AppError> {
        let unlocked_level = self.store.unlocked_level()?;
        let completed = self.store.completed_levels()?;

        let mut entries = Vec::with_capacity(self.config.max_levels as usize);
        for level in 1..=self.config.max_levels {
            entries.push(LevelEntry {
                level,
                unlocked: level <= unlocked_level,
                completed: completed.contains(&level),
                best_score: self.store.performance_score(level)?,
            });
        }
        Ok(entries)
    }

    /// Begin a round for an unlocked level. Fails if the image provider
    /// cannot supply enough images.
    pub fn start_level<R: Rng + ?Sized>(
        &self,
        level: u32,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<PuzzleRound, AppError> {
        if level == 0 || !self.store.is_level_unlocked(level)? {
            return Err(AppError::LevelLocked(level));
        }

        info!("Level {level} selected, starting");
        let images = self.images.images_for_level(level);
        PuzzleRound::start(level, images, rng, now).map_err(|e| {
            error!("{e}");
            AppError::from(e)
        })
    }

    /// Score a solved round and commit it to the progress store.
    pub fn finish_round(&mut self, round: &PuzzleRound) -> Result<u32, AppError> {
        let score = round
            .score(self.config.score_params())
            .ok_or(AppError::RoundUnsolved(round.level()))?;
        self.store
            .complete_level(i64::from(round.level()), i64::from(score))?;
        Ok(score)
    }

    /// Whether the front end should play sounds. False when nothing is loaded.
    pub fn sounds_enabled(&self) -> bool {
        self.store.settings().map(|s| s.sounds).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageAsset;
    use chrono::{Duration, TimeZone};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Serves `count` images for every level.
    struct FixedImages {
        count: usize,
    }

    impl ImageProvider for FixedImages {
        fn images_for_level(&self, level: u32) -> Vec<ImageAsset> {
            (0..self.count)
                .map(|index| ImageAsset {
                    index,
                    path: PathBuf::from(format!("level{level}_img{}.png", index + 1)),
                })
                .collect()
        }
    }

    fn make_app(count: usize) -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.save_file = dir.path().join("progress.json");
        config.max_levels = 5;
        let store = ProgressStore::open(JsonStore::new(config.save_file.clone()));
        let app = App::new(config, store, Box::new(FixedImages { count }));
        (dir, app)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn solve(round: &mut PuzzleRound, secs: i64) {
        for image in 0..round.images().len() {
            round.select(image, t0() + Duration::seconds(secs));
        }
    }

    #[test]
    fn test_fresh_menu_has_only_level_one_unlocked() {
        let (_dir, app) = make_app(3);
        let menu = app.level_menu().unwrap();
        assert_eq!(menu.len(), 5);
        assert!(menu[0].unlocked);
        assert!(menu[1..].iter().all(|entry| !entry.unlocked));
    }

    #[test]
    fn test_locked_level_cannot_start() {
        let (_dir, app) = make_app(3);
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(matches!(
            app.start_level(2, &mut rng, t0()),
            Err(AppError::LevelLocked(2))
        ));
        assert!(matches!(
            app.start_level(0, &mut rng, t0()),
            Err(AppError::LevelLocked(0))
        ));
    }

    #[test]
    fn test_missing_images_abort_level_start() {
        let (_dir, app) = make_app(2);
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(matches!(
            app.start_level(1, &mut rng, t0()),
            Err(AppError::Round(RoundError::NotEnoughImages { level: 1, found: 2 }))
        ));
    }

    #[test]
    fn test_finish_round_commits_score_and_unlocks() {
        let (_dir, mut app) = make_app(3);
        let mut rng = SmallRng::seed_from_u64(3);
        let mut round = app.start_level(1, &mut rng, t0()).unwrap();
        solve(&mut round, 5);

        assert_eq!(app.finish_round(&round).unwrap(), 7);
        let menu = app.level_menu().unwrap();
        assert!(menu[0].completed);
        assert_eq!(menu[0].best_score, 7);
        assert!(menu[1].unlocked);
        assert!(!menu[2].unlocked);
    }

    #[test]
    fn test_unsolved_round_is_not_committed() {
        let (_dir, mut app) = make_app(3);
        let mut rng = SmallRng::seed_from_u64(3);
        let round = app.start_level(1, &mut rng, t0()).unwrap();
        assert!(matches!(
            app.finish_round(&round),
            Err(AppError::RoundUnsolved(1))
        ));
        assert_eq!(app.store.unlocked_level().unwrap(), 1);
    }

    #[test]
    fn test_slower_replay_keeps_best_score() {
        let (_dir, mut app) = make_app(3);
        let mut rng = SmallRng::seed_from_u64(3);

        let mut fast = app.start_level(1, &mut rng, t0()).unwrap();
        solve(&mut fast, 5);
        app.finish_round(&fast).unwrap();

        let mut slow = app.start_level(1, &mut rng, t0()).unwrap();
        solve(&mut slow, 120);
        assert_eq!(app.finish_round(&slow).unwrap(), 1);
        assert_eq!(app.store.performance_score(1).unwrap(), 7);
        assert_eq!(app.store.unlocked_level().unwrap(), 2);
    }

    #[test]
    fn test_sounds_follow_settings() {
        let (_dir, mut app) = make_app(3);
        assert!(app.sounds_enabled());
        app.store.update_settings(false).unwrap();
        assert!(!app.sounds_enabled());
        app.store.delete_progress().unwrap();
        assert!(!app.sounds_enabled());
    }
}
