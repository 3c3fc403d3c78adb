use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::assets::{IMAGES_PER_LEVEL, ImageAsset};
use crate::engine::scoring::{self, ScoreParams};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("not enough images to start level {level}: found {found}, need {}", IMAGES_PER_LEVEL)]
    NotEnoughImages { level: u32, found: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStatus {
    /// Selection out of range, repeated, or made after the round ended.
    Ignored,
    Selecting { remaining: usize },
    Solved,
    /// The full selection was wrong; it has been cleared.
    WrongOrder,
}

/// One attempt at ordering a level's images.
pub struct PuzzleRound {
    level: u32,
    images: Vec<ImageAsset>,
    display_order: Vec<usize>,
    selected: Vec<usize>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    attempts: u32,
}

impl PuzzleRound {
    /// The images must be given in their correct order; they are shown in a
    /// random one.
    pub fn start<R: Rng + ?Sized>(
        level: u32,
        images: Vec<ImageAsset>,
        rng: &mut R,
        started_at: DateTime<Utc>,
    ) -> Result<Self, RoundError> {
        if images.len() < IMAGES_PER_LEVEL {
            return Err(RoundError::NotEnoughImages {
                level,
                found: images.len(),
            });
        }

        let mut display_order: Vec<usize> = (0..images.len()).collect();
        display_order.shuffle(rng);
        debug!("Level {level} display order: {display_order:?}");

        Ok(Self {
            level,
            images,
            display_order,
            selected: Vec::new(),
            started_at,
            finished_at: None,
            attempts: 0,
        })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn images(&self) -> &[ImageAsset] {
        &self.images
    }

    /// Positions into [`PuzzleRound::images`] in the order they are shown.
    pub fn display_order(&self) -> &[usize] {
        &self.display_order
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Number of full selections that were checked, including the solving one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_solved(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Pick the image at `image` (a position into [`PuzzleRound::images`]).
    /// Once every image is picked the order is checked.
    pub fn select(&mut self, image: usize, now: DateTime<Utc>) -> RoundStatus {
        if self.is_solved() || image >= self.images.len() || self.selected.contains(&image) {
            return RoundStatus::Ignored;
        }

        self.selected.push(image);
        if self.selected.len() < self.images.len() {
            return RoundStatus::Selecting {
                remaining: self.images.len() - self.selected.len(),
            };
        }

        self.attempts += 1;
        if self.selected.iter().copied().eq(0..self.images.len()) {
            self.finished_at = Some(now);
            info!("Level {} solved after {} attempt(s)", self.level, self.attempts);
            RoundStatus::Solved
        } else {
            debug!("Wrong order for level {}: {:?}", self.level, self.selected);
            self.selected.clear();
            RoundStatus::WrongOrder
        }
    }

    /// Clear the current selection without ending the round.
    pub fn reset(&mut self) {
        if !self.is_solved() {
            self.selected.clear();
        }
    }

    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> f64 {
        let end = self.finished_at.unwrap_or(now);
        ((end - self.started_at).num_milliseconds() as f64 / 1000.0).max(0.0)
    }

    /// The score for a solved round, `None` while still in progress.
    pub fn score(&self, params: ScoreParams) -> Option<u32> {
        self.finished_at
            .map(|end| scoring::compute_score_with(params, self.started_at, end))
    }
}
