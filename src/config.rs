use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::scoring::{DEFAULT_BASE_SCORE, DEFAULT_DECAY_FACTOR, ScoreParams};

const MAX_LEVELS_LIMIT: u32 = 1000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_save_file")]
    pub save_file: PathBuf,
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f64,
    #[serde(default = "default_max_levels")]
    pub max_levels: u32,
}

fn default_save_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orderly")
        .join("progress.json")
}
fn default_asset_dir() -> PathBuf {
    PathBuf::from("assets").join("images")
}
fn default_base_score() -> f64 {
    DEFAULT_BASE_SCORE
}
fn default_decay_factor() -> f64 {
    DEFAULT_DECAY_FACTOR
}
fn default_max_levels() -> u32 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_file: default_save_file(),
            asset_dir: default_asset_dir(),
            base_score: default_base_score(),
            decay_factor: default_decay_factor(),
            max_levels: default_max_levels(),
        }
    }
}

impl Config {
    /// Load from the default location, or defaults if there is no file.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("orderly")
            .join("config.toml")
    }

    pub fn score_params(&self) -> ScoreParams {
        ScoreParams {
            base_score: self.base_score,
            decay_factor: self.decay_factor,
        }
    }

    /// Reset values the scoring formula or level menu cannot use.
    pub fn validate(&mut self) {
        if !self.base_score.is_finite() || self.base_score < 0.0 {
            warn!("Invalid base_score {}, using default", self.base_score);
            self.base_score = default_base_score();
        }
        if !self.decay_factor.is_finite() || self.decay_factor < 0.0 {
            warn!("Invalid decay_factor {}, using default", self.decay_factor);
            self.decay_factor = default_decay_factor();
        }
        self.max_levels = self.max_levels.clamp(1, MAX_LEVELS_LIMIT);
    }
}
