use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Highest playable level index. Keeps `unlockedLevel` (at most
/// `MAX_LEVEL + 1`) and the ranges built from it bounded.
pub const MAX_LEVEL: u32 = 10_000;

/// Older save files used snake_case keys, and one revision named the
/// unlocked level `max_level` and the scores `max_score`. Pairs are applied
/// in order, so `unlocked_level` takes precedence over `max_level`.
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("unlocked_level", "unlockedLevel"),
    ("max_level", "unlockedLevel"),
    ("completed_levels", "completedLevels"),
    ("performance_score", "performanceScore"),
    ("max_score", "performanceScore"),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub sounds: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sounds: default_true(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    #[serde(default)]
    pub last_played: Option<String>,
}

/// Everything persisted for one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default = "default_unlocked_level")]
    pub unlocked_level: u32,
    #[serde(default)]
    pub completed_levels: Vec<u32>,
    /// Best score per level. Keys are written as strings in JSON.
    #[serde(default)]
    pub performance_score: BTreeMap<u32, u32>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub timestamps: Timestamps,
}

fn default_unlocked_level() -> u32 {
    1
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            unlocked_level: default_unlocked_level(),
            completed_levels: Vec::new(),
            performance_score: BTreeMap::new(),
            settings: Settings::default(),
            timestamps: Timestamps::default(),
        }
    }
}

impl Progress {
    /// Parse a save document, migrating legacy keys first.
    pub fn from_json(content: &str) -> serde_json::Result<(Self, bool)> {
        let mut value: Value = serde_json::from_str(content)?;
        let migrated = migrate_legacy_keys(&mut value);
        let mut progress: Progress = serde_json::from_value(value)?;
        progress.normalize();
        Ok((progress, migrated))
    }

    /// Restore the invariants a hand-edited file may have broken.
    pub fn normalize(&mut self) {
        self.unlocked_level = self.unlocked_level.clamp(1, MAX_LEVEL + 1);

        let mut seen = HashSet::new();
        self.completed_levels.retain(|level| seen.insert(*level));
    }

    pub fn best_score(&self, level: u32) -> u32 {
        self.performance_score.get(&level).copied().unwrap_or(0)
    }
}

/// Rewrite legacy snake_case keys to the canonical schema in place.
/// Canonical keys already present are never overwritten.
/// Returns true if anything was rewritten.
pub fn migrate_legacy_keys(value: &mut Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };

    let mut migrated = false;
    for (legacy, canonical) in LEGACY_KEYS {
        if let Some(old) = map.remove(*legacy) {
            migrated = true;
            if !map.contains_key(*canonical) {
                map.insert((*canonical).to_string(), old);
            }
        }
    }

    if let Some(Value::Object(timestamps)) = map.get_mut("timestamps")
        && let Some(old) = timestamps.remove("last_played")
    {
        migrated = true;
        if !timestamps.contains_key("lastPlayed") {
            timestamps.insert("lastPlayed".to_string(), old);
        }
    }

    migrated
}
