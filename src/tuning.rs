//! Data-driven game balance
//!
//! Every speed, cadence, hit radius and score value the simulation uses
//! lives here so level-dependent behavior is derived instead of hard-coded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading tuning or settings files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Game balance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Grid ===
    pub cols: i32,
    pub rows: i32,
    /// First row the player may occupy
    pub home_zone_top: i32,

    // === Player ===
    pub player_start: (f32, f32),
    /// Cells per tick
    pub player_speed: f32,
    /// Minimum ticks between shots
    pub fire_cooldown_ticks: u64,
    /// Rows per tick, upward
    pub bullet_speed: f32,

    // === Mushrooms ===
    pub mushroom_hp: u8,
    pub initial_mushrooms: u32,
    /// Row range for the initial forest (end exclusive)
    pub mushroom_rows: (i32, i32),
    /// Chance that a generated mushroom is poisoned
    pub poisoned_mushroom_chance: f64,

    // === DDT bombs ===
    pub ddt_count: u32,
    pub ddt_cols: (i32, i32),
    pub ddt_rows: (i32, i32),
    pub gas_particles: u32,
    /// Gas spawns within ±spread cells of the bomb
    pub gas_spread: f32,
    pub gas_lifetime: u32,
    pub gas_radius: f32,

    // === Millipede ===
    pub chain_base_length: u32,
    pub chain_start_col: i32,
    /// Ticks between head decisions at level 0
    pub chain_base_interval: u64,
    pub chain_min_interval: u64,

    // === Spider ===
    pub spider_speed: (f32, f32),
    /// Ticks between random velocity flips
    pub spider_flip_ticks: u64,
    pub spider_respawn_ticks: u32,

    // === Effects ===
    pub spark_lifetime: u32,
    pub spider_burst: u32,

    // === Hit boxes (per-axis reach) ===
    pub segment_reach: f32,
    pub spider_reach: f32,
    pub ddt_reach: f32,
    pub fatal_reach: f32,

    // === Scoring ===
    pub score_head: u64,
    pub score_body: u64,
    pub score_gas_kill: u64,
    pub score_mushroom_hit: u64,
    pub score_mushroom_destroyed: u64,
    pub score_ddt: u64,
    pub score_spider: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            cols: GRID_COLS,
            rows: GRID_ROWS,
            home_zone_top: HOME_ZONE_TOP,

            player_start: (10.0, 30.0),
            player_speed: 0.4,
            fire_cooldown_ticks: 8,
            bullet_speed: 0.8,

            mushroom_hp: MUSHROOM_HP,
            initial_mushrooms: 50,
            mushroom_rows: (2, 28),
            poisoned_mushroom_chance: 0.0,

            ddt_count: 3,
            ddt_cols: (1, GRID_COLS - 1),
            ddt_rows: (5, 23),
            gas_particles: 15,
            gas_spread: 2.0,
            gas_lifetime: 60,
            gas_radius: 2.0,

            chain_base_length: 12,
            chain_start_col: 10,
            chain_base_interval: 5,
            chain_min_interval: 1,

            spider_speed: (0.15, 0.1),
            spider_flip_ticks: 30,
            spider_respawn_ticks: 240,

            spark_lifetime: 12,
            spider_burst: 8,

            segment_reach: 0.7,
            spider_reach: 0.7,
            ddt_reach: 0.8,
            fatal_reach: 0.7,

            score_head: 100,
            score_body: 10,
            score_gas_kill: 50,
            score_mushroom_hit: 1,
            score_mushroom_destroyed: 5,
            score_ddt: 200,
            score_spider: 300,
        }
    }
}

impl Tuning {
    /// Balance for a difficulty preset
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let mut tuning = Self::default();
        match difficulty {
            Difficulty::Easy => {
                tuning.chain_base_interval = 7;
                tuning.chain_base_length = 8;
                tuning.initial_mushrooms = 35;
                tuning.ddt_count = 4;
            }
            Difficulty::Normal => {}
            Difficulty::Hard => {
                tuning.chain_base_interval = 4;
                tuning.chain_base_length = 14;
                tuning.initial_mushrooms = 65;
                tuning.ddt_count = 2;
                tuning.poisoned_mushroom_chance = 0.1;
            }
        }
        tuning
    }

    /// Parse and validate tuning from JSON; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cols <= 0 || self.rows <= 0 {
            return Err(ConfigError::Invalid {
                field: "cols/rows",
                reason: format!("grid must be non-empty, got {}x{}", self.cols, self.rows),
            });
        }
        if self.home_zone_top < 0 || self.home_zone_top >= self.rows {
            return Err(ConfigError::Invalid {
                field: "home_zone_top",
                reason: format!("{} is outside 0..{}", self.home_zone_top, self.rows),
            });
        }
        if self.player_speed <= 0.0 || self.bullet_speed <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "player_speed/bullet_speed",
                reason: "speeds must be positive".to_string(),
            });
        }
        if self.mushroom_hp == 0 {
            return Err(ConfigError::Invalid {
                field: "mushroom_hp",
                reason: "mushrooms need at least one hit point".to_string(),
            });
        }
        if self.chain_base_length == 0 {
            return Err(ConfigError::Invalid {
                field: "chain_base_length",
                reason: "a wave needs at least one segment".to_string(),
            });
        }
        if self.chain_min_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "chain_min_interval",
                reason: "must be at least one tick".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.poisoned_mushroom_chance) {
            return Err(ConfigError::Invalid {
                field: "poisoned_mushroom_chance",
                reason: format!("{} is not a probability", self.poisoned_mushroom_chance),
            });
        }
        Ok(())
    }

    /// Ticks between millipede head decisions; shrinks as the level rises
    pub fn chain_interval(&self, level: u32) -> u64 {
        self.chain_base_interval
            .saturating_sub(level as u64)
            .max(self.chain_min_interval)
    }

    /// Segment count for the chain spawned at `level`
    pub fn chain_length(&self, level: u32) -> u32 {
        self.chain_base_length + level
    }

    /// Lowest row index inside the grid
    pub fn bottom_row(&self) -> i32 {
        self.rows - 1
    }

    /// Rightmost column index inside the grid
    pub fn right_col(&self) -> i32 {
        self.cols - 1
    }
}
