//! Millipede - a tick-based arcade shooter simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, movement, collisions, waves)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player identity and preferences
//! - `leaderboard`: Score submission contract and top-10 table

pub mod leaderboard;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use leaderboard::{Leaderboard, ScoreSink, ScoreSubmission, SubmitError};
pub use settings::Settings;
pub use tuning::{ConfigError, Difficulty, Tuning};

use glam::{IVec2, Vec2};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Playfield size in cells
    pub const GRID_COLS: i32 = 20;
    pub const GRID_ROWS: i32 = 32;
    /// First row of the player's home zone
    pub const HOME_ZONE_TOP: i32 = 24;

    /// Fresh mushroom durability
    pub const MUSHROOM_HP: u8 = 4;
}

/// Coarse grid cell containing a fractional position
#[inline]
pub fn cell_of(pos: Vec2) -> IVec2 {
    IVec2::new(pos.x.floor() as i32, pos.y.floor() as i32)
}

/// Top-left corner of a grid cell as a fractional position
#[inline]
pub fn cell_origin(cell: IVec2) -> Vec2 {
    Vec2::new(cell.x as f32, cell.y as f32)
}

/// Per-axis overlap test used for every hit box in the game
#[inline]
pub fn within(a: Vec2, b: Vec2, reach: f32) -> bool {
    (a.x - b.x).abs() < reach && (a.y - b.y).abs() < reach
}
