//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod input;
pub mod movement;
pub mod state;
pub mod tick;
pub mod wave;

pub use clock::SimulationClock;
pub use collision::{BulletHit, find_bullet_hit};
pub use input::{Action, InputState};
pub use state::{
    Bullet, DdtBomb, EntityStore, Frame, GameEvent, GamePhase, GameState, Millipede, Mushroom,
    Particle, Player, Segment, Spider, WaveState,
};
pub use tick::tick;
