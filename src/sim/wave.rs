//! Wave progression
//!
//! Building → Active ⇄ Cleared, and any phase → GameOver on a fatal
//! collision. Mushrooms are only generated while building; afterwards the
//! forest grows from destroyed segments.

use glam::{IVec2, Vec2};
use rand::Rng;

use super::state::{DdtBomb, GameEvent, GamePhase, GameState, Spider};
use crate::tuning::Tuning;

/// Uniform pick from `lo..hi`, or `lo` for an empty range
fn pick(rng: &mut impl Rng, (lo, hi): (i32, i32)) -> i32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Populate the first wave: mushroom forest, DDT bombs, a spider and the first millipede
pub fn build(state: &mut GameState, tuning: &Tuning, rng: &mut impl Rng) {
    for _ in 0..tuning.initial_mushrooms {
        let cell = IVec2::new(pick(rng, (0, tuning.cols)), pick(rng, tuning.mushroom_rows));
        let poisoned = rng.random_bool(tuning.poisoned_mushroom_chance);
        state.entities.spawn_mushroom(cell, tuning.mushroom_hp, poisoned);
    }
    spawn_ddt_bombs(state, tuning, rng);
    spawn_spider(state, tuning, rng);

    let length = tuning.chain_base_length;
    state.entities.spawn_millipede(length, tuning.chain_start_col);
    state.wave.phase = GamePhase::Active;
    state.events.push(GameEvent::WaveStarted {
        level: state.wave.level,
        length,
    });
    log::info!(
        "Wave built: {} mushrooms, {} DDT, millipede of {}",
        state.entities.mushrooms.len(),
        state.entities.ddt_bombs.len(),
        length
    );
}

/// Cleared → Active: next level, a longer millipede, fresh DDT. Mushrooms and score carry over.
pub fn start_next_wave(state: &mut GameState, tuning: &Tuning, rng: &mut impl Rng) {
    state.wave.level += 1;
    let length = tuning.chain_length(state.wave.level);
    state.entities.spawn_millipede(length, tuning.chain_start_col);

    state.entities.ddt_bombs.retain(|d| d.active);
    spawn_ddt_bombs(state, tuning, rng);

    state.wave.phase = GamePhase::Active;
    state.events.push(GameEvent::WaveStarted {
        level: state.wave.level,
        length,
    });
    log::info!("Level {} started, millipede of {}", state.wave.level, length);
}

/// End-of-tick bookkeeping: detect a cleared wave and respawn the spider
pub fn update(state: &mut GameState, tuning: &Tuning, rng: &mut impl Rng) {
    if !state.wave.is_active() {
        return;
    }

    // The respawn timer keeps running through the cleared frame
    if state.spider_respawn_ticks > 0 {
        state.spider_respawn_ticks -= 1;
        if state.spider_respawn_ticks == 0 && state.entities.spiders.is_empty() {
            spawn_spider(state, tuning, rng);
        }
    }

    if state.wave.phase == GamePhase::Active
        && state.entities.millipedes.iter().all(|m| m.is_empty())
    {
        state.entities.millipedes.clear();
        state.wave.phase = GamePhase::Cleared;
        state.events.push(GameEvent::WaveCleared {
            level: state.wave.level,
        });
        log::info!("Level {} cleared, score {}", state.wave.level, state.wave.score);
    }
}

/// Fatal collision: the game ends immediately, the offending enemy survives
pub fn player_killed(state: &mut GameState) {
    if state.wave.phase == GamePhase::GameOver {
        return;
    }
    state.wave.phase = GamePhase::GameOver;
    state.entities.player.alive = false;
    state.events.push(GameEvent::PlayerKilled {
        pos: state.entities.player.pos,
    });
    log::info!(
        "Game over at level {} with score {}",
        state.wave.level,
        state.wave.score
    );
}

/// Throw away the current run and wait to build a new first wave
pub fn restart(state: &mut GameState, tuning: &Tuning) {
    state.entities.clear();
    state
        .entities
        .player
        .reposition(Vec2::new(tuning.player_start.0, tuning.player_start.1));
    state.wave = Default::default();
    state.time_ticks = 0;
    state.spider_respawn_ticks = 0;
    state.events.clear();
}

/// Top the DDT field back up to `ddt_count` active bombs on free cells
fn spawn_ddt_bombs(state: &mut GameState, tuning: &Tuning, rng: &mut impl Rng) {
    const ATTEMPTS: u32 = 16;

    let missing = (tuning.ddt_count as usize).saturating_sub(state.entities.ddt_bombs.len());
    for _ in 0..missing {
        let free = (0..ATTEMPTS)
            .map(|_| IVec2::new(pick(rng, tuning.ddt_cols), pick(rng, tuning.ddt_rows)))
            .find(|&cell| {
                state.entities.mushroom_at(cell).is_none()
                    && !state.entities.ddt_bombs.iter().any(|d| d.cell == cell)
            });
        if let Some(cell) = free {
            let id = state.entities.next_entity_id();
            state.entities.ddt_bombs.push(DdtBomb {
                id,
                cell,
                active: true,
            });
        }
    }
}

/// Spawn a spider at a random side edge of the player's zone
fn spawn_spider(state: &mut GameState, tuning: &Tuning, rng: &mut impl Rng) {
    let from_left = rng.random_bool(0.5);
    let x = if from_left { 0 } else { tuning.right_col() };
    let y = pick(rng, (tuning.home_zone_top, tuning.rows));
    let vx = if from_left {
        tuning.spider_speed.0
    } else {
        -tuning.spider_speed.0
    };
    let vy = if rng.random_bool(0.5) {
        tuning.spider_speed.1
    } else {
        -tuning.spider_speed.1
    };

    let id = state.entities.next_entity_id();
    state.entities.spiders.push(Spider {
        id,
        pos: Vec2::new(x as f32, y as f32),
        vel: Vec2::new(vx, vy),
    });
    state.events.push(GameEvent::SpiderSpawned);
}
