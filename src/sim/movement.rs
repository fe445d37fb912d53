//! Movement and enemy AI
//!
//! Player steering and firing, bullet travel, millipede head decisions with
//! follow-the-leader bodies, and spider wander.

use glam::Vec2;
use rand::Rng;

use super::input::InputState;
use super::state::{Bullet, GameEvent, GamePhase, GameState, Millipede, Mushroom, Segment};
use super::wave;
use crate::tuning::Tuning;
use crate::{cell_of, within};

/// Move the player by the held directions, clamped to the home zone
pub fn move_player(state: &mut GameState, input: &InputState, tuning: &Tuning) {
    let delta = Vec2::new(input.horizontal(), input.vertical()) * tuning.player_speed;
    if delta == Vec2::ZERO {
        return;
    }
    let min = Vec2::new(0.0, tuning.home_zone_top as f32);
    let max = Vec2::new(tuning.right_col() as f32, tuning.bottom_row() as f32);
    let player = &mut state.entities.player;
    player.pos = (player.pos + delta).clamp(min, max);
}

/// Fire a bullet if fire is held and the cooldown has elapsed. Returns whether one was fired.
pub fn fire(state: &mut GameState, input: &InputState, tuning: &Tuning) -> bool {
    if !input.fire {
        return false;
    }
    let now = state.time_ticks;
    let ready = state
        .entities
        .player
        .last_fire_tick
        .is_none_or(|last| now.saturating_sub(last) >= tuning.fire_cooldown_ticks);
    if !ready {
        return false;
    }

    state.entities.player.last_fire_tick = Some(now);
    // Shots leave from the middle of the player's cell
    let pos = state.entities.player.pos + Vec2::new(0.5, 0.0);
    let id = state.entities.next_entity_id();
    state.entities.bullets.push(Bullet { id, pos });
    state.events.push(GameEvent::BulletFired { pos });
    true
}

/// Advance bullets upward and drop the ones that left the top of the grid
pub fn move_bullets(state: &mut GameState, tuning: &Tuning) {
    for bullet in &mut state.entities.bullets {
        bullet.pos.y -= tuning.bullet_speed;
    }
    state.entities.bullets.retain(|b| b.pos.y >= 0.0);
}

/// One head decision: dive, turn down, or step sideways
pub fn step_head(head: &mut Segment, mushrooms: &[Mushroom], tuning: &Tuning) {
    let bottom = tuning.bottom_row() as f32;

    if head.diving {
        head.pos.y += 1.0;
        if head.pos.y >= bottom {
            head.pos.y = bottom;
            head.diving = false;
        }
        return;
    }

    let next_x = head.pos.x + head.dir as f32;
    // Heads still entering from off-grid keep walking in
    let leaving = (head.dir < 0 && next_x < 0.0)
        || (head.dir > 0 && next_x > tuning.right_col() as f32);
    let blocker = mushrooms
        .iter()
        .find(|m| m.cell == cell_of(Vec2::new(next_x, head.pos.y)));

    match blocker {
        // Nowhere left to dive on the bottom row
        Some(mushroom) if mushroom.poisoned && !leaving && head.pos.y < bottom => {
            head.diving = true;
            head.pos.y += 1.0;
        }
        Some(_) => turn_down(head, tuning),
        None if leaving => turn_down(head, tuning),
        None => head.pos.x = next_x,
    }
}

fn turn_down(head: &mut Segment, tuning: &Tuning) {
    head.pos.y += 1.0;
    head.dir = -head.dir;
    if head.pos.y >= tuning.rows as f32 {
        head.pos.y = tuning.home_zone_top as f32;
    }
}

/// Move a chain one step: the head decides, every body segment takes its
/// predecessor's pre-move state
pub fn advance_chain(chain: &mut Millipede, mushrooms: &[Mushroom], tuning: &Tuning) {
    let previous = chain.segments.clone();
    let Some(head) = chain.segments.first_mut() else {
        return;
    };
    step_head(head, mushrooms, tuning);
    for (segment, leader) in chain.segments.iter_mut().skip(1).zip(previous.iter()) {
        *segment = *leader;
    }
}

/// Millipede step for one tick
///
/// Spawns the next wave if the last one was cleared, moves every chain on
/// eligible ticks, then ends the game if any segment touches the player.
pub fn step_millipedes(state: &mut GameState, tuning: &Tuning, rng: &mut impl Rng) {
    if state.wave.phase == GamePhase::Cleared {
        wave::start_next_wave(state, tuning, rng);
    }

    let interval = tuning.chain_interval(state.wave.level);
    if state.time_ticks % interval == 0 {
        let entities = &mut state.entities;
        for chain in &mut entities.millipedes {
            advance_chain(chain, &entities.mushrooms, tuning);
        }
    }

    let player = state.entities.player.pos;
    let touching = state
        .entities
        .millipedes
        .iter()
        .flat_map(|m| m.segments.iter())
        .any(|s| within(s.pos, player, tuning.fatal_reach));
    if touching {
        wave::player_killed(state);
    }
}

/// Spider wander: random velocity flips, linear motion, reflection at the zone edges
pub fn move_spiders(state: &mut GameState, tuning: &Tuning, rng: &mut impl Rng) {
    let flip = tuning.spider_flip_ticks > 0 && state.time_ticks % tuning.spider_flip_ticks == 0;
    let min = Vec2::new(0.0, tuning.home_zone_top as f32);
    let max = Vec2::new(tuning.right_col() as f32, tuning.bottom_row() as f32);

    for spider in &mut state.entities.spiders {
        if flip {
            if rng.random_bool(0.5) {
                spider.vel.y = -spider.vel.y;
            }
            if rng.random_bool(0.25) {
                spider.vel.x = -spider.vel.x;
            }
        }
        spider.pos += spider.vel;

        if spider.pos.x < min.x {
            spider.pos.x = min.x;
            spider.vel.x = spider.vel.x.abs();
        } else if spider.pos.x > max.x {
            spider.pos.x = max.x;
            spider.vel.x = -spider.vel.x.abs();
        }
        if spider.pos.y < min.y {
            spider.pos.y = min.y;
            spider.vel.y = spider.vel.y.abs();
        } else if spider.pos.y > max.y {
            spider.pos.y = max.y;
            spider.vel.y = -spider.vel.y.abs();
        }
    }

    let player = state.entities.player.pos;
    if state
        .entities
        .spiders
        .iter()
        .any(|s| within(s.pos, player, tuning.fatal_reach))
    {
        wave::player_killed(state);
    }
}
