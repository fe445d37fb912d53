//! Collision detection and resolution
//!
//! Bullets are tested against targets in a fixed precedence: DDT bombs,
//! mushrooms, spiders, then millipede segments. The first match wins, so a
//! bullet scores at most one hit per tick. Gas particles then sweep the
//! millipedes independently of any bullet.

use glam::{IVec2, Vec2};
use rand::Rng;

use super::state::{EntityStore, GameEvent, GameState, Particle};
use crate::tuning::Tuning;
use crate::{cell_of, cell_origin, within};

/// What a bullet struck, by index into the store's collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletHit {
    Ddt(usize),
    Mushroom(usize),
    Spider(usize),
    Segment { chain: usize, segment: usize },
}

/// Find the highest-precedence target under a bullet
pub fn find_bullet_hit(store: &EntityStore, pos: Vec2, tuning: &Tuning) -> Option<BulletHit> {
    let center = Vec2::splat(0.5);

    if let Some(i) = store
        .ddt_bombs
        .iter()
        .position(|d| d.active && within(pos, d.center(), tuning.ddt_reach))
    {
        return Some(BulletHit::Ddt(i));
    }

    let cell = cell_of(pos);
    if let Some(i) = store.mushrooms.iter().position(|m| m.cell == cell) {
        return Some(BulletHit::Mushroom(i));
    }

    if let Some(i) = store
        .spiders
        .iter()
        .position(|s| within(pos, s.pos + center, tuning.spider_reach))
    {
        return Some(BulletHit::Spider(i));
    }

    store
        .millipedes
        .iter()
        .enumerate()
        .find_map(|(chain, m)| {
            m.segments
                .iter()
                .position(|s| within(pos, s.pos + center, tuning.segment_reach))
                .map(|segment| BulletHit::Segment { chain, segment })
        })
}

/// Test every bullet and apply the hits it scores
pub fn resolve_bullets(state: &mut GameState, tuning: &Tuning, rng: &mut impl Rng) {
    let mut i = 0;
    while i < state.entities.bullets.len() {
        let pos = state.entities.bullets[i].pos;
        match find_bullet_hit(&state.entities, pos, tuning) {
            Some(hit) => {
                state.entities.bullets.remove(i);
                apply_hit(state, hit, tuning, rng);
            }
            None => i += 1,
        }
    }
}

fn apply_hit(state: &mut GameState, hit: BulletHit, tuning: &Tuning, rng: &mut impl Rng) {
    match hit {
        BulletHit::Ddt(i) => {
            let bomb = &mut state.entities.ddt_bombs[i];
            bomb.active = false;
            let cell = bomb.cell;
            trigger_ddt(state, cell, tuning, rng);
            state.wave.award(tuning.score_ddt);
        }
        BulletHit::Mushroom(i) => {
            let mushroom = &mut state.entities.mushrooms[i];
            mushroom.hp = mushroom.hp.saturating_sub(1);
            let cell = mushroom.cell;
            let destroyed = mushroom.hp == 0;
            state.wave.award(tuning.score_mushroom_hit);
            state.entities.particles.push(Particle {
                pos: cell_origin(cell) + Vec2::splat(0.5),
                vel: Vec2::new(0.0, -0.05),
                life: tuning.spark_lifetime,
                gas: false,
            });
            if destroyed {
                state.entities.mushrooms.remove(i);
                state.wave.award(tuning.score_mushroom_destroyed);
            }
            state.events.push(GameEvent::MushroomHit { cell, destroyed });
        }
        BulletHit::Spider(i) => {
            let spider = state.entities.spiders.remove(i);
            state.wave.award(tuning.score_spider);
            spawn_burst(state, spider.pos + Vec2::splat(0.5), tuning, rng);
            state.spider_respawn_ticks = tuning.spider_respawn_ticks;
            state.events.push(GameEvent::SpiderKilled { pos: spider.pos });
        }
        BulletHit::Segment { chain, segment } => {
            let chains_before = state.entities.millipedes.len();
            let Some(hit) = state.entities.destroy_segment(chain, segment) else {
                return;
            };
            let head = segment == 0;
            state.wave.award(if head {
                tuning.score_head
            } else {
                tuning.score_body
            });
            leave_mushroom(&mut state.entities, cell_of(hit.pos), tuning);

            let parts = state.entities.millipedes.len() + 1 - chains_before;
            if parts == 2 {
                log::debug!("Millipede split at segment {}", segment);
                state.events.push(GameEvent::ChainSplit { parts });
            }
            state.events.push(GameEvent::SegmentDestroyed { pos: hit.pos, head });
        }
    }
}

/// A destroyed segment leaves a fresh mushroom behind
fn leave_mushroom(store: &mut EntityStore, cell: IVec2, tuning: &Tuning) {
    if cell.x < 0 || cell.x >= tuning.cols || cell.y < 0 || cell.y >= tuning.rows {
        return;
    }
    match store.mushrooms.iter_mut().find(|m| m.cell == cell) {
        Some(existing) => {
            existing.hp = tuning.mushroom_hp;
            existing.poisoned = false;
        }
        None => {
            store.spawn_mushroom(cell, tuning.mushroom_hp, false);
        }
    }
}

/// Release a gas cloud around a DDT bomb's cell
pub fn trigger_ddt(state: &mut GameState, cell: IVec2, tuning: &Tuning, rng: &mut impl Rng) {
    log::debug!("DDT triggered at ({}, {})", cell.x, cell.y);
    let origin = cell_origin(cell);
    let spread = tuning.gas_spread;
    for _ in 0..tuning.gas_particles {
        let offset = Vec2::new(
            rng.random::<f32>() * 2.0 * spread - spread,
            rng.random::<f32>() * 2.0 * spread - spread,
        );
        state.entities.particles.push(Particle {
            pos: origin + offset,
            vel: Vec2::ZERO,
            life: tuning.gas_lifetime,
            gas: true,
        });
    }
    state.events.push(GameEvent::DdtTriggered { cell });
}

fn spawn_burst(state: &mut GameState, pos: Vec2, tuning: &Tuning, rng: &mut impl Rng) {
    for _ in 0..tuning.spider_burst {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        state.entities.particles.push(Particle {
            pos,
            vel: Vec2::from_angle(angle) * 0.1,
            life: tuning.spark_lifetime,
            gas: false,
        });
    }
}

/// Every live gas particle destroys the segments within its radius
pub fn resolve_gas(state: &mut GameState, tuning: &Tuning) {
    for p in 0..state.entities.particles.len() {
        let particle = &state.entities.particles[p];
        if !particle.gas || particle.life == 0 {
            continue;
        }
        let center = particle.pos;
        while let Some((chain, segment)) = segment_near(&state.entities, center, tuning.gas_radius) {
            let Some(killed) = state.entities.destroy_segment(chain, segment) else {
                break;
            };
            state.wave.award(tuning.score_gas_kill);
            state.events.push(GameEvent::GasKill { pos: killed.pos });
        }
    }
}

fn segment_near(store: &EntityStore, center: Vec2, radius: f32) -> Option<(usize, usize)> {
    store.millipedes.iter().enumerate().find_map(|(chain, m)| {
        m.segments
            .iter()
            .position(|s| s.pos.distance(center) < radius)
            .map(|segment| (chain, segment))
    })
}

/// Drift particles and count down their lifetime, dropping expired ones
pub fn decay_particles(state: &mut GameState) {
    for particle in &mut state.entities.particles {
        particle.pos += particle.vel;
        particle.life = particle.life.saturating_sub(1);
    }
    state.entities.particles.retain(|p| p.life > 0);
}
