//! Fixed timestep simulation tick
//!
//! One call advances the whole game by exactly one step, always in the
//! same order: movement and AI, collisions, then wave bookkeeping.

use rand::Rng;

use super::input::InputState;
use super::state::{GamePhase, GameState};
use super::{collision, movement, wave};
use crate::tuning::Tuning;

/// Advance the game state by one fixed step.
///
/// `tuning` must have passed [`Tuning::validate`]; `SimulationClock` checks this on construction.
pub fn tick(state: &mut GameState, input: &InputState, tuning: &Tuning, rng: &mut impl Rng) {
    state.events.clear();

    match state.phase() {
        // Only cosmetics keep running once the player is dead
        GamePhase::GameOver => {
            collision::decay_particles(state);
            return;
        }
        GamePhase::Building => wave::build(state, tuning, rng),
        GamePhase::Active | GamePhase::Cleared => {}
    }

    state.time_ticks += 1;

    // Movement and AI
    movement::move_player(state, input, tuning);
    movement::move_bullets(state, tuning);
    movement::fire(state, input, tuning);
    movement::step_millipedes(state, tuning, rng);
    if !state.wave.is_game_over() {
        movement::move_spiders(state, tuning, rng);
    }

    if state.wave.is_game_over() {
        collision::decay_particles(state);
        state.entities.normalize_order();
        return;
    }

    // Collisions
    collision::resolve_bullets(state, tuning, rng);
    collision::resolve_gas(state, tuning);
    collision::decay_particles(state);

    // Waves
    wave::update(state, tuning, rng);

    // Ensure deterministic ordering
    state.entities.normalize_order();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Bullet, GameEvent, Millipede, Particle, Segment, Spider};
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn new_game(seed: u64) -> (GameState, Tuning, Pcg32) {
        let tuning = Tuning::default();
        (
            GameState::new(seed, &tuning),
            tuning,
            Pcg32::seed_from_u64(seed),
        )
    }

    fn row_chain(len: i32, row: f32) -> Millipede {
        Millipede {
            id: 500,
            segments: (0..len)
                .rev()
                .map(|x| Segment {
                    pos: Vec2::new(x as f32, row),
                    dir: 1,
                    diving: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_first_tick_builds_wave() {
        let (mut state, tuning, mut rng) = new_game(12345);
        assert_eq!(state.phase(), GamePhase::Building);
        tick(&mut state, &InputState::default(), &tuning, &mut rng);
        assert_eq!(state.phase(), GamePhase::Active);
        assert!(state.wave.is_active());
        assert_eq!(state.time_ticks, 1);
        assert!(
            state
                .events
                .contains(&GameEvent::WaveStarted { level: 1, length: 12 })
        );
    }

    #[test]
    fn test_idle_tick_changes_nothing_for_player() {
        let (mut state, tuning, mut rng) = new_game(1);
        tick(&mut state, &InputState::default(), &tuning, &mut rng);
        let start = state.entities.player.pos;
        for _ in 0..3 {
            tick(&mut state, &InputState::default(), &tuning, &mut rng);
            assert_eq!(state.entities.player.pos, start);
            assert!(state.entities.bullets.is_empty());
        }
    }

    #[test]
    fn test_fire_then_travel() {
        let (mut state, tuning, mut rng) = new_game(1);
        let input = InputState {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &input, &tuning, &mut rng);
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::BulletFired { .. }))
        );
        tick(&mut state, &input, &tuning, &mut rng);
        assert!(state.entities.bullets.len() <= 1);
    }

    #[test]
    fn test_wave_clear_advances_level_once() {
        let (mut state, tuning, mut rng) = new_game(9);
        state.wave.phase = GamePhase::Active;
        state.entities.millipedes.push(row_chain(12, 10.0));
        for x in 0..12 {
            let id = state.entities.next_entity_id();
            state.entities.bullets.push(Bullet {
                id,
                pos: Vec2::new(x as f32 + 0.5, 11.3),
            });
        }

        // Tick 1 is not a millipede move tick at level 1
        tick(&mut state, &InputState::default(), &tuning, &mut rng);
        assert_eq!(state.entities.segment_count(), 0);
        assert_eq!(state.phase(), GamePhase::Cleared);
        assert_eq!(state.wave.level, 1);
        assert_eq!(state.wave.score, tuning.score_head + 11 * tuning.score_body);
        assert_eq!(state.entities.mushrooms.len(), 12);

        let mut started = 0;
        for _ in 0..20 {
            tick(&mut state, &InputState::default(), &tuning, &mut rng);
            started += state
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::WaveStarted { .. }))
                .count();
        }
        assert_eq!(started, 1);
        assert_eq!(state.wave.level, 2);
        assert_eq!(state.phase(), GamePhase::Active);
        assert_eq!(state.entities.segment_count(), 14);
    }

    #[test]
    fn test_fatal_collision_freezes_world() {
        let (mut state, tuning, mut rng) = new_game(3);
        state.wave.phase = GamePhase::Active;
        let mut chain = row_chain(3, 30.0);
        for segment in &mut chain.segments {
            segment.pos.x += 8.0;
        }
        state.entities.millipedes.push(chain);
        state.entities.particles.push(Particle {
            pos: Vec2::new(1.0, 1.0),
            vel: Vec2::ZERO,
            life: 10,
            gas: true,
        });

        tick(&mut state, &InputState::default(), &tuning, &mut rng);
        assert_eq!(state.phase(), GamePhase::GameOver);
        assert_eq!(state.entities.segment_count(), 3);

        let player = state.entities.player.pos;
        let segments = state.entities.millipedes[0].segments.clone();
        let score = state.wave.score;
        let life = state.entities.particles[0].life;
        let busy = InputState {
            left: true,
            fire: true,
            ..Default::default()
        };
        for _ in 0..5 {
            tick(&mut state, &busy, &tuning, &mut rng);
        }
        assert_eq!(state.entities.player.pos, player);
        assert_eq!(state.entities.millipedes[0].segments, segments);
        assert!(state.entities.bullets.is_empty());
        assert_eq!(state.wave.score, score);
        assert_eq!(state.entities.particles[0].life, life - 5);
    }

    #[test]
    fn test_wave_cleared_by_gas() {
        let (mut state, tuning, mut rng) = new_game(4);
        state.wave.phase = GamePhase::Active;
        state.entities.millipedes.push(row_chain(12, 10.0));
        // Four clouds whose radii cover columns 0..=11 of row 10
        for x in [1.0, 4.0, 7.0, 10.0] {
            state.entities.particles.push(Particle {
                pos: Vec2::new(x, 10.0),
                vel: Vec2::ZERO,
                life: tuning.gas_lifetime,
                gas: true,
            });
        }

        tick(&mut state, &InputState::default(), &tuning, &mut rng);
        assert_eq!(state.entities.segment_count(), 0);
        assert_eq!(state.phase(), GamePhase::Cleared);
        assert_eq!(state.wave.score, 12 * tuning.score_gas_kill);
        assert!(state.entities.mushrooms.is_empty());

        let mut started = 0;
        for _ in 0..5 {
            tick(&mut state, &InputState::default(), &tuning, &mut rng);
            started += state
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::WaveStarted { .. }))
                .count();
        }
        assert_eq!(started, 1);
        assert_eq!(state.wave.level, 2);
        assert_eq!(state.phase(), GamePhase::Active);
        assert_eq!(state.entities.segment_count(), 14);
    }

    #[test]
    fn test_spider_on_player_is_fatal() {
        let (mut state, tuning, mut rng) = new_game(6);
        state.wave.phase = GamePhase::Active;
        state.entities.millipedes.push(row_chain(3, 2.0));
        let player = state.entities.player.pos;
        state.entities.spiders.push(Spider {
            id: 700,
            pos: player + Vec2::new(0.2, -0.3),
            vel: Vec2::ZERO,
        });

        tick(&mut state, &InputState::default(), &tuning, &mut rng);
        assert_eq!(state.phase(), GamePhase::GameOver);
        assert!(!state.entities.player.alive);
        assert_eq!(state.entities.spiders.len(), 1);
        assert_eq!(state.entities.spiders[0].id, 700);

        let spider = state.entities.spiders[0].pos;
        tick(&mut state, &InputState::default(), &tuning, &mut rng);
        assert_eq!(state.entities.spiders[0].pos, spider);
    }

    #[test]
    fn test_determinism() {
        let (mut state1, tuning, mut rng1) = new_game(99999);
        let (mut state2, _, mut rng2) = new_game(99999);

        for t in 0..600u32 {
            let input = InputState {
                left: t % 90 < 45,
                right: t % 90 >= 45,
                fire: true,
                ..Default::default()
            };
            tick(&mut state1, &input, &tuning, &mut rng1);
            tick(&mut state2, &input, &tuning, &mut rng2);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.wave.score, state2.wave.score);
        assert_eq!(
            serde_json::to_string(&state1.entities).unwrap(),
            serde_json::to_string(&state2.entities).unwrap()
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_score_never_decreases(seed in any::<u64>(), inputs in proptest::collection::vec(0u8..32, 1..400)) {
            let (mut state, tuning, mut rng) = new_game(seed);
            let mut last = 0;
            for bits in inputs {
                let input = InputState {
                    up: bits & 1 != 0,
                    down: bits & 2 != 0,
                    left: bits & 4 != 0,
                    right: bits & 8 != 0,
                    fire: bits & 16 != 0,
                };
                tick(&mut state, &input, &tuning, &mut rng);
                prop_assert!(state.wave.score >= last);
                last = state.wave.score;

                let mut cells: Vec<_> = state.entities.mushrooms.iter().map(|m| (m.cell.x, m.cell.y)).collect();
                let count = cells.len();
                cells.sort();
                cells.dedup();
                prop_assert_eq!(cells.len(), count);
                prop_assert!(state.entities.mushrooms.iter().all(|m| m.hp > 0));
            }
        }
    }
}
