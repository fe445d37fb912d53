//! Fixed-step driver
//!
//! Owns the game state, balance and RNG for one run. The host feeds it
//! elapsed frame time (or single steps) and reads back a `Frame`.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::input::InputState;
use super::state::{Frame, GameState};
use super::{tick, wave};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::leaderboard::ScoreSink;
use crate::tuning::{ConfigError, Tuning};

/// Drives a single game at a fixed tick rate
pub struct SimulationClock {
    state: GameState,
    tuning: Tuning,
    rng: Pcg32,
    accumulator: f32,
    game_slug: String,
    initials: String,
    score_reported: bool,
}

impl SimulationClock {
    /// Start a run; rejects balance the simulation cannot run with
    pub fn new(tuning: Tuning, seed: u64) -> Result<Self, ConfigError> {
        tuning.validate()?;
        Ok(Self {
            state: GameState::new(seed, &tuning),
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            accumulator: 0.0,
            game_slug: "millipede".to_string(),
            initials: "AAA".to_string(),
            score_reported: false,
        })
    }

    /// Who the final score is submitted as
    pub fn with_identity(mut self, game_slug: &str, initials: &str) -> Self {
        self.game_slug = game_slug.to_string();
        self.initials = initials.to_string();
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn frame(&self) -> Frame<'_> {
        self.state.frame()
    }

    /// False once the game is over; the host stops requesting ticks then
    pub fn is_running(&self) -> bool {
        !self.state.wave.is_game_over()
    }

    /// Run exactly one tick
    pub fn step(&mut self, input: &InputState) -> Frame<'_> {
        // Snapshot so the host can keep updating its copy mid-tick
        let input = *input;
        tick::tick(&mut self.state, &input, &self.tuning, &mut self.rng);
        self.state.frame()
    }

    /// Accumulate frame time and run the ticks it covers. Returns the number of ticks run.
    pub fn advance(&mut self, dt: f32, input: &InputState) -> u32 {
        self.accumulator += dt.clamp(0.0, 0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step(input);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog rather than spiral
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    /// Submit the final score once the game is over.
    ///
    /// Submits at most once per run. Returns `None` while the game is still
    /// running or after the score was already reported, otherwise whether
    /// the sink accepted it. Failures are logged, never retried.
    pub fn report_score(&mut self, sink: &mut dyn ScoreSink) -> Option<bool> {
        if self.is_running() || self.score_reported {
            return None;
        }
        self.score_reported = true;

        let score = self.state.wave.score;
        match sink.submit(&self.game_slug, &self.initials, score) {
            Ok(()) => {
                log::info!("Score {} submitted for {}", score, self.initials);
                Some(true)
            }
            Err(err) => {
                log::warn!("Score submission failed: {}", err);
                Some(false)
            }
        }
    }

    /// Start a fresh run with the same balance
    pub fn restart(&mut self) {
        wave::restart(&mut self.state, &self.tuning);
        self.accumulator = 0.0;
        self.score_reported = false;
    }
}
