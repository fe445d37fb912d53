//! Millipede headless runner
//!
//! Plays one game on autopilot at the fixed tick rate, submits the final
//! score to the local leaderboard and prints the table and leader tenure.
//!
//! Usage: `millipede [seed] [max_ticks]`

use std::time::{SystemTime, UNIX_EPOCH};

use millipede::leaderboard::{self, Leaderboard};
use millipede::sim::{GameEvent, InputState, SimulationClock};
use millipede::{ConfigError, Settings};

/// Ten minutes of play at 60 Hz
const DEFAULT_MAX_TICKS: u64 = 36_000;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ConfigError> {
    let settings_path =
        std::env::var("MILLIPEDE_SETTINGS").unwrap_or_else(|_| "millipede.json".to_string());
    let settings = Settings::load(&settings_path)?;
    let tuning = settings.tuning()?;

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg.parse().map_err(|_| ConfigError::Invalid {
            field: "seed",
            reason: format!("`{}` is not an unsigned integer", arg),
        })?,
        None => settings.seed.unwrap_or_else(clock_seed),
    };
    let max_ticks = match args.next() {
        Some(arg) => arg.parse().map_err(|_| ConfigError::Invalid {
            field: "max_ticks",
            reason: format!("`{}` is not an unsigned integer", arg),
        })?,
        None => DEFAULT_MAX_TICKS,
    };

    log::info!(
        "Millipede starting (seed {}, {}, {} ticks max)",
        seed,
        settings.difficulty.as_str(),
        max_ticks
    );

    let mut clock =
        SimulationClock::new(tuning, seed)?.with_identity(&settings.game_slug, &settings.initials);

    while clock.is_running() && clock.state().time_ticks < max_ticks {
        let input = InputState::autopilot(clock.state());
        let frame = clock.step(&input);
        for event in frame.events {
            match event {
                GameEvent::WaveCleared { level } => log::info!("Wave {} cleared", level),
                GameEvent::PlayerKilled { pos } => log::info!("Player killed at {}", pos),
                _ => {}
            }
        }
    }

    let state = clock.state();
    println!(
        "Final score {} at level {} after {} ticks",
        state.wave.score, state.wave.level, state.time_ticks
    );
    if clock.is_running() {
        log::info!("Tick limit reached, score not submitted");
        return Ok(());
    }

    let mut board = match &settings.leaderboard_path {
        Some(path) => Leaderboard::load(path)?,
        None => Leaderboard::new(),
    };
    if clock.report_score(&mut board) == Some(true) {
        let response = board.response(&settings.game_slug);
        println!(
            "{}",
            serde_json::to_string_pretty(&response).map_err(ConfigError::Parse)?
        );
        let top_dogs = board.top_dogs(leaderboard::now_secs());
        println!(
            "{}",
            serde_json::to_string_pretty(&top_dogs).map_err(ConfigError::Parse)?
        );
        if let Some(path) = &settings.leaderboard_path {
            board.save(path)?;
        }
    }
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
