//! Sidestorm entry point
//!
//! Headless autoplay session: runs the simulation for a fixed number of
//! frames with a scripted jump pattern, then reports the run and records
//! it on the local leaderboard. A renderer front-end drives the same
//! `GameState::tick` from its frame loop.

use std::path::Path;

use sidestorm::consts::*;
use sidestorm::sim::{GameEvent, GamePhase, GameState, TickInput, UpgradeChoice};
use sidestorm::{HighScores, Settings};

const SESSION_TICKS: u64 = TICKS_PER_SECOND as u64 * 120;
const SCORES_PATH: &str = "sidestorm_scores.json";
const SETTINGS_PATH: &str = "sidestorm_settings.json";

fn main() {
    env_logger::init();
    log::info!("Sidestorm starting...");

    let settings = Settings::load(Path::new(SETTINGS_PATH));
    let seed = settings.fixed_seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    });
    log::info!("Session seed: {seed}");

    let mut state = GameState::new(seed);
    let mut input = TickInput {
        primary: true,
        ..Default::default()
    };

    let mut kills = 0u32;
    let mut coins = 0u32;
    for frame in 0..SESSION_TICKS {
        state.tick(&input);

        // Clear one-shot inputs after processing
        input.primary = false;
        input.primary_release = false;
        input.pause = false;
        input.select_upgrade = None;

        // Scripted play: hop every two seconds, short-hop on the off-beat
        let beat = frame % (TICKS_PER_SECOND as u64 * 2);
        if state.phase == GamePhase::Running {
            if beat == 0 {
                input.primary = true;
            } else if beat == 8 {
                input.primary_release = true;
            }
        }

        // Autopilot takes the first offered upgrade
        if state.phase == GamePhase::LevelUp {
            report_choices(&state.pending_choices);
            input.select_upgrade = Some(0);
        }
        if state.phase == GamePhase::GameOver {
            break;
        }

        for event in state.take_events() {
            match event {
                GameEvent::EnemyKilled { .. } => kills += 1,
                GameEvent::CoinBonus(n) => coins += n,
                GameEvent::LevelReached(level) => log::info!("reached level {level}"),
                GameEvent::RunEnded { score } => log::info!("run ended with score {score}"),
                GameEvent::Sound(_) | GameEvent::UpgradeApplied(_) => {}
            }
        }
    }

    println!("Run complete:");
    println!("  score   {}", state.score);
    println!("  level   {}", state.progression.level);
    println!("  kills   {kills}");
    println!("  bonuses {coins}");
    println!("  ticks   {}", state.time_ticks);

    let scores_path = Path::new(SCORES_PATH);
    let mut scores = HighScores::load(scores_path);
    let result = scores.submit_score("autopilot", state.score, state.progression.level);
    match result.rank {
        Some(rank) => println!("  rank    #{rank} of {}", result.total),
        None => println!("  rank    below the board"),
    }
    if let Err(err) = scores.save(scores_path) {
        log::warn!("could not save high scores: {err}");
    }
}

fn report_choices(choices: &[UpgradeChoice]) {
    let names: Vec<&str> = choices.iter().map(|c| c.name.as_str()).collect();
    log::info!("upgrade offer: {}", names.join(" / "));
}
