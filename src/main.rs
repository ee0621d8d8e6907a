//! Void Runner headless runner
//!
//! Plays one run on autopilot at a fixed 60 Hz and prints the final
//! snapshot as JSON. Usage:
//!
//! `void-runner [seed] [campaign|void_rush|endless] [progress.json] [tuning.json]`

use std::env;
use std::fs;

use glam::Vec2;
use void_runner::persistence::{JsonFileStore, ProgressStore};
use void_runner::sim::{CheckpointChoice, GameEvent, GamePhase, GameState, TickInput, tick};
use void_runner::{ModeKind, Tuning};

const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up after ten minutes of game time
const MAX_FRAMES: u32 = 60 * 60 * 10;

fn parse_mode(arg: Option<&str>) -> ModeKind {
    match arg {
        Some("void_rush") => ModeKind::VoidRush,
        Some("endless") => ModeKind::Endless,
        Some("campaign") | None => ModeKind::Campaign,
        Some(other) => {
            log::warn!("unknown mode {other:?}, playing campaign");
            ModeKind::Campaign
        }
    }
}

fn load_tuning(path: Option<&str>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    match fs::read_to_string(path).map(|json| Tuning::from_json(&json)) {
        Ok(Ok(tuning)) => {
            log::info!("loaded tuning from {path}");
            tuning
        }
        Ok(Err(err)) => {
            log::warn!("bad tuning file {path}: {err}, using defaults");
            Tuning::default()
        }
        Err(err) => {
            log::warn!("cannot read tuning file {path}: {err}, using defaults");
            Tuning::default()
        }
    }
}

/// Strafe across the lower half, fire constantly, dash when something is close
fn autopilot(state: &GameState, frame: u32) -> TickInput {
    let t = frame as f32 * FRAME_DT;
    let target = Vec2::new((t * 0.7).sin() * 300.0, -120.0 + (t * 0.3).sin() * 60.0);
    let threatened = state
        .enemy_bullets
        .iter_active()
        .any(|(_, bullet)| bullet.pos.distance(state.player.pos) < 30.0);

    TickInput {
        target: Some(target),
        fire: true,
        dash: threatened,
        upgrade_choice: (state.phase == GamePhase::LevelUp).then_some(0),
        checkpoint_choice: Some(CheckpointChoice::Bank),
        ..Default::default()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let seed = args
        .first()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0x5eed);
    let mode = parse_mode(args.get(1).map(String::as_str));
    let mut store = JsonFileStore::new(
        args.get(2)
            .map_or("void_runner_progress.json", String::as_str),
    );
    let tuning = load_tuning(args.get(3).map(String::as_str));

    log::info!("Void Runner (headless) starting...");
    let progress = store.load_or_default();
    let mut state = GameState::new(seed, mode, tuning, progress);

    for frame in 0..MAX_FRAMES {
        let input = autopilot(&state, frame);
        tick(&mut state, &input, FRAME_DT);

        for event in state.drain_events() {
            if let GameEvent::ProgressChanged { .. } = event {
                if let Err(err) = store.save(&state.progress) {
                    log::warn!("failed to save progress: {err}");
                }
            }
            log::debug!("{event:?}");
        }
        if state.is_over() {
            break;
        }
    }

    match serde_json::to_string_pretty(&state.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("failed to encode snapshot: {err}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is driven by the embedding page on wasm
}
