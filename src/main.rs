//! Merge Drop headless driver
//!
//! Stands in for the presentation layer: picks a variant, drops balls from
//! the seeded queue on a fixed timestep and logs what happens.
//!
//! Usage: `merge-drop [variant|settings.json] [seed] [drops]`

use std::time::{Duration, Instant};

use merge_drop::consts::*;
use merge_drop::sim::{Container, GamePhase, GameState, tick};
use merge_drop::{Settings, Variant};

fn load_settings(arg: Option<&str>) -> Settings {
    let Some(arg) = arg else {
        return Settings::default();
    };
    if let Some(variant) = Variant::from_str(arg) {
        return Settings::from_preset(variant);
    }
    match Settings::load(arg) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Falling back to default settings: {}", e);
            Settings::default()
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = load_settings(args.first().map(String::as_str));
    let seed = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(0x5eed);
    let drops: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(40);

    log::info!("Merge Drop (headless) starting: basket={}, seed={}", settings.basket.name(), seed);

    let width = settings.basket.field().width;
    let mut state = GameState::new(settings, seed);

    // Simulated clock advancing one fixed step per tick
    let mut now = Instant::now();
    let step = Duration::from_secs_f64(SIM_DT);

    let mut dropped = 0;
    let mut sweep = 0.5;
    while dropped < drops && state.phase() != GamePhase::GameOver {
        if matches!(state.phase(), GamePhase::Settling | GamePhase::CountdownToGameOver) {
            // Sweep the drop point back and forth across the field
            sweep = (sweep + 0.37) % 1.0;
            let start = glam::DVec2::new(width * sweep, 0.0);
            if state.begin_aim(start) {
                let preview = state.aim_preview(start + glam::DVec2::new(20.0, 0.0));
                if let Some(end) = preview.as_ref().and_then(|p| p.last()) {
                    log::debug!("Aim preview lands near ({:.1}, {:.1})", end.x, end.y);
                }
                if state.release_aim(start + glam::DVec2::new(20.0, 0.0)).is_some() {
                    dropped += 1;
                }
            }
        }

        let result = tick(&mut state, now);
        now += step;
        if result.merges > 0 {
            log::info!("{} merge(s), score {}", result.merges, state.score());
        }
    }

    // Let the last drop settle
    for _ in 0..(TICK_RATE * 5) {
        if tick(&mut state, now).game_over_signaled() {
            break;
        }
        now += step;
    }

    let top_tier = state.balls().iter().map(|b| b.tier).max().unwrap_or(0);
    println!(
        "dropped {} balls over {} ticks: score {}, {} balls left, top tier {}, phase {:?}",
        dropped,
        state.time_ticks,
        state.score(),
        state.balls().len(),
        top_tier,
        state.phase()
    );
}
