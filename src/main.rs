//! Pawtrail headless runner
//!
//! Loads a level (the bundled demo by default), walks the player along a
//! scripted route and logs what the simulation reports.
//!
//! Usage: `pawtrail [level.json] [settings.json]`

use std::path::PathBuf;
use std::process::ExitCode;

use glam::Vec2;

use pawtrail::consts::SIM_DT_MS;
use pawtrail::sim::{GameEvent, GameState, KeyState, TickInput, tick};
use pawtrail::{Level, LevelError, Settings};

const DEMO_LEVEL: &str = include_str!("../assets/levels/demo.json");

/// Route through the demo: loop in Welcome, touch the sparkle, walk into the Cave
const ROUTE: [(f32, f32); 6] = [
    (300.0, 250.0),
    (300.0, 420.0),
    (464.0, 432.0),
    (600.0, 320.0),
    (900.0, 320.0),
    (1000.0, 450.0),
];
/// Time spent idling at the end of the route (ms)
const LINGER_MS: f32 = 6000.0;
const ARRIVE_RADIUS: f32 = 24.0;
/// Give up on a route the player cannot finish (ms)
const MAX_RUN_MS: f64 = 60_000.0;

fn load_level(path: Option<&PathBuf>) -> Result<Level, LevelError> {
    match path {
        Some(path) => Level::load(path),
        None => Level::from_json(DEMO_LEVEL),
    }
}

/// Steer toward a waypoint with digital keys
fn steer(from: Vec2, to: Vec2) -> KeyState {
    let d = to - from;
    let slack = ARRIVE_RADIUS / 2.0;
    KeyState {
        left: d.x < -slack,
        right: d.x > slack,
        up: d.y < -slack,
        down: d.y > slack,
    }
}

fn log_event(time_ms: f64, event: &GameEvent) {
    match event {
        GameEvent::FootprintPlaced { .. } => log::debug!("[{:>7.0}ms] {:?}", time_ms, event),
        _ => log::info!("[{:>7.0}ms] {:?}", time_ms, event),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::init();
    log::info!("Pawtrail (headless) starting...");

    let mut args = std::env::args().skip(1).map(PathBuf::from);
    let level_path = args.next();
    let settings_path = args.next();

    let settings = Settings::load(settings_path.as_deref());
    let level = match load_level(level_path.as_ref()) {
        Ok(level) => level,
        Err(e) => {
            log::error!("Failed to load level: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut state = GameState::new(level, settings);
    let mut waypoint = 0;
    let mut lingered = 0.0;

    while lingered < LINGER_MS && state.time_ms < MAX_RUN_MS {
        let keys = match ROUTE.get(waypoint) {
            Some(&(x, y)) => {
                let target = Vec2::new(x, y);
                if state.player.pos.distance(target) < ARRIVE_RADIUS {
                    waypoint += 1;
                }
                steer(state.player.pos, target)
            }
            None => {
                lingered += SIM_DT_MS;
                KeyState::default()
            }
        };

        let input = TickInput {
            keys,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT_MS);

        for event in state.drain_events() {
            log_event(state.time_ms, &event);
        }
    }

    log::info!(
        "Done after {:.1}s: {} footprints placed, {} hazards, room {:?}",
        state.time_ms / 1000.0,
        state.pool.total_placed(),
        state.rooms.hazards().len(),
        state.rooms.current()
    );
    state.teardown();
    ExitCode::SUCCESS
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Embedders drive `tick` themselves on the web
}
