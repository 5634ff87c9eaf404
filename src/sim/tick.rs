//! Frame step
//!
//! Order within a tick matters: the player moves first, then the room check
//! runs, then footprints, sparkles, scheduled effects and hazards update. A
//! room change found this tick is therefore visible to the magic transfer in
//! the same tick.

use glam::Vec2;

use super::geom::Rect;
use super::player::{KeyState, TouchEvent};
use super::rooms::Effect;
use super::state::{GameEvent, GameState};

/// Input sampled for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub keys: KeyState,
    /// Pointer events since the last tick, oldest first
    pub touches: Vec<TouchEvent>,
    /// Action key pressed
    pub action: bool,
}

/// Advance the scene by `dt_ms`
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f32) {
    state.time_ms += dt_ms as f64;

    for &touch in &input.touches {
        if state.player.handle_touch(touch) {
            state.events.push(GameEvent::Action);
        }
    }
    if input.action {
        state.events.push(GameEvent::Action);
    }

    // Movement
    let before = state.player.pos;
    let world = state.tiles.pixel_bounds();
    state.player.integrate(&input.keys, dt_ms, Some(&world));
    slide_along_walls(state, before);
    block_on_hazards(state, before);
    if state.player.track_distance(before) {
        state.add_footprint();
    }

    // Rooms
    let collider = state.player.collider();
    {
        let (rooms, _, mut ctx) = state.split();
        rooms.update(&collider, &mut ctx);
    }
    state.hud.update(dt_ms);

    // Footprints
    state.pool.tick(dt_ms, &state.regions);
    state.rooms.update_magic(dt_ms, &state.regions);

    for i in 0..state.sparkles.len() {
        if state.sparkles[i].update(&collider) {
            let sparkle = state.sparkles[i].clone();
            let (rooms, pool, mut ctx) = state.split();
            rooms.sparkle_effect(&sparkle, pool, &mut ctx);
        }
    }

    // Scheduled effects, completions fire inline
    let reports = state.scheduler.advance(state.time_ms);
    for report in &reports {
        if report.action == Effect::ClearHurt {
            state.clear_hurt();
            continue;
        }
        let (rooms, _, mut ctx) = state.split();
        rooms.apply(report, &mut ctx);
    }

    // Hazards
    if state
        .rooms
        .update_hazards(&state.cycle, state.time_ms, &collider)
    {
        state.hurt_player();
    }
}

/// Wall tiles stop the player, keeping whichever axis of the move is free
fn slide_along_walls(state: &mut GameState, before: Vec2) {
    let size = state.settings.movement.collider_size;
    let tiles = &state.tiles;
    let hits = |at: Vec2| tiles.rect_hits_wall(&Rect::from_center(at, size));

    let after = state.player.pos;
    if !hits(after) || hits(before) {
        return;
    }

    let player = &mut state.player;
    if !hits(Vec2::new(after.x, before.y)) {
        player.pos = Vec2::new(after.x, before.y);
        player.vel.y = 0.0;
    } else if !hits(Vec2::new(before.x, after.y)) {
        player.pos = Vec2::new(before.x, after.y);
        player.vel.x = 0.0;
    } else {
        player.pos = before;
        player.vel = Vec2::ZERO;
    }
}

/// Armed hazards stop the player from walking into them
fn block_on_hazards(state: &mut GameState, before: Vec2) {
    let now = state.player.collider();
    let prev = now.translated(before - state.player.pos);
    let blocked = state
        .rooms
        .solid_hazards()
        .any(|h| h.touches(&now) && !h.touches(&prev));
    if blocked {
        state.player.pos = before;
        state.player.vel = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT_MS;
    use crate::level::{LayerKind, Level, TileMap, TileProperties};
    use crate::settings::Settings;
    use crate::sim::regions::RegionIndex;
    use crate::sim::rooms::{OUT_OF_BOUNDS_TEXT, RoomState};
    use crate::sim::sparkle::Sparkle;

    const SNOW: u32 = 1;
    const ROCK: u32 = 2;

    /// Welcome and Cave side by side, plus an unclaimed strip on the right
    fn test_level() -> Level {
        let mut tiles = TileMap::new(24, 10, 64, 64);
        tiles.set_properties(
            SNOW,
            TileProperties {
                footprints: true,
                ..Default::default()
            },
        );
        tiles.set_properties(
            ROCK,
            TileProperties {
                is_wall: true,
                ..Default::default()
            },
        );
        for row in 0..10 {
            for col in 0..24 {
                tiles.set_tile(LayerKind::Ground, col, row, SNOW);
            }
        }
        // Lands on (1040, 200), a relocation target below
        tiles.set_tile(LayerKind::Wall, 16, 3, ROCK);

        let mut regions = RegionIndex::new();
        regions.register("Welcome", Rect::new(0.0, 0.0, 640.0, 640.0));
        regions.register("Cave", Rect::new(640.0, 0.0, 640.0, 640.0));

        Level {
            tiles,
            regions,
            sparkles: vec![Sparkle::new(7, Rect::new(150.0, 150.0, 20.0, 20.0), "Cave")],
            spawn: Some(Vec2::new(100.0, 100.0)),
            debug_spawn: None,
        }
    }

    fn idle(state: &mut GameState, ms: f32) {
        let input = TickInput::default();
        let mut elapsed = 0.0;
        while elapsed < ms {
            tick(state, &input, SIM_DT_MS);
            elapsed += SIM_DT_MS;
        }
    }

    fn teleport(state: &mut GameState, pos: Vec2) {
        state.player.pos = pos;
        state.player.vel = Vec2::ZERO;
        tick(state, &TickInput::default(), SIM_DT_MS);
    }

    fn room_changes(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::RoomChanged { .. }))
            .count()
    }

    #[test]
    fn test_walking_leaves_footprints() {
        let mut state = GameState::new(test_level(), Settings::default());
        state.drain_events();

        let input = TickInput {
            keys: KeyState {
                right: true,
                ..Default::default()
            },
            ..Default::default()
        };
        for _ in 0..60 {
            tick(&mut state, &input, SIM_DT_MS);
        }

        let placed = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::FootprintPlaced { .. }))
            .count();
        assert!(placed >= 2);
        assert_eq!(state.pool.active_count(), placed);
        assert!(state.pool.iter().all(|m| m.room.is_some()));
    }

    #[test]
    fn test_wall_stops_player_without_trail() {
        let mut level = test_level();
        for row in 0..10 {
            level.tiles.set_tile(LayerKind::Wall, 3, row, ROCK);
        }
        let mut state = GameState::new(level, Settings::default());
        state.drain_events();

        let input = TickInput {
            keys: KeyState {
                right: true,
                ..Default::default()
            },
            ..Default::default()
        };
        for _ in 0..120 {
            tick(&mut state, &input, SIM_DT_MS);
        }

        // Collider is 60 wide, the wall column starts at x = 192
        assert!(state.player.pos.x <= 162.0);
        assert!(state.player.pos.x > 140.0);
        assert!(state.player.distance_walked <= 62.0);
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::FootprintPlaced { .. }))
        );
    }

    #[test]
    fn test_wall_slide_keeps_free_axis() {
        let mut level = test_level();
        for row in 0..10 {
            level.tiles.set_tile(LayerKind::Wall, 3, row, ROCK);
        }
        let mut state = GameState::new(level, Settings::default());
        state.player.pos = Vec2::new(160.0, 300.0);

        let input = TickInput {
            keys: KeyState {
                right: true,
                down: true,
                ..Default::default()
            },
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut state, &input, SIM_DT_MS);
        }
        assert!(state.player.pos.x <= 162.0);
        assert!(state.player.pos.y > 310.0);
    }

    #[test]
    fn test_room_check_is_idempotent() {
        let mut state = GameState::new(test_level(), Settings::default());
        state.drain_events();

        teleport(&mut state, Vec2::new(900.0, 300.0));
        assert_eq!(room_changes(&state.drain_events()), 1);
        assert_eq!(state.rooms.previous(), &RoomState::In("Welcome".into()));

        teleport(&mut state, Vec2::new(900.0, 300.0));
        assert_eq!(room_changes(&state.drain_events()), 0);
        assert_eq!(state.rooms.current(), &RoomState::In("Cave".into()));
    }

    #[test]
    fn test_smooth_camera_transition() {
        let mut state = GameState::new(test_level(), Settings::default());
        teleport(&mut state, Vec2::new(900.0, 300.0));
        assert!(state.camera.is_following());
        assert_eq!(state.hud.text, "Cave");

        idle(&mut state, 250.0);
        assert_eq!(state.camera.bounds, Rect::new(640.0, 0.0, 640.0, 640.0));
        assert_eq!(state.camera.zoom, 1.0);
    }

    #[test]
    fn test_out_of_bounds_is_reported_once() {
        let mut state = GameState::new(test_level(), Settings::default());
        state.drain_events();

        teleport(&mut state, Vec2::new(1400.0, 300.0));
        assert_eq!(state.rooms.current(), &RoomState::OutOfBounds);
        assert!(state.drain_events().contains(&GameEvent::OutOfBounds));
        assert_eq!(state.hud.text, OUT_OF_BOUNDS_TEXT);

        idle(&mut state, 500.0);
        assert!(!state.drain_events().contains(&GameEvent::OutOfBounds));
        assert!(state.hud.shown);
        // No automatic recovery
        assert_eq!(state.player.pos, Vec2::new(1400.0, 300.0));

        teleport(&mut state, Vec2::new(900.0, 300.0));
        assert!(state.drain_events().contains(&GameEvent::RoomChanged {
            from: None,
            to: "Cave".into(),
        }));
    }

    #[test]
    fn test_tap_on_player_fires_action() {
        let mut state = GameState::new(test_level(), Settings::default());
        state.drain_events();

        let at = state.player.pos;
        let input = TickInput {
            touches: vec![TouchEvent::Start(at), TouchEvent::End(at)],
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT_MS);
        assert!(state.drain_events().contains(&GameEvent::Action));
    }

    #[test]
    fn test_magic_transfer_end_to_end() {
        let mut state = GameState::new(test_level(), Settings::default());
        assert_eq!(state.rooms.previous(), &RoomState::Unset);

        for pos in [(200.0, 200.0), (300.0, 300.0), (400.0, 200.0)] {
            state.pool.request_marker(Vec2::new(pos.0, pos.1), true, 0.2);
        }
        idle(&mut state, 20.0);
        state.drain_events();

        // Touch the sparkle
        teleport(&mut state, Vec2::new(160.0, 160.0));
        let request = state.rooms.pending_magic().expect("sparkle should capture");
        assert_eq!(request.origin, "Welcome");
        assert_eq!(request.destination, "Cave");
        let captured: Vec<u64> = request.prints.iter().map(|m| m.index).collect();
        assert_eq!(captured, vec![0, 1, 2]);
        assert!(request.prints.iter().all(|m| m.magical));
        assert_eq!(state.pool.active_count(), 0);
        assert!(state.drain_events().contains(&GameEvent::SparkleFired {
            id: 7,
            origin: "Welcome".into(),
            destination: "Cave".into(),
            captured: 3,
        }));

        // Sparkles fire once
        idle(&mut state, 100.0);
        assert_eq!(state.rooms.pending_magic().map(|m| m.prints.len()), Some(3));

        // Walk into the Cave: (400, 200) + (640, 0) is rock
        teleport(&mut state, Vec2::new(1100.0, 500.0));
        let relocated_at = state.time_ms;
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::MarkerDiscarded { index: 2 }));
        assert!(events.contains(&GameEvent::RelocationStarted {
            index: 0,
            to: Vec2::new(840.0, 200.0),
        }));
        assert!(events.contains(&GameEvent::RelocationStarted {
            index: 1,
            to: Vec2::new(940.0, 300.0),
        }));
        assert_eq!(state.rooms.relocating().len(), 2);

        idle(&mut state, 1000.0);
        let hazards = state.rooms.hazards();
        assert_eq!(hazards.len(), 2);
        assert!(state.rooms.relocating().is_empty());
        for hazard in hazards {
            let expected = if hazard.marker.index == 0 {
                Vec2::new(840.0, 200.0)
            } else {
                Vec2::new(940.0, 300.0)
            };
            assert!(hazard.center().distance(expected) < 1e-3);
            assert_eq!(hazard.marker.rotation, 0.0);
            assert!(!hazard.marker.magical);
            assert!((hazard.radius - 38.4).abs() < 1e-4);
        }

        // Request lingers until the reset timer
        while state.time_ms + (SIM_DT_MS as f64) < relocated_at + 3000.0 {
            tick(&mut state, &TickInput::default(), SIM_DT_MS);
            assert!(state.rooms.pending_magic().is_some());
        }
        idle(&mut state, 2.0 * SIM_DT_MS);
        assert!(state.rooms.pending_magic().is_none());
        assert!(state.drain_events().contains(&GameEvent::MagicReset));
    }

    #[test]
    fn test_standing_on_hazard_hurts_during_raise() {
        let mut state = GameState::new(test_level(), Settings::default());
        state.pool.request_marker(Vec2::new(200.0, 200.0), true, 0.0);
        idle(&mut state, 20.0);
        teleport(&mut state, Vec2::new(160.0, 160.0));
        teleport(&mut state, Vec2::new(1100.0, 500.0));
        idle(&mut state, 1000.0);
        assert_eq!(state.rooms.hazards().len(), 1);
        state.drain_events();

        teleport(&mut state, Vec2::new(840.0, 200.0));
        let mut hurt = false;
        let mut elapsed = 0.0;
        while elapsed < 5600.0 {
            tick(&mut state, &TickInput::default(), SIM_DT_MS);
            hurt |= state.player.hurt;
            elapsed += SIM_DT_MS;
        }
        assert!(hurt);
        assert!(state.drain_events().contains(&GameEvent::PlayerHurt));

        teleport(&mut state, Vec2::new(1200.0, 600.0));
        idle(&mut state, 600.0);
        assert!(!state.player.hurt);
    }

    #[test]
    fn test_teardown_drops_pending_work() {
        let mut state = GameState::new(test_level(), Settings::default());
        state.pool.request_marker(Vec2::new(200.0, 200.0), true, 0.0);
        idle(&mut state, 20.0);
        teleport(&mut state, Vec2::new(160.0, 160.0));
        assert!(!state.scheduler.is_empty());

        state.teardown();
        assert!(state.scheduler.is_empty());
        assert!(state.rooms.pending_magic().is_none());
    }
}
