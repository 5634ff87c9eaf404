//! Game state: everything a level scene owns
//!
//! Built once from a loaded [`Level`] and a [`Settings`], then advanced by
//! [`tick`](super::tick::tick).

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::camera::{CameraRig, Hud};
use super::footprints::FootprintPool;
use super::hazard::ActivationCycle;
use super::player::Player;
use super::regions::RegionIndex;
use super::rooms::{Effect, RoomContext, RoomTransitionManager};
use super::schedule::{Scheduler, TaskHandle};
use super::sparkle::Sparkle;
use crate::level::{LayerKind, Level, TileMap};
use crate::settings::Settings;

/// Things that happened during a tick, drained by the frontend
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RoomChanged { from: Option<String>, to: String },
    OutOfBounds,
    FootprintPlaced { index: u64 },
    SparkleFired {
        id: u32,
        origin: String,
        destination: String,
        captured: usize,
    },
    /// A captured footprint was dropped (wall or superseded transfer)
    MarkerDiscarded { index: u64 },
    RelocationStarted { index: u64, to: Vec2 },
    HazardCreated { index: u64 },
    MagicReset,
    PlayerHurt,
    /// Action key or a tap on the player
    Action,
}

/// Complete scene state
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    pub tiles: TileMap,
    pub regions: RegionIndex,
    pub sparkles: Vec<Sparkle>,
    pub player: Player,
    pub pool: FootprintPool,
    pub rooms: RoomTransitionManager,
    pub cycle: ActivationCycle,
    pub camera: CameraRig,
    pub hud: Hud,
    pub scheduler: Scheduler<Effect>,
    /// Scene clock (ms)
    pub time_ms: f64,
    pub events: Vec<GameEvent>,
    rng: Pcg32,
    hurt_timer: Option<TaskHandle>,
}

impl GameState {
    pub fn new(level: Level, settings: Settings) -> Self {
        let Level {
            tiles,
            regions,
            sparkles,
            ..
        } = &level;

        let start = level
            .spawn_point(settings.debug_spawn)
            .or_else(|| regions.area(&settings.start_room).map(|area| area.center()))
            .unwrap_or_else(|| tiles.pixel_bounds().center());
        log::info!(
            "Starting in '{}' at {:?} ({} rooms, {} sparkles)",
            settings.start_room,
            start,
            regions.len(),
            sparkles.len()
        );

        let player = Player::new(
            start,
            settings.movement.clone(),
            settings.footprints.spacing,
            settings.footprints.spacing_mode,
        );
        let pool = FootprintPool::new(settings.footprints.capacity)
            .with_expiry(settings.footprints.expire_after_ms)
            .with_marker_size(settings.footprints.size);

        let mut state = Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            cycle: ActivationCycle::new(&settings.hazards),
            tiles: level.tiles,
            regions: level.regions,
            sparkles: level.sparkles,
            player,
            pool,
            rooms: RoomTransitionManager::new(),
            camera: CameraRig::default(),
            hud: Hud::default(),
            scheduler: Scheduler::new(),
            time_ms: 0.0,
            events: Vec::new(),
            hurt_timer: None,
            settings,
        };

        let start_room = state.settings.start_room.clone();
        let (rooms, _, mut ctx) = state.split();
        rooms.change_room(&start_room, false, &mut ctx);
        state
    }

    /// Borrow the room manager, the pool and the collaborators it drives
    pub(crate) fn split(&mut self) -> (&mut RoomTransitionManager, &mut FootprintPool, RoomContext<'_>) {
        let GameState {
            settings,
            tiles,
            regions,
            pool,
            rooms,
            camera,
            hud,
            scheduler,
            time_ms,
            events,
            rng,
            ..
        } = self;

        let ctx = RoomContext {
            regions: &*regions,
            tiles: &*tiles,
            scheduler,
            camera,
            hud,
            rng,
            settings: &*settings,
            events,
            now_ms: *time_ms,
        };
        (rooms, pool, ctx)
    }

    /// Leave a footprint under the current paw, if the ground takes one
    pub fn add_footprint(&mut self) {
        let paw = self.player.paw();
        let ground = self.tiles.tile_at(paw.pos, LayerKind::Ground);
        let props = ground.map(|t| t.properties).unwrap_or_default();

        self.player.slipping = props.slippery;
        if !props.footprints {
            return;
        }

        if let Some(index) = self.pool.request_marker(paw.pos, paw.facing_right, paw.tilt) {
            log::trace!("Footprint #{} ({:?}) at {:?}", index, paw.foot, paw.pos);
            self.events.push(GameEvent::FootprintPlaced { index });
        }
    }

    /// Tint the player red, restarting the timer if already hurt
    pub fn hurt_player(&mut self) {
        if !self.player.hurt {
            log::info!("Player hurt at {:?}", self.player.pos);
        }
        self.player.hurt = true;
        self.scheduler.cancel_slot(&mut self.hurt_timer);
        self.hurt_timer = Some(self.scheduler.after(
            self.time_ms,
            self.settings.hazards.hurt_tint_ms,
            Effect::ClearHurt,
        ));
        self.events.push(GameEvent::PlayerHurt);
    }

    pub(crate) fn clear_hurt(&mut self) {
        self.player.hurt = false;
        self.hurt_timer = None;
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Cancel everything scheduled (scene shutdown)
    pub fn teardown(&mut self) {
        self.rooms.teardown(&mut self.scheduler);
        self.scheduler.clear();
        self.hurt_timer = None;
        self.events.clear();
    }
}
