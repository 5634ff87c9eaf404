//! Room transitions and the magic footprint transfer
//!
//! Every tick the player's collider is resolved to a room. A change of room
//! moves the camera, flashes the room name and may complete a pending magic
//! transfer: footprints captured by a sparkle in the origin room are shifted
//! by the offset between the origin and destination rooms, dropped where they
//! would land in a wall, eased into place and turned into hazards.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use super::camera::{CameraRig, Hud};
use super::footprints::{FootprintMarker, FootprintPool};
use super::geom::Rect;
use super::hazard::{ActivationCycle, Hazard};
use super::regions::RegionIndex;
use super::schedule::{Easing, Progress, RELOCATION_EASINGS, Scheduler, TaskHandle};
use super::sparkle::Sparkle;
use super::state::GameEvent;
use crate::consts::{MAGIC_START_ALPHA, NEUTRAL_TINT, RAINBOW};
use crate::level::TileMap;
use crate::settings::Settings;
use crate::{hsl_to_rgb, lerp, lerp_rgb};

pub const OUT_OF_BOUNDS_TEXT: &str = "Out of bounds!";

/// Which room the player is in
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoomState {
    /// Before the first room is entered
    #[default]
    Unset,
    In(String),
    /// Collider overlaps no room
    OutOfBounds,
}

impl RoomState {
    pub fn name(&self) -> Option<&str> {
        match self {
            RoomState::In(name) => Some(name),
            RoomState::Unset | RoomState::OutOfBounds => None,
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name() == Some(name)
    }
}

/// Footprints captured by a sparkle, waiting for the player to reach the destination
#[derive(Debug, Clone, Default)]
pub struct MagicTransferRequest {
    pub origin: String,
    pub destination: String,
    pub prints: Vec<FootprintMarker>,
}

/// Work the scheduler runs on behalf of the room manager and the player
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ease a footprint to its destination room, then make it a hazard
    Relocate {
        index: u64,
        from: Vec2,
        to: Vec2,
        from_rotation: f32,
    },
    /// Fade a freshly magical footprint in
    MagicGlow { index: u64, tint: u32 },
    /// Fade a new hazard to its ice tint
    HazardTint { index: u64, tint: u32 },
    CameraBounds { from: Rect, to: Rect },
    CameraZoom { from: f32, to: f32 },
    /// Forget the consumed transfer
    ResetMagic,
    ClearHurt,
}

/// Collaborators the room manager drives
pub struct RoomContext<'a> {
    pub regions: &'a RegionIndex,
    pub tiles: &'a TileMap,
    pub scheduler: &'a mut Scheduler<Effect>,
    pub camera: &'a mut CameraRig,
    pub hud: &'a mut Hud,
    pub rng: &'a mut Pcg32,
    pub settings: &'a Settings,
    pub events: &'a mut Vec<GameEvent>,
    pub now_ms: f64,
}

/// Tracks the current room and hosts the magic transfer
#[derive(Debug, Clone, Default)]
pub struct RoomTransitionManager {
    current: RoomState,
    previous: RoomState,
    magic: Option<MagicTransferRequest>,
    /// Footprints mid-flight to their destination room
    relocating: Vec<FootprintMarker>,
    hazards: Vec<Hazard>,
    reset_timer: Option<TaskHandle>,
    camera_tweens: Vec<TaskHandle>,
}

impl RoomTransitionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &RoomState {
        &self.current
    }

    pub fn previous(&self) -> &RoomState {
        &self.previous
    }

    pub fn pending_magic(&self) -> Option<&MagicTransferRequest> {
        self.magic.as_ref()
    }

    pub fn relocating(&self) -> &[FootprintMarker] {
        &self.relocating
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    /// Hazards whose collider currently blocks movement
    pub fn solid_hazards(&self) -> impl Iterator<Item = &Hazard> {
        self.hazards.iter().filter(|h| h.solid)
    }

    /// Resolve the player's room. Returns true on a room change.
    pub fn check_room(&mut self, player: &Rect, regions: &RegionIndex) -> bool {
        let resolved = match regions.region_containing(player) {
            Some(name) => RoomState::In(name.to_string()),
            None => RoomState::OutOfBounds,
        };

        if resolved == self.current {
            return false;
        }

        if resolved == RoomState::OutOfBounds {
            log::warn!("Player not in any room (left {:?})", self.current.name());
        }
        self.previous = std::mem::replace(&mut self.current, resolved);
        true
    }

    /// Per-tick room check and transition handling
    pub fn update(&mut self, player: &Rect, ctx: &mut RoomContext) -> bool {
        let changed = self.check_room(player, ctx.regions);

        match self.current.clone() {
            RoomState::OutOfBounds => {
                ctx.hud
                    .show_panel(OUT_OF_BOUNDS_TEXT, ctx.settings.camera.out_of_bounds_panel_ms);
                if changed {
                    ctx.events.push(GameEvent::OutOfBounds);
                }
            }
            RoomState::In(name) if changed => self.enter_room(&name, true, ctx),
            _ => {}
        }
        changed
    }

    /// Force a room change (level start). Unknown rooms are ignored.
    pub fn change_room(&mut self, name: &str, smooth_camera: bool, ctx: &mut RoomContext) -> bool {
        if ctx.regions.get(name).is_none() {
            log::warn!("Room '{}' not found", name);
            return false;
        }
        if !self.current.is(name) {
            self.previous = std::mem::replace(&mut self.current, RoomState::In(name.to_string()));
        }
        self.enter_room(name, smooth_camera, ctx);
        true
    }

    fn enter_room(&mut self, name: &str, smooth_camera: bool, ctx: &mut RoomContext) {
        let Some(room) = ctx.regions.get(name) else {
            log::warn!("Room '{}' not found", name);
            return;
        };
        let (area, props) = (room.area, room.properties);

        log::info!("Entered room '{}' from {:?}", name, self.previous.name());
        ctx.hud.show_panel(name, ctx.settings.camera.room_panel_ms);
        ctx.events.push(GameEvent::RoomChanged {
            from: self.previous.name().map(str::to_string),
            to: name.to_string(),
        });

        if props.static_camera {
            ctx.camera.stop_follow();
        } else {
            ctx.camera.start_follow(ctx.settings.camera.follow_lerp);
        }

        let transfer_due = self.magic.as_ref().is_some_and(|m| {
            self.previous.is(&m.origin) && self.current.is(&m.destination)
        });
        if transfer_due {
            self.relocate(ctx);
        }

        for handle in self.camera_tweens.drain(..) {
            ctx.scheduler.cancel(handle);
        }

        if !smooth_camera {
            ctx.camera.zoom = props.zoom;
            ctx.camera.bounds = area;
            return;
        }

        let from = self
            .previous
            .name()
            .and_then(|prev| ctx.regions.area(prev))
            .unwrap_or(Rect::ZERO);
        let duration = ctx.settings.camera.transition_ms;
        self.camera_tweens.push(ctx.scheduler.tween(
            ctx.now_ms,
            0.0,
            duration,
            Easing::ExpoOut,
            Effect::CameraBounds { from, to: area },
        ));
        self.camera_tweens.push(ctx.scheduler.tween(
            ctx.now_ms,
            0.0,
            duration,
            Easing::QuadOut,
            Effect::CameraZoom {
                from: ctx.camera.zoom,
                to: props.zoom,
            },
        ));
    }

    /// Capture the footprints in the sparkle's room for a later transfer
    pub fn sparkle_effect(&mut self, sparkle: &Sparkle, pool: &mut FootprintPool, ctx: &mut RoomContext) {
        let Some(origin) = ctx.regions.region_containing(&sparkle.area) else {
            log::warn!("Sparkle {} activated outside a room", sparkle.id);
            return;
        };
        let origin = origin.to_string();

        if let Some(stale) = self.magic.take() {
            if !stale.prints.is_empty() {
                log::warn!(
                    "Discarding {} footprints from unfinished transfer {} -> {}",
                    stale.prints.len(),
                    stale.origin,
                    stale.destination
                );
            }
            for print in stale.prints {
                ctx.events.push(GameEvent::MarkerDiscarded { index: print.index });
            }
        }
        ctx.scheduler.cancel_slot(&mut self.reset_timer);

        if origin == sparkle.destination {
            log::warn!("Magic origin is the same as destination ('{}')", origin);
        }

        let mut prints = pool.withdraw_room(&origin);
        let capacity = pool.capacity().max(1) as f32;
        for (i, print) in prints.iter_mut().enumerate() {
            print.magical = true;
            print.tint = NEUTRAL_TINT;
            print.alpha = MAGIC_START_ALPHA;

            let tint = *RAINBOW.choose(&mut *ctx.rng).unwrap_or(&NEUTRAL_TINT);
            let fade = ctx.settings.magic.glow_fade_ms;
            ctx.scheduler.tween(
                ctx.now_ms,
                i as f32 * fade / capacity,
                fade,
                Easing::Linear,
                Effect::MagicGlow {
                    index: print.index,
                    tint,
                },
            );
        }

        log::info!(
            "Sparkle {} captured {} footprints in '{}' for '{}'",
            sparkle.id,
            prints.len(),
            origin,
            sparkle.destination
        );
        ctx.events.push(GameEvent::SparkleFired {
            id: sparkle.id,
            origin: origin.clone(),
            destination: sparkle.destination.clone(),
            captured: prints.len(),
        });

        self.magic = Some(MagicTransferRequest {
            origin,
            destination: sparkle.destination.clone(),
            prints,
        });
    }

    /// Move captured footprints into the destination room
    fn relocate(&mut self, ctx: &mut RoomContext) {
        let Some(magic) = self.magic.as_mut() else {
            return;
        };
        let (Some(origin), Some(destination)) = (
            ctx.regions.area(&magic.origin),
            ctx.regions.area(&magic.destination),
        ) else {
            log::warn!("Magic transfer {} -> {} references a missing room", magic.origin, magic.destination);
            return;
        };
        let offset = destination.top_left() - origin.top_left();

        let magic_settings = &ctx.settings.magic;
        let min_ms = magic_settings.relocation_min_ms;
        let max_ms = magic_settings.relocation_max_ms.max(min_ms);
        let mut moved = 0;
        for mut print in std::mem::take(&mut magic.prints) {
            let target = print.pos + offset;
            if ctx.tiles.is_wall_blocked(target) {
                log::debug!("Footprint #{} would land in a wall, dropped", print.index);
                ctx.events.push(GameEvent::MarkerDiscarded { index: print.index });
                continue;
            }

            print.magical = false;
            let easing = *RELOCATION_EASINGS
                .choose(&mut *ctx.rng)
                .unwrap_or(&Easing::ExpoOut);
            let duration = ctx.rng.random_range(min_ms..=max_ms);
            let delay = ctx.rng.random_range(0..=magic_settings.stagger_max_ms);

            ctx.scheduler.tween(
                ctx.now_ms,
                delay as f32,
                duration as f32,
                easing,
                Effect::Relocate {
                    index: print.index,
                    from: print.pos,
                    to: target,
                    from_rotation: print.rotation,
                },
            );
            ctx.events.push(GameEvent::RelocationStarted {
                index: print.index,
                to: target,
            });
            self.relocating.push(print);
            moved += 1;
        }

        log::info!(
            "Magic transfer {} -> {}: {} footprints relocating by {:?}",
            magic.origin,
            magic.destination,
            moved,
            offset
        );

        ctx.scheduler.cancel_slot(&mut self.reset_timer);
        self.reset_timer = Some(ctx.scheduler.after(
            ctx.now_ms,
            magic_settings.reset_delay_ms,
            Effect::ResetMagic,
        ));
    }

    fn marker_mut(&mut self, index: u64) -> Option<&mut FootprintMarker> {
        let pending = self.magic.iter_mut().flat_map(|m| m.prints.iter_mut());
        pending
            .chain(self.relocating.iter_mut())
            .chain(self.hazards.iter_mut().map(|h| &mut h.marker))
            .find(|m| m.index == index)
    }

    /// Apply one scheduler report. Returns false for effects owned elsewhere.
    pub fn apply(&mut self, report: &Progress<Effect>, ctx: &mut RoomContext) -> bool {
        let t = report.t;
        match &report.action {
            Effect::Relocate {
                index,
                from,
                to,
                from_rotation,
            } => {
                let Some(slot) = self.relocating.iter().position(|m| m.index == *index) else {
                    return true;
                };
                let marker = &mut self.relocating[slot];
                marker.pos = from.lerp(*to, t);
                marker.rotation = lerp(*from_rotation, 0.0, t);
                if report.finished {
                    let marker = self.relocating.remove(slot);
                    self.convert_to_hazard(marker, ctx);
                }
            }
            Effect::MagicGlow { index, tint } => {
                if let Some(marker) = self.marker_mut(*index) {
                    marker.alpha = lerp(MAGIC_START_ALPHA, 1.0, t);
                    marker.tint = lerp_rgb(NEUTRAL_TINT, *tint, t);
                }
            }
            Effect::HazardTint { index, tint } => {
                if let Some(hazard) = self.hazards.iter_mut().find(|h| h.marker.index == *index) {
                    hazard.marker.tint = lerp_rgb(NEUTRAL_TINT, *tint, t);
                }
            }
            Effect::CameraBounds { from, to } => {
                ctx.camera.bounds = from.lerp(to, t);
                if report.finished {
                    self.camera_tweens.retain(|h| *h != report.handle);
                }
            }
            Effect::CameraZoom { from, to } => {
                ctx.camera.zoom = lerp(*from, *to, t);
                if report.finished {
                    self.camera_tweens.retain(|h| *h != report.handle);
                }
            }
            Effect::ResetMagic => {
                self.reset_timer = None;
                if let Some(magic) = self.magic.take() {
                    log::debug!("Magic transfer {} -> {} cleared", magic.origin, magic.destination);
                }
                ctx.events.push(GameEvent::MagicReset);
            }
            Effect::ClearHurt => return false,
        }
        true
    }

    fn convert_to_hazard(&mut self, mut marker: FootprintMarker, ctx: &mut RoomContext) {
        marker.rotation = 0.0;
        marker.tint = NEUTRAL_TINT;
        marker.alpha = 1.0;
        let index = marker.index;
        let radius = ctx.tiles.tile_width() * ctx.settings.hazards.radius_factor;

        let tint = hsl_to_rgb(
            ctx.rng.random_range(185.0f32..225.0) / 360.0,
            ctx.rng.random_range(0.6f32..0.9),
            ctx.rng.random_range(0.4f32..0.6),
        );
        ctx.scheduler.tween(
            ctx.now_ms,
            0.0,
            ctx.settings.magic.hazard_fade_ms,
            Easing::QuintInOut,
            Effect::HazardTint { index, tint },
        );

        log::debug!("Footprint #{} became a hazard at {:?}", index, marker.pos);
        self.hazards.push(Hazard::new(marker, radius));
        ctx.events.push(GameEvent::HazardCreated { index });
    }

    /// Spin and re-home the footprints waiting in a pending transfer
    pub fn update_magic(&mut self, dt_ms: f32, regions: &RegionIndex) {
        if let Some(magic) = self.magic.as_mut() {
            for print in &mut magic.prints {
                print.alive_ms += dt_ms;
                print.refresh_room(regions);
                print.spin(dt_ms);
            }
        }
    }

    /// Advance every hazard's cycle. Returns true if the player got hurt.
    pub fn update_hazards(&mut self, cycle: &ActivationCycle, time_ms: f64, player: &Rect) -> bool {
        let count = self.hazards.len();
        let mut hurt = false;
        for hazard in &mut self.hazards {
            hurt |= hazard.update(cycle, time_ms, count, player);
        }
        hurt
    }

    /// Drop all pending work (scene teardown)
    pub fn teardown(&mut self, scheduler: &mut Scheduler<Effect>) {
        scheduler.cancel_slot(&mut self.reset_timer);
        for handle in self.camera_tweens.drain(..) {
            scheduler.cancel(handle);
        }
        self.magic = None;
        self.relocating.clear();
        self.hazards.clear();
    }
}
