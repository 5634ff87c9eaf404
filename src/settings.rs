//! Simulation tuning
//!
//! Every number the simulation uses lives here so levels can be tuned from a
//! JSON file without recompiling. Missing keys fall back to `crate::consts`.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// What happens to the walked-distance accumulator after a footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpacingMode {
    /// Keep the overshoot (accumulator modulo spacing)
    #[default]
    Carry,
    /// Drop the overshoot
    Reset,
}

impl SpacingMode {
    /// Apply the mode to an accumulator that just reached `spacing`
    pub fn consume(&self, accumulated: f32, spacing: f32) -> f32 {
        match self {
            SpacingMode::Carry if spacing > 0.0 => accumulated % spacing,
            SpacingMode::Carry | SpacingMode::Reset => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintSettings {
    /// Pool capacity
    pub capacity: usize,
    /// Distance between footprints (pixels)
    pub spacing: f32,
    pub spacing_mode: SpacingMode,
    /// Expire non-magical footprints after this long (ms). `None` means
    /// footprints only leave the pool under capacity pressure.
    pub expire_after_ms: Option<f32>,
    /// Sprite size used for marker bounds (pixels)
    pub size: f32,
}

impl Default for FootprintSettings {
    fn default() -> Self {
        Self {
            capacity: FOOTPRINT_CAPACITY,
            spacing: FOOTPRINT_SPACING,
            spacing_mode: SpacingMode::Carry,
            expire_after_ms: None,
            size: FOOTPRINT_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSettings {
    pub acceleration: f32,
    pub max_speed: f32,
    /// Velocity retained per tick (< 1)
    pub friction: f32,
    /// Velocity retained per tick while slipping (< 1)
    pub slippery_friction: f32,
    pub tap_window_ms: f32,
    pub touch_divisor: f32,
    pub touch_body_radius: f32,
    /// Player collision rectangle size, centred on the player position
    pub collider_size: Vec2,
    /// Offset of the planted paw from the player position (x mirrored per foot)
    pub paw_offset: Vec2,
    /// Paw tilt (radians) applied away from the facing direction
    pub paw_tilt: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            acceleration: ACCELERATION,
            max_speed: MAX_SPEED,
            friction: FRICTION,
            slippery_friction: SLIPPERY_FRICTION,
            tap_window_ms: TAPPING_TIMER_MS,
            touch_divisor: TOUCH_DIVISOR,
            touch_body_radius: TOUCH_BODY_RADIUS,
            collider_size: Vec2::new(60.0, 40.0),
            paw_offset: Vec2::new(12.0, 40.0),
            paw_tilt: 0.15,
        }
    }
}

impl MovementSettings {
    /// Whether `max_speed` can actually be reached with this friction
    pub fn max_speed_reachable(&self) -> bool {
        self.acceleration / (1.0 - self.friction) >= self.max_speed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardSettings {
    pub period_ms: f32,
    /// Fraction of the period spent safe before arming
    pub safe_fraction: f32,
    /// Length of the lower/raise windows (ms)
    pub edge_ms: f32,
    /// Collision radius as a fraction of tile width
    pub radius_factor: f32,
    pub hurt_tint_ms: f32,
}

impl Default for HazardSettings {
    fn default() -> Self {
        Self {
            period_ms: HAZARD_PERIOD_MS,
            safe_fraction: HAZARD_SAFE_FRACTION,
            edge_ms: HAZARD_EDGE_MS,
            radius_factor: HAZARD_RADIUS_FACTOR,
            hurt_tint_ms: HURT_TINT_MS,
        }
    }
}

impl HazardSettings {
    /// Cycle position at which a hazard arms (ms)
    pub fn arm_threshold(&self) -> f32 {
        self.period_ms * self.safe_fraction
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MagicSettings {
    /// Delay after relocation starts before the transfer is cleared (ms)
    pub reset_delay_ms: f32,
    pub relocation_min_ms: u32,
    pub relocation_max_ms: u32,
    /// Upper bound of the random start stagger (ms)
    pub stagger_max_ms: u32,
    /// Magical glow fade-in (ms)
    pub glow_fade_ms: f32,
    /// Hazard tint fade after conversion (ms)
    pub hazard_fade_ms: f32,
}

impl Default for MagicSettings {
    fn default() -> Self {
        Self {
            reset_delay_ms: MAGIC_RESET_MS,
            relocation_min_ms: 300,
            relocation_max_ms: 700,
            stagger_max_ms: 50,
            glow_fade_ms: 250.0,
            hazard_fade_ms: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Follow smoothing (per axis)
    pub follow_lerp: Vec2,
    pub transition_ms: f32,
    pub room_panel_ms: f32,
    pub out_of_bounds_panel_ms: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            follow_lerp: Vec2::new(0.5, 0.5),
            transition_ms: CAMERA_TRANSITION_MS,
            room_panel_ms: ROOM_PANEL_MS,
            out_of_bounds_panel_ms: OUT_OF_BOUNDS_PANEL_MS,
        }
    }
}

/// Full simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub footprints: FootprintSettings,
    pub movement: MovementSettings,
    pub hazards: HazardSettings,
    pub magic: MagicSettings,
    pub camera: CameraSettings,
    /// Room entered (without camera easing) when the level starts
    pub start_room: String,
    /// Honour `Debug` spawn objects in the level
    pub debug_spawn: bool,
    /// Seed for every random pick in the simulation
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            footprints: FootprintSettings::default(),
            movement: MovementSettings::default(),
            hazards: HazardSettings::default(),
            magic: MagicSettings::default(),
            camera: CameraSettings::default(),
            start_room: START_ROOM.to_string(),
            debug_spawn: false,
            seed: 0x5EED,
        }
    }
}

impl Settings {
    /// Settings reproducing the earlier revision where footprints melted away
    pub fn with_legacy_expiry(mut self) -> Self {
        self.footprints.expire_after_ms = Some(LEGACY_FOOTPRINT_TTL_MS);
        self
    }

    /// Parse settings from JSON, missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Self::default();
        };

        match std::fs::read_to_string(path).map(|json| Self::from_json(&json)) {
            Ok(Ok(settings)) => {
                log::info!("Loaded settings from {}", path.display());
                settings.warn_if_inconsistent();
                settings
            }
            Ok(Err(e)) => {
                log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }
            Err(e) => {
                log::warn!("Could not read settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    fn warn_if_inconsistent(&self) {
        if !self.movement.max_speed_reachable() {
            log::warn!(
                "Max speed {} unreachable with acceleration {} and friction {}",
                self.movement.max_speed,
                self.movement.acceleration,
                self.movement.friction
            );
        }
        if self.footprints.capacity == 0 {
            log::warn!("Footprint capacity is 0, no footprints will be placed");
        }
    }
}
