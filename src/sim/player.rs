//! Player movement controller
//!
//! Turns keyboard or touch input into velocity, integrates position and
//! reports when enough distance has been walked for a new footprint.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use crate::settings::{MovementSettings, SpacingMode};

/// Directional keys held this tick (WASD and arrows already merged)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl KeyState {
    /// Each axis summed to -1, 0 or 1
    pub fn axis(&self) -> Vec2 {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.down as i8 - self.up as i8) as f32;
        Vec2::new(x, y)
    }
}

/// Pointer events in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TouchEvent {
    Start(Vec2),
    Drag(Vec2),
    End(Vec2),
    /// Another pointer went down while one is already held
    SecondaryStart(Vec2),
}

/// Which way the player last moved on each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facing {
    pub right: bool,
    pub down: bool,
}

impl Default for Facing {
    fn default() -> Self {
        Self {
            right: true,
            down: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Foot {
    Left,
    Right,
}

impl Foot {
    fn other(self) -> Self {
        match self {
            Foot::Left => Foot::Right,
            Foot::Right => Foot::Left,
        }
    }

    fn side(self) -> f32 {
        match self {
            Foot::Left => -1.0,
            Foot::Right => 1.0,
        }
    }
}

/// Where the planted foot is, for placing a footprint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PawSample {
    pub pos: Vec2,
    pub facing_right: bool,
    pub tilt: f32,
    pub foot: Foot,
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Clamped input of the last update (magnitude <= 1)
    pub input: Vec2,
    pub facing: Facing,
    /// Standing on slippery ground
    pub slipping: bool,
    /// Hurt tint showing
    pub hurt: bool,
    /// Total distance walked (pixels)
    pub distance_walked: f32,
    settings: MovementSettings,
    spacing: f32,
    spacing_mode: SpacingMode,
    since_footprint: f32,
    touched: bool,
    tapped: bool,
    tapped_timer_ms: f32,
    touch_pos: Vec2,
    next_foot: Foot,
}

impl Player {
    pub fn new(pos: Vec2, settings: MovementSettings, spacing: f32, spacing_mode: SpacingMode) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            input: Vec2::ZERO,
            facing: Facing::default(),
            slipping: false,
            hurt: false,
            distance_walked: 0.0,
            settings,
            spacing,
            spacing_mode,
            since_footprint: 0.0,
            touched: false,
            tapped: false,
            tapped_timer_ms: 0.0,
            touch_pos: Vec2::ZERO,
            next_foot: Foot::Left,
        }
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn is_tapped(&self) -> bool {
        self.tapped
    }

    /// Collision rectangle centred on the player
    pub fn collider(&self) -> Rect {
        Rect::from_center(self.pos, self.settings.collider_size)
    }

    fn raw_input(&self, keys: &KeyState) -> Vec2 {
        if self.touched {
            (self.touch_pos - self.pos) / self.settings.touch_divisor
        } else {
            keys.axis()
        }
    }

    /// Advance one tick. Returns true when a footprint should be placed.
    pub fn update(&mut self, keys: &KeyState, dt_ms: f32, bounds: Option<&Rect>) -> bool {
        let prev = self.pos;
        self.integrate(keys, dt_ms, bounds);
        self.track_distance(prev)
    }

    /// Velocity, position and facing for one tick, without trail bookkeeping
    pub fn integrate(&mut self, keys: &KeyState, dt_ms: f32, bounds: Option<&Rect>) {
        self.input = self.raw_input(keys).clamp_length_max(1.0);

        if self.tapped {
            self.tapped_timer_ms -= dt_ms;
            if self.tapped_timer_ms <= 0.0 {
                self.tapped = false;
            }
        } else {
            let friction = if self.slipping {
                self.settings.slippery_friction
            } else {
                self.settings.friction
            };
            self.vel = (self.vel * friction + self.input * self.settings.acceleration)
                .clamp_length_max(self.settings.max_speed);
        }

        self.pos += self.vel * dt_ms / 1000.0;

        let deadzone = crate::consts::FACING_DEADZONE;
        if self.input.x.abs() > deadzone {
            self.facing.right = self.input.x >= 0.0;
        }
        if self.input.y.abs() > deadzone {
            self.facing.down = self.input.y >= 0.0;
        }

        if let Some(bounds) = bounds {
            self.pos = bounds.clamp_point(self.pos);
        }
    }

    /// Count the distance covered since `prev`. Returns true when a footprint is due.
    pub fn track_distance(&mut self, prev: Vec2) -> bool {
        let moved = prev.distance(self.pos);
        self.distance_walked += moved;
        self.since_footprint += moved;

        if self.spacing > 0.0 && self.since_footprint >= self.spacing {
            self.since_footprint = self.spacing_mode.consume(self.since_footprint, self.spacing);
            return true;
        }
        false
    }

    fn touch_inside_body(&self, at: Vec2) -> bool {
        self.pos.distance(at) < self.settings.touch_body_radius
    }

    /// Feed a pointer event. Returns true when it triggers the action.
    pub fn handle_touch(&mut self, event: TouchEvent) -> bool {
        match event {
            TouchEvent::Start(at) => {
                self.touched = true;
                self.tapped = false;
                self.touch_pos = at;
                if self.touch_inside_body(at) {
                    self.tapped = true;
                    self.tapped_timer_ms = self.settings.tap_window_ms;
                }
                false
            }
            TouchEvent::Drag(at) => {
                self.touch_pos = at;
                if self.tapped && !self.touch_inside_body(at) {
                    self.tapped = false;
                }
                false
            }
            TouchEvent::End(_) => {
                let action = self.tapped && self.tapped_timer_ms > 0.0;
                self.touched = false;
                self.tapped = false;
                action
            }
            TouchEvent::SecondaryStart(_) => self.touched && !self.tapped,
        }
    }

    /// Sample the planted paw; alternates feet on every call
    pub fn paw(&mut self) -> PawSample {
        let foot = self.next_foot;
        self.next_foot = foot.other();

        let offset = Vec2::new(self.settings.paw_offset.x * foot.side(), self.settings.paw_offset.y);
        let tilt = if self.facing.right {
            self.settings.paw_tilt
        } else {
            -self.settings.paw_tilt
        };

        PawSample {
            pos: self.pos + offset,
            facing_right: self.facing.right,
            tilt,
            foot,
        }
    }
}
