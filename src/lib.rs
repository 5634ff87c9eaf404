//! Pawtrail - room transitions and magic footprints for a top-down snow game
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (rooms, footprints, hazards, player)
//! - `level`: Level description loading and tile lookup
//! - `settings`: Data-driven tuning
//! - `error`: Load-time configuration errors

pub mod error;
pub mod level;
pub mod settings;
pub mod sim;

pub use error::LevelError;
pub use level::{Level, TileMap};
pub use settings::Settings;

/// Game configuration constants (defaults for `Settings`)
pub mod consts {
    /// Maximum live footprints in the pool
    pub const FOOTPRINT_CAPACITY: usize = 40;
    /// Distance walked between two footprints (pixels)
    pub const FOOTPRINT_SPACING: f32 = 100.0;
    /// Timeout used by the earlier revision when footprints still expired (ms)
    pub const LEGACY_FOOTPRINT_TTL_MS: f32 = 10_000.0;

    /// Player acceleration per tick of full input
    pub const ACCELERATION: f32 = 150.0;
    /// Player speed cap (pixels/s)
    pub const MAX_SPEED: f32 = 400.0;
    /// Velocity retained per tick
    pub const FRICTION: f32 = 0.7;
    /// Velocity retained per tick on slippery ground
    pub const SLIPPERY_FRICTION: f32 = 0.95;
    /// Window after a tap-in-place during which velocity is frozen (ms)
    pub const TAPPING_TIMER_MS: f32 = 200.0;
    /// Touch drag delta is divided by this to get an input vector
    pub const TOUCH_DIVISOR: f32 = 50.0;
    /// Touches closer than this to the player count as touching its body
    pub const TOUCH_BODY_RADIUS: f32 = 200.0;
    /// Input axis magnitude below which facing is left alone
    pub const FACING_DEADZONE: f32 = 0.05;

    /// Hazard activation cycle length (ms)
    pub const HAZARD_PERIOD_MS: f32 = 5500.0;
    /// Fraction of the cycle a hazard spends lowered before arming
    pub const HAZARD_SAFE_FRACTION: f32 = 0.25;
    /// Length of the lower/raise animation windows (ms)
    pub const HAZARD_EDGE_MS: f32 = 100.0;
    /// Hazard collision radius as a fraction of tile width
    pub const HAZARD_RADIUS_FACTOR: f32 = 0.6;
    /// Player hurt tint duration (ms)
    pub const HURT_TINT_MS: f32 = 500.0;

    /// Delay before a consumed magic transfer is cleared (ms)
    pub const MAGIC_RESET_MS: f32 = 3000.0;
    /// Footprint sprite size, used for marker bounds (pixels)
    pub const FOOTPRINT_SIZE: f32 = 30.0;

    /// Camera room transition duration (ms)
    pub const CAMERA_TRANSITION_MS: f32 = 200.0;
    /// How long the room name panel stays up (ms)
    pub const ROOM_PANEL_MS: f32 = 3000.0;
    /// How long the out-of-bounds notice stays up, refreshed every tick (ms)
    pub const OUT_OF_BOUNDS_PANEL_MS: f32 = 100.0;

    /// Nominal frame step (ms); `tick` accepts any delta
    pub const SIM_DT_MS: f32 = 1000.0 / 60.0;

    /// Room the player starts in
    pub const START_ROOM: &str = "Welcome";

    /// Neutral footprint tint (rgb 96, 97, 84)
    pub const NEUTRAL_TINT: u32 = 0x606154;
    /// No tint
    pub const WHITE: u32 = 0xFFFFFF;
    /// Starting alpha of a freshly magical footprint
    pub const MAGIC_START_ALPHA: f32 = 42.0 / 256.0;
    /// Palette a magical footprint picks its glow from
    pub const RAINBOW: [u32; 7] = [
        0xFF8A8A, 0xFFC48A, 0xFFF38A, 0x9DFF8A, 0x8AD8FF, 0x9E8AFF, 0xE58AFF,
    ];
}

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Interpolate two packed 0xRRGGBB colours channel-wise
pub fn lerp_rgb(from: u32, to: u32, t: f32) -> u32 {
    let channel = |c: u32, shift: u32| ((c >> shift) & 0xFF) as f32;
    let mix = |shift: u32| {
        lerp(channel(from, shift), channel(to, shift), t)
            .round()
            .clamp(0.0, 255.0) as u32
    };
    (mix(16) << 16) | (mix(8) << 8) | mix(0)
}

/// Convert HSL (all components 0..=1) to packed 0xRRGGBB
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> u32 {
    if s <= 0.0 {
        let v = (l * 255.0).round() as u32;
        return (v << 16) | (v << 8) | v;
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let hue = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    let to_byte = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u32;
    (to_byte(hue(h + 1.0 / 3.0)) << 16) | (to_byte(hue(h)) << 8) | to_byte(hue(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_rgb_endpoints() {
        assert_eq!(lerp_rgb(0x000000, 0xFFFFFF, 0.0), 0x000000);
        assert_eq!(lerp_rgb(0x000000, 0xFFFFFF, 1.0), 0xFFFFFF);
        assert_eq!(lerp_rgb(0x000000, 0x0000FF, 0.5), 0x000080);
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), 0xFF0000);
        assert_eq!(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), 0x00FF00);
        assert_eq!(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), 0x0000FF);
        assert_eq!(hsl_to_rgb(0.0, 0.0, 1.0), 0xFFFFFF);
    }
}
