//! Camera framing and the HUD room-name panel
//!
//! Both are plain state the renderer reads back every frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;

/// How the camera tracks the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CameraMode {
    /// Camera holds still inside the room bounds
    Static,
    /// Follow the player with per-axis smoothing
    Follow { lerp: Vec2 },
}

/// Camera bounds, zoom and follow mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraRig {
    pub bounds: Rect,
    pub zoom: f32,
    pub mode: CameraMode,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            zoom: 1.0,
            mode: CameraMode::Static,
        }
    }
}

impl CameraRig {
    pub fn stop_follow(&mut self) {
        self.mode = CameraMode::Static;
    }

    pub fn start_follow(&mut self, lerp: Vec2) {
        self.mode = CameraMode::Follow { lerp };
    }

    pub fn is_following(&self) -> bool {
        matches!(self.mode, CameraMode::Follow { .. })
    }
}

/// Transient text panel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hud {
    pub text: String,
    pub shown: bool,
    /// Remaining display time (ms)
    pub timer_ms: f32,
}

impl Hud {
    /// Show `text` for `duration_ms`. Re-showing while up refreshes text and timer.
    pub fn show_panel(&mut self, text: &str, duration_ms: f32) {
        if self.text != text {
            self.text.clear();
            self.text.push_str(text);
        }
        self.timer_ms = duration_ms;
        self.shown = true;
    }

    pub fn hide_panel(&mut self) {
        self.shown = false;
        self.timer_ms = 0.0;
    }

    pub fn update(&mut self, dt_ms: f32) {
        self.timer_ms = (self.timer_ms - dt_ms).max(0.0);
        if self.shown && self.timer_ms <= 0.0 {
            self.hide_panel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_hides_after_duration() {
        let mut hud = Hud::default();
        hud.show_panel("Welcome", 3000.0);
        hud.update(2000.0);
        assert!(hud.shown);
        hud.update(1000.0);
        assert!(!hud.shown);
    }

    #[test]
    fn test_reshow_refreshes_timer() {
        let mut hud = Hud::default();
        hud.show_panel("Welcome", 100.0);
        hud.update(90.0);
        hud.show_panel("Cave", 100.0);
        hud.update(90.0);
        assert!(hud.shown);
        assert_eq!(hud.text, "Cave");
    }

    #[test]
    fn test_follow_toggle() {
        let mut camera = CameraRig::default();
        camera.start_follow(Vec2::splat(0.5));
        assert!(camera.is_following());
        camera.stop_follow();
        assert!(!camera.is_following());
    }
}
