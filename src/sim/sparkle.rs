//! One-shot sparkle triggers

use serde::{Deserialize, Serialize};

use super::geom::Rect;

/// Zone that starts a magic transfer the first time the player touches it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sparkle {
    pub id: u32,
    pub area: Rect,
    /// Room the captured footprints travel to
    pub destination: String,
    pub activated: bool,
}

impl Sparkle {
    pub fn new(id: u32, area: Rect, destination: impl Into<String>) -> Self {
        Self {
            id,
            area,
            destination: destination.into(),
            activated: false,
        }
    }

    /// Check the player collider; returns true exactly once, on activation
    pub fn update(&mut self, player: &Rect) -> bool {
        if self.activated || !self.area.intersects(player) {
            return false;
        }
        self.activated = true;
        log::debug!("Sparkle #{} activated", self.id);
        true
    }
}
