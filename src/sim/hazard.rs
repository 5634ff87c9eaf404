//! Hazards grown from relocated magic footprints
//!
//! Every hazard runs the same cycle, shifted by a phase offset so a field of
//! spikes does not rise in unison:
//!
//! ```text
//! 0        edge           threshold   threshold+edge            period
//! |-lower--|----safe-------|--raise----|---------armed------------|
//! ```
//!
//! The player is only hurt when standing on a spike while it raises; while
//! armed the spike blocks movement.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::footprints::FootprintMarker;
use super::geom::{Rect, circle_intersects_rect};
use crate::settings::HazardSettings;

/// Where in its cycle a hazard is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePhase {
    Lowering,
    Safe,
    Raising,
    Armed,
}

impl CyclePhase {
    pub fn is_armed(&self) -> bool {
        matches!(self, CyclePhase::Raising | CyclePhase::Armed)
    }
}

/// Animation the renderer should be playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardAnim {
    /// One-off grow animation right after conversion
    Spike,
    Lower,
    Raise,
}

/// Shared cycle timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivationCycle {
    pub period_ms: f32,
    pub threshold_ms: f32,
    pub edge_ms: f32,
}

impl ActivationCycle {
    pub fn new(settings: &HazardSettings) -> Self {
        Self {
            period_ms: settings.period_ms,
            threshold_ms: settings.arm_threshold(),
            edge_ms: settings.edge_ms,
        }
    }

    /// Phase offset for the hazard grown from footprint `index` out of `count`
    pub fn offset(&self, index: u64, count: usize) -> f32 {
        if count == 0 {
            return 0.0;
        }
        (index as f64 / count as f64 * self.period_ms as f64).rem_euclid(self.period_ms as f64) as f32
    }

    /// Position within the cycle (ms)
    pub fn position(&self, time_ms: f64, offset_ms: f32) -> f32 {
        if self.period_ms <= 0.0 {
            return 0.0;
        }
        (time_ms + offset_ms as f64).rem_euclid(self.period_ms as f64) as f32
    }

    pub fn phase_at(&self, cycle_ms: f32) -> CyclePhase {
        if cycle_ms >= self.threshold_ms {
            if cycle_ms < self.threshold_ms + self.edge_ms {
                CyclePhase::Raising
            } else {
                CyclePhase::Armed
            }
        } else if cycle_ms < self.edge_ms {
            CyclePhase::Lowering
        } else {
            CyclePhase::Safe
        }
    }
}

/// A converted footprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub marker: FootprintMarker,
    /// Collision circle radius, centred on the marker
    pub radius: f32,
    pub phase: CyclePhase,
    /// Collider enabled (blocks movement)
    pub solid: bool,
    pub anim: HazardAnim,
}

impl Hazard {
    pub fn new(marker: FootprintMarker, radius: f32) -> Self {
        Self {
            marker,
            radius,
            phase: CyclePhase::Safe,
            solid: false,
            anim: HazardAnim::Spike,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.marker.pos
    }

    pub fn armed(&self) -> bool {
        self.phase.is_armed()
    }

    /// Collision circle overlaps `rect` (movement blocking)
    pub fn touches(&self, rect: &Rect) -> bool {
        circle_intersects_rect(self.center(), self.radius, rect)
    }

    /// Sprite overlaps `rect` (hurt check)
    pub fn sprite_overlaps(&self, rect: &Rect) -> bool {
        self.marker.bounds().intersects(rect)
    }

    /// Advance to `time_ms`. Returns true if the player got hurt this tick.
    pub fn update(&mut self, cycle: &ActivationCycle, time_ms: f64, count: usize, player: &Rect) -> bool {
        let offset = cycle.offset(self.marker.index, count);
        self.phase = cycle.phase_at(cycle.position(time_ms, offset));
        self.solid = self.phase.is_armed();

        match self.phase {
            CyclePhase::Lowering => {
                self.anim = HazardAnim::Lower;
                false
            }
            CyclePhase::Raising => {
                self.anim = HazardAnim::Raise;
                self.sprite_overlaps(player)
            }
            CyclePhase::Safe | CyclePhase::Armed => false,
        }
    }
}
