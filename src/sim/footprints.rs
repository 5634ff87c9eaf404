//! Footprint markers and the bounded pool that recycles them
//!
//! Markers get a monotonically increasing index when placed. Once the pool is
//! full, the active marker with the smallest index is recycled. Magical
//! markers are withdrawn: the pool hands over ownership and forgets them, so
//! they neither count toward capacity nor get evicted.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use super::regions::RegionIndex;
use crate::consts::{FOOTPRINT_SIZE, WHITE};

/// A single footprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintMarker {
    /// Placement order, unique among live markers
    pub index: u64,
    pub pos: Vec2,
    /// Facing right (sprite not mirrored)
    pub facing_right: bool,
    /// Rotation (radians)
    pub rotation: f32,
    /// Room under the marker, refreshed every tick
    pub room: Option<String>,
    pub active: bool,
    /// Time since placement (ms)
    pub alive_ms: f32,
    pub magical: bool,
    /// Packed 0xRRGGBB tint
    pub tint: u32,
    pub alpha: f32,
    /// Sprite edge length (pixels)
    pub size: f32,
}

impl FootprintMarker {
    pub fn new(index: u64, pos: Vec2, facing_right: bool, tilt: f32) -> Self {
        Self {
            index,
            pos,
            facing_right,
            rotation: tilt,
            room: None,
            active: true,
            alive_ms: 0.0,
            magical: false,
            tint: WHITE,
            alpha: 1.0,
            size: FOOTPRINT_SIZE,
        }
    }

    /// Put a recycled marker back into service
    fn reset(&mut self, index: u64, pos: Vec2, facing_right: bool, tilt: f32, size: f32) {
        *self = Self::new(index, pos, facing_right, tilt);
        self.size = size;
    }

    /// Sprite bounds centred on the marker
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.pos, Vec2::splat(self.size))
    }

    /// Recompute which room the marker lies in
    pub fn refresh_room(&mut self, regions: &RegionIndex) {
        self.room = regions
            .region_containing(&Rect::point(self.pos))
            .map(str::to_string);
    }

    /// Magical markers slowly spin, direction and speed keyed off the index
    pub fn spin(&mut self, dt_ms: f32) {
        if self.magical {
            self.rotation += ((self.index % 5) as f32 - 2.5) * dt_ms * 1e-3;
        }
    }
}

/// Bounded footprint pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintPool {
    capacity: usize,
    slots: Vec<FootprintMarker>,
    /// Next index to hand out (also total footprints ever placed)
    next_index: u64,
    /// Expire non-magical markers after this long, if set
    expire_after_ms: Option<f32>,
    marker_size: f32,
}

impl FootprintPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            next_index: 0,
            expire_after_ms: None,
            marker_size: FOOTPRINT_SIZE,
        }
    }

    /// Enable (or disable) time-based expiry
    pub fn with_expiry(mut self, expire_after_ms: Option<f32>) -> Self {
        self.expire_after_ms = expire_after_ms;
        self
    }

    /// Sprite size given to every marker placed from now on
    pub fn with_marker_size(mut self, size: f32) -> Self {
        self.marker_size = size;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Footprints ever placed
    pub fn total_placed(&self) -> u64 {
        self.next_index
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|m| m.active).count()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Place a footprint, recycling the oldest one when the pool is full.
    /// Returns the new marker's index.
    pub fn request_marker(&mut self, pos: Vec2, facing_right: bool, tilt: f32) -> Option<u64> {
        if self.capacity == 0 {
            return None;
        }

        let slot = if let Some(free) = self.slots.iter().position(|m| !m.active) {
            free
        } else if !self.is_full() {
            self.slots
                .push(FootprintMarker::new(self.next_index, pos, facing_right, tilt));
            self.slots.len() - 1
        } else {
            match self.oldest_active_slot() {
                Some(oldest) => oldest,
                None => {
                    log::warn!("Footprint pool full but no active marker to recycle");
                    return None;
                }
            }
        };

        let index = self.next_index;
        self.next_index += 1;
        self.slots[slot].reset(index, pos, facing_right, tilt, self.marker_size);
        Some(index)
    }

    fn oldest_active_slot(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, m)| m.active)
            .min_by_key(|(_, m)| m.index)
            .map(|(slot, _)| slot)
    }

    /// Take a marker out of the pool, freeing its capacity
    pub fn withdraw(&mut self, index: u64) -> Option<FootprintMarker> {
        let slot = self
            .slots
            .iter()
            .position(|m| m.active && m.index == index)?;
        Some(self.slots.swap_remove(slot))
    }

    /// Withdraw every active marker currently in `room`, oldest first
    pub fn withdraw_room(&mut self, room: &str) -> Vec<FootprintMarker> {
        let indices: Vec<u64> = self.markers_in_room(room).map(|m| m.index).collect();
        indices
            .into_iter()
            .filter_map(|index| self.withdraw(index))
            .collect()
    }

    /// Advance marker clocks and refresh their rooms
    pub fn tick(&mut self, dt_ms: f32, regions: &RegionIndex) {
        for marker in self.slots.iter_mut().filter(|m| m.active) {
            marker.alive_ms += dt_ms;
            if let Some(ttl) = self.expire_after_ms {
                if marker.alive_ms > ttl {
                    marker.active = false;
                    continue;
                }
            }
            marker.refresh_room(regions);
        }
    }

    /// Active markers in `room`, ordered by index
    pub fn markers_in_room<'a>(&'a self, room: &'a str) -> impl Iterator<Item = &'a FootprintMarker> {
        let mut found: Vec<&FootprintMarker> = self
            .slots
            .iter()
            .filter(|m| m.active && m.room.as_deref() == Some(room))
            .collect();
        found.sort_by_key(|m| m.index);
        found.into_iter()
    }

    pub fn get(&self, index: u64) -> Option<&FootprintMarker> {
        self.slots.iter().find(|m| m.active && m.index == index)
    }

    /// Active markers in slot order
    pub fn iter(&self) -> impl Iterator<Item = &FootprintMarker> {
        self.slots.iter().filter(|m| m.active)
    }
}
