//! Named room regions and "which room is this in" queries
//!
//! Rooms are immutable once the level is loaded. Lookups scan in reverse
//! registration order so that when regions overlap, the one registered last
//! wins. Keep the storage ordered: the tie-break depends on it.

use serde::{Deserialize, Serialize};

use super::geom::Rect;

/// Typed room properties (closed key set, explicit defaults)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomProperties {
    /// Camera stays put instead of following the player
    pub static_camera: bool,
    pub zoom: f32,
}

impl Default for RoomProperties {
    fn default() -> Self {
        Self {
            static_camera: false,
            zoom: 1.0,
        }
    }
}

/// A named rectangular room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub area: Rect,
    pub properties: RoomProperties,
}

/// Ordered collection of rooms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionIndex {
    rooms: Vec<Room>,
}

impl RegionIndex {
    pub fn new() -> Self {
        Self { rooms: Vec::new() }
    }

    /// Register a room with default properties
    pub fn register(&mut self, name: impl Into<String>, area: Rect) {
        self.register_room(Room {
            name: name.into(),
            area,
            properties: RoomProperties::default(),
        });
    }

    /// Register a room. Re-registering a name replaces the old entry and moves
    /// it to the end of the lookup order.
    pub fn register_room(&mut self, room: Room) {
        if let Some(pos) = self.rooms.iter().position(|r| r.name == room.name) {
            log::warn!("Room '{}' registered twice, keeping the later one", room.name);
            self.rooms.remove(pos);
        }
        self.rooms.push(room);
    }

    /// Name of the last-registered room intersecting `rect`
    pub fn region_containing(&self, rect: &Rect) -> Option<&str> {
        self.rooms
            .iter()
            .rev()
            .find(|room| room.area.intersects(rect))
            .map(|room| room.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.name == name)
    }

    pub fn area(&self, name: &str) -> Option<Rect> {
        self.get(name).map(|r| r.area)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Rooms in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }
}
