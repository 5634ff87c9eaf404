//! Level description loading
//!
//! Levels are Tiled JSON exports. Two tile layers are required (`Wall` and
//! `Ground`, drawn with the `debugtiles` tileset) plus an `Objects` layer
//! holding rooms, spawn points and sparkles. Missing tilesets or layers abort
//! loading; odd objects are logged and skipped.

use std::collections::HashMap;
use std::path::Path;

use glam::Vec2;
use serde::Deserialize;

use crate::error::LevelError;
use crate::sim::geom::Rect;
use crate::sim::regions::{RegionIndex, Room, RoomProperties};
use crate::sim::sparkle::Sparkle;

/// Tileset every level must use
pub const TILESET_NAME: &str = "debugtiles";
/// Object layer holding rooms and triggers
pub const OBJECT_LAYER: &str = "Objects";

/// Tiled stores flip flags in the top bits of a gid
const GID_MASK: u32 = 0x1FFF_FFFF;

/// The tile layers the simulation knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Collides with the player
    Wall,
    Ground,
}

impl LayerKind {
    pub const ALL: [LayerKind; 2] = [LayerKind::Wall, LayerKind::Ground];

    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Wall => "Wall",
            LayerKind::Ground => "Ground",
        }
    }

    pub fn collides(&self) -> bool {
        matches!(self, LayerKind::Wall)
    }
}

/// Typed tile properties (closed key set, unset keys false)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileProperties {
    pub is_wall: bool,
    pub slippery: bool,
    /// Walking here leaves footprints
    pub footprints: bool,
}

/// A non-empty tile found by a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub gid: u32,
    pub layer: LayerKind,
    pub properties: TileProperties,
}

#[derive(Debug, Clone)]
struct TileLayer {
    kind: LayerKind,
    /// Row-major gids, 0 = empty
    data: Vec<u32>,
}

/// Tile layers of a level, queried in world pixels
#[derive(Debug, Clone)]
pub struct TileMap {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    /// In file order; lookups report tiles in this order
    layers: Vec<TileLayer>,
    properties: HashMap<u32, TileProperties>,
}

impl TileMap {
    /// Empty map with both layers present
    pub fn new(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Self {
        let cells = (width * height) as usize;
        Self {
            width,
            height,
            tile_width,
            tile_height,
            layers: LayerKind::ALL
                .iter()
                .map(|&kind| TileLayer {
                    kind,
                    data: vec![0; cells],
                })
                .collect(),
            properties: HashMap::new(),
        }
    }

    pub fn tile_width(&self) -> f32 {
        self.tile_width as f32
    }

    pub fn tile_height(&self) -> f32 {
        self.tile_height as f32
    }

    /// Whole map in world pixels
    pub fn pixel_bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            (self.width * self.tile_width) as f32,
            (self.height * self.tile_height) as f32,
        )
    }

    /// Paint a tile (gid 0 clears)
    pub fn set_tile(&mut self, layer: LayerKind, col: u32, row: u32, gid: u32) {
        if col >= self.width || row >= self.height {
            return;
        }
        let cell = (row * self.width + col) as usize;
        if let Some(l) = self.layers.iter_mut().find(|l| l.kind == layer) {
            l.data[cell] = gid;
        }
    }

    pub fn set_properties(&mut self, gid: u32, properties: TileProperties) {
        self.properties.insert(gid, properties);
    }

    fn cell_at(&self, world: Vec2) -> Option<usize> {
        if world.x < 0.0 || world.y < 0.0 {
            return None;
        }
        let col = (world.x / self.tile_width as f32).floor() as u32;
        let row = (world.y / self.tile_height as f32).floor() as u32;
        if col >= self.width || row >= self.height {
            return None;
        }
        Some((row * self.width + col) as usize)
    }

    /// Tile on `layer` at a world position
    pub fn tile_at(&self, world: Vec2, layer: LayerKind) -> Option<Tile> {
        self.tiles_at(world).into_iter().find(|t| t.layer == layer)
    }

    /// All non-empty tiles at a world position, in layer order
    pub fn tiles_at(&self, world: Vec2) -> Vec<Tile> {
        let Some(cell) = self.cell_at(world) else {
            return Vec::new();
        };
        self.layers
            .iter()
            .filter_map(|layer| {
                let gid = layer.data[cell] & GID_MASK;
                (gid != 0).then(|| Tile {
                    gid,
                    layer: layer.kind,
                    properties: self.properties.get(&gid).copied().unwrap_or_default(),
                })
            })
            .collect()
    }

    fn is_wall_tile(&self, world: Vec2) -> bool {
        self.tiles_at(world)
            .iter()
            .any(|t| t.layer.collides() || t.properties.is_wall)
    }

    /// Whether a footprint can't sit here: wall tile, wall-flagged tile, or off the map
    pub fn is_wall_blocked(&self, world: Vec2) -> bool {
        self.cell_at(world).is_none() || self.is_wall_tile(world)
    }

    /// Whether any wall cell overlaps `rect`. Cells off the map are ignored.
    pub fn rect_hits_wall(&self, rect: &Rect) -> bool {
        if rect.is_empty() {
            return false;
        }
        let (tw, th) = (self.tile_width(), self.tile_height());
        let span = |lo: f32, hi: f32, size: f32, count: u32| {
            (lo / size).floor().max(0.0) as u32..((hi / size).ceil().max(0.0) as u32).min(count)
        };
        let cols = span(rect.x, rect.right(), tw, self.width);
        let rows = span(rect.y, rect.bottom(), th, self.height);

        rows.flat_map(|row| cols.clone().map(move |col| (col, row)))
            .any(|(col, row)| {
                let center = Vec2::new((col as f32 + 0.5) * tw, (row as f32 + 0.5) * th);
                self.is_wall_tile(center)
            })
    }
}

/// Everything the simulation needs from a level file
#[derive(Debug, Clone)]
pub struct Level {
    pub tiles: TileMap,
    pub regions: RegionIndex,
    pub sparkles: Vec<Sparkle>,
    pub spawn: Option<Vec2>,
    /// Spawn override honoured in debug mode
    pub debug_spawn: Option<Vec2>,
}

#[derive(Deserialize)]
struct RawMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    layers: Vec<RawLayer>,
    #[serde(default)]
    tilesets: Vec<RawTileset>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawLayer {
    #[serde(rename = "tilelayer")]
    Tiles { name: String, data: Vec<u32> },
    #[serde(rename = "objectgroup")]
    Objects { name: String, objects: Vec<RawObject> },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct RawTileset {
    firstgid: u32,
    name: String,
    #[serde(default)]
    tiles: Vec<RawTile>,
}

#[derive(Deserialize)]
struct RawTile {
    id: u32,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

#[derive(Deserialize)]
struct RawObject {
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type", alias = "class")]
    kind: String,
    x: f32,
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

impl RawObject {
    fn area(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

#[derive(Deserialize)]
struct RawProperty {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

fn tile_properties(raw: &[RawProperty]) -> TileProperties {
    let mut props = TileProperties::default();
    for p in raw {
        let flag = p.value.as_bool().unwrap_or(false);
        match p.name.as_str() {
            "isWall" | "is_wall" => props.is_wall = flag,
            "slippery" => props.slippery = flag,
            "footprints" => props.footprints = flag,
            other => log::debug!("Ignoring tile property '{}'", other),
        }
    }
    props
}

fn room_properties(raw: &[RawProperty]) -> RoomProperties {
    let mut props = RoomProperties::default();
    for p in raw {
        match p.name.as_str() {
            "staticCamera" | "static_camera" => {
                props.static_camera = p.value.as_bool().unwrap_or(false)
            }
            "zoom" => {
                props.zoom = p.value.as_f64().map(|z| z as f32).unwrap_or(props.zoom)
            }
            other => log::debug!("Ignoring room property '{}'", other),
        }
    }
    props
}

impl Level {
    /// Read and parse a level file
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        let level = Self::from_json(&json)?;
        log::info!(
            "Loaded level {} ({} rooms, {} sparkles)",
            path.display(),
            level.regions.len(),
            level.sparkles.len()
        );
        Ok(level)
    }

    /// Parse a Tiled JSON level
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let raw: RawMap = serde_json::from_str(json)?;

        if raw.tilewidth == 0 || raw.tileheight == 0 {
            return Err(LevelError::InvalidTileSize {
                width: raw.tilewidth,
                height: raw.tileheight,
            });
        }

        let tileset = raw
            .tilesets
            .iter()
            .find(|t| t.name == TILESET_NAME)
            .ok_or_else(|| LevelError::MissingTileset(TILESET_NAME.to_string()))?;

        let mut tiles = TileMap::new(raw.width, raw.height, raw.tilewidth, raw.tileheight);
        tiles.layers.clear();
        for t in &tileset.tiles {
            tiles.set_properties(tileset.firstgid + t.id, tile_properties(&t.properties));
        }

        let cells = (raw.width * raw.height) as usize;
        for kind in LayerKind::ALL {
            let data = raw
                .layers
                .iter()
                .find_map(|layer| match layer {
                    RawLayer::Tiles { name, data } if name == kind.name() => Some(data),
                    _ => None,
                })
                .ok_or_else(|| LevelError::MissingLayer(kind.name().to_string()))?;

            if data.len() != cells {
                return Err(LevelError::MalformedLayer {
                    name: kind.name().to_string(),
                    expected: cells,
                    actual: data.len(),
                });
            }
            tiles.layers.push(TileLayer {
                kind,
                data: data.clone(),
            });
        }

        let mut level = Level {
            tiles,
            regions: RegionIndex::new(),
            sparkles: Vec::new(),
            spawn: None,
            debug_spawn: None,
        };

        let objects = raw.layers.iter().find_map(|layer| match layer {
            RawLayer::Objects { name, objects } if name == OBJECT_LAYER => Some(objects),
            _ => None,
        });

        match objects {
            Some(objects) => objects.iter().for_each(|obj| level.add_object(obj)),
            None => log::warn!("Level has no '{}' layer, no rooms defined", OBJECT_LAYER),
        }

        Ok(level)
    }

    fn add_object(&mut self, obj: &RawObject) {
        match obj.kind.as_str() {
            "Room" => self.regions.register_room(Room {
                name: obj.name.clone(),
                area: obj.area(),
                properties: room_properties(&obj.properties),
            }),
            "Spawn" => self.spawn = Some(Vec2::new(obj.x, obj.y)),
            "Debug" => self.debug_spawn = Some(Vec2::new(obj.x, obj.y)),
            "Sparkle" => {
                let destination = obj
                    .property("destination")
                    .and_then(|v| v.as_str())
                    .filter(|d| !d.is_empty());
                match destination {
                    Some(destination) => self
                        .sparkles
                        .push(Sparkle::new(obj.id, obj.area(), destination)),
                    None => log::warn!("Sparkle #{} has no destination", obj.id),
                }
            }
            // Placed in the editor, no behaviour yet
            "Trigger" => {}
            other => log::warn!("Unknown object type '{}' (object #{})", other, obj.id),
        }
    }

    /// Where the player starts
    pub fn spawn_point(&self, debug: bool) -> Option<Vec2> {
        if debug {
            self.debug_spawn.or(self.spawn)
        } else {
            self.spawn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn level_json() -> serde_json::Value {
        // 4x2 tiles of 64px; wall along column 3
        json!({
            "width": 4, "height": 2, "tilewidth": 64, "tileheight": 64,
            "tilesets": [{
                "firstgid": 1, "name": "debugtiles",
                "tiles": [
                    { "id": 0, "properties": [{ "name": "footprints", "type": "bool", "value": true }] },
                    { "id": 1, "properties": [
                        { "name": "slippery", "type": "bool", "value": true },
                        { "name": "footprints", "type": "bool", "value": true }
                    ] }
                ]
            }],
            "layers": [
                { "type": "tilelayer", "name": "Wall", "data": [0, 0, 0, 3, 0, 0, 0, 3] },
                { "type": "tilelayer", "name": "Ground", "data": [1, 1, 2, 0, 1, 1, 2, 0] },
                { "type": "objectgroup", "name": "Objects", "objects": [
                    { "id": 1, "name": "Welcome", "type": "Room", "x": 0, "y": 0, "width": 128, "height": 128,
                      "properties": [{ "name": "zoom", "type": "float", "value": 1.5 }] },
                    { "id": 2, "name": "Cave", "type": "Room", "x": 128, "y": 0, "width": 128, "height": 128,
                      "properties": [{ "name": "staticCamera", "type": "bool", "value": true }] },
                    { "id": 3, "name": "", "type": "Spawn", "x": 40, "y": 60 },
                    { "id": 4, "name": "", "type": "Sparkle", "x": 10, "y": 10, "width": 20, "height": 20,
                      "properties": [{ "name": "destination", "type": "string", "value": "Cave" }] },
                    { "id": 5, "name": "", "type": "Sparkle", "x": 10, "y": 10, "width": 20, "height": 20 },
                    { "id": 6, "name": "", "type": "Trigger", "x": 0, "y": 0 },
                    { "id": 7, "name": "", "type": "Mystery", "x": 0, "y": 0 }
                ]},
                { "type": "imagelayer", "name": "Backdrop" }
            ]
        })
    }

    #[test]
    fn test_loads_rooms_sparkles_and_spawn() {
        let level = Level::from_json(&level_json().to_string()).unwrap();

        assert_eq!(level.regions.len(), 2);
        let welcome = level.regions.get("Welcome").unwrap();
        assert_eq!(welcome.properties.zoom, 1.5);
        assert!(!welcome.properties.static_camera);
        assert!(level.regions.get("Cave").unwrap().properties.static_camera);

        // The sparkle without a destination is skipped
        assert_eq!(level.sparkles.len(), 1);
        assert_eq!(level.sparkles[0].destination, "Cave");
        assert_eq!(level.spawn_point(false), Some(Vec2::new(40.0, 60.0)));
        assert_eq!(level.spawn_point(true), Some(Vec2::new(40.0, 60.0)));
    }

    #[test]
    fn test_tile_lookup() {
        let level = Level::from_json(&level_json().to_string()).unwrap();
        let tiles = &level.tiles;

        let ground = tiles.tile_at(Vec2::new(10.0, 10.0), LayerKind::Ground).unwrap();
        assert!(ground.properties.footprints);
        assert!(!ground.properties.slippery);

        let icy = tiles.tile_at(Vec2::new(130.0, 70.0), LayerKind::Ground).unwrap();
        assert!(icy.properties.slippery);

        assert!(tiles.is_wall_blocked(Vec2::new(200.0, 10.0)));
        assert!(!tiles.is_wall_blocked(Vec2::new(10.0, 10.0)));
        assert!(tiles.is_wall_blocked(Vec2::new(-1.0, 10.0)));
        assert!(tiles.is_wall_blocked(Vec2::new(10.0, 500.0)));
        assert_eq!(tiles.pixel_bounds(), Rect::new(0.0, 0.0, 256.0, 128.0));
    }

    #[test]
    fn test_missing_tileset_is_fatal() {
        let mut value = level_json();
        value["tilesets"][0]["name"] = json!("othertiles");
        let err = Level::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, LevelError::MissingTileset(_)));
    }

    #[test]
    fn test_missing_layer_is_fatal() {
        let mut value = level_json();
        value["layers"][0]["name"] = json!("Walls");
        let err = Level::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, LevelError::MissingLayer(ref name) if name == "Wall"));
    }

    #[test]
    fn test_short_layer_is_fatal() {
        let mut value = level_json();
        value["layers"][1]["data"] = json!([1, 1]);
        let err = Level::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, LevelError::MalformedLayer { expected: 8, actual: 2, .. }));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(Level::from_json("{ nope"), Err(LevelError::Parse(_))));
    }

    #[test]
    fn test_flip_bits_ignored() {
        let mut map = TileMap::new(1, 1, 64, 64);
        map.set_tile(LayerKind::Ground, 0, 0, 0x8000_0001);
        map.set_properties(1, TileProperties { footprints: true, ..Default::default() });
        let tile = map.tile_at(Vec2::new(5.0, 5.0), LayerKind::Ground).unwrap();
        assert_eq!(tile.gid, 1);
        assert!(tile.properties.footprints);
    }

    #[test]
    fn test_rect_hits_wall() {
        let mut tiles = TileMap::new(4, 2, 64, 64);
        tiles.set_tile(LayerKind::Wall, 2, 0, 9);

        assert!(tiles.rect_hits_wall(&Rect::new(100.0, 10.0, 40.0, 20.0)));
        // Touching the wall cell's edge is not overlap
        assert!(!tiles.rect_hits_wall(&Rect::new(88.0, 10.0, 40.0, 20.0)));
        assert!(!tiles.rect_hits_wall(&Rect::new(130.0, 70.0, 40.0, 20.0)));
        assert!(!tiles.rect_hits_wall(&Rect::new(-50.0, -50.0, 20.0, 20.0)));
    }

    #[test]
    fn test_bundled_demo_level() {
        let level = Level::from_json(include_str!("../assets/levels/demo.json")).unwrap();
        assert_eq!(level.regions.len(), 2);
        assert!(level.regions.get("Welcome").unwrap().properties.static_camera);
        assert_eq!(level.regions.get("Cave").unwrap().properties.zoom, 1.5);
        assert_eq!(level.sparkles.len(), 1);
        assert_eq!(level.sparkles[0].destination, "Cave");
        assert_eq!(level.spawn, Some(Vec2::new(160.0, 320.0)));

        let ice = level.tiles.tile_at(Vec2::new(800.0, 420.0), LayerKind::Ground).unwrap();
        assert!(ice.properties.slippery);
        assert!(level.tiles.is_wall_blocked(Vec2::new(660.0, 100.0)));
    }
}
