//! Load-time configuration errors
//!
//! Only level construction can fail. Once a `GameState` exists, per-frame code
//! logs and degrades instead of returning errors.

use thiserror::Error;

/// Failure to build a level from its description
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed level description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tileset `{0}` not found in level")]
    MissingTileset(String),

    #[error("tile layer `{0}` not found in level")]
    MissingLayer(String),

    #[error("tile layer `{name}` holds {actual} tiles, expected {expected}")]
    MalformedLayer {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("level tile size must be positive, got {width}x{height}")]
    InvalidTileSize { width: u32, height: u32 },
}
