//! Frame-stepped simulation
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Elapsed time comes in through `tick`, never from a wall clock
//! - Seeded RNG only
//! - Stable iteration order (registration / placement order)
//! - No rendering or platform dependencies

pub mod camera;
pub mod footprints;
pub mod geom;
pub mod hazard;
pub mod player;
pub mod regions;
pub mod rooms;
pub mod schedule;
pub mod sparkle;
pub mod state;
pub mod tick;

pub use camera::{CameraMode, CameraRig, Hud};
pub use footprints::{FootprintMarker, FootprintPool};
pub use geom::Rect;
pub use hazard::{ActivationCycle, CyclePhase, Hazard, HazardAnim};
pub use player::{KeyState, PawSample, Player, TouchEvent};
pub use regions::{RegionIndex, Room, RoomProperties};
pub use rooms::{Effect, MagicTransferRequest, RoomState, RoomTransitionManager};
pub use schedule::{Easing, Scheduler, TaskHandle};
pub use sparkle::Sparkle;
pub use state::{GameEvent, GameState};
pub use tick::{TickInput, tick};
