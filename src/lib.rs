//! Deep Dig - a dig-downward arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, physics, entities, game state)
//! - `tuning`: Data-driven game balance

pub mod sim;
pub mod tuning;

pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 6;

    /// Edge length of one tile in pixels
    pub const TILE_SIZE: f32 = 32.0;
    /// Playfield width in tiles (every row spans the full width)
    pub const MAP_WIDTH_TILES: i32 = 12;
    /// Playfield width in pixels
    pub const MAP_WIDTH: f32 = MAP_WIDTH_TILES as f32 * TILE_SIZE;

    /// Thickness of a row's collision surface, flush with the bottom of the row
    pub const COLLIDER_THICKNESS: f32 = 4.0;

    /// Downward acceleration (pixels/s²)
    pub const GRAVITY: f32 = 900.0;
    /// Terminal fall speed
    pub const MAX_FALL_SPEED: f32 = 700.0;

    /// Entity footprints (full width, full height)
    pub const PLAYER_SIZE: (f32, f32) = (20.0, 24.0);
    pub const BOULDER_SIZE: (f32, f32) = (26.0, 26.0);
    pub const ENEMY_SIZE: (f32, f32) = (22.0, 18.0);
    pub const SPIKE_SIZE: (f32, f32) = (24.0, 12.0);
    pub const TNT_SIZE: (f32, f32) = (16.0, 20.0);
    pub const COIN_SIZE: (f32, f32) = (12.0, 12.0);
}

/// Sign of the horizontal direction from `from` to `to` (never zero)
#[inline]
pub fn direction_toward(from: f32, to: f32) -> f32 {
    if to >= from { 1.0 } else { -1.0 }
}
