//! Tile model and world/tile coordinate mapping
//!
//! Rows are stacked densely: row `tile_y` covers world Y in
//! `[tile_y * TILE_SIZE, (tile_y + 1) * TILE_SIZE)`. Each row's solid surface
//! sits at the bottom of its cell, so anything standing on row `tile_y` is
//! drawn inside that row's cell.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Contents of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Empty,
    Sand,
    Dirt,
    Stone,
    Gold,
}

impl TileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileKind::Empty => "empty",
            TileKind::Sand => "sand",
            TileKind::Dirt => "dirt",
            TileKind::Stone => "stone",
            TileKind::Gold => "gold",
        }
    }
}

/// Top edge of a row in world pixels
#[inline]
pub fn row_top(tile_y: i32) -> f32 {
    tile_y as f32 * TILE_SIZE
}

/// Y of the walkable surface of a row (top of its collider)
#[inline]
pub fn surface_y(tile_y: i32) -> f32 {
    row_top(tile_y) + TILE_SIZE - COLLIDER_THICKNESS
}

/// Row containing a world Y
#[inline]
pub fn world_to_tile_y(world_y: f32) -> i32 {
    (world_y / TILE_SIZE).floor() as i32
}

/// Horizontal center of a column
#[inline]
pub fn tile_center_x(tile_x: i32) -> f32 {
    (tile_x as f32 + 0.5) * TILE_SIZE
}

/// The row whose surface lies directly beneath a trigger point.
///
/// A point inside a row's cell is above that row's surface, so this is the
/// containing row.
#[inline]
pub fn row_below(world_y: f32) -> i32 {
    world_to_tile_y(world_y)
}

/// Center position for a body of height `height` resting on row `tile_y` in column `tile_x`
#[inline]
pub fn resting_center(tile_x: i32, tile_y: i32, height: f32) -> Vec2 {
    Vec2::new(tile_center_x(tile_x), surface_y(tile_y) - height / 2.0)
}
