//! Row collider store
//!
//! One thin, invisible, full-width static surface per generated row. Shape
//! count grows with rows visited, not tiles visited.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::{row_top, surface_y};
use super::physics::Aabb;
use crate::consts::*;

/// Collision surface of a single row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowCollider {
    pub tile_y: i32,
    pub bounds: Aabb,
}

impl RowCollider {
    pub fn new(tile_y: i32) -> Self {
        let top = surface_y(tile_y);
        Self {
            tile_y,
            bounds: Aabb::new(
                Vec2::new(0.0, top),
                Vec2::new(MAP_WIDTH, row_top(tile_y) + TILE_SIZE),
            ),
        }
    }

    /// Y coordinate bodies rest on
    #[inline]
    pub fn top(&self) -> f32 {
        self.bounds.min.y
    }
}

/// All live row colliders, keyed by row index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowColliderStore {
    rows: BTreeMap<i32, RowCollider>,
}

impl RowColliderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the collider for a row. Returns false if one already exists.
    pub fn add_row(&mut self, tile_y: i32) -> bool {
        if self.rows.contains_key(&tile_y) {
            return false;
        }
        self.rows.insert(tile_y, RowCollider::new(tile_y));
        true
    }

    /// Delete a row's collider, returning it if it existed
    pub fn remove_row(&mut self, tile_y: i32) -> Option<RowCollider> {
        self.rows.remove(&tile_y)
    }

    pub fn has_row(&self, tile_y: i32) -> bool {
        self.rows.contains_key(&tile_y)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Colliders of rows `first..=last`, in ascending row order
    pub fn rows_between(&self, first: i32, last: i32) -> impl Iterator<Item = &RowCollider> {
        let range = if first <= last { first..=last } else { last..=first };
        self.rows.range(range).map(|(_, c)| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_idempotent() {
        let mut store = RowColliderStore::new();
        assert!(store.add_row(4));
        assert!(!store.add_row(4));
        assert_eq!(store.len(), 1);
        assert!(store.has_row(4));
        assert!(store.remove_row(4).is_some());
        assert!(store.remove_row(4).is_none());
        assert!(!store.has_row(4));
    }

    #[test]
    fn test_collider_spans_row_width_at_cell_bottom() {
        let collider = RowCollider::new(2);
        assert_eq!(collider.bounds.min.x, 0.0);
        assert_eq!(collider.bounds.max.x, MAP_WIDTH);
        assert!((collider.bounds.height() - COLLIDER_THICKNESS).abs() < 1e-4);
        assert!((collider.top() - surface_y(2)).abs() < 1e-4);
    }

    #[test]
    fn test_rows_between_is_ordered() {
        let mut store = RowColliderStore::new();
        for row in [5, 1, 3, 9] {
            store.add_row(row);
        }
        let rows: Vec<i32> = store.rows_between(2, 9).map(|c| c.tile_y).collect();
        assert_eq!(rows, vec![3, 5, 9]);
        assert_eq!(store.rows_between(1, 1).count(), 1);
    }
}
