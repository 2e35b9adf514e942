//! Row-based terrain generator
//!
//! Rows are produced ahead of the camera in fixed-size chunks. Each chunk is
//! built in two passes: first tiles and colliders for every row, then the
//! spawn policy for every row, so occupancy checks always see the finished
//! geometry of the whole chunk.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::colliders::RowColliderStore;
use super::grid::{TileKind, row_top};
use super::spawn;
use super::state::GameState;
use crate::consts::*;
use crate::tuning::TerrainTuning;

/// Row index of the forced starting platform
pub const PLATFORM_ROW: i32 = 0;

/// How a row's tiles are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    /// All sand, no hazards (platform and the rows just under it)
    Safe,
    /// Probabilistic tiles
    Random,
}

/// One generated row of tiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub tile_y: i32,
    pub tiles: Vec<TileKind>,
}

/// Generated rows, their colliders and the generation frontier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    rows: BTreeMap<i32, Row>,
    /// Rows that were generated and later cleared; never regenerated
    cleared: BTreeSet<i32>,
    pub colliders: RowColliderStore,
    /// First row index not generated yet
    next_row: i32,
    /// Deepest row that is sand-only and spawn-free
    safe_until_row: i32,
}

impl Default for Terrain {
    fn default() -> Self {
        Self::new()
    }
}

impl Terrain {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            cleared: BTreeSet::new(),
            colliders: RowColliderStore::new(),
            next_row: PLATFORM_ROW,
            safe_until_row: PLATFORM_ROW,
        }
    }

    /// World Y below which nothing has been generated (the frontier)
    pub fn generated_rows_max_y(&self) -> f32 {
        row_top(self.next_row)
    }

    /// Depth is measured from the top of the platform row
    pub fn origin_y(&self) -> f32 {
        row_top(PLATFORM_ROW)
    }

    pub fn next_row(&self) -> i32 {
        self.next_row
    }

    /// Row currently holds tiles and a collider
    pub fn is_generated(&self, tile_y: i32) -> bool {
        self.rows.contains_key(&tile_y)
    }

    /// Platform and safe rows never receive hazards
    pub fn is_spawn_exempt(&self, tile_y: i32) -> bool {
        tile_y <= self.safe_until_row
    }

    pub fn row(&self, tile_y: i32) -> Option<&Row> {
        self.rows.get(&tile_y)
    }

    /// Create tiles and collider for one row.
    ///
    /// No-op (returns false) outside the map or for rows that were already
    /// generated or cleared.
    pub fn generate_row(
        &mut self,
        tile_y: i32,
        style: RowStyle,
        rng: &mut Pcg32,
        tuning: &TerrainTuning,
    ) -> bool {
        if tile_y < PLATFORM_ROW || tile_y >= tuning.map_height_rows {
            return false;
        }
        if self.rows.contains_key(&tile_y) || self.cleared.contains(&tile_y) {
            return false;
        }

        let tiles = (0..MAP_WIDTH_TILES)
            .map(|_| match style {
                RowStyle::Safe => TileKind::Sand,
                RowStyle::Random => choose_tile(rng, tuning),
            })
            .collect();

        self.rows.insert(tile_y, Row { tile_y, tiles });
        self.colliders.add_row(tile_y);
        self.next_row = self.next_row.max(tile_y + 1);
        if style == RowStyle::Safe {
            self.safe_until_row = self.safe_until_row.max(tile_y);
        }
        true
    }

    /// Remove a row's tiles and collider, returning the prior tiles.
    ///
    /// Returns None if the row does not exist (never generated or already cleared).
    pub fn clear_row(&mut self, tile_y: i32) -> Option<Vec<TileKind>> {
        let row = self.rows.remove(&tile_y)?;
        self.colliders.remove_row(tile_y);
        self.cleared.insert(tile_y);
        Some(row.tiles)
    }
}

/// Sand by default; sometimes dirt or stone, rarely gold
fn choose_tile(rng: &mut Pcg32, tuning: &TerrainTuning) -> TileKind {
    if rng.random::<f32>() < tuning.special_tile_chance {
        if rng.random::<bool>() {
            TileKind::Dirt
        } else {
            TileKind::Stone
        }
    } else if rng.random::<f32>() < tuning.gold_tile_chance {
        TileKind::Gold
    } else {
        TileKind::Sand
    }
}

/// Generate `rows` in two passes: geometry for all, then spawns for all
fn generate_rows(state: &mut GameState, rows: &[(i32, RowStyle)]) -> usize {
    let mut created = Vec::with_capacity(rows.len());
    for &(tile_y, style) in rows {
        if state
            .terrain
            .generate_row(tile_y, style, &mut state.rng, &state.tuning.terrain)
        {
            created.push(tile_y);
        }
    }

    for &tile_y in &created {
        spawn::spawn_row(state, tile_y);
    }
    created.len()
}

/// Starting platform plus the first rows beneath it
pub fn generate_initial_chunk(state: &mut GameState) -> usize {
    let safe_rows = state.tuning.terrain.safe_rows.max(0);
    let initial_rows = state.tuning.terrain.initial_rows.max(0);

    let rows: Vec<(i32, RowStyle)> = (0..=initial_rows)
        .map(|i| {
            let style = if i <= safe_rows {
                RowStyle::Safe
            } else {
                RowStyle::Random
            };
            (PLATFORM_ROW + i, style)
        })
        .collect();
    let created = generate_rows(state, &rows);
    log::debug!("Initial chunk: {} rows", created);
    created
}

/// Generate one chunk if the camera's lower bound is near the frontier.
///
/// Returns the number of rows created (0 when nothing was needed).
pub fn advance(state: &mut GameState, frontier_y: f32) -> usize {
    let margin = state.tuning.terrain.lookahead_margin;
    if frontier_y + margin <= state.terrain.generated_rows_max_y() {
        return 0;
    }

    let first = state.terrain.next_row();
    let count = state.tuning.terrain.chunk_rows.max(1);
    let rows: Vec<(i32, RowStyle)> = (first..first + count)
        .map(|tile_y| (tile_y, RowStyle::Random))
        .collect();
    let created = generate_rows(state, &rows);
    if created > 0 {
        log::info!(
            "Generated chunk rows {}..{} (frontier y={})",
            first,
            first + created as i32,
            state.terrain.generated_rows_max_y()
        );
    }
    created
}
