//! Entity spawn policy
//!
//! Walks a freshly generated row left to right. Each tile position is skipped
//! if anything already occupies its footprint; otherwise boulder, enemy, spike
//! and coin are rolled in that order and the first success spawns.

use glam::Vec2;
use rand::Rng;

use super::difficulty;
use super::entity::EntityId;
use super::grid::{resting_center, row_top, surface_y};
use super::physics::Aabb;
use super::state::GameState;
use super::terrain::PLATFORM_ROW;
use crate::consts::*;

/// Coins dropped by the spawn policy are worth this much
pub const COIN_VALUE: u32 = 1;

/// The tile-sized box above a row's surface at a column
pub fn tile_footprint(tile_x: i32, tile_y: i32) -> Aabb {
    Aabb::new(
        Vec2::new(tile_x as f32 * TILE_SIZE, row_top(tile_y)),
        Vec2::new((tile_x + 1) as f32 * TILE_SIZE, surface_y(tile_y)),
    )
    .inset(0.5)
}

/// Whether any live boulder, enemy, spike, coin or TNT overlaps a box
pub fn is_occupied(state: &GameState, area: &Aabb) -> bool {
    state.occupied_boxes().any(|b| b.intersects(area))
}

/// Roll and place entities on one generated row.
///
/// Returns the IDs spawned, left to right. Rows that are not generated, or are
/// spawn-exempt, spawn nothing.
pub fn spawn_row(state: &mut GameState, tile_y: i32) -> Vec<EntityId> {
    let mut spawned = Vec::new();
    if !state.terrain.is_generated(tile_y) || state.terrain.is_spawn_exempt(tile_y) {
        return spawned;
    }

    let depth = (tile_y - PLATFORM_ROW).max(0) as u32;
    let params = difficulty::params(depth, &state.tuning.difficulty);

    for tile_x in 0..MAP_WIDTH_TILES {
        if is_occupied(state, &tile_footprint(tile_x, tile_y)) {
            continue;
        }

        let id = if state.rng.random::<f32>() < params.boulder_chance {
            let pos = resting_center(tile_x, tile_y, BOULDER_SIZE.1);
            Some(state.spawn_boulder(pos))
        } else if state.rng.random::<f32>() < params.enemy_chance {
            let pos = resting_center(tile_x, tile_y, ENEMY_SIZE.1);
            let dir = if state.rng.random::<bool>() { 1.0 } else { -1.0 };
            Some(state.spawn_enemy(pos, params.enemy_speed, dir))
        } else if state.rng.random::<f32>() < params.spike_chance {
            let pos = resting_center(tile_x, tile_y, SPIKE_SIZE.1);
            Some(state.spawn_spike(pos))
        } else if state.rng.random::<f32>() < params.coin_chance {
            let pos = resting_center(tile_x, tile_y, COIN_SIZE.1);
            Some(state.spawn_coin(pos, COIN_VALUE))
        } else {
            None
        };

        spawned.extend(id);
    }

    if !spawned.is_empty() {
        log::debug!("Row {}: spawned {} entities", tile_y, spawned.len());
    }
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::terrain::RowStyle;
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn crowded_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.difficulty.boulder_chance = 0.3;
        tuning.difficulty.enemy_chance_base = 0.3;
        tuning.difficulty.spike_chance_base = 0.3;
        tuning.difficulty.enemy_chance_max = 0.3;
        tuning.difficulty.spike_chance_max = 0.3;
        tuning.difficulty.coin_chance = 0.5;
        tuning
    }

    fn empty_world(seed: u64, tuning: Tuning) -> GameState {
        let mut state = GameState::with_tuning(seed, tuning);
        state.boulders.clear();
        state.enemies.clear();
        state.spikes.clear();
        state.coins.clear();
        state
    }

    fn boxes(state: &GameState) -> Vec<Aabb> {
        state.occupied_boxes().collect()
    }

    #[test]
    fn test_exempt_and_missing_rows_spawn_nothing() {
        let mut state = empty_world(1, crowded_tuning());
        assert!(spawn_row(&mut state, PLATFORM_ROW).is_empty());
        assert!(spawn_row(&mut state, PLATFORM_ROW + 1).is_empty());
        assert!(spawn_row(&mut state, 10_000).is_empty());
    }

    #[test]
    fn test_occupied_position_is_skipped() {
        let mut tuning = crowded_tuning();
        tuning.difficulty.coin_chance = 1.0;
        let mut state = empty_world(2, tuning);
        let row = state.tuning.terrain.safe_rows + 2;
        state.spawn_boulder(resting_center(4, row, BOULDER_SIZE.1));

        spawn_row(&mut state, row);
        let in_column = state
            .occupied_boxes()
            .filter(|b| b.intersects(&tile_footprint(4, row)))
            .count();
        assert_eq!(in_column, 1);
    }

    #[test]
    fn test_every_position_filled_when_coin_certain() {
        let mut tuning = Tuning::default();
        tuning.difficulty.boulder_chance = 0.0;
        tuning.difficulty.enemy_chance_base = 0.0;
        tuning.difficulty.enemy_chance_per_depth = 0.0;
        tuning.difficulty.spike_chance_base = 0.0;
        tuning.difficulty.spike_chance_per_depth = 0.0;
        tuning.difficulty.coin_chance = 1.0;
        let mut state = empty_world(3, tuning);
        let row = state.tuning.terrain.safe_rows + 5;

        let ids = spawn_row(&mut state, row);
        assert_eq!(ids.len(), MAP_WIDTH_TILES as usize);
        assert_eq!(state.coins.len(), MAP_WIDTH_TILES as usize);
    }

    #[test]
    fn test_boulder_roll_has_priority() {
        let mut tuning = crowded_tuning();
        tuning.difficulty.boulder_chance = 1.0;
        let mut state = empty_world(4, tuning);
        let row = state.tuning.terrain.safe_rows + 3;
        spawn_row(&mut state, row);
        assert_eq!(state.boulders.len(), MAP_WIDTH_TILES as usize);
        assert!(state.enemies.is_empty());
        assert!(state.spikes.is_empty());
        assert!(state.coins.is_empty());
    }

    proptest! {
        #[test]
        fn prop_spawned_entities_never_overlap(seed in any::<u64>(), row_offset in 0i32..40) {
            let mut state = empty_world(seed, crowded_tuning());
            let row = state.terrain.next_row() + row_offset;
            let mut rng = rand_pcg::Pcg32::seed_from_u64(seed);
            state.terrain.generate_row(row, RowStyle::Random, &mut rng, &crowded_tuning().terrain);

            spawn_row(&mut state, row);
            let all = boxes(&state);
            for i in 0..all.len() {
                for j in (i + 1)..all.len() {
                    prop_assert!(!all[i].intersects(&all[j]));
                }
            }
        }
    }
}
