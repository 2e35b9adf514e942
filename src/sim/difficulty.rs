//! Depth-based difficulty scaling
//!
//! Pure functions of depth. Enemy and spike chances and enemy speed grow
//! linearly with depth up to a cap; boulder and coin chances stay constant.

use serde::{Deserialize, Serialize};

use crate::tuning::DifficultyTuning;

/// Spawn and speed parameters for one depth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    pub boulder_chance: f32,
    pub enemy_chance: f32,
    pub spike_chance: f32,
    pub coin_chance: f32,
    pub enemy_speed: f32,
}

#[inline]
fn scaled(base: f32, per_depth: f32, max: f32, depth: u32) -> f32 {
    (base + per_depth * depth as f32).min(max.max(base))
}

pub fn enemy_spawn_chance(depth: u32, tuning: &DifficultyTuning) -> f32 {
    scaled(
        tuning.enemy_chance_base,
        tuning.enemy_chance_per_depth,
        tuning.enemy_chance_max,
        depth,
    )
}

pub fn spike_spawn_chance(depth: u32, tuning: &DifficultyTuning) -> f32 {
    scaled(
        tuning.spike_chance_base,
        tuning.spike_chance_per_depth,
        tuning.spike_chance_max,
        depth,
    )
}

/// Boulders are kept at a fixed rate at every depth
pub fn boulder_spawn_chance(_depth: u32, tuning: &DifficultyTuning) -> f32 {
    tuning.boulder_chance
}

pub fn enemy_speed(depth: u32, tuning: &DifficultyTuning) -> f32 {
    scaled(
        tuning.enemy_speed_base,
        tuning.enemy_speed_per_depth,
        tuning.enemy_speed_max,
        depth,
    )
}

/// All parameters for a depth
pub fn params(depth: u32, tuning: &DifficultyTuning) -> DifficultyParams {
    DifficultyParams {
        boulder_chance: boulder_spawn_chance(depth, tuning),
        enemy_chance: enemy_spawn_chance(depth, tuning),
        spike_chance: spike_spawn_chance(depth, tuning),
        coin_chance: tuning.coin_chance,
        enemy_speed: enemy_speed(depth, tuning),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_surface_values_are_base() {
        let t = DifficultyTuning::default();
        let p = params(0, &t);
        assert_eq!(p.enemy_chance, t.enemy_chance_base);
        assert_eq!(p.spike_chance, t.spike_chance_base);
        assert_eq!(p.enemy_speed, t.enemy_speed_base);
    }

    #[test]
    fn test_clamped_at_maxima() {
        let t = DifficultyTuning::default();
        let p = params(1_000_000, &t);
        assert_eq!(p.enemy_chance, t.enemy_chance_max);
        assert_eq!(p.spike_chance, t.spike_chance_max);
        assert_eq!(p.enemy_speed, t.enemy_speed_max);
    }

    #[test]
    fn test_boulder_chance_is_depth_independent() {
        let t = DifficultyTuning::default();
        assert_eq!(boulder_spawn_chance(0, &t), boulder_spawn_chance(5000, &t));
    }

    proptest! {
        #[test]
        fn prop_monotonic_in_depth(d1 in 0u32..20_000, delta in 1u32..20_000) {
            let t = DifficultyTuning::default();
            let d2 = d1 + delta;
            prop_assert!(enemy_spawn_chance(d2, &t) >= enemy_spawn_chance(d1, &t));
            prop_assert!(spike_spawn_chance(d2, &t) >= spike_spawn_chance(d1, &t));
            prop_assert!(enemy_speed(d2, &t) >= enemy_speed(d1, &t));
            prop_assert!(enemy_spawn_chance(d2, &t) <= t.enemy_chance_max);
            prop_assert!(enemy_speed(d2, &t) <= t.enemy_speed_max);
        }
    }
}
