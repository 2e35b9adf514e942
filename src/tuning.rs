//! Data-driven game balance
//!
//! Every gameplay number that is not pure geometry lives here. The defaults
//! are the shipped balance; a JSON file may override any subset of fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning value `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Terrain generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTuning {
    /// Rows generated below the starting platform at run start
    pub initial_rows: i32,
    /// Rows per look-ahead chunk
    pub chunk_rows: i32,
    /// Extra distance (pixels) below the camera that must already be generated
    pub lookahead_margin: f32,
    /// Vertical bound of the map, in rows
    pub map_height_rows: i32,
    /// Rows directly under the platform that are sand-only and spawn-free
    pub safe_rows: i32,
    /// Chance that a tile is DIRT or STONE instead of SAND
    pub special_tile_chance: f32,
    /// Chance that a non-special tile is GOLD
    pub gold_tile_chance: f32,
    /// Coins paid per GOLD tile dug out
    pub gold_tile_value: u32,
    /// Half the visible viewport height (camera lower bound = player y + this)
    pub view_half_height: f32,
}

impl Default for TerrainTuning {
    fn default() -> Self {
        Self {
            initial_rows: 30,
            chunk_rows: 20,
            lookahead_margin: 10.0 * crate::consts::TILE_SIZE,
            map_height_rows: 100_000,
            safe_rows: 3,
            special_tile_chance: 0.25,
            gold_tile_chance: 0.02,
            gold_tile_value: 2,
            view_half_height: 320.0,
        }
    }
}

/// Depth scaling for spawns and enemy speed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Boulder chance per tile position (does not scale with depth)
    pub boulder_chance: f32,
    pub enemy_chance_base: f32,
    pub enemy_chance_per_depth: f32,
    pub enemy_chance_max: f32,
    pub spike_chance_base: f32,
    pub spike_chance_per_depth: f32,
    pub spike_chance_max: f32,
    pub coin_chance: f32,
    pub enemy_speed_base: f32,
    pub enemy_speed_per_depth: f32,
    pub enemy_speed_max: f32,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            boulder_chance: 0.02,
            enemy_chance_base: 0.01,
            enemy_chance_per_depth: 0.0005,
            enemy_chance_max: 0.06,
            spike_chance_base: 0.008,
            spike_chance_per_depth: 0.0004,
            spike_chance_max: 0.05,
            coin_chance: 0.04,
            enemy_speed_base: 50.0,
            enemy_speed_per_depth: 0.4,
            enemy_speed_max: 140.0,
        }
    }
}

/// Player movement and damage windows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub start_lives: u32,
    pub move_speed: f32,
    pub jump_velocity: f32,
    pub dig_cooldown_ms: u64,
    pub invulnerable_ms: u64,
    /// Repeat contacts with the same boulder inside this window are ignored
    pub boulder_hit_cooldown_ms: u64,
    pub knockback_speed: f32,
    /// Horizontal input is ignored for this long after a knockback
    pub knockback_lock_ms: u64,
    pub stomp_bounce: f32,
    /// How far below the enemy's top edge the player's feet may be and still stomp
    pub stomp_tolerance: f32,
    /// Fraction of the player/boulder velocity difference returned as pushback
    pub pushback_factor: f32,
    /// Fraction of the player's horizontal speed handed to a pushed boulder
    pub push_transfer: f32,
    pub shield_ms: u64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            start_lives: 3,
            move_speed: 150.0,
            jump_velocity: 300.0,
            dig_cooldown_ms: 250,
            invulnerable_ms: 1500,
            boulder_hit_cooldown_ms: 500,
            knockback_speed: 220.0,
            knockback_lock_ms: 200,
            stomp_bounce: 260.0,
            stomp_tolerance: 8.0,
            pushback_factor: 0.3,
            push_transfer: 0.6,
            shield_ms: 5000,
        }
    }
}

/// Boulder physics thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoulderTuning {
    pub health: i32,
    /// Speed above which a boulder hurts the player
    pub dangerous_speed: f32,
    /// Fall speed that arms the landing latch
    pub fast_fall_speed: f32,
    /// Vertical speed under which a latched boulder counts as landed
    pub landed_speed: f32,
    pub impact_cooldown_ms: u64,
    /// Radius of the crush check under a landing boulder
    pub impact_radius: f32,
    /// Grace window after a non-hostile contact with the player
    pub safe_window_ms: u64,
    /// Boulders slower than this can be pushed without harm
    pub push_speed: f32,
    /// Destroyed boulders leave the physics world after this delay
    pub removal_delay_ms: u64,
}

impl Default for BoulderTuning {
    fn default() -> Self {
        Self {
            health: 3,
            dangerous_speed: 150.0,
            fast_fall_speed: 180.0,
            landed_speed: 10.0,
            impact_cooldown_ms: 400,
            impact_radius: 24.0,
            safe_window_ms: 600,
            push_speed: 60.0,
            removal_delay_ms: 300,
        }
    }
}

/// Enemy and spike thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    /// Boulders at or above this speed kill enemies; slower ones turn them around
    pub enemy_kill_speed: f32,
    /// Boulders at or above this speed shatter spikes
    pub spike_kill_speed: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            enemy_kill_speed: 100.0,
            spike_kill_speed: 120.0,
        }
    }
}

/// TNT fuse and blast
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TntTuning {
    pub fuse_ticks: u32,
    pub fuse_interval_ms: u64,
    pub radius: f32,
}

impl Default for TntTuning {
    fn default() -> Self {
        Self {
            fuse_ticks: 3,
            fuse_interval_ms: 500,
            radius: 4.0 * crate::consts::TILE_SIZE,
        }
    }
}

/// Shop pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopTuning {
    /// The shop opens each time max depth crosses a multiple of this
    pub interval_depth: u32,
    pub offer_count: usize,
    pub reroll_base_cost: u32,
    pub reroll_cost_step: u32,
}

impl Default for ShopTuning {
    fn default() -> Self {
        Self {
            interval_depth: 50,
            offer_count: 3,
            reroll_base_cost: 5,
            reroll_cost_step: 5,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub terrain: TerrainTuning,
    pub difficulty: DifficultyTuning,
    pub player: PlayerTuning,
    pub boulder: BoulderTuning,
    pub hazards: HazardTuning,
    pub tnt: TntTuning,
    pub shop: ShopTuning,
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Range-check values that would otherwise break generation or RNG calls
    pub fn validate(&self) -> Result<(), TuningError> {
        let probabilities = [
            ("terrain.special_tile_chance", self.terrain.special_tile_chance),
            ("terrain.gold_tile_chance", self.terrain.gold_tile_chance),
            ("difficulty.boulder_chance", self.difficulty.boulder_chance),
            ("difficulty.enemy_chance_base", self.difficulty.enemy_chance_base),
            ("difficulty.enemy_chance_max", self.difficulty.enemy_chance_max),
            ("difficulty.spike_chance_base", self.difficulty.spike_chance_base),
            ("difficulty.spike_chance_max", self.difficulty.spike_chance_max),
            ("difficulty.coin_chance", self.difficulty.coin_chance),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::OutOfRange {
                    field,
                    value: value as f64,
                });
            }
        }

        let positive = [
            ("terrain.chunk_rows", self.terrain.chunk_rows),
            ("terrain.map_height_rows", self.terrain.map_height_rows),
            ("boulder.health", self.boulder.health),
        ];
        for (field, value) in positive {
            if value <= 0 {
                return Err(TuningError::OutOfRange {
                    field,
                    value: value as f64,
                });
            }
        }

        if self.tnt.fuse_ticks == 0 {
            return Err(TuningError::OutOfRange {
                field: "tnt.fuse_ticks",
                value: 0.0,
            });
        }
        if self.difficulty.enemy_speed_max < self.difficulty.enemy_speed_base {
            return Err(TuningError::OutOfRange {
                field: "difficulty.enemy_speed_max",
                value: self.difficulty.enemy_speed_max as f64,
            });
        }
        Ok(())
    }
}
