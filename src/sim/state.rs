//! Game state and run bookkeeping
//!
//! All simulation state lives in `GameState`; nothing in `sim` reaches for
//! globals. Run statistics (the former registry of lives, coins, relics and
//! consumables) are an explicit `RunStats` owned by the state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boulder::Boulder;
use super::entity::EntityId;
use super::events::{GameEvent, StatsSnapshot};
use super::grid::resting_center;
use super::hazards::{Coin, Enemy, Spike, Tnt};
use super::player::Player;
use super::shop::{Consumable, Relic, Shop};
use super::terrain::{self, PLATFORM_ROW, Terrain};
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Shop is open; the simulation is frozen until it closes
    Shop,
    /// Run ended
    GameOver,
}

/// Per-run statistics, reset at run start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub lives: u32,
    /// Spendable balance
    pub coins: u32,
    /// Every coin earned this run, spent or not
    pub total_coins: u32,
    pub max_depth: u32,
    pub relics: Vec<Relic>,
    pub consumables: Vec<Consumable>,
}

impl RunStats {
    pub fn new(lives: u32) -> Self {
        Self {
            lives,
            coins: 0,
            total_coins: 0,
            max_depth: 0,
            relics: Vec::new(),
            consumables: Vec::new(),
        }
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
        self.total_coins = self.total_coins.saturating_add(amount);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lives: self.lives,
            coins: self.coins,
            depth: self.max_depth,
            relics: self.relics.clone(),
            consumables: self.consumables.clone(),
        }
    }
}

fn fresh_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Complete game state (deterministic)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Seeded generator; the only randomness source in the simulation
    #[serde(skip, default = "fresh_rng")]
    pub rng: Pcg32,
    pub tuning: Tuning,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulation clock; only advances while playing
    pub clock_ms: u64,
    /// Sub-millisecond remainder carried between steps
    #[serde(default)]
    clock_frac_ms: f64,
    pub phase: GamePhase,
    pub stats: RunStats,
    pub terrain: Terrain,
    pub player: Player,
    pub boulders: Vec<Boulder>,
    /// Pooled: inactive enemies are reused by later spawns
    pub enemies: Vec<Enemy>,
    pub spikes: Vec<Spike>,
    pub tnts: Vec<Tnt>,
    pub coins: Vec<Coin>,
    pub shop: Shop,
    /// Outbound events since the host last drained them
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    stats_dirty: bool,
    next_id: u32,
}

impl GameState {
    /// Create a new run with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// Create a new run: empty world, initial chunk, player on the platform
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let spawn = resting_center(MAP_WIDTH_TILES / 2, PLATFORM_ROW, PLAYER_SIZE.1);
        let shop = Shop::new(&tuning.shop);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            stats: RunStats::new(tuning.player.start_lives),
            tuning,
            time_ticks: 0,
            clock_ms: 0,
            clock_frac_ms: 0.0,
            phase: GamePhase::Playing,
            terrain: Terrain::new(),
            player: Player::new(EntityId(0), spawn),
            boulders: Vec::new(),
            enemies: Vec::new(),
            spikes: Vec::new(),
            tnts: Vec::new(),
            coins: Vec::new(),
            shop,
            events: Vec::new(),
            stats_dirty: false,
            next_id: 1,
        };

        terrain::generate_initial_chunk(&mut state);
        state.mark_stats_dirty();
        state.flush_stats();
        log::info!(
            "Run started: seed={}, rows generated to y={}",
            seed,
            state.terrain.generated_rows_max_y()
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Advance the simulation clock by one step of `dt` seconds
    pub fn advance_clock(&mut self, dt: f32) {
        let total = self.clock_frac_ms + f64::from(dt.max(0.0)) * 1000.0;
        let whole = total.floor();
        self.clock_ms += whole as u64;
        self.clock_frac_ms = total - whole;
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event published since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Note that lives/coins/depth/inventory changed
    pub fn mark_stats_dirty(&mut self) {
        self.stats_dirty = true;
    }

    /// Publish one `StatsChanged` if anything changed since the last flush
    pub fn flush_stats(&mut self) {
        if self.stats_dirty {
            self.stats_dirty = false;
            let snapshot = self.stats.snapshot();
            self.emit(GameEvent::StatsChanged(snapshot));
        }
    }

    /// Current depth of the player in rows below the platform
    pub fn player_depth(&self) -> u32 {
        let rows = (self.player.body.pos.y - self.terrain.origin_y()) / TILE_SIZE;
        rows.floor().max(0.0) as u32
    }

    /// End the run. Publishes `GameOver` exactly once.
    pub fn end_run(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;
        log::info!(
            "Game over: depth={}, coins={}, relics={}",
            self.stats.max_depth,
            self.stats.total_coins,
            self.stats.relics.len()
        );
        self.emit(GameEvent::GameOver {
            final_depth: self.stats.max_depth,
            total_coins: self.stats.total_coins,
            relics: self.stats.relics.clone(),
        });
    }

    /// Boxes of every live blocking entity (used for spawn occupancy)
    pub fn occupied_boxes(&self) -> impl Iterator<Item = super::physics::Aabb> + '_ {
        let boulders = self.boulders.iter().filter(|b| b.active).map(|b| b.body.aabb());
        let enemies = self.enemies.iter().filter(|e| e.active).map(|e| e.body.aabb());
        let spikes = self.spikes.iter().filter(|s| s.active).map(|s| s.body.aabb());
        let coins = self.coins.iter().filter(|c| c.active).map(|c| c.body.aabb());
        let tnts = self.tnts.iter().filter(|t| t.active).map(|t| t.body.aabb());
        boulders.chain(enemies).chain(spikes).chain(coins).chain(tnts)
    }

    /// Spawn a boulder resting at `pos`
    pub fn spawn_boulder(&mut self, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let health = self.tuning.boulder.health;
        self.boulders.push(Boulder::new(id, pos, health));
        id
    }

    /// Spawn an enemy, reusing a pooled slot when one is free
    pub fn spawn_enemy(&mut self, pos: Vec2, speed: f32, dir: f32) -> EntityId {
        let id = self.next_entity_id();
        match self.enemies.iter_mut().find(|e| !e.active) {
            Some(slot) => slot.reset(id, pos, speed, dir),
            None => self.enemies.push(Enemy::new(id, pos, speed, dir)),
        }
        id
    }

    pub fn spawn_spike(&mut self, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.spikes.push(Spike::new(id, pos));
        id
    }

    pub fn spawn_coin(&mut self, pos: Vec2, value: u32) -> EntityId {
        let id = self.next_entity_id();
        self.coins.push(Coin::new(id, pos, value));
        id
    }

    /// Drop a lit TNT; the first fuse tick lands one interval from now
    pub fn spawn_tnt(&mut self, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let first_tick = self.clock_ms + self.tuning.tnt.fuse_interval_ms;
        self.tnts.push(Tnt::new(id, pos, self.tuning.tnt.fuse_ticks, first_tick));
        id
    }
}
