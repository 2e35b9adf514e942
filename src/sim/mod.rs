//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (pool order, IDs ascending)
//! - No rendering, audio or platform dependencies

pub mod boulder;
pub mod collision;
pub mod colliders;
pub mod difficulty;
pub mod dig;
pub mod entity;
pub mod events;
pub mod grid;
pub mod hazards;
pub mod physics;
pub mod player;
pub mod shop;
pub mod spawn;
pub mod state;
pub mod terrain;
pub mod tick;

pub use boulder::Boulder;
pub use collision::{hit, resolve_contacts};
pub use colliders::{RowCollider, RowColliderStore};
pub use difficulty::DifficultyParams;
pub use dig::{ExplosionReport, clear_row, explode};
pub use entity::{DamageCause, DamageOutcome, Destructible, Entity, EntityId, EntityKind};
pub use events::{ClearCause, EventBus, EventKind, GameEvent, StatsSnapshot};
pub use grid::TileKind;
pub use hazards::{Coin, Enemy, Spike, Tnt};
pub use physics::{Aabb, Body};
pub use player::{DigAttempt, Player, PlayerState};
pub use shop::{Consumable, Relic, ShopError, ShopItem};
pub use state::{GamePhase, GameState, RunStats};
pub use terrain::Terrain;
pub use tick::{TickInput, tick};
