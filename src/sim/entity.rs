//! Shared entity vocabulary and capability traits
//!
//! Every entity kind implements a small capability set instead of sitting in
//! an inheritance tree. Contact rules dispatch on `EntityKind` pairs.

use serde::{Deserialize, Serialize};

use super::physics::Body;

/// Stable entity identifier, unique for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Entity variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Boulder,
    Enemy,
    Spike,
    Tnt,
    Coin,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Boulder => "boulder",
            EntityKind::Enemy => "enemy",
            EntityKind::Spike => "spike",
            EntityKind::Tnt => "tnt",
            EntityKind::Coin => "coin",
        }
    }
}

/// What dealt the damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageCause {
    Boulder,
    BoulderImpact,
    Enemy,
    Spike,
    Stomp,
    /// Enemy killed by a side-on collision with the player
    Player,
    Explosion,
    RowCleared,
    /// Boulder wear from hitting things
    Wear,
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Target was inactive or otherwise could not be hurt
    Ignored,
    /// Target took the hit (or shrugged it off while invulnerable) and is still alive
    Survived,
    /// Target's health reached zero and it was deactivated
    Destroyed,
}

/// Capabilities common to every entity
pub trait Entity {
    fn id(&self) -> EntityId;
    fn kind(&self) -> EntityKind;
    fn is_active(&self) -> bool;
    fn body(&self) -> &Body;
}

/// Entities with a health pool.
///
/// Implementations must deactivate in the same call that drops health to zero.
pub trait Destructible: Entity {
    fn health(&self) -> i32;
    fn take_damage(&mut self, amount: i32, cause: DamageCause) -> DamageOutcome;
}

/// Shared health bookkeeping for the simple hazards
pub(crate) fn apply_damage(
    health: &mut i32,
    active: &mut bool,
    amount: i32,
) -> DamageOutcome {
    if !*active || amount <= 0 {
        return DamageOutcome::Ignored;
    }
    *health -= amount;
    if *health <= 0 {
        *health = 0;
        *active = false;
        DamageOutcome::Destroyed
    } else {
        DamageOutcome::Survived
    }
}
