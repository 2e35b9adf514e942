//! Enemies, spikes, TNT and coins

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{DamageCause, DamageOutcome, Destructible, Entity, EntityId, EntityKind, apply_damage};
use super::physics::Body;
use crate::consts::*;

/// A 1-health patrol agent that walks until it hits a wall
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub body: Body,
    pub active: bool,
    pub health: i32,
    /// -1.0 = left, 1.0 = right
    pub dir: f32,
    pub speed: f32,
}

impl Enemy {
    pub fn new(id: EntityId, pos: Vec2, speed: f32, dir: f32) -> Self {
        Self {
            id,
            body: Body::new(pos, ENEMY_SIZE),
            active: true,
            health: 1,
            dir: if dir < 0.0 { -1.0 } else { 1.0 },
            speed,
        }
    }

    /// Re-arm a pooled slot for a new spawn
    pub fn reset(&mut self, id: EntityId, pos: Vec2, speed: f32, dir: f32) {
        *self = Self::new(id, pos, speed, dir);
    }

    pub fn reverse(&mut self) {
        self.dir = -self.dir;
        self.body.vel.x = self.dir * self.speed;
    }

    /// Turn around at walls, then set walking velocity
    pub fn patrol(&mut self) {
        if !self.active {
            return;
        }
        if self.body.blocked_left {
            self.dir = 1.0;
        } else if self.body.blocked_right {
            self.dir = -1.0;
        }
        self.body.vel.x = self.dir * self.speed;
    }
}

impl Entity for Enemy {
    fn id(&self) -> EntityId {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Enemy
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Destructible for Enemy {
    fn health(&self) -> i32 {
        self.health
    }

    fn take_damage(&mut self, amount: i32, _cause: DamageCause) -> DamageOutcome {
        let outcome = apply_damage(&mut self.health, &mut self.active, amount);
        if outcome == DamageOutcome::Destroyed {
            self.body.vel = Vec2::ZERO;
        }
        outcome
    }
}

/// Immovable 1-health hazard resting on a row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spike {
    pub id: EntityId,
    pub body: Body,
    pub active: bool,
    pub health: i32,
}

impl Spike {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            body: Body::fixed(pos, SPIKE_SIZE),
            active: true,
            health: 1,
        }
    }
}

impl Entity for Spike {
    fn id(&self) -> EntityId {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Spike
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Destructible for Spike {
    fn health(&self) -> i32 {
        self.health
    }

    fn take_damage(&mut self, amount: i32, _cause: DamageCause) -> DamageOutcome {
        apply_damage(&mut self.health, &mut self.active, amount)
    }
}

/// What a fuse did this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuseStep {
    Idle,
    /// Warning tick; `ticks_left` more to go before detonation
    Warn { ticks_left: u32 },
    Detonate,
}

/// A lit explosive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tnt {
    pub id: EntityId,
    pub body: Body,
    pub active: bool,
    pub ticks_left: u32,
    pub next_tick_at_ms: u64,
}

impl Tnt {
    pub fn new(id: EntityId, pos: Vec2, fuse_ticks: u32, first_tick_at_ms: u64) -> Self {
        Self {
            id,
            body: Body::new(pos, TNT_SIZE),
            active: true,
            ticks_left: fuse_ticks.max(1),
            next_tick_at_ms: first_tick_at_ms,
        }
    }

    /// Advance the fuse against the simulation clock
    pub fn advance_fuse(&mut self, now_ms: u64, interval_ms: u64) -> FuseStep {
        if !self.active || now_ms < self.next_tick_at_ms {
            return FuseStep::Idle;
        }
        self.ticks_left = self.ticks_left.saturating_sub(1);
        if self.ticks_left == 0 {
            FuseStep::Detonate
        } else {
            self.next_tick_at_ms = now_ms + interval_ms;
            FuseStep::Warn {
                ticks_left: self.ticks_left,
            }
        }
    }

    /// Caught in another blast: go off on the next fuse check
    pub fn ignite_now(&mut self, now_ms: u64) {
        if self.active {
            self.ticks_left = 1;
            self.next_tick_at_ms = now_ms;
        }
    }
}

impl Entity for Tnt {
    fn id(&self) -> EntityId {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Tnt
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn body(&self) -> &Body {
        &self.body
    }
}

/// Currency pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub id: EntityId,
    pub body: Body,
    pub active: bool,
    pub value: u32,
}

impl Coin {
    pub fn new(id: EntityId, pos: Vec2, value: u32) -> Self {
        Self {
            id,
            body: Body::new(pos, COIN_SIZE),
            active: true,
            value,
        }
    }
}

impl Entity for Coin {
    fn id(&self) -> EntityId {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Coin
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn body(&self) -> &Body {
        &self.body
    }
}
