//! Boulder state machine
//!
//! Free-falling rigid body. A boulder arms a latch while falling fast and
//! fires a landing impact once its vertical speed drops back near zero.
//! Landing impacts crush what is directly beneath and wear the boulder down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::hit;
use super::entity::{DamageCause, DamageOutcome, Destructible, Entity, EntityId, EntityKind, apply_damage};
use super::events::GameEvent;
use super::physics::Body;
use super::player::damage_player;
use super::state::GameState;
use crate::consts::*;
use crate::tuning::BoulderTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boulder {
    pub id: EntityId,
    pub body: Body,
    pub active: bool,
    pub health: i32,
    /// Radians; follows horizontal travel
    pub rotation: f32,
    /// Player damage from this boulder is suppressed until this time
    pub safe_until_ms: u64,
    pub was_falling_fast: bool,
    pub impact_cooldown_until_ms: u64,
    /// Set once destroyed; the boulder leaves the world at this time
    pub removal_at_ms: Option<u64>,
}

impl Boulder {
    pub fn new(id: EntityId, pos: Vec2, health: i32) -> Self {
        Self {
            id,
            body: Body::new(pos, BOULDER_SIZE),
            active: true,
            health,
            rotation: 0.0,
            safe_until_ms: 0,
            was_falling_fast: false,
            impact_cooldown_until_ms: 0,
            removal_at_ms: None,
        }
    }

    #[inline]
    pub fn is_safe(&self, now_ms: u64) -> bool {
        now_ms < self.safe_until_ms
    }

    /// Start (or extend) the safe-for-player grace window
    pub fn mark_safe(&mut self, until_ms: u64) {
        self.safe_until_ms = self.safe_until_ms.max(until_ms);
    }

    /// Roll in the direction of travel
    pub fn update_rotation(&mut self, dt: f32) {
        let radius = self.body.half.x.max(1.0);
        self.rotation = (self.rotation + self.body.vel.x * dt / radius) % std::f32::consts::TAU;
    }

    /// Update the fall latch. Returns true when a landing impact should fire.
    pub fn track_fall(&mut self, now_ms: u64, tuning: &BoulderTuning) -> bool {
        if !self.active {
            return false;
        }
        if self.body.vel.y > tuning.fast_fall_speed {
            self.was_falling_fast = true;
            return false;
        }
        if self.was_falling_fast && self.body.vel.y.abs() < tuning.landed_speed {
            self.was_falling_fast = false;
            if now_ms >= self.impact_cooldown_until_ms {
                self.impact_cooldown_until_ms = now_ms + tuning.impact_cooldown_ms;
                return true;
            }
        }
        false
    }
}

impl Entity for Boulder {
    fn id(&self) -> EntityId {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Boulder
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Destructible for Boulder {
    fn health(&self) -> i32 {
        self.health
    }

    fn take_damage(&mut self, amount: i32, _cause: DamageCause) -> DamageOutcome {
        let outcome = apply_damage(&mut self.health, &mut self.active, amount);
        if outcome == DamageOutcome::Destroyed {
            // Timers keyed to this boulder die with it
            self.safe_until_ms = 0;
            self.impact_cooldown_until_ms = 0;
            self.was_falling_fast = false;
            self.body.vel = Vec2::ZERO;
            self.body.dynamic = false;
        }
        outcome
    }
}

/// What a boulder ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoulderTarget {
    Player,
    Enemy(usize),
    Spike(usize),
}

/// Type-specific damage when a boulder hits something
pub fn deal_damage_on_collision(state: &mut GameState, bi: usize, target: BoulderTarget) {
    if !state.boulders[bi].active {
        return;
    }
    match target {
        BoulderTarget::Enemy(ei) => {
            let enemy = &mut state.enemies[ei];
            let amount = enemy.health;
            hit(enemy, amount, DamageCause::Boulder, &mut state.events);
        }
        BoulderTarget::Spike(si) => {
            let spike = &mut state.spikes[si];
            let amount = spike.health;
            hit(spike, amount, DamageCause::Boulder, &mut state.events);
        }
        BoulderTarget::Player => {
            if state.boulders[bi].is_safe(state.clock_ms) || !state.player.active {
                return;
            }
            damage_player(state, 1, DamageCause::Boulder);
            hit(&mut state.boulders[bi], 1, DamageCause::Wear, &mut state.events);
        }
    }
}

/// Landing impact: crush what is beneath, then take wear damage
pub fn landing_impact(state: &mut GameState, bi: usize) {
    let now = state.clock_ms;
    let radius = state.tuning.boulder.impact_radius;
    let (id, center, safe) = {
        let boulder = &state.boulders[bi];
        if !boulder.active {
            return;
        }
        (boulder.id, boulder.body.pos, boulder.is_safe(now))
    };
    let impact_point = Vec2::new(center.x, center.y + BOULDER_SIZE.1 / 2.0);
    let beneath = |body: &Body| body.pos.y > center.y && body.pos.distance(impact_point) <= radius;

    log::debug!("Boulder {:?} landed at {:?}", id, impact_point);
    state.emit(GameEvent::BoulderImpact {
        id,
        pos: impact_point,
    });

    let enemies: Vec<usize> = (0..state.enemies.len())
        .filter(|&i| state.enemies[i].active && beneath(&state.enemies[i].body))
        .collect();
    for ei in enemies {
        let enemy = &mut state.enemies[ei];
        let amount = enemy.health;
        hit(enemy, amount, DamageCause::BoulderImpact, &mut state.events);
    }

    let spikes: Vec<usize> = (0..state.spikes.len())
        .filter(|&i| state.spikes[i].active && beneath(&state.spikes[i].body))
        .collect();
    for si in spikes {
        let spike = &mut state.spikes[si];
        let amount = spike.health;
        hit(spike, amount, DamageCause::BoulderImpact, &mut state.events);
    }

    if !safe && state.player.active && beneath(&state.player.body) {
        damage_player(state, 1, DamageCause::BoulderImpact);
    }

    hit(&mut state.boulders[bi], 1, DamageCause::Wear, &mut state.events);
}

/// Per-tick boulder upkeep: rotation and landing detection
pub fn update_boulders(state: &mut GameState, dt: f32) {
    let now = state.clock_ms;
    let mut impacts = Vec::new();
    for (i, boulder) in state.boulders.iter_mut().enumerate() {
        if !boulder.active {
            continue;
        }
        boulder.update_rotation(dt);
        if boulder.track_fall(now, &state.tuning.boulder) {
            impacts.push(i);
        }
    }
    for bi in impacts {
        landing_impact(state, bi);
    }
}
