//! Player state machine
//!
//! Grounded/airborne comes from physics each tick. Invulnerability is a
//! deadline on the simulation clock. Death is terminal and ends the run.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boulder::{BoulderTarget, deal_damage_on_collision};
use super::collision::hit;
use super::dig;
use super::entity::{DamageCause, DamageOutcome, Entity, EntityId, EntityKind};
use super::events::{ClearCause, GameEvent};
use super::grid::row_below;
use super::physics::Body;
use super::shop::{Consumable, PlayerModifiers};
use super::state::GameState;
use crate::consts::*;
use crate::direction_toward;

/// Movement state derived from physics contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    Grounded,
    Airborne,
    Dead,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub body: Body,
    pub active: bool,
    pub invulnerable_until_ms: u64,
    /// Horizontal input is ignored until this time (after knockback)
    pub control_locked_until_ms: u64,
    pub last_dig_ms: Option<u64>,
    /// Dig input must be released once before it fires again (re-armed after pause)
    pub dig_armed: bool,
    /// Last damage-relevant contact per boulder
    pub boulder_contacts: BTreeMap<EntityId, u64>,
}

impl Player {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            body: Body::new(pos, PLAYER_SIZE),
            active: true,
            invulnerable_until_ms: 0,
            control_locked_until_ms: 0,
            last_dig_ms: None,
            dig_armed: true,
            boulder_contacts: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> PlayerState {
        if !self.active {
            PlayerState::Dead
        } else if self.body.on_ground {
            PlayerState::Grounded
        } else {
            PlayerState::Airborne
        }
    }

    #[inline]
    pub fn is_invulnerable(&self, now_ms: u64) -> bool {
        now_ms < self.invulnerable_until_ms
    }

    pub fn dig_ready(&self, now_ms: u64, cooldown_ms: u64) -> bool {
        self.last_dig_ms
            .is_none_or(|last| now_ms >= last + cooldown_ms)
    }

    /// Whether this boulder touched us within the cooldown window
    pub fn recent_boulder_contact(&self, boulder: EntityId, now_ms: u64, cooldown_ms: u64) -> bool {
        self.boulder_contacts
            .get(&boulder)
            .is_some_and(|&at| now_ms < at + cooldown_ms)
    }

    pub fn record_boulder_contact(&mut self, boulder: EntityId, now_ms: u64) {
        self.boulder_contacts.insert(boulder, now_ms);
    }

    /// Drop the timestamp for a boulder that left the world
    pub fn forget_boulder(&mut self, boulder: EntityId) {
        self.boulder_contacts.remove(&boulder);
    }

    /// Drop timestamps whose window has passed
    pub fn prune_contacts(&mut self, now_ms: u64, cooldown_ms: u64) {
        self.boulder_contacts.retain(|_, &mut at| now_ms < at + cooldown_ms);
    }
}

impl Entity for Player {
    fn id(&self) -> EntityId {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn body(&self) -> &Body {
        &self.body
    }
}

/// Apply damage to the player.
///
/// While invulnerable this is a no-op that still reports `Survived`. Losing
/// the last life deactivates the player and ends the run.
pub fn damage_player(state: &mut GameState, amount: u32, cause: DamageCause) -> DamageOutcome {
    let now = state.clock_ms;
    if !state.player.active {
        return DamageOutcome::Ignored;
    }
    if amount == 0 || state.player.is_invulnerable(now) {
        return DamageOutcome::Survived;
    }

    state.stats.lives = state.stats.lives.saturating_sub(amount);
    state.mark_stats_dirty();
    let id = state.player.id;

    if state.stats.lives > 0 {
        state.player.invulnerable_until_ms = now + state.tuning.player.invulnerable_ms;
        log::debug!("Player hit by {:?}, {} lives left", cause, state.stats.lives);
        state.emit(GameEvent::EntityDamaged {
            id,
            kind: EntityKind::Player,
            cause,
            remaining: state.stats.lives as i32,
        });
        DamageOutcome::Survived
    } else {
        let pos = state.player.body.pos;
        state.player.active = false;
        state.player.body.vel = Vec2::ZERO;
        state.player.body.dynamic = false;
        state.player.boulder_contacts.clear();
        state.emit(GameEvent::EntityDestroyed {
            id,
            kind: EntityKind::Player,
            cause,
            pos,
        });
        state.flush_stats();
        state.end_run();
        DamageOutcome::Destroyed
    }
}

/// Outcome of a jump+dig request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigAttempt {
    Dead,
    NotGrounded,
    CoolingDown,
    /// Jumped; `rows_cleared` may be 0 when there was nothing beneath
    Dug { rows_cleared: u32 },
}

/// Jump and dig out the row beneath the player's feet
pub fn attempt_jump_and_dig(state: &mut GameState) -> DigAttempt {
    let now = state.clock_ms;
    let mods = PlayerModifiers::from_relics(&state.stats.relics);
    let cooldown = (state.tuning.player.dig_cooldown_ms as f32 * mods.dig_cooldown_multiplier) as u64;

    if !state.player.active {
        return DigAttempt::Dead;
    }
    if !state.player.body.on_ground {
        return DigAttempt::NotGrounded;
    }
    if !state.player.dig_ready(now, cooldown) {
        return DigAttempt::CoolingDown;
    }

    let player = &mut state.player;
    player.last_dig_ms = Some(now);
    player.body.vel.y = -state.tuning.player.jump_velocity * mods.jump_multiplier;
    player.body.on_ground = false;
    let first_row = row_below(player.body.pos.y);

    let mut rows_cleared = 0;
    if dig::clear_row_index(state, first_row, ClearCause::Dig) {
        rows_cleared += 1;
        for extra in 1..=mods.extra_dig_rows {
            if !dig::clear_row_index(state, first_row + extra as i32, ClearCause::Dig) {
                break;
            }
            rows_cleared += 1;
        }
    }
    DigAttempt::Dug { rows_cleared }
}

/// Set horizontal velocity from the movement axis
pub fn apply_movement(state: &mut GameState, move_x: f32) {
    let now = state.clock_ms;
    let speed = state.tuning.player.move_speed
        * PlayerModifiers::from_relics(&state.stats.relics).speed_multiplier;
    let player = &mut state.player;
    if !player.active || now < player.control_locked_until_ms {
        return;
    }
    player.body.vel.x = move_x.clamp(-1.0, 1.0) * speed;
}

fn knock_back(player: &mut Player, away: f32, speed: f32, lift: f32, locked_until_ms: u64) {
    player.body.vel = Vec2::new(away * speed, -lift);
    player.body.on_ground = false;
    player.control_locked_until_ms = locked_until_ms;
}

/// How a player/boulder contact was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoulderContact {
    Ignored,
    LandedOnTop,
    Pushed,
    Damaged,
    PushedBack,
}

/// Player touched a boulder: land, push, get hurt, or get nudged
pub fn on_boulder_contact(state: &mut GameState, bi: usize) -> BoulderContact {
    let now = state.clock_ms;
    let pt = state.tuning.player.clone();
    let bt = state.tuning.boulder.clone();

    let player = &mut state.player;
    let boulder = &mut state.boulders[bi];
    if !player.active || !boulder.active {
        return BoulderContact::Ignored;
    }

    // Falling onto it from above is never harmful
    if player.body.vel.y > 0.0 && player.body.bottom() <= boulder.body.pos.y {
        player.body.land_on(boulder.body.top());
        return BoulderContact::LandedOnTop;
    }

    if player.recent_boulder_contact(boulder.id, now, pt.boulder_hit_cooldown_ms) {
        return BoulderContact::Ignored;
    }
    player.record_boulder_contact(boulder.id, now);

    let toward = direction_toward(player.body.pos.x, boulder.body.pos.x);
    let moving_toward = player.body.vel.x * toward > 1.0;
    let boulder_speed = boulder.body.speed();
    let co_moving = boulder.body.vel.x * player.body.vel.x > 0.0;

    if moving_toward && (boulder_speed < bt.push_speed || co_moving) {
        boulder.mark_safe(now + bt.safe_window_ms);
        let pushed = player.body.vel.x * pt.push_transfer;
        if pushed.abs() > boulder.body.vel.x.abs() {
            boulder.body.vel.x = pushed;
        }
        return BoulderContact::Pushed;
    }

    if boulder_speed > bt.dangerous_speed && !boulder.is_safe(now) {
        let lift = pt.knockback_speed * 0.5;
        knock_back(player, -toward, pt.knockback_speed, lift, now + pt.knockback_lock_ms);
        deal_damage_on_collision(state, bi, BoulderTarget::Player);
        return BoulderContact::Damaged;
    }

    let diff = player.body.vel.x - boulder.body.vel.x;
    player.body.vel.x -= diff * pt.pushback_factor;
    boulder.mark_safe(now + bt.safe_window_ms);
    BoulderContact::PushedBack
}

/// How a player/enemy contact was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyContact {
    Ignored,
    Stomped,
    SideHit,
}

/// Player touched an enemy: stomp it from above or take a side hit
pub fn on_enemy_contact(state: &mut GameState, ei: usize) -> EnemyContact {
    let now = state.clock_ms;
    let pt = state.tuning.player.clone();
    let stomp_immune = PlayerModifiers::from_relics(&state.stats.relics).stomp_immune;

    let player = &mut state.player;
    let enemy = &mut state.enemies[ei];
    if !player.active || !enemy.active {
        return EnemyContact::Ignored;
    }

    // Judge by where the feet were before this step; a fast fall covers more than the tolerance
    let feet = player.body.prev_bottom.min(player.body.bottom());
    let stomp = player.body.vel.y > 0.0 && feet <= enemy.body.top() + pt.stomp_tolerance;

    if stomp {
        hit(enemy, 1, DamageCause::Stomp, &mut state.events);
        player.body.vel.y = -pt.stomp_bounce;
        player.body.on_ground = false;
        if !stomp_immune {
            damage_player(state, 1, DamageCause::Stomp);
        }
        return EnemyContact::Stomped;
    }

    if player.is_invulnerable(now) {
        return EnemyContact::Ignored;
    }
    let away = -direction_toward(player.body.pos.x, enemy.body.pos.x);
    hit(enemy, 1, DamageCause::Player, &mut state.events);
    knock_back(player, away, pt.knockback_speed, 0.0, now + pt.knockback_lock_ms);
    damage_player(state, 1, DamageCause::Enemy);
    EnemyContact::SideHit
}

/// Use one consumable from the inventory. Returns false if none is owned.
pub fn use_consumable(state: &mut GameState, item: Consumable) -> bool {
    if !state.player.active {
        return false;
    }
    let Some(slot) = state.stats.consumables.iter().position(|c| *c == item) else {
        return false;
    };
    state.stats.consumables.remove(slot);
    state.mark_stats_dirty();

    match item {
        Consumable::Dynamite => {
            let pos = state.player.body.pos;
            state.spawn_tnt(pos);
        }
        Consumable::Heart => {
            state.stats.lives += 1;
        }
        Consumable::Shield => {
            let until = state.clock_ms + state.tuning.player.shield_ms;
            let player = &mut state.player;
            player.invulnerable_until_ms = player.invulnerable_until_ms.max(until);
        }
    }
    log::debug!("Used consumable {:?}", item);
    true
}
