//! Collision and damage resolution
//!
//! Overlaps are gathered after bodies move, then each pair is dispatched on
//! its `(EntityKind, EntityKind)` tag to the rule for that pairing. Solid
//! pairs are pushed apart only after the rules ran, so the rules see the
//! velocities that caused the contact.

use super::boulder::{BoulderTarget, deal_damage_on_collision};
use super::entity::{DamageCause, DamageOutcome, Destructible, EntityKind};
use super::events::GameEvent;
use super::physics::{Separation, separate};
use super::player::{damage_player, on_boulder_contact, on_enemy_contact};
use super::state::GameState;
use crate::direction_toward;

/// Apply damage to any destructible entity and publish the result
pub fn hit<T: Destructible>(
    target: &mut T,
    amount: i32,
    cause: DamageCause,
    events: &mut Vec<GameEvent>,
) -> DamageOutcome {
    let outcome = target.take_damage(amount, cause);
    match outcome {
        DamageOutcome::Survived => events.push(GameEvent::EntityDamaged {
            id: target.id(),
            kind: target.kind(),
            cause,
            remaining: target.health(),
        }),
        DamageOutcome::Destroyed => events.push(GameEvent::EntityDestroyed {
            id: target.id(),
            kind: target.kind(),
            cause,
            pos: target.body().pos,
        }),
        DamageOutcome::Ignored => {}
    }
    outcome
}

/// One side of a contact: entity kind plus index into its pool
pub type ContactSide = (EntityKind, usize);

/// Two overlapping entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: ContactSide,
    pub b: ContactSide,
}

impl Contact {
    fn new(a: ContactSide, b: ContactSide) -> Self {
        Self { a, b }
    }
}

/// Every overlapping pair that has a rule, in stable pool order
pub fn find_contacts(state: &GameState) -> Vec<Contact> {
    let mut contacts = Vec::new();
    let player = (EntityKind::Player, 0);

    if state.player.active {
        let pbox = state.player.body.aabb();
        for (i, b) in state.boulders.iter().enumerate() {
            if b.active && b.body.aabb().intersects(&pbox) {
                contacts.push(Contact::new(player, (EntityKind::Boulder, i)));
            }
        }
        for (i, e) in state.enemies.iter().enumerate() {
            if e.active && e.body.aabb().intersects(&pbox) {
                contacts.push(Contact::new(player, (EntityKind::Enemy, i)));
            }
        }
        for (i, s) in state.spikes.iter().enumerate() {
            if s.active && s.body.aabb().intersects(&pbox) {
                contacts.push(Contact::new(player, (EntityKind::Spike, i)));
            }
        }
        for (i, c) in state.coins.iter().enumerate() {
            if c.active && c.body.aabb().intersects(&pbox) {
                contacts.push(Contact::new(player, (EntityKind::Coin, i)));
            }
        }
    }

    for (bi, boulder) in state.boulders.iter().enumerate() {
        if !boulder.active {
            continue;
        }
        let bbox = boulder.body.aabb();
        let me = (EntityKind::Boulder, bi);
        for (i, e) in state.enemies.iter().enumerate() {
            if e.active && e.body.aabb().intersects(&bbox) {
                contacts.push(Contact::new(me, (EntityKind::Enemy, i)));
            }
        }
        for (i, s) in state.spikes.iter().enumerate() {
            if s.active && s.body.aabb().intersects(&bbox) {
                contacts.push(Contact::new(me, (EntityKind::Spike, i)));
            }
        }
        for (i, other) in state.boulders.iter().enumerate().skip(bi + 1) {
            if other.active && other.body.aabb().intersects(&bbox) {
                contacts.push(Contact::new(me, (EntityKind::Boulder, i)));
            }
        }
    }

    contacts
}

/// Apply the rule for one contact. Contacts whose entities died earlier in the
/// same pass are skipped.
pub fn resolve_contact(state: &mut GameState, contact: Contact) {
    use EntityKind::*;
    match (contact.a, contact.b) {
        ((Player, _), (Boulder, bi)) => {
            on_boulder_contact(state, bi);
        }
        ((Player, _), (Enemy, ei)) => {
            on_enemy_contact(state, ei);
        }
        ((Player, _), (Spike, si)) => {
            if state.spikes[si].active {
                damage_player(state, 1, DamageCause::Spike);
            }
        }
        ((Player, _), (Coin, ci)) => collect_coin(state, ci),
        ((Boulder, bi), (Enemy, ei)) => boulder_meets_enemy(state, bi, ei),
        ((Boulder, bi), (Spike, si)) => {
            let fast = state.boulders[bi].body.speed() >= state.tuning.hazards.spike_kill_speed;
            if fast {
                deal_damage_on_collision(state, bi, BoulderTarget::Spike(si));
            }
        }
        // Boulder pairs are purely physical
        ((Boulder, _), (Boulder, _)) => {}
        (a, b) => log::trace!("No contact rule for {:?} / {:?}", a.0, b.0),
    }
}

fn collect_coin(state: &mut GameState, ci: usize) {
    let coin = &mut state.coins[ci];
    if !state.player.active || !coin.active {
        return;
    }
    coin.active = false;
    let value = coin.value;
    state.stats.add_coins(value);
    state.mark_stats_dirty();
    state.emit(GameEvent::CoinCollected { value });
}

/// Fast boulders flatten enemies; slow ones just turn them around
fn boulder_meets_enemy(state: &mut GameState, bi: usize, ei: usize) {
    let kill_speed = state.tuning.hazards.enemy_kill_speed;
    let boulder = &state.boulders[bi];
    let enemy = &mut state.enemies[ei];
    if !boulder.active || !enemy.active {
        return;
    }
    if boulder.body.speed() >= kill_speed {
        deal_damage_on_collision(state, bi, BoulderTarget::Enemy(ei));
    } else if enemy.dir == direction_toward(enemy.body.pos.x, boulder.body.pos.x) {
        enemy.reverse();
    }
}

/// Push solid pairs apart (player/boulder, boulder/boulder)
pub fn separate_solids(state: &mut GameState) {
    if state.player.active {
        for boulder in state.boulders.iter_mut().filter(|b| b.active) {
            // The player yields; boulders are heavy
            separate(&mut state.player.body, &mut boulder.body, 1.0);
        }
    }

    let count = state.boulders.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let (head, tail) = state.boulders.split_at_mut(j);
            let (a, b) = (&mut head[i], &mut tail[0]);
            if !a.active || !b.active {
                continue;
            }
            if separate(&mut a.body, &mut b.body, 0.5) == Separation::Side {
                // Rolling boulders trade horizontal momentum
                std::mem::swap(&mut a.body.vel.x, &mut b.body.vel.x);
            }
        }
    }
}

/// Find and resolve every contact for this tick, then separate solids
pub fn resolve_contacts(state: &mut GameState) -> usize {
    let contacts = find_contacts(state);
    for contact in &contacts {
        resolve_contact(state, *contact);
    }
    separate_solids(state);
    contacts.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::grid::resting_center;
    use glam::Vec2;

    fn empty_state() -> GameState {
        let mut state = GameState::new(99);
        state.boulders.clear();
        state.enemies.clear();
        state.spikes.clear();
        state.coins.clear();
        state.events.clear();
        state
    }

    #[test]
    fn test_hit_publishes_damage_and_destruction() {
        let mut state = empty_state();
        state.spawn_boulder(Vec2::new(100.0, 100.0));
        let boulder = &mut state.boulders[0];
        assert_eq!(hit(boulder, 1, DamageCause::Wear, &mut state.events), DamageOutcome::Survived);
        let boulder = &mut state.boulders[0];
        assert_eq!(hit(boulder, 5, DamageCause::Explosion, &mut state.events), DamageOutcome::Destroyed);
        assert!(matches!(state.events[0], GameEvent::EntityDamaged { remaining: 2, .. }));
        assert!(matches!(
            state.events[1],
            GameEvent::EntityDestroyed {
                kind: EntityKind::Boulder,
                cause: DamageCause::Explosion,
                ..
            }
        ));
    }

    #[test]
    fn test_coin_pickup() {
        let mut state = empty_state();
        let pos = state.player.body.pos;
        state.spawn_coin(pos, 3);
        resolve_contacts(&mut state);
        assert!(!state.coins[0].active);
        assert_eq!(state.stats.coins, 3);
        assert_eq!(state.stats.total_coins, 3);
        assert!(state.events.contains(&GameEvent::CoinCollected { value: 3 }));
    }

    #[test]
    fn test_spike_hurts_player() {
        let mut state = empty_state();
        let pos = state.player.body.pos;
        state.spawn_spike(pos + Vec2::new(0.0, 6.0));
        resolve_contacts(&mut state);
        assert_eq!(state.stats.lives, 2);
        // Spike survives touching the player
        assert!(state.spikes[0].active);
    }

    #[test]
    fn test_fast_boulder_kills_enemy_slow_one_turns_it() {
        let mut state = empty_state();
        let row = 8;
        let enemy_pos = resting_center(3, row, ENEMY_SIZE.1);
        state.spawn_enemy(enemy_pos, 50.0, 1.0);
        state.spawn_boulder(enemy_pos + Vec2::new(15.0, -4.0));

        state.boulders[0].body.vel.x = -20.0;
        resolve_contacts(&mut state);
        assert!(state.enemies[0].active);
        assert_eq!(state.enemies[0].dir, -1.0);

        state.boulders[0].body.vel = Vec2::new(0.0, 300.0);
        resolve_contacts(&mut state);
        assert!(!state.enemies[0].active);
    }

    #[test]
    fn test_fast_boulder_shatters_spike() {
        let mut state = empty_state();
        let spike_pos = resting_center(5, 9, SPIKE_SIZE.1);
        state.spawn_spike(spike_pos);
        state.spawn_boulder(spike_pos + Vec2::new(0.0, -10.0));

        resolve_contacts(&mut state);
        assert!(state.spikes[0].active);

        state.boulders[0].body.vel.y = 250.0;
        resolve_contacts(&mut state);
        assert!(!state.spikes[0].active);
    }

    #[test]
    fn test_boulders_do_not_stay_overlapped() {
        let mut state = empty_state();
        state.spawn_boulder(Vec2::new(100.0, 200.0));
        state.spawn_boulder(Vec2::new(110.0, 200.0));
        resolve_contacts(&mut state);
        assert!(!state.boulders[0].body.aabb().intersects(&state.boulders[1].body.aabb()));
    }
}
