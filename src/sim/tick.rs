//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. The simulation
//! clock only moves while the phase is `Playing`, so pausing or opening the
//! shop freezes generation, spawns and every deadline.

use super::boulder;
use super::collision;
use super::dig;
use super::entity::{DamageCause, EntityKind};
use super::events::GameEvent;
use super::grid::row_below;
use super::hazards::FuseStep;
use super::physics::integrate;
use super::player::{apply_movement, attempt_jump_and_dig, use_consumable};
use super::shop::{self, Consumable};
use super::state::{GamePhase, GameState};
use super::terrain;
use crate::consts::*;
use crate::direction_toward;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Horizontal movement axis in [-1, 1]
    pub move_x: f32,
    /// Jump+dig button; fires on press, must be released to fire again
    pub dig: bool,
    /// Pause toggle
    pub pause: bool,
    /// Use one consumable from the inventory
    pub use_consumable: Option<Consumable>,
    /// Idle/demo mode - autopilot plays the game
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::info!("Paused at tick {}", state.time_ticks);
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                // A dig held through the pause must not fire on resume
                state.player.dig_armed = false;
            }
            _ => {}
        }
    }

    if input.idle_mode && state.phase == GamePhase::Shop {
        shop_autopilot(state);
    }

    // Don't tick unless playing
    if state.phase != GamePhase::Playing {
        return;
    }

    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, &mut input);
    }

    state.time_ticks += 1;
    state.advance_clock(dt);

    if let Some(item) = input.use_consumable {
        use_consumable(state, item);
    }

    apply_movement(state, input.move_x);

    if input.dig {
        if state.player.dig_armed {
            state.player.dig_armed = false;
            let attempt = attempt_jump_and_dig(state);
            log::trace!("Dig attempt: {:?}", attempt);
        }
    } else {
        state.player.dig_armed = true;
    }

    for enemy in state.enemies.iter_mut() {
        enemy.patrol();
    }

    integrate_bodies(state, dt);
    collision::resolve_contacts(state);
    boulder::update_boulders(state, dt);
    update_fuses(state);
    retire_destroyed(state);

    let now = state.clock_ms;
    let cooldown = state.tuning.player.boulder_hit_cooldown_ms;
    state.player.prune_contacts(now, cooldown);

    update_depth(state);

    let frontier = state.player.body.pos.y + state.tuning.terrain.view_half_height;
    terrain::advance(state, frontier);

    state.flush_stats();
}

/// Move every live dynamic body against the row colliders
fn integrate_bodies(state: &mut GameState, dt: f32) {
    let colliders = &state.terrain.colliders;
    if state.player.active {
        integrate(&mut state.player.body, colliders, dt);
    }
    for boulder in state.boulders.iter_mut().filter(|b| b.active) {
        integrate(&mut boulder.body, colliders, dt);
    }
    for enemy in state.enemies.iter_mut().filter(|e| e.active) {
        integrate(&mut enemy.body, colliders, dt);
    }
    for coin in state.coins.iter_mut().filter(|c| c.active) {
        integrate(&mut coin.body, colliders, dt);
    }
    for tnt in state.tnts.iter_mut().filter(|t| t.active) {
        integrate(&mut tnt.body, colliders, dt);
    }
}

/// Tick every lit fuse; detonations go through the explosion engine
fn update_fuses(state: &mut GameState) {
    let now = state.clock_ms;
    let interval = state.tuning.tnt.fuse_interval_ms;
    let radius = state.tuning.tnt.radius;

    let mut blasts = Vec::new();
    for tnt in state.tnts.iter_mut() {
        match tnt.advance_fuse(now, interval) {
            FuseStep::Idle => {}
            FuseStep::Warn { ticks_left } => {
                state.events.push(GameEvent::TntFuseTick {
                    id: tnt.id,
                    ticks_left,
                });
            }
            FuseStep::Detonate => {
                tnt.active = false;
                state.events.push(GameEvent::TntFuseTick {
                    id: tnt.id,
                    ticks_left: 0,
                });
                state.events.push(GameEvent::EntityDestroyed {
                    id: tnt.id,
                    kind: EntityKind::Tnt,
                    cause: DamageCause::Explosion,
                    pos: tnt.body.pos,
                });
                blasts.push(tnt.body.pos);
            }
        }
    }

    for pos in blasts {
        dig::explode(state, pos, radius);
    }
}

/// Drop dead entities from their pools.
///
/// Destroyed boulders linger until their removal deadline; enemies stay
/// pooled for reuse.
pub fn retire_destroyed(state: &mut GameState) {
    let now = state.clock_ms;
    let delay = state.tuning.boulder.removal_delay_ms;

    for b in state.boulders.iter_mut() {
        if !b.active && b.removal_at_ms.is_none() {
            b.removal_at_ms = Some(now + delay);
            state.player.forget_boulder(b.id);
        }
    }
    state
        .boulders
        .retain(|b| b.active || b.removal_at_ms.is_some_and(|at| now < at));
    state.spikes.retain(|s| s.active);
    state.coins.retain(|c| c.active);
    state.tnts.retain(|t| t.active);
}

/// Track the deepest row reached; may open the shop
fn update_depth(state: &mut GameState) {
    if !state.player.active {
        return;
    }
    let depth = state.player_depth();
    if depth > state.stats.max_depth {
        state.stats.max_depth = depth;
        state.mark_stats_dirty();
        state.emit(GameEvent::DepthChanged { depth });
        shop::maybe_open_shop(state);
    }
}

/// Demo player: dig whenever possible, dodge nearby enemies, step off boulders
fn autopilot(state: &GameState, input: &mut TickInput) {
    let player = &state.player;
    if !player.active {
        return;
    }
    let pos = player.body.pos;

    // Press on the ground, release in the air so the button re-arms
    input.dig = player.body.on_ground && player.dig_armed;
    input.move_x = 0.0;

    let threat = state
        .enemies
        .iter()
        .filter(|e| e.active)
        .filter(|e| (e.body.pos.y - pos.y).abs() < TILE_SIZE)
        .map(|e| e.body.pos.x)
        .filter(|x| (x - pos.x).abs() < 3.0 * TILE_SIZE)
        .min_by(|a, b| (a - pos.x).abs().total_cmp(&(b - pos.x).abs()));
    if let Some(x) = threat {
        input.move_x = -direction_toward(pos.x, x);
    }

    // Grounded with no row beneath means we are standing on something else
    let on_row = state.terrain.colliders.has_row(row_below(pos.y));
    if player.body.on_ground && !on_row {
        let under = state
            .boulders
            .iter()
            .filter(|b| b.active && b.body.top() >= player.body.bottom() - 1.0)
            .map(|b| b.body.pos.x)
            .min_by(|a, b| (a - pos.x).abs().total_cmp(&(b - pos.x).abs()));
        input.move_x = match under {
            Some(x) if (x - pos.x).abs() > 0.5 => -direction_toward(pos.x, x),
            _ => direction_toward(pos.x, MAP_WIDTH / 2.0),
        };
    }

    if state.stats.lives == 1 && state.stats.consumables.contains(&Consumable::Heart) {
        input.use_consumable = Some(Consumable::Heart);
    }
}

/// Demo shopper: buy the first affordable offer, then leave
fn shop_autopilot(state: &mut GameState) {
    let coins = state.stats.coins;
    let affordable = state
        .shop
        .offers
        .iter()
        .position(|o| matches!(o, Some(item) if item.price() <= coins));
    if let Some(index) = affordable {
        if let Err(err) = shop::purchase(state, index) {
            log::debug!("Autopilot purchase failed: {}", err);
        }
    }
    if let Err(err) = shop::close_shop(state) {
        log::debug!("Autopilot could not close shop: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::resting_center;
    use crate::tuning::Tuning;

    fn settled_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        tick(&mut state, &TickInput::default(), SIM_DT);
        state.events.clear();
        state
    }

    fn count(state: &GameState, pred: impl Fn(&GameEvent) -> bool) -> usize {
        state.events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_tick_pause() {
        let mut state = settled_state(12345);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };

        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);
        let frozen = (state.clock_ms, state.time_ticks, state.player.body.pos);

        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!((state.clock_ms, state.time_ticks, state.player.body.pos), frozen);

        // Unpause; a held dig does not fire on the resume tick
        let resume_with_dig = TickInput {
            pause: true,
            dig: true,
            ..Default::default()
        };
        let row = row_below(state.player.body.pos.y);
        tick(&mut state, &resume_with_dig, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.terrain.colliders.has_row(row));
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999);
        let mut state2 = GameState::new(99999);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };

        for _ in 0..600 {
            tick(&mut state1, &input, SIM_DT);
            tick(&mut state2, &input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.drain_events(), state2.drain_events());
        assert_eq!(
            serde_json::to_string(&state1).unwrap(),
            serde_json::to_string(&state2).unwrap()
        );
    }

    #[test]
    fn test_dig_drops_player_one_row() {
        let mut state = settled_state(5);
        let start = row_below(state.player.body.pos.y);
        assert!(state.player.body.on_ground);

        let dig = TickInput {
            dig: true,
            ..Default::default()
        };
        tick(&mut state, &dig, SIM_DT);
        assert!(!state.terrain.colliders.has_row(start));

        // Holding the button does nothing more
        for _ in 0..120 {
            tick(&mut state, &dig, SIM_DT);
        }
        assert!(state.player.body.on_ground);
        assert_eq!(row_below(state.player.body.pos.y), start + 1);
        assert!(state.terrain.colliders.has_row(start + 1));
        assert_eq!(state.stats.max_depth, 1);
        assert_eq!(
            count(&state, |e| matches!(e, GameEvent::DepthChanged { depth: 1 })),
            1
        );
        assert_eq!(count(&state, |e| matches!(e, GameEvent::RowCleared { .. })), 1);
    }

    #[test]
    fn test_game_over_reported_once() {
        let mut state = settled_state(8);
        state.stats.lives = 1;
        let pos = state.player.body.pos;
        state.spawn_spike(pos + glam::Vec2::new(0.0, 6.0));

        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(!state.player.active);
        assert_eq!(count(&state, |e| matches!(e, GameEvent::GameOver { .. })), 1);

        let clock = state.clock_ms;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.clock_ms, clock);
    }

    #[test]
    fn test_fast_fall_onto_enemy_is_a_stomp() {
        let mut state = settled_state(23);
        state.boulders.clear();
        state.enemies.clear();
        state.spikes.clear();
        state.coins.clear();
        state.stats.relics.push(crate::sim::Relic::SteelCaps);

        let head = crate::sim::grid::surface_y(row_below(state.player.body.pos.y)) + 10.0;
        let x = state.player.body.pos.x;
        state.spawn_enemy(glam::Vec2::new(x, head + ENEMY_SIZE.1 / 2.0), 50.0, 1.0);
        state.player.body.pos.y = head - 2.0 - PLAYER_SIZE.1 / 2.0;
        state.player.body.vel.y = 600.0;

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(!state.enemies[0].active);
        assert_eq!(state.stats.lives, 3);
        assert!(state.player.body.vel.y < 0.0);
    }

    #[test]
    fn test_tnt_fuse_ticks_then_explodes() {
        let mut state = settled_state(17);
        let row = 20;
        let id = state.spawn_tnt(resting_center(3, row, TNT_SIZE.1));

        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }

        let ticks: Vec<u32> = state
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::TntFuseTick { id: t, ticks_left } if *t == id => Some(*ticks_left),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![2, 1, 0]);
        assert_eq!(count(&state, |e| matches!(e, GameEvent::ExplosionOccurred { .. })), 1);
        assert!(state.tnts.is_empty());
        assert!(!state.terrain.colliders.has_row(row));
        // Far from the platform
        assert_eq!(state.stats.lives, 3);
    }

    #[test]
    fn test_explosion_sets_off_neighbouring_tnt() {
        let mut state = settled_state(18);
        let row = 20;
        state.spawn_tnt(resting_center(3, row, TNT_SIZE.1));
        state.spawn_tnt(resting_center(5, row, TNT_SIZE.1));
        state.tnts[1].ticks_left = 50;

        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.tnts.is_empty());
        assert_eq!(count(&state, |e| matches!(e, GameEvent::ExplosionOccurred { .. })), 2);
    }

    #[test]
    fn test_destroyed_boulder_leaves_after_delay() {
        let mut state = settled_state(19);
        state.boulders.clear();
        let id = state.spawn_boulder(resting_center(2, 12, BOULDER_SIZE.1));
        state.player.record_boulder_contact(id, state.clock_ms);
        let health = state.boulders[0].health;
        collision::hit(&mut state.boulders[0], health, DamageCause::Explosion, &mut state.events);

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.boulders.len(), 1);
        assert!(state.player.boulder_contacts.is_empty());

        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.boulders.is_empty());
    }

    #[test]
    fn test_shop_freezes_simulation() {
        let mut tuning = Tuning::default();
        tuning.shop.interval_depth = 1;
        let mut state = GameState::with_tuning(21, tuning);
        tick(&mut state, &TickInput::default(), SIM_DT);

        let dig = TickInput {
            dig: true,
            ..Default::default()
        };
        for _ in 0..120 {
            tick(&mut state, &dig, SIM_DT);
            if state.phase == GamePhase::Shop {
                break;
            }
        }
        assert_eq!(state.phase, GamePhase::Shop);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::ShopOpened { depth: 1, .. })));

        let clock = state.clock_ms;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.clock_ms, clock);

        shop::close_shop(&mut state).unwrap();
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.clock_ms > clock);
    }

    #[test]
    fn test_autopilot_digs_down() {
        let mut state = GameState::new(7);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..900 {
            tick(&mut state, &input, SIM_DT);
        }
        assert!(state.stats.max_depth >= 3 || state.phase == GamePhase::GameOver);
    }

    #[test]
    fn test_consumable_input_is_spent() {
        let mut state = settled_state(23);
        state.stats.consumables.push(Consumable::Heart);
        let input = TickInput {
            use_consumable: Some(Consumable::Heart),
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.stats.lives, 4);
        assert!(state.stats.consumables.is_empty());
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::StatsChanged(s) if s.lives == 4)));

        // Nothing left to use
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.stats.lives, 4);
    }

    #[test]
    fn test_settled_player_is_grounded() {
        let state = settled_state(1);
        assert_eq!(state.player.state(), crate::sim::player::PlayerState::Grounded);
    }
}
