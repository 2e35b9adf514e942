//! Dig and explosion engine
//!
//! Digging removes one full-width row. Explosions remove every row whose
//! center lies within the blast's vertical reach, but damage entities by true
//! distance from the blast center. The two shapes are deliberately different.

use glam::Vec2;

use super::collision::hit;
use super::entity::DamageCause;
use super::events::{ClearCause, GameEvent};
use super::grid::{TileKind, row_below, row_top, surface_y, world_to_tile_y};
use super::player::damage_player;
use super::state::GameState;
use crate::consts::*;

/// Clear the row directly below a trigger point.
///
/// Returns false when there is no row there (never generated or already
/// cleared). That is not an error; nothing is emitted in that case.
pub fn clear_row(state: &mut GameState, trigger_y: f32, cause: ClearCause) -> bool {
    clear_row_index(state, row_below(trigger_y), cause)
}

/// Clear a row by index
pub fn clear_row_index(state: &mut GameState, tile_y: i32, cause: ClearCause) -> bool {
    let Some(tiles) = state.terrain.clear_row(tile_y) else {
        return false;
    };

    // Spikes standing on the removed surface go with it
    let surface = surface_y(tile_y);
    let doomed: Vec<usize> = state
        .spikes
        .iter()
        .enumerate()
        .filter(|(_, s)| s.active && s.body.pos.y >= surface - TILE_SIZE && s.body.pos.y <= surface)
        .map(|(i, _)| i)
        .collect();
    for si in doomed {
        let spike = &mut state.spikes[si];
        let amount = spike.health;
        hit(spike, amount, DamageCause::RowCleared, &mut state.events);
    }

    wake_bodies_on(state, surface);

    if cause == ClearCause::Dig {
        let gold = tiles.iter().filter(|t| **t == TileKind::Gold).count() as u32;
        if gold > 0 {
            state.stats.add_coins(gold * state.tuning.terrain.gold_tile_value);
            state.mark_stats_dirty();
        }
    }

    log::debug!("Row {} cleared ({:?})", tile_y, cause);
    state.emit(GameEvent::RowCleared {
        row: tile_y,
        tiles,
        cause,
    });
    true
}

/// Anything resting on a vanished surface starts falling this tick
fn wake_bodies_on(state: &mut GameState, surface: f32) {
    let resting = |bottom: f32| (bottom - surface).abs() < 0.5;

    if resting(state.player.body.bottom()) {
        state.player.body.on_ground = false;
    }
    let bodies = state
        .boulders
        .iter_mut()
        .map(|b| &mut b.body)
        .chain(state.enemies.iter_mut().map(|e| &mut e.body))
        .chain(state.coins.iter_mut().map(|c| &mut c.body))
        .chain(state.tnts.iter_mut().map(|t| &mut t.body));
    for body in bodies {
        if body.dynamic && resting(body.bottom()) {
            body.on_ground = false;
        }
    }
}

/// What an explosion did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplosionReport {
    /// Rows removed, top to bottom
    pub rows_cleared: Vec<i32>,
    /// Enemies, spikes and boulders destroyed
    pub destroyed: usize,
    /// Other TNT set to go off next
    pub ignited: usize,
    pub player_hit: bool,
}

/// Blast at `center`: damage by distance, then clear rows within vertical reach
pub fn explode(state: &mut GameState, center: Vec2, radius: f32) -> ExplosionReport {
    let mut report = ExplosionReport::default();
    let radius = radius.max(0.0);
    state.emit(GameEvent::ExplosionOccurred {
        pos: center,
        radius,
    });

    let in_blast = |pos: Vec2| pos.distance(center) <= radius;

    for i in 0..state.enemies.len() {
        let enemy = &mut state.enemies[i];
        if enemy.active && in_blast(enemy.body.pos) {
            let amount = enemy.health;
            hit(enemy, amount, DamageCause::Explosion, &mut state.events);
            report.destroyed += 1;
        }
    }
    for i in 0..state.spikes.len() {
        let spike = &mut state.spikes[i];
        if spike.active && in_blast(spike.body.pos) {
            let amount = spike.health;
            hit(spike, amount, DamageCause::Explosion, &mut state.events);
            report.destroyed += 1;
        }
    }
    for i in 0..state.boulders.len() {
        let boulder = &mut state.boulders[i];
        if boulder.active && in_blast(boulder.body.pos) {
            let amount = boulder.health;
            hit(boulder, amount, DamageCause::Explosion, &mut state.events);
            report.destroyed += 1;
        }
    }

    // Chain reaction; the TNT that is exploding has already deactivated
    let now = state.clock_ms;
    for tnt in state.tnts.iter_mut() {
        if tnt.active && in_blast(tnt.body.pos) {
            tnt.ignite_now(now);
            report.ignited += 1;
        }
    }

    // Rows go last so kills are credited to the blast, not the missing floor
    let center_row = world_to_tile_y(center.y);
    let reach = (radius / TILE_SIZE).ceil() as i32;
    for tile_y in (center_row - reach)..=(center_row + reach) {
        let row_center = row_top(tile_y) + TILE_SIZE / 2.0;
        if (row_center - center.y).abs() <= radius
            && clear_row_index(state, tile_y, ClearCause::Explosion)
        {
            report.rows_cleared.push(tile_y);
        }
    }

    if state.player.active && in_blast(state.player.body.pos) {
        damage_player(state, 1, DamageCause::Explosion);
        report.player_hit = true;
    }

    log::debug!(
        "Explosion at {:?} r={}: {} rows, {} destroyed",
        center,
        radius,
        report.rows_cleared.len(),
        report.destroyed
    );
    report
}
