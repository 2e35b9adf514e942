//! Arcade physics: axis-aligned boxes, gravity bodies and row landing
//!
//! Bodies fall under gravity and land on row surfaces from above only.
//! Landing scans every row crossed during the step, so a fast body can never
//! tunnel through a thin surface.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::colliders::RowColliderStore;
use super::grid::world_to_tile_y;
use crate::consts::*;

/// Tolerance for "was above the surface last step"
const LANDING_SLOP: f32 = 1.0;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap (touching edges do not count)
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Shrink on every side (used for footprint queries so neighbours don't touch)
    pub fn inset(&self, amount: f32) -> Self {
        Self {
            min: self.min + Vec2::splat(amount),
            max: self.max - Vec2::splat(amount),
        }
    }
}

/// Result of an overlap check between two boxes
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the boxes overlap
    pub hit: bool,
    /// Separation axis, pointing from `b` toward `a`
    pub normal: Vec2,
    /// Overlap depth along `normal`
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Minimum-translation overlap between two boxes
pub fn aabb_overlap(a: &Aabb, b: &Aabb) -> CollisionResult {
    if !a.intersects(b) {
        return CollisionResult::miss();
    }

    let pen_x = (a.max.x - b.min.x).min(b.max.x - a.min.x);
    let pen_y = (a.max.y - b.min.y).min(b.max.y - a.min.y);
    let delta = a.center() - b.center();

    if pen_y <= pen_x {
        CollisionResult {
            hit: true,
            normal: Vec2::new(0.0, if delta.y < 0.0 { -1.0 } else { 1.0 }),
            penetration: pen_y,
        }
    } else {
        CollisionResult {
            hit: true,
            normal: Vec2::new(if delta.x < 0.0 { -1.0 } else { 1.0 }, 0.0),
            penetration: pen_x,
        }
    }
}

/// A moving box in the physics world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    /// Center position
    pub pos: Vec2,
    pub vel: Vec2,
    /// Half extents
    pub half: Vec2,
    /// Affected by gravity
    pub dynamic: bool,
    /// Resting on a row surface or another body this step
    pub on_ground: bool,
    pub blocked_left: bool,
    pub blocked_right: bool,
    /// Bottom edge at the start of the last integration step
    #[serde(default)]
    pub prev_bottom: f32,
}

impl Body {
    pub fn new(pos: Vec2, size: (f32, f32)) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            half: Vec2::new(size.0 / 2.0, size.1 / 2.0),
            dynamic: true,
            on_ground: false,
            blocked_left: false,
            blocked_right: false,
            prev_bottom: pos.y + size.1 / 2.0,
        }
    }

    /// A body that never moves on its own
    pub fn fixed(pos: Vec2, size: (f32, f32)) -> Self {
        Self {
            dynamic: false,
            ..Self::new(pos, size)
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.half)
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - self.half.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.half.y
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Keep the body inside the side walls, flagging which wall it touched
    pub fn clamp_to_walls(&mut self) {
        if self.pos.x - self.half.x < 0.0 {
            self.pos.x = self.half.x;
            if self.vel.x < 0.0 {
                self.vel.x = 0.0;
            }
            self.blocked_left = true;
        }
        if self.pos.x + self.half.x > MAP_WIDTH {
            self.pos.x = MAP_WIDTH - self.half.x;
            if self.vel.x > 0.0 {
                self.vel.x = 0.0;
            }
            self.blocked_right = true;
        }
    }

    /// Rest this body on top of a surface at `y`
    pub fn land_on(&mut self, y: f32) {
        self.pos.y = y - self.half.y;
        if self.vel.y > 0.0 {
            self.vel.y = 0.0;
        }
        self.on_ground = true;
    }
}

/// Advance one body by `dt`, landing it on any row surface it crosses
pub fn integrate(body: &mut Body, colliders: &RowColliderStore, dt: f32) {
    body.prev_bottom = body.bottom();
    if !body.dynamic {
        return;
    }

    body.blocked_left = false;
    body.blocked_right = false;
    body.vel.y = (body.vel.y + GRAVITY * dt).min(MAX_FALL_SPEED);

    body.pos.x += body.vel.x * dt;
    body.clamp_to_walls();

    let old_bottom = body.bottom();
    body.pos.y += body.vel.y * dt;
    body.on_ground = false;

    if body.vel.y >= 0.0 {
        let new_bottom = body.bottom();
        let first = world_to_tile_y(old_bottom - LANDING_SLOP);
        let last = world_to_tile_y(new_bottom);
        let landing = colliders
            .rows_between(first, last)
            .map(|c| c.top())
            .find(|&top| old_bottom <= top + LANDING_SLOP && new_bottom >= top);
        if let Some(top) = landing {
            body.land_on(top);
        }
    }
}

/// How two solid bodies were pushed apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separation {
    None,
    /// `a` ended up resting on `b`
    AOnTop,
    /// `b` ended up resting on `a`
    BOnTop,
    Side,
}

/// Push two overlapping solid bodies apart.
///
/// `a_share` is the fraction of the correction applied to `a` (1.0 moves only `a`).
pub fn separate(a: &mut Body, b: &mut Body, a_share: f32) -> Separation {
    let result = aabb_overlap(&a.aabb(), &b.aabb());
    if !result.hit {
        return Separation::None;
    }

    let a_share = a_share.clamp(0.0, 1.0);
    let correction = result.normal * result.penetration;

    if result.normal.y != 0.0 {
        // Whichever body is on top moves up; the one below stays put
        if result.normal.y < 0.0 {
            let top = b.top();
            a.land_on(top);
            Separation::AOnTop
        } else {
            let top = a.top();
            b.land_on(top);
            Separation::BOnTop
        }
    } else {
        a.pos += correction * a_share;
        b.pos -= correction * (1.0 - a_share);
        a.clamp_to_walls();
        b.clamp_to_walls();
        Separation::Side
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::surface_y;

    #[test]
    fn test_body_lands_on_row() {
        let mut store = RowColliderStore::new();
        store.add_row(3);
        let mut body = Body::new(Vec2::new(100.0, surface_y(3) - 40.0), (20.0, 20.0));

        for _ in 0..120 {
            integrate(&mut body, &store, SIM_DT);
        }
        assert!(body.on_ground);
        assert!((body.bottom() - surface_y(3)).abs() < 1e-3);
        assert_eq!(body.vel.y, 0.0);
    }

    #[test]
    fn test_fast_body_does_not_tunnel() {
        let mut store = RowColliderStore::new();
        store.add_row(10);
        let mut body = Body::new(Vec2::new(50.0, surface_y(10) - 12.0), (10.0, 10.0));
        body.vel.y = MAX_FALL_SPEED;

        // One large step covering several rows
        integrate(&mut body, &store, 0.1);
        assert!(body.on_ground);
        assert!((body.bottom() - surface_y(10)).abs() < 1e-3);
    }

    #[test]
    fn test_prev_bottom_tracks_step_start() {
        let store = RowColliderStore::new();
        let mut body = Body::new(Vec2::new(50.0, 100.0), (10.0, 10.0));
        body.vel.y = 600.0;
        let start = body.bottom();
        integrate(&mut body, &store, SIM_DT);
        assert_eq!(body.prev_bottom, start);
        assert!(body.bottom() > start + 8.0);
    }

    #[test]
    fn test_rising_body_passes_through_surface() {
        let mut store = RowColliderStore::new();
        store.add_row(2);
        let mut body = Body::new(Vec2::new(50.0, surface_y(2) + 20.0), (10.0, 10.0));
        body.vel.y = -400.0;
        integrate(&mut body, &store, 0.1);
        assert!(!body.on_ground);
        assert!(body.vel.y < 0.0);
    }

    #[test]
    fn test_falls_after_row_removed() {
        let mut store = RowColliderStore::new();
        store.add_row(1);
        store.add_row(2);
        let mut body = Body::new(Vec2::new(50.0, surface_y(1) - 5.0), (10.0, 10.0));
        integrate(&mut body, &store, SIM_DT);
        assert!(body.on_ground);

        store.remove_row(1);
        for _ in 0..60 {
            integrate(&mut body, &store, SIM_DT);
        }
        assert!((body.bottom() - surface_y(2)).abs() < 1e-3);
    }

    #[test]
    fn test_walls_block() {
        let store = RowColliderStore::new();
        let mut body = Body::new(Vec2::new(5.0, 0.0), (10.0, 10.0));
        body.vel.x = -100.0;
        integrate(&mut body, &store, SIM_DT);
        assert!(body.blocked_left);
        assert_eq!(body.pos.x, 5.0);
    }

    #[test]
    fn test_separate_top_and_side() {
        let mut a = Body::new(Vec2::new(50.0, 42.0), (20.0, 20.0));
        let mut b = Body::new(Vec2::new(50.0, 60.0), (20.0, 20.0));
        a.vel.y = 100.0;
        assert_eq!(separate(&mut a, &mut b, 1.0), Separation::AOnTop);
        assert!((a.bottom() - b.top()).abs() < 1e-4);
        assert_eq!(a.vel.y, 0.0);

        let mut a = Body::new(Vec2::new(45.0, 60.0), (20.0, 20.0));
        let mut b = Body::new(Vec2::new(60.0, 60.0), (20.0, 20.0));
        assert_eq!(separate(&mut a, &mut b, 0.5), Separation::Side);
        assert!(!a.aabb().intersects(&b.aabb()));
    }
}
