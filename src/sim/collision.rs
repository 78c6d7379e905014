//! Movement and collision resolution for box-shaped actors
//!
//! Sequential per-axis resolution, not swept collision: apply x, resolve
//! against the first overlapping obstacle, then the same for y, then clamp to
//! the world. Blocky rooms make this good enough and keep it cheap.

use glam::{IVec2, Vec2};

use super::aabb::Aabb;
use crate::consts::DIAGONAL_SCALE;

/// Result of resolving one tick of movement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    /// Collision box after movement and clamping
    pub bbox: Aabb,
    /// Requested velocity with blocked axes zeroed
    pub residual: Vec2,
    /// Index (into the obstacle list) of the obstacle that stopped x motion
    pub blocked_x: Option<usize>,
    /// Index of the obstacle that stopped y motion
    pub blocked_y: Option<usize>,
}

impl MoveResult {
    fn unchanged(bbox: Aabb) -> Self {
        Self {
            bbox,
            residual: Vec2::ZERO,
            blocked_x: None,
            blocked_y: None,
        }
    }

    /// True if either axis was stopped by an obstacle
    pub fn was_blocked(&self) -> bool {
        self.blocked_x.is_some() || self.blocked_y.is_some()
    }
}

/// Move `actor` by `delta` against `obstacles`, then clamp to `world`.
///
/// Obstacles are scanned in order and only the first overlap per axis is
/// resolved, so iteration order decides which obstacle is credited. An actor
/// that already overlaps an obstacle is not pushed out.
pub fn resolve_movement(actor: Aabb, delta: Vec2, obstacles: &[Aabb], world: &Aabb) -> MoveResult {
    if delta == Vec2::ZERO {
        return MoveResult::unchanged(actor);
    }

    let mut bbox = actor;
    let mut residual = delta;
    let mut blocked_x = None;
    let mut blocked_y = None;

    // X axis
    bbox.pos.x += delta.x;
    if delta.x != 0.0 {
        if let Some(i) = obstacles.iter().position(|o| bbox.overlaps(o)) {
            let o = &obstacles[i];
            if delta.x > 0.0 {
                bbox.set_right(o.left());
            } else {
                bbox.set_left(o.right());
            }
            residual.x = 0.0;
            blocked_x = Some(i);
        }
    }

    // Y axis
    bbox.pos.y += delta.y;
    if delta.y != 0.0 {
        if let Some(i) = obstacles.iter().position(|o| bbox.overlaps(o)) {
            let o = &obstacles[i];
            if delta.y > 0.0 {
                bbox.set_bottom(o.top());
            } else {
                bbox.set_top(o.bottom());
            }
            residual.y = 0.0;
            blocked_y = Some(i);
        }
    }

    MoveResult {
        bbox: bbox.clamped_within(world),
        residual,
        blocked_x,
        blocked_y,
    }
}

/// Velocity for a directional intent (each component -1, 0 or 1).
///
/// Diagonal intent is scaled by 1/sqrt(2) per component so it is no faster
/// than axial movement.
pub fn intent_velocity(intent: IVec2, speed: f32) -> Vec2 {
    let dir = intent.clamp(IVec2::NEG_ONE, IVec2::ONE).as_vec2();
    if dir.x != 0.0 && dir.y != 0.0 {
        dir * DIAGONAL_SCALE * speed
    } else {
        dir * speed
    }
}

/// Entities that request a velocity and move through `resolve_movement`
pub trait Movable {
    /// Velocity requested for the current tick (units per second)
    fn velocity(&self) -> Vec2;
    /// Apply the outcome of movement resolution (blocked axes stop)
    fn apply_move(&mut self, result: &MoveResult);
}
