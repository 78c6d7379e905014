//! Guard vision: detection test and the clipped sight cone
//!
//! Detection is three gates evaluated from the guard's center:
//! - distance: target center within range
//! - angle: bearing within half the field of view of the facing angle
//! - occlusion: the straight segment to the target crosses no occluder
//!
//! The cone silhouette is feedback only and never feeds the detection decision.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use crate::{angle_diff, heading, polar_to_cartesian};

/// Sight parameters of a guard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sight {
    /// Maximum seeing distance
    pub range: f32,
    /// Half of the field of view (radians)
    pub half_fov: f32,
}

impl Sight {
    pub fn new(range: f32, fov_degrees: f32) -> Self {
        debug_assert!(range >= 0.0, "negative vision range");
        Self {
            range,
            half_fov: fov_degrees.to_radians() / 2.0,
        }
    }
}

/// Boxes a guard can spot a target by.
///
/// A tall sprite with a narrow physical footprint exposes its feet box and
/// optionally the larger upper-body box. Either one being seen is enough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetHitboxes {
    pub feet: Aabb,
    pub body: Option<Aabb>,
}

impl TargetHitboxes {
    pub fn single(feet: Aabb) -> Self {
        Self { feet, body: None }
    }

    pub fn with_body(feet: Aabb, body: Aabb) -> Self {
        Self {
            feet,
            body: Some(body),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aabb> {
        std::iter::once(&self.feet).chain(self.body.as_ref())
    }
}

/// Anything a guard can look for
pub trait Detectable {
    fn hitboxes(&self) -> TargetHitboxes;
}

/// True if any occluder touches the segment `from -> to`
pub fn line_blocked(from: Vec2, to: Vec2, occluders: &[Aabb]) -> bool {
    occluders.iter().any(|o| o.clip_segment(from, to).is_hit())
}

/// Whether a guard at `eye` facing `facing` sees `point`
pub fn sees_point(eye: Vec2, facing: f32, sight: &Sight, point: Vec2, occluders: &[Aabb]) -> bool {
    let to_target = point - eye;
    let distance = to_target.length();
    if distance > sight.range {
        return false;
    }

    // Coincident centers have no bearing; treat as in view
    if distance > f32::EPSILON && angle_diff(heading(to_target), facing).abs() > sight.half_fov {
        return false;
    }

    !line_blocked(eye, point, occluders)
}

/// Detection test for one guard against one target.
///
/// Each hit-box is tested on its own center; detection succeeds if any of
/// them clears all three gates.
pub fn is_detected(
    eye: Vec2,
    facing: f32,
    sight: &Sight,
    target: &TargetHitboxes,
    occluders: &[Aabb],
) -> bool {
    target
        .iter()
        .any(|hitbox| sees_point(eye, facing, sight, hitbox.center(), occluders))
}

/// Visible wedge: apex at the guard center, two clipped far corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionCone {
    pub apex: Vec2,
    /// End of the `facing - half_fov` edge
    pub left: Vec2,
    /// End of the `facing + half_fov` edge
    pub right: Vec2,
}

impl VisionCone {
    pub fn points(&self) -> [Vec2; 3] {
        [self.apex, self.left, self.right]
    }

    /// Length of each edge after clipping
    pub fn edge_lengths(&self) -> (f32, f32) {
        (self.apex.distance(self.left), self.apex.distance(self.right))
    }
}

/// Build the sight cone, shortening each edge at its first occluder.
///
/// Each edge is clipped independently, so two different walls may cut the
/// two edges. Walls that sit inside the wedge without touching either edge
/// are not carved out.
pub fn vision_cone(eye: Vec2, facing: f32, sight: &Sight, occluders: &[Aabb]) -> VisionCone {
    let left = eye + polar_to_cartesian(sight.range, facing - sight.half_fov);
    let right = eye + polar_to_cartesian(sight.range, facing + sight.half_fov);
    VisionCone {
        apex: eye,
        left: clip_edge(eye, left, occluders),
        right: clip_edge(eye, right, occluders),
    }
}

/// Nearest boundary crossing along `origin -> end`, or `end` if unobstructed
fn clip_edge(origin: Vec2, end: Vec2, occluders: &[Aabb]) -> Vec2 {
    occluders
        .iter()
        .filter_map(|o| {
            // Apex inside a wall: nothing of this edge is visible
            if o.contains_point(origin) {
                return Some(origin);
            }
            o.clip_segment(origin, end).nearest_to(origin)
        })
        .min_by(|a, b| {
            a.distance_squared(origin)
                .total_cmp(&b.distance_squared(origin))
        })
        .unwrap_or(end)
}
