//! Axis-aligned box geometry
//!
//! Screen space, y grows downward. A box is its top-left corner plus size:
//! - left/top: the position
//! - right/bottom: position + size (exclusive trailing edge)

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height (both >= 0)
    pub size: Vec2,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        debug_assert!(w >= 0.0 && h >= 0.0, "negative box size {w}x{h}");
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Box of the given size centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            pos: center - size / 2.0,
            size,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Move so the left edge sits at `x` (size unchanged)
    #[inline]
    pub fn set_left(&mut self, x: f32) {
        self.pos.x = x;
    }

    /// Move so the right edge sits at `x` (size unchanged)
    #[inline]
    pub fn set_right(&mut self, x: f32) {
        self.pos.x = x - self.size.x;
    }

    #[inline]
    pub fn set_top(&mut self, y: f32) {
        self.pos.y = y;
    }

    #[inline]
    pub fn set_bottom(&mut self, y: f32) {
        self.pos.y = y - self.size.y;
    }

    /// Copy grown by `amount` in total on each axis, keeping the center
    pub fn inflated(&self, amount: Vec2) -> Self {
        Self::from_center(self.center(), (self.size + amount).max(Vec2::ZERO))
    }

    /// True iff the interiors intersect. Touching edges do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// True if `other` lies entirely inside this box (edges may touch)
    pub fn contains(&self, other: &Aabb) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// True if the point lies inside. Left and top edges are inside, right
    /// and bottom edges are not, matching `overlaps`.
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// True if the point lies strictly inside (not on the boundary)
    fn strictly_contains_point(&self, p: Vec2) -> bool {
        p.x > self.left() && p.x < self.right() && p.y > self.top() && p.y < self.bottom()
    }

    /// Push the box back inside `bounds`, one edge at a time.
    ///
    /// Left then right, top then bottom. A box wider than the bounds ends up
    /// flush with the right/bottom edge.
    pub fn clamped_within(&self, bounds: &Aabb) -> Self {
        let mut out = *self;
        if out.left() < bounds.left() {
            out.set_left(bounds.left());
        }
        if out.right() > bounds.right() {
            out.set_right(bounds.right());
        }
        if out.top() < bounds.top() {
            out.set_top(bounds.top());
        }
        if out.bottom() > bounds.bottom() {
            out.set_bottom(bounds.bottom());
        }
        out
    }

    /// Clip the segment `p1 -> p2` against this box (Liang-Barsky).
    ///
    /// Only boundary crossings are reported; an endpoint lying inside the box
    /// is never returned as a clip point. A segment that only runs along or
    /// touches the right or bottom edge misses.
    pub fn clip_segment(&self, p1: Vec2, p2: Vec2) -> Clip {
        let d = p2 - p1;
        let mut t_enter = 0.0_f32;
        let mut t_exit = 1.0_f32;

        let slabs = [
            (-d.x, p1.x - self.left()),
            (d.x, self.right() - p1.x),
            (-d.y, p1.y - self.top()),
            (d.y, self.bottom() - p1.y),
        ];

        for (p, q) in slabs {
            if p == 0.0 {
                // Parallel to this slab: outside means no hit at all
                if q < 0.0 {
                    return Clip::Miss;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t_exit {
                    return Clip::Miss;
                }
                t_enter = t_enter.max(r);
            } else {
                if r < t_enter {
                    return Clip::Miss;
                }
                t_exit = t_exit.min(r);
            }
        }

        // Any interior point of the clipped span lies on a trailing edge only
        // if the whole span does
        if !self.contains_point(p1 + d * ((t_enter + t_exit) * 0.5)) {
            return Clip::Miss;
        }

        let enters = !self.strictly_contains_point(p1);
        let exits = !self.strictly_contains_point(p2);
        let entry = p1 + d * t_enter;
        let exit = p1 + d * t_exit;

        match (enters, exits) {
            (true, true) => Clip::Through { entry, exit },
            (true, false) => Clip::Single(entry),
            (false, true) => Clip::Single(exit),
            (false, false) => Clip::Inside,
        }
    }
}

/// Result of clipping a segment against a box
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clip {
    /// The segment never touches the box
    Miss,
    /// Both endpoints are inside; the boundary is never crossed
    Inside,
    /// Exactly one endpoint is inside; the single boundary crossing
    Single(Vec2),
    /// The segment enters and leaves the box (ordered along the segment)
    Through { entry: Vec2, exit: Vec2 },
}

impl Clip {
    /// Whether the segment touches the box at all
    #[inline]
    pub fn is_hit(&self) -> bool {
        !matches!(self, Clip::Miss)
    }

    /// Boundary crossings, in segment order
    pub fn crossings(&self) -> impl Iterator<Item = Vec2> {
        let (a, b) = match *self {
            Clip::Miss | Clip::Inside => (None, None),
            Clip::Single(p) => (Some(p), None),
            Clip::Through { entry, exit } => (Some(entry), Some(exit)),
        };
        a.into_iter().chain(b)
    }

    /// Crossing closest to `origin`, if any
    pub fn nearest_to(&self, origin: Vec2) -> Option<Vec2> {
        self.crossings().min_by(|a, b| {
            a.distance_squared(origin)
                .total_cmp(&b.distance_squared(origin))
        })
    }
}

/// Anything with a physical footprint that blocks movement
pub trait HasCollisionBox {
    fn collision_box(&self) -> Aabb;
}

impl HasCollisionBox for Aabb {
    fn collision_box(&self) -> Aabb {
        *self
    }
}
