//! Constrained random placement
//!
//! Rejection sampling inside spawn zones, plus satellite placement in an
//! annulus around already placed anchors. All randomness comes from the
//! caller's seeded RNG so a given seed always yields the same area.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use crate::polar_to_cartesian;

/// Shape of a placeable object relative to its visual top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Visual (sprite) size
    pub size: Vec2,
    /// Collision box offset from the visual top-left
    pub collision_offset: Vec2,
    pub collision_size: Vec2,
    /// Interaction zone, centered on the collision box
    pub interaction_size: Option<Vec2>,
}

impl Footprint {
    /// Collision box equals the visual box
    pub fn solid(size: Vec2) -> Self {
        Self {
            size,
            collision_offset: Vec2::ZERO,
            collision_size: size,
            interaction_size: None,
        }
    }

    /// Collision box given as fractions of the visual size
    pub fn from_fractions(size: Vec2, offset_frac: Vec2, size_frac: Vec2) -> Self {
        Self {
            size,
            collision_offset: size * offset_frac,
            collision_size: size * size_frac,
            interaction_size: None,
        }
    }

    /// Collision box of `size_frac` centered horizontally and resting on the
    /// bottom edge (trunks, feet)
    pub fn grounded(size: Vec2, size_frac: Vec2) -> Self {
        let offset_frac = Vec2::new((1.0 - size_frac.x) / 2.0, 1.0 - size_frac.y);
        Self::from_fractions(size, offset_frac, size_frac)
    }

    pub fn with_interaction(mut self, size: Vec2) -> Self {
        self.interaction_size = Some(size);
        self
    }

    /// Instantiate with the visual top-left at `top_left`
    pub fn at(&self, top_left: Vec2) -> Placement {
        let visual = Aabb {
            pos: top_left,
            size: self.size,
        };
        let collision = Aabb {
            pos: top_left + self.collision_offset,
            size: self.collision_size,
        };
        let interaction = self
            .interaction_size
            .map(|size| Aabb::from_center(collision.center(), size));
        Placement {
            visual,
            collision,
            interaction,
        }
    }

    /// Instantiate with the collision box centered on `center`
    pub fn centered_at(&self, center: Vec2) -> Placement {
        self.at(center - self.collision_offset - self.collision_size / 2.0)
    }
}

/// A placed object's boxes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub visual: Aabb,
    pub collision: Aabb,
    pub interaction: Option<Aabb>,
}

impl Placement {
    /// True if the collision box or the interaction zone overlaps `other`
    fn touches(&self, other: &Aabb) -> bool {
        self.collision.overlaps(other) || self.interaction.is_some_and(|i| i.overlaps(other))
    }
}

/// Zone placement parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementRules {
    /// Inset from the zone edges
    pub margin: f32,
    /// Attempts per instance before it is skipped
    pub max_attempts: u32,
    /// Minimum gap between instances of the same batch
    pub separation: f32,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            margin: 8.0,
            max_attempts: 200,
            separation: 0.0,
        }
    }
}

/// Satellite placement parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteRules {
    pub min_radius: f32,
    pub max_radius: f32,
    /// Satellites wanted per anchor, drawn from `min_count..=max_count`
    pub min_count: u32,
    pub max_count: u32,
    /// Attempt budget per anchor
    pub max_attempts: u32,
}

impl Default for SatelliteRules {
    fn default() -> Self {
        Self {
            min_radius: 70.0,
            max_radius: 100.0,
            min_count: 1,
            max_count: 4,
            max_attempts: 300,
        }
    }
}

/// Uniform top-left for an object of `size` inside `zone` inset by `margin`.
///
/// None if the zone is too small for the object.
pub fn random_point_in_zone<R: Rng + ?Sized>(
    rng: &mut R,
    zone: &Aabb,
    size: Vec2,
    margin: f32,
) -> Option<Vec2> {
    let min = zone.pos + Vec2::splat(margin);
    let max = zone.pos + zone.size - size - Vec2::splat(margin);
    if max.x < min.x || max.y < min.y {
        return None;
    }
    Some(Vec2::new(
        rng.random_range(min.x..=max.x),
        rng.random_range(min.y..=max.y),
    ))
}

/// Place up to `count` objects in `zones` by rejection sampling.
///
/// Each attempt picks a zone uniformly and a position inside it. A candidate
/// is rejected if its visual box leaves `world`, if its collision box or
/// interaction zone overlaps an obstacle, or if it comes within
/// `rules.separation` of an instance placed earlier in this call. An
/// instance whose budget runs out is skipped, so the result may be short.
pub fn place_objects<R: Rng + ?Sized>(
    rng: &mut R,
    zones: &[Aabb],
    count: usize,
    footprint: &Footprint,
    obstacles: &[Aabb],
    rules: &PlacementRules,
    world: &Aabb,
) -> Vec<Placement> {
    let mut placed: Vec<Placement> = Vec::with_capacity(count);
    if zones.is_empty() {
        if count > 0 {
            log::warn!("No spawn zones given; skipping {count} objects");
        }
        return placed;
    }

    for _ in 0..count {
        let found = (0..rules.max_attempts).find_map(|_| {
            let zone = zones.choose(rng)?;
            let top_left = random_point_in_zone(rng, zone, footprint.size, rules.margin)?;
            let candidate = footprint.at(top_left);
            is_valid(&candidate, obstacles, &placed, rules.separation, world).then_some(candidate)
        });

        match found {
            Some(p) => placed.push(p),
            None => log::warn!(
                "Could not place object after {} attempts",
                rules.max_attempts
            ),
        }
    }

    if placed.len() < count {
        log::info!("Placed {}/{} objects", placed.len(), count);
    }
    placed
}

fn is_valid(
    candidate: &Placement,
    obstacles: &[Aabb],
    placed: &[Placement],
    separation: f32,
    world: &Aabb,
) -> bool {
    if !world.contains(&candidate.visual) {
        return false;
    }
    if obstacles.iter().any(|o| candidate.touches(o)) {
        return false;
    }
    let buffer = candidate.collision.inflated(Vec2::splat(separation * 2.0));
    !placed.iter().any(|p| {
        buffer.overlaps(&p.collision)
            || matches!((candidate.interaction, p.interaction), (Some(a), Some(b)) if a.overlaps(&b))
    })
}

/// Place satellites in an annulus around each anchor.
///
/// Rings are centered on the anchor's visual center. Besides the usual
/// rejection rules (obstacles, anchors and earlier satellites all block),
/// a satellite whose bottom edge is above the anchor's collision top is
/// rejected so it never hides behind the anchor sprite.
pub fn place_satellites<R: Rng + ?Sized>(
    rng: &mut R,
    anchors: &[Placement],
    footprint: &Footprint,
    obstacles: &[Aabb],
    rules: &SatelliteRules,
    world: &Aabb,
) -> Vec<Placement> {
    let (min_radius, max_radius) = if rules.min_radius <= rules.max_radius {
        (rules.min_radius, rules.max_radius)
    } else {
        (rules.max_radius, rules.min_radius)
    };
    let (min_count, max_count) = (
        rules.min_count.min(rules.max_count),
        rules.min_count.max(rules.max_count),
    );

    let mut blockers: Vec<Aabb> = obstacles.to_vec();
    blockers.extend(anchors.iter().map(|a| a.collision));

    let mut placed: Vec<Placement> = Vec::new();
    for anchor in anchors {
        let wanted = rng.random_range(min_count..=max_count);
        let center = anchor.visual.center();
        let mut got = 0;
        let mut attempts = rules.max_attempts;

        while got < wanted && attempts > 0 {
            attempts -= 1;
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let radius = rng.random_range(min_radius..=max_radius);
            let candidate = footprint.centered_at(center + polar_to_cartesian(radius, angle));

            if candidate.collision.bottom() < anchor.collision.top() {
                continue;
            }
            if !is_valid(&candidate, &blockers, &placed, 0.0, world) {
                continue;
            }
            placed.push(candidate);
            got += 1;
        }

        if got < wanted {
            log::debug!("Anchor at {center}: placed {got}/{wanted} satellites");
        }
    }

    log::info!(
        "Placed {} satellites around {} anchors",
        placed.len(),
        anchors.len()
    );
    placed
}
