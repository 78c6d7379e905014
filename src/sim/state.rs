//! World state and entity types
//!
//! Everything the tick mutates lives in `World`. Entity lists are kept
//! sorted by id so iteration (and therefore RNG consumption) is stable.

use glam::{IVec2, Vec2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::aabb::{Aabb, HasCollisionBox};
use super::collision::{Movable, MoveResult, intent_velocity};
use super::encounter::{EncounterPhase, Vitality};
use super::interact::Collectible;
use super::placement::{Placement, place_objects, place_satellites};
use super::vision::{Detectable, Sight, TargetHitboxes, VisionCone, is_detected, vision_cone};
use crate::tuning::{AreaLayout, GuardPreset, GuardTuning, PlayerTuning, Tuning};
use crate::{heading, polar_to_cartesian};

/// The controlled actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Collision (feet) box
    pub bbox: Aabb,
    /// Requested velocity (pixels per second)
    pub vel: Vec2,
    pub speed: f32,
    /// Full sprite height, bottom-aligned with the collision box
    pub sprite_height: Option<f32>,
    pub vitality: Vitality,
}

impl Player {
    pub fn new(spawn: Vec2, tuning: &PlayerTuning) -> Self {
        Self {
            bbox: Aabb {
                pos: spawn,
                size: tuning.size,
            },
            vel: Vec2::ZERO,
            speed: tuning.speed,
            sprite_height: tuning.sprite_height,
            vitality: Vitality::new(tuning.lives, tuning.invuln_ticks),
        }
    }

    pub fn set_intent(&mut self, intent: IVec2) {
        self.vel = intent_velocity(intent, self.speed);
    }

    /// Whole-sprite box, when the sprite is taller than the feet box
    pub fn body_box(&self) -> Option<Aabb> {
        let h = self.sprite_height.filter(|h| *h > self.bbox.height())?;
        Some(Aabb::new(
            self.bbox.left(),
            self.bbox.bottom() - h,
            self.bbox.width(),
            h,
        ))
    }

    /// Back to the spawn point, standing still
    pub fn respawn(&mut self, spawn: Vec2) {
        self.bbox.pos = spawn;
        self.vel = Vec2::ZERO;
    }
}

impl HasCollisionBox for Player {
    fn collision_box(&self) -> Aabb {
        self.bbox
    }
}

impl Movable for Player {
    fn velocity(&self) -> Vec2 {
        self.vel
    }

    fn apply_move(&mut self, result: &MoveResult) {
        self.bbox = result.bbox;
        if result.blocked_x.is_some() {
            self.vel.x = 0.0;
        }
        if result.blocked_y.is_some() {
            self.vel.y = 0.0;
        }
    }
}

impl Detectable for Player {
    fn hitboxes(&self) -> TargetHitboxes {
        match self.body_box() {
            Some(body) => TargetHitboxes::with_body(self.bbox, body),
            None => TargetHitboxes::single(self.bbox),
        }
    }
}

/// A patrolling guard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guard {
    pub id: u32,
    pub preset: GuardPreset,
    /// Collision box; its center is the eye
    pub bbox: Aabb,
    /// Collision box offset inside the sprite
    pub sprite_offset: Vec2,
    pub sprite_size: Vec2,
    pub vel: Vec2,
    pub speed: f32,
    /// Radians, 0 = +x, y down
    pub facing: f32,
    pub sight: Sight,
    /// Ticks since the last direction change
    pub move_timer: u32,
    /// Whether the last detection test had a clear line to the player
    pub los_clear: bool,
    /// Latest clipped sight cone
    #[serde(skip)]
    pub cone: Option<VisionCone>,
}

impl Guard {
    pub fn new(id: u32, preset: GuardPreset, placement: &Placement, tuning: &GuardTuning) -> Self {
        Self {
            id,
            preset,
            bbox: placement.collision,
            sprite_offset: placement.collision.pos - placement.visual.pos,
            sprite_size: placement.visual.size,
            vel: Vec2::ZERO,
            speed: preset.speed(),
            facing: 0.0,
            sight: tuning.sight_for(preset),
            move_timer: 0,
            los_clear: false,
            cone: None,
        }
    }

    /// Guard whose eye sits at `center`
    pub fn centered_at(id: u32, preset: GuardPreset, center: Vec2, tuning: &GuardTuning) -> Self {
        Self::new(id, preset, &preset.footprint().centered_at(center), tuning)
    }

    pub fn eye(&self) -> Vec2 {
        self.bbox.center()
    }

    pub fn visual(&self) -> Aabb {
        Aabb {
            pos: self.bbox.pos - self.sprite_offset,
            size: self.sprite_size,
        }
    }

    /// Pick a new random heading. At least one velocity component must
    /// exceed `min_axis_speed` so the guard visibly moves.
    pub fn roll_direction<R: Rng + ?Sized>(&mut self, rng: &mut R, min_axis_speed: f32) {
        const MAX_TRIES: u32 = 16;
        let mut vel = Vec2::ZERO;
        for _ in 0..MAX_TRIES {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            vel = polar_to_cartesian(self.speed, angle);
            if vel.x.abs() > min_axis_speed || vel.y.abs() > min_axis_speed {
                break;
            }
        }
        self.vel = vel;
        self.move_timer = 0;
        if vel != Vec2::ZERO {
            self.facing = heading(vel);
        }
    }

    /// Advance the patrol timer, re-rolling on schedule or when fully stopped
    pub fn update_patrol<R: Rng + ?Sized>(&mut self, rng: &mut R, tuning: &GuardTuning) {
        self.move_timer += 1;
        if self.move_timer >= tuning.move_interval_ticks || self.vel == Vec2::ZERO {
            self.roll_direction(rng, tuning.min_axis_speed);
        }
        if self.vel != Vec2::ZERO {
            self.facing = heading(self.vel);
        }
    }

    /// Run the detection test against `target` and refresh the sight cone
    pub fn look(&mut self, target: &TargetHitboxes, occluders: &[Aabb]) -> bool {
        let seen = is_detected(self.eye(), self.facing, &self.sight, target, occluders);
        self.los_clear = seen;
        self.cone = Some(vision_cone(self.eye(), self.facing, &self.sight, occluders));
        seen
    }
}

impl HasCollisionBox for Guard {
    fn collision_box(&self) -> Aabb {
        self.bbox
    }
}

impl Movable for Guard {
    fn velocity(&self) -> Vec2 {
        self.vel
    }

    /// A blocked axis stays stopped until the next direction roll
    fn apply_move(&mut self, result: &MoveResult) {
        self.bbox = result.bbox;
        if result.blocked_x.is_some() {
            self.vel.x = 0.0;
        }
        if result.blocked_y.is_some() {
            self.vel.y = 0.0;
        }
    }
}

/// Borrowed view of anything with a collision box in the world
#[derive(Debug, Clone, Copy)]
pub enum Body<'a> {
    Wall(&'a Aabb),
    Tree(&'a Placement),
    Collectible(&'a Collectible),
    Guard(&'a Guard),
}

impl Body<'_> {
    /// Walls and decorations block sight; collectibles and guards do not
    pub fn occludes_sight(&self) -> bool {
        matches!(self, Body::Wall(_) | Body::Tree(_))
    }

    pub fn guard_id(&self) -> Option<u32> {
        match self {
            Body::Guard(g) => Some(g.id),
            _ => None,
        }
    }
}

impl HasCollisionBox for Body<'_> {
    fn collision_box(&self) -> Aabb {
        match self {
            Body::Wall(b) => **b,
            Body::Tree(p) => p.collision,
            Body::Collectible(c) => c.body,
            Body::Guard(g) => g.bbox,
        }
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    /// Seed the area was generated from
    pub seed: u64,
    /// Patrol and placement randomness
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub bounds: Aabb,
    pub walls: Vec<Aabb>,
    /// Decorations; block movement and sight
    pub trees: Vec<Placement>,
    /// Uncollected collectibles (sorted by id)
    pub collectibles: Vec<Collectible>,
    /// Guards (sorted by id)
    pub guards: Vec<Guard>,
    pub player: Player,
    /// Player collision top-left at round start
    pub spawn: Vec2,
    pub phase: EncounterPhase,
    pub score: u64,
    pub collected: u32,
    pub time_ticks: u64,
    pub paused: bool,
    /// Set when the Terminal phase has run out
    pub restart_requested: bool,
    next_id: u32,
}

impl World {
    /// Empty area with only walls and the player
    pub fn new(bounds: Aabb, walls: Vec<Aabb>, spawn: Vec2, tuning: Tuning, seed: u64) -> Self {
        let player = Player::new(spawn, &tuning.player);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            bounds,
            walls,
            trees: Vec::new(),
            collectibles: Vec::new(),
            guards: Vec::new(),
            player,
            spawn,
            phase: EncounterPhase::Active,
            score: 0,
            collected: 0,
            time_ticks: 0,
            paused: false,
            restart_requested: false,
            next_id: 1,
        }
    }

    /// Fixed layout: entities are taken as given
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        bounds: Aabb,
        walls: Vec<Aabb>,
        trees: Vec<Placement>,
        collectibles: Vec<Collectible>,
        guards: Vec<Guard>,
        spawn: Vec2,
        tuning: Tuning,
        seed: u64,
    ) -> Self {
        let mut world = Self::new(bounds, walls, spawn, tuning, seed);
        let max_id = collectibles
            .iter()
            .map(|c| c.id)
            .chain(guards.iter().map(|g| g.id))
            .max()
            .unwrap_or(0);
        world.next_id = max_id + 1;
        world.trees = trees;
        world.collectibles = collectibles;
        world.guards = guards;
        world.normalize_order();
        world
    }

    /// Generate an area: decorations, then guards, then collectibles
    /// around the decorations
    pub fn generate(layout: &AreaLayout, tuning: Tuning, seed: u64) -> Self {
        let mut world = Self::new(
            layout.bounds,
            layout.walls.clone(),
            layout.player_spawn,
            tuning,
            seed,
        );
        let placement = world.tuning.placement.clone();
        let spawn_box = world.player.bbox;

        world.trees = place_objects(
            &mut world.rng,
            &layout.tree_zones,
            layout.tree_count,
            &placement.tree_footprint(),
            &world.walls,
            &placement.trees,
            &world.bounds,
        );

        let mut blockers = world.walls.clone();
        blockers.extend(world.trees.iter().map(|t| t.collision));
        blockers.push(spawn_box);

        let preset = layout.guard_preset;
        let guard_spots = place_objects(
            &mut world.rng,
            &layout.guard_zones,
            layout.guard_count,
            &preset.footprint(),
            &blockers,
            &placement.guards,
            &world.bounds,
        );
        for spot in &guard_spots {
            let id = world.next_entity_id();
            let mut guard = Guard::new(id, preset, spot, &world.tuning.guard);
            guard.roll_direction(&mut world.rng, world.tuning.guard.min_axis_speed);
            world.guards.push(guard);
        }

        // Anchors are added by place_satellites itself
        let mut blockers = world.walls.clone();
        blockers.extend(world.guards.iter().map(|g| g.bbox));
        blockers.push(spawn_box);

        let spots = place_satellites(
            &mut world.rng,
            &world.trees,
            &world.tuning.collect.footprint(),
            &blockers,
            &placement.satellites,
            &world.bounds,
        );
        let max_progress = world.tuning.collect.max_progress;
        for spot in &spots {
            let id = world.next_entity_id();
            world
                .collectibles
                .push(Collectible::from_placement(id, spot, max_progress));
        }

        log::info!(
            "Generated '{}' (seed {}): {} trees, {} guards, {} collectibles",
            layout.name,
            seed,
            world.trees.len(),
            world.guards.len(),
            world.collectibles.len()
        );
        world
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Ensure entity lists are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.guards.sort_by_key(|g| g.id);
        self.collectibles.sort_by_key(|c| c.id);
    }

    /// Every static or moving body except the player
    pub fn bodies(&self) -> impl Iterator<Item = Body<'_>> {
        self.walls
            .iter()
            .map(Body::Wall)
            .chain(self.trees.iter().map(Body::Tree))
            .chain(self.collectibles.iter().map(Body::Collectible))
            .chain(self.guards.iter().map(Body::Guard))
    }

    /// Boxes that block line of sight (walls and decorations)
    pub fn sight_occluders(&self) -> Vec<Aabb> {
        self.bodies()
            .filter(|b| b.occludes_sight())
            .map(|b| b.collision_box())
            .collect()
    }

    /// Boxes that block the player
    pub fn player_obstacles(&self) -> Vec<Aabb> {
        self.bodies().map(|b| b.collision_box()).collect()
    }

    /// Boxes that block guard `id`: everything except itself and the player
    pub fn guard_obstacles(&self, id: u32) -> Vec<Aabb> {
        self.bodies()
            .filter(|b| b.guard_id() != Some(id))
            .map(|b| b.collision_box())
            .collect()
    }

    /// Cones for drawing, in guard id order
    pub fn cones(&self) -> impl Iterator<Item = &VisionCone> {
        self.guards.iter().filter_map(|g| g.cone.as_ref())
    }

    pub fn lives(&self) -> u8 {
        self.player.vitality.lives
    }

    /// Put the player back at spawn after an alert; guards stay where they are
    pub fn reset_round(&mut self) {
        self.player.respawn(self.spawn);
        for c in &mut self.collectibles {
            c.cancel();
        }
        log::info!("Round reset, lives left: {}", self.lives());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> Tuning {
        Tuning::default()
    }

    #[test]
    fn test_player_body_box_above_feet() {
        let p = Player::new(Vec2::new(100.0, 200.0), &tuning().player);
        let body = p.body_box().unwrap();
        assert_eq!(body.bottom(), p.bbox.bottom());
        assert_eq!(body.height(), 128.0);
        assert!(body.center().y < p.bbox.center().y);

        let flat = PlayerTuning {
            sprite_height: None,
            ..PlayerTuning::default()
        };
        let p = Player::new(Vec2::ZERO, &flat);
        assert!(p.body_box().is_none());
        assert!(p.hitboxes().body.is_none());
    }

    #[test]
    fn test_guard_visual_roundtrip() {
        let g = Guard::centered_at(1, GuardPreset::Child, Vec2::new(300.0, 300.0), &GuardTuning::default());
        assert!((g.eye() - Vec2::new(300.0, 300.0)).length() < 1e-4);
        assert!(g.visual().contains(&g.bbox));
        assert_eq!(g.sight.range, 180.0);
    }

    #[test]
    fn test_roll_direction_moves_and_faces() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut g = Guard::centered_at(1, GuardPreset::Adult, Vec2::new(300.0, 300.0), &GuardTuning::default());
        for _ in 0..50 {
            g.roll_direction(&mut rng, 10.0);
            assert!(g.vel.x.abs() > 10.0 || g.vel.y.abs() > 10.0);
            assert!((g.vel.length() - 80.0).abs() < 1e-3);
            assert!((g.facing - heading(g.vel)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_patrol_rerolls_on_schedule_and_when_stopped() {
        let mut rng = Pcg32::seed_from_u64(9);
        let t = GuardTuning::default();
        let mut g = Guard::centered_at(1, GuardPreset::Adult, Vec2::new(300.0, 300.0), &t);

        // Stopped: rolls right away
        g.update_patrol(&mut rng, &t);
        assert_ne!(g.vel, Vec2::ZERO);
        assert_eq!(g.move_timer, 0);

        let v = g.vel;
        for _ in 0..t.move_interval_ticks - 1 {
            g.update_patrol(&mut rng, &t);
        }
        assert_eq!(g.vel, v);
        g.update_patrol(&mut rng, &t);
        assert_eq!(g.move_timer, 0);
    }

    #[test]
    fn test_blocked_axis_stays_zero_and_facing_is_kept() {
        let t = GuardTuning::default();
        let mut g = Guard::centered_at(1, GuardPreset::Adult, Vec2::new(300.0, 300.0), &t);
        g.vel = Vec2::new(80.0, 0.0);
        g.facing = 0.0;
        let result = MoveResult {
            bbox: g.bbox,
            residual: Vec2::ZERO,
            blocked_x: Some(0),
            blocked_y: None,
        };
        g.apply_move(&result);
        assert_eq!(g.vel, Vec2::ZERO);
        assert_eq!(g.facing, 0.0);
    }

    #[test]
    fn test_generate_is_deterministic_and_valid() {
        let layout = AreaLayout::default();
        let a = World::generate(&layout, tuning(), 1234);
        let b = World::generate(&layout, tuning(), 1234);
        assert_eq!(a.guards.len(), b.guards.len());
        assert_eq!(a.collectibles.len(), b.collectibles.len());
        for (x, y) in a.guards.iter().zip(&b.guards) {
            assert_eq!(x.bbox, y.bbox);
            assert_eq!(x.vel, y.vel);
        }

        let solids: Vec<Aabb> = a.walls.iter().copied().chain(a.trees.iter().map(|t| t.collision)).collect();
        for g in &a.guards {
            assert!(!solids.iter().any(|s| s.overlaps(&g.bbox)));
            assert!(!g.bbox.overlaps(&a.player.bbox));
        }
        for c in &a.collectibles {
            assert!(!solids.iter().any(|s| s.overlaps(&c.body)));
            assert!(a.bounds.contains(&c.body));
        }
        // Ids unique and ordered
        let ids: Vec<u32> = a.guards.iter().map(|g| g.id).chain(a.collectibles.iter().map(|c| c.id)).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn test_obstacle_lists() {
        let t = tuning();
        let g1 = Guard::centered_at(1, GuardPreset::Adult, Vec2::new(200.0, 200.0), &t.guard);
        let g2 = Guard::centered_at(2, GuardPreset::Adult, Vec2::new(500.0, 200.0), &t.guard);
        let walls = vec![Aabb::new(0.0, 0.0, 10.0, 10.0)];
        let gift = Collectible::new(3, Aabb::new(400.0, 400.0, 40.0, 40.0), Vec2::splat(90.0), 150);
        let world = World::from_parts(
            Aabb::new(0.0, 0.0, 1280.0, 720.0),
            walls,
            Vec::new(),
            vec![gift],
            vec![g2, g1],
            Vec2::new(600.0, 600.0),
            t,
            0,
        );
        assert_eq!(world.guards[0].id, 1);
        assert_eq!(world.sight_occluders().len(), 1);
        assert_eq!(world.player_obstacles().len(), 4);
        assert_eq!(world.guard_obstacles(1).len(), 3);
        assert!(!world.guard_obstacles(1).contains(&world.guards[0].bbox));
    }
}
