//! Balance values and area layouts
//!
//! Everything that differs between areas or guard types lives here as plain
//! data so it can be loaded from JSON instead of being baked into the sim.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{AREA_HEIGHT, AREA_WIDTH, COLLECT_SCORE, TICKS_PER_SEC};
use crate::sim::aabb::Aabb;
use crate::sim::placement::{Footprint, PlacementRules, SatelliteRules};
use crate::sim::vision::Sight;

/// Guard archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GuardPreset {
    #[default]
    Adult,
    Child,
    Lookout,
}

impl GuardPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardPreset::Adult => "Adult",
            GuardPreset::Child => "Child",
            GuardPreset::Lookout => "Lookout",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "adult" | "enemy" => Some(GuardPreset::Adult),
            "child" | "kid" => Some(GuardPreset::Child),
            "lookout" => Some(GuardPreset::Lookout),
            _ => None,
        }
    }

    /// Vision range in pixels
    pub fn sight_range(&self) -> f32 {
        match self {
            GuardPreset::Adult => 150.0,
            GuardPreset::Child => 180.0,
            GuardPreset::Lookout => 100.0,
        }
    }

    /// Patrol speed (pixels per second)
    pub fn speed(&self) -> f32 {
        match self {
            GuardPreset::Adult => 80.0,
            GuardPreset::Child => 100.0,
            GuardPreset::Lookout => 80.0,
        }
    }

    /// Sprite size
    pub fn sprite_size(&self) -> Vec2 {
        match self {
            GuardPreset::Adult | GuardPreset::Lookout => Vec2::new(64.0, 128.0),
            GuardPreset::Child => Vec2::new(48.0, 96.0),
        }
    }

    /// Sprite plus collision box. Adults collide with their lower half,
    /// children only with a small box at the feet.
    pub fn footprint(&self) -> Footprint {
        let size = self.sprite_size();
        match self {
            GuardPreset::Adult | GuardPreset::Lookout => {
                Footprint::from_fractions(size, Vec2::new(0.0, 0.5), Vec2::new(1.0, 0.5))
            }
            GuardPreset::Child => {
                Footprint::from_fractions(size, Vec2::new(0.25, 0.65), Vec2::new(0.7, 0.2))
            }
        }
    }
}

/// Patrol and vision parameters shared by all guards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardTuning {
    /// Full field of view (degrees)
    pub fov_degrees: f32,
    /// Ticks between random direction changes
    pub move_interval_ticks: u32,
    /// A new direction needs at least one velocity component above this
    pub min_axis_speed: f32,
}

impl Default for GuardTuning {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            move_interval_ticks: 90,
            min_axis_speed: 10.0,
        }
    }
}

impl GuardTuning {
    pub fn sight_for(&self, preset: GuardPreset) -> Sight {
        Sight::new(preset.sight_range(), self.fov_degrees)
    }
}

/// Controlled actor parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerTuning {
    pub speed: f32,
    /// Collision (feet) box size
    pub size: Vec2,
    /// Full sprite height. When taller than the collision box, the sprite
    /// area above the feet is exposed to guards as a second hit-box.
    pub sprite_height: Option<f32>,
    pub lives: u8,
    /// Invulnerability after a hit
    pub invuln_ticks: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 200.0,
            size: Vec2::new(72.0, 96.0),
            sprite_height: Some(128.0),
            lives: 3,
            invuln_ticks: 2 * TICKS_PER_SEC,
        }
    }
}

/// Collectible parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectTuning {
    pub body_size: f32,
    pub interaction_size: f32,
    /// Ticks of holding needed to collect
    pub max_progress: u32,
    pub score: u64,
}

impl Default for CollectTuning {
    fn default() -> Self {
        Self {
            body_size: 40.0,
            interaction_size: 90.0,
            max_progress: 150,
            score: COLLECT_SCORE,
        }
    }
}

impl CollectTuning {
    pub fn footprint(&self) -> Footprint {
        Footprint::solid(Vec2::splat(self.body_size))
            .with_interaction(Vec2::splat(self.interaction_size))
    }
}

/// Encounter phase durations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterTuning {
    pub alerted_ticks: u32,
    pub terminal_ticks: u32,
}

impl Default for EncounterTuning {
    fn default() -> Self {
        Self {
            alerted_ticks: 2 * TICKS_PER_SEC,
            terminal_ticks: 3 * TICKS_PER_SEC,
        }
    }
}

/// Area generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementTuning {
    /// Decoration sprite size
    pub tree_size: Vec2,
    /// Decoration collision box as a fraction of the sprite, resting on its base
    pub tree_collision_frac: Vec2,
    pub trees: PlacementRules,
    pub guards: PlacementRules,
    pub satellites: SatelliteRules,
}

impl Default for PlacementTuning {
    fn default() -> Self {
        Self {
            tree_size: Vec2::new(140.0, 180.0),
            tree_collision_frac: Vec2::new(0.4, 0.3),
            trees: PlacementRules {
                separation: 30.0,
                ..Default::default()
            },
            guards: PlacementRules::default(),
            satellites: SatelliteRules::default(),
        }
    }
}

impl PlacementTuning {
    pub fn tree_footprint(&self) -> Footprint {
        Footprint::grounded(self.tree_size, self.tree_collision_frac)
    }
}

/// All balance values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tuning {
    #[serde(default)]
    pub guard: GuardTuning,
    #[serde(default)]
    pub player: PlayerTuning,
    #[serde(default)]
    pub collect: CollectTuning,
    #[serde(default)]
    pub encounter: EncounterTuning,
    #[serde(default)]
    pub placement: PlacementTuning,
}

impl Tuning {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Check ranges that placement samples from
    pub fn validate(&self) -> Result<(), String> {
        let sat = &self.placement.satellites;
        if sat.min_radius > sat.max_radius {
            return Err(format!(
                "satellite radius {}..{} is empty",
                sat.min_radius, sat.max_radius
            ));
        }
        if sat.min_count > sat.max_count {
            return Err(format!(
                "satellite count {}..{} is empty",
                sat.min_count, sat.max_count
            ));
        }
        Ok(())
    }

    /// Parse `json`, falling back to defaults if it is malformed or out of range
    pub fn load_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => match tuning.validate() {
                Ok(()) => {
                    log::info!("Loaded tuning");
                    tuning
                }
                Err(reason) => {
                    log::warn!("Invalid tuning ({reason}), using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Invalid tuning ({e}), using defaults");
                Self::default()
            }
        }
    }
}

/// Static description of an area: bounds, walls, spawn zones and counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaLayout {
    pub name: String,
    pub bounds: Aabb,
    pub walls: Vec<Aabb>,
    pub guard_zones: Vec<Aabb>,
    pub tree_zones: Vec<Aabb>,
    pub guard_count: usize,
    pub tree_count: usize,
    /// Preset for every generated guard
    #[serde(default)]
    pub guard_preset: GuardPreset,
    /// Top-left of the player's collision box at round start
    pub player_spawn: Vec2,
}

impl Default for AreaLayout {
    fn default() -> Self {
        Self::level_one()
    }
}

impl AreaLayout {
    fn bounds() -> Aabb {
        Aabb::new(0.0, 0.0, AREA_WIDTH, AREA_HEIGHT)
    }

    fn border_walls() -> Vec<Aabb> {
        vec![
            Aabb::new(0.0, 0.0, AREA_WIDTH, 20.0),
            Aabb::new(0.0, 0.0, 20.0, AREA_HEIGHT),
            Aabb::new(0.0, AREA_HEIGHT - 20.0, AREA_WIDTH, 20.0),
            Aabb::new(AREA_WIDTH - 20.0, 0.0, 20.0, AREA_HEIGHT),
        ]
    }

    /// Split interior: corridor on the left, open hall on the right
    pub fn level_one() -> Self {
        let mut walls = Self::border_walls();
        walls.extend([
            Aabb::new(0.0, 350.0, 180.0, 20.0),
            Aabb::new(300.0, 350.0, 220.0, 20.0),
            Aabb::new(520.0, 350.0, 20.0, 100.0),
            Aabb::new(520.0, 600.0, 20.0, 200.0),
            Aabb::new(780.0, 0.0, 20.0, 500.0),
        ]);
        Self {
            name: "level1".to_string(),
            bounds: Self::bounds(),
            walls,
            guard_zones: vec![
                Aabb::new(270.0, 400.0, 200.0, 200.0),
                Aabb::new(810.0, 300.0, 440.0, 300.0),
            ],
            tree_zones: vec![
                Aabb::new(30.0, 380.0, 170.0, 310.0),
                Aabb::new(30.0, 30.0, 500.0, 200.0),
                Aabb::new(810.0, 30.0, 440.0, 300.0),
            ],
            guard_count: 3,
            tree_count: 3,
            guard_preset: GuardPreset::Adult,
            player_spawn: Vec2::new(630.0, 550.0),
        }
    }

    /// Cross-shaped interior with trees in the four corners
    pub fn level_two() -> Self {
        let mut walls = Self::border_walls();
        walls.extend([
            Aabb::new(655.0, 150.0, 20.0, 400.0),
            Aabb::new(300.0, 340.0, 700.0, 20.0),
            Aabb::new(0.0, 340.0, 150.0, 20.0),
            Aabb::new(1150.0, 340.0, 200.0, 20.0),
        ]);
        Self {
            name: "level2".to_string(),
            bounds: Self::bounds(),
            walls,
            guard_zones: vec![
                Aabb::new(380.0, 30.0, 150.0, 300.0),
                Aabb::new(850.0, 30.0, 150.0, 300.0),
                Aabb::new(900.0, 400.0, 200.0, 200.0),
                Aabb::new(200.0, 400.0, 200.0, 200.0),
            ],
            tree_zones: vec![
                Aabb::new(30.0, 30.0, 170.0, 300.0),
                Aabb::new(1080.0, 30.0, 170.0, 300.0),
                Aabb::new(30.0, 480.0, 170.0, 210.0),
                Aabb::new(1080.0, 480.0, 170.0, 210.0),
            ],
            guard_count: 3,
            tree_count: 3,
            guard_preset: GuardPreset::Child,
            player_spawn: Vec2::new(700.0, 560.0),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "level1" | "1" => Some(Self::level_one()),
            "level2" | "2" => Some(Self::level_two()),
            _ => None,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Parse `json`, falling back to the stock layout if it is malformed
    pub fn load_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|e| {
            log::warn!("Invalid area layout ({e}), using {}", Self::default().name);
            Self::default()
        })
    }
}
