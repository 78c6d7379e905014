//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod aabb;
pub mod collision;
pub mod encounter;
pub mod interact;
pub mod placement;
pub mod state;
pub mod tick;
pub mod vision;

pub use aabb::{Aabb, Clip, HasCollisionBox};
pub use collision::{MoveResult, Movable, intent_velocity, resolve_movement};
pub use encounter::{EncounterOutcome, EncounterPhase, HitKind, Vitality, update_encounter};
pub use interact::{CollectState, Collectible, Interactable, select_target, update_collectible};
pub use placement::{
    Footprint, Placement, PlacementRules, SatelliteRules, place_objects, place_satellites,
    random_point_in_zone,
};
pub use state::{Body, Guard, Player, World};
pub use tick::{SimEvent, TickInput, tick};
pub use vision::{
    Detectable, Sight, TargetHitboxes, VisionCone, is_detected, line_blocked, sees_point,
    vision_cone,
};
