//! Stealth Sim - a 2D sneak-past-the-guards simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, vision, placement, encounter state)
//! - `tuning`: Data-driven balance and area layouts

pub mod sim;
pub mod tuning;

pub use tuning::{AreaLayout, GuardPreset, Tuning};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Ticks per second, used to express durations in ticks
    pub const TICKS_PER_SEC: u32 = 60;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Default area dimensions
    pub const AREA_WIDTH: f32 = 1280.0;
    pub const AREA_HEIGHT: f32 = 720.0;

    /// Diagonal intent scale (1/sqrt(2)) so diagonal speed matches axial speed
    pub const DIAGONAL_SCALE: f32 = std::f32::consts::FRAC_1_SQRT_2;

    /// Score awarded per collected collectible
    pub const COLLECT_SCORE: u64 = 100;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}

/// Signed difference `target - facing`, wrapped to [-π, π)
#[inline]
pub fn angle_diff(target: f32, facing: f32) -> f32 {
    normalize_angle(target - facing)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Heading of a vector (radians, y-down screen space)
#[inline]
pub fn heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
