//! Hold-to-collect interaction
//!
//! A collectible goes Idle -> Collecting when the actor interacts inside its
//! zone, gains one progress point per tick while the actor stays there and
//! becomes Collected at the threshold. Walking out resets it to Idle.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::{Aabb, HasCollisionBox};
use super::placement::Placement;
use super::vision::line_blocked;

/// Collection progress of a single collectible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollectState {
    #[default]
    Idle,
    Collecting {
        progress: u32,
    },
    Collected,
}

/// A collectible object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub id: u32,
    /// Physical body (blocks movement until collected)
    pub body: Aabb,
    /// Interaction zone, concentric with the body and larger
    pub zone: Aabb,
    pub state: CollectState,
    /// Ticks of holding required
    pub max_progress: u32,
}

impl Collectible {
    pub fn new(id: u32, body: Aabb, zone_size: Vec2, max_progress: u32) -> Self {
        Self {
            id,
            body,
            zone: Aabb::from_center(body.center(), zone_size),
            state: CollectState::Idle,
            max_progress,
        }
    }

    /// Build from a placement; a placement without an interaction zone gets
    /// a zone equal to its body
    pub fn from_placement(id: u32, placement: &Placement, max_progress: u32) -> Self {
        Self {
            id,
            body: placement.collision,
            zone: placement.interaction.unwrap_or(placement.collision),
            state: CollectState::Idle,
            max_progress,
        }
    }

    pub fn is_collected(&self) -> bool {
        self.state == CollectState::Collected
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.state, CollectState::Collecting { .. })
    }

    pub fn progress(&self) -> u32 {
        match self.state {
            CollectState::Idle => 0,
            CollectState::Collecting { progress } => progress,
            CollectState::Collected => self.max_progress,
        }
    }

    /// Progress in 0..=1 for meters
    pub fn progress_fraction(&self) -> f32 {
        if self.max_progress == 0 {
            return 1.0;
        }
        self.progress() as f32 / self.max_progress as f32
    }

    /// Abort an in-progress collection
    pub fn cancel(&mut self) {
        if self.is_collecting() {
            self.state = CollectState::Idle;
        }
    }
}

/// Something the actor can interact with from inside a zone
pub trait Interactable {
    fn interaction_zone(&self) -> Aabb;
    /// Point used for distance ranking and line of sight
    fn interaction_anchor(&self) -> Vec2;
    /// False once the object can no longer be interacted with
    fn is_available(&self) -> bool {
        true
    }

    fn in_reach(&self, actor: &Aabb) -> bool {
        self.is_available() && self.interaction_zone().overlaps(actor)
    }
}

impl Interactable for Collectible {
    fn interaction_zone(&self) -> Aabb {
        self.zone
    }

    fn interaction_anchor(&self) -> Vec2 {
        self.body.center()
    }

    fn is_available(&self) -> bool {
        !self.is_collected()
    }
}

impl HasCollisionBox for Collectible {
    fn collision_box(&self) -> Aabb {
        self.body
    }
}

/// Next state of `collectible` for one tick.
///
/// An interact signal starts an Idle collectible when the actor is in its
/// zone. A collecting one then advances in the same tick while the actor
/// stays, and falls back to Idle with no progress once the actor leaves.
pub fn update_collectible(collectible: &Collectible, actor_in_zone: bool, interact: bool) -> CollectState {
    let state = match collectible.state {
        CollectState::Idle if interact && actor_in_zone => CollectState::Collecting { progress: 0 },
        other => other,
    };

    match state {
        CollectState::Collecting { .. } if !actor_in_zone => CollectState::Idle,
        CollectState::Collecting { progress } => {
            let progress = progress + 1;
            if progress >= collectible.max_progress {
                CollectState::Collected
            } else {
                CollectState::Collecting { progress }
            }
        }
        other => other,
    }
}

/// Index of the collectible an interact press should start, if any.
///
/// The nearest reachable item is chosen by distance from the actor center.
/// If the straight line to it is blocked the press does nothing; a farther
/// item is not tried instead.
pub fn select_target<T: Interactable>(items: &[T], actor: &Aabb, occluders: &[Aabb]) -> Option<usize> {
    let from = actor.center();
    let (index, item) = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.in_reach(actor))
        .min_by(|(_, a), (_, b)| {
            a.interaction_anchor()
                .distance_squared(from)
                .total_cmp(&b.interaction_anchor().distance_squared(from))
        })?;

    if line_blocked(from, item.interaction_anchor(), occluders) {
        log::debug!("Interaction blocked: no line of sight");
        return None;
    }
    Some(index)
}
