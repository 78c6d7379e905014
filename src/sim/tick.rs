//! Fixed timestep simulation tick
//!
//! Order within a tick:
//! 1. movement (player first, then guards by id)
//! 2. detection for every guard
//! 3. collectibles, then the encounter state machine

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::collision::{Movable, resolve_movement};
use super::encounter::{HitKind, update_encounter};
use super::interact::{CollectState, Interactable, select_target, update_collectible};
use super::state::World;
use super::vision::Detectable;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Directional intent, each component -1, 0 or 1
    pub intent: IVec2,
    /// Interact (start collecting the nearest collectible)
    pub interact: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Things that happened during a tick, for collaborators outside the sim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Seen by a guard; a life was lost
    Caught { guard_id: u32 },
    /// Touched by a guard; a life was lost
    Struck { guard_id: u32 },
    CollectStarted { id: u32 },
    Collected { id: u32, score: u64 },
    /// Player put back at spawn after an alert
    RoundReset,
    /// Out of lives and the terminal delay is over
    SessionRestart,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, dt: f32) -> Vec<SimEvent> {
    let mut events = Vec::new();

    if input.pause {
        world.paused = !world.paused;
        log::debug!("Paused: {}", world.paused);
    }
    // Nothing runs while paused or once a restart is pending
    if world.paused || world.restart_requested {
        return events;
    }

    world.time_ticks += 1;

    let mut seen_by = None;
    let mut struck_by = None;
    if world.phase.is_active() {
        move_actors(world, input.intent, dt);
        (seen_by, struck_by) = detect(world);
        update_collectibles(world, input.interact, &mut events);
    }

    let outcome = update_encounter(
        world.phase,
        world.player.vitality,
        seen_by.is_some(),
        struck_by.is_some(),
        &world.tuning.encounter,
    );
    world.phase = outcome.phase;
    world.player.vitality = outcome.vitality;

    match (outcome.hit, seen_by, struck_by) {
        (Some(HitKind::Detected), Some(guard_id), _) => events.push(SimEvent::Caught { guard_id }),
        (Some(HitKind::Struck), _, Some(guard_id)) => events.push(SimEvent::Struck { guard_id }),
        _ => {}
    }

    if outcome.reset_requested {
        world.reset_round();
        events.push(SimEvent::RoundReset);
    }
    if outcome.restart_requested {
        log::info!("Session over, final score {}", world.score);
        world.restart_requested = true;
        events.push(SimEvent::SessionRestart);
    }

    events
}

fn move_actors(world: &mut World, intent: IVec2, dt: f32) {
    world.player.set_intent(intent);
    let obstacles = world.player_obstacles();
    let result = resolve_movement(
        world.player.bbox,
        world.player.velocity() * dt,
        &obstacles,
        &world.bounds,
    );
    world.player.apply_move(&result);

    // Guards see each other's positions from earlier in this loop
    for i in 0..world.guards.len() {
        world.guards[i].update_patrol(&mut world.rng, &world.tuning.guard);
        let obstacles = world.guard_obstacles(world.guards[i].id);
        let guard = &mut world.guards[i];
        let result = resolve_movement(guard.bbox, guard.velocity() * dt, &obstacles, &world.bounds);
        guard.apply_move(&result);
    }
}

/// First guard (by id) that sees the player, and first one touching it
fn detect(world: &mut World) -> (Option<u32>, Option<u32>) {
    let occluders = world.sight_occluders();
    let target = world.player.hitboxes();
    let player_box = world.player.bbox;

    let mut seen_by = None;
    let mut struck_by = None;
    for guard in &mut world.guards {
        // Every guard looks so each one's feedback stays current
        if guard.look(&target, &occluders) && seen_by.is_none() {
            seen_by = Some(guard.id);
        }
        if struck_by.is_none() && guard.bbox.overlaps(&player_box) {
            struck_by = Some(guard.id);
        }
    }
    (seen_by, struck_by)
}

fn update_collectibles(world: &mut World, interact: bool, events: &mut Vec<SimEvent>) {
    let actor: Aabb = world.player.bbox;
    let pressed = if interact {
        select_target(&world.collectibles, &actor, &world.sight_occluders())
    } else {
        None
    };

    let score = world.tuning.collect.score;
    for (i, c) in world.collectibles.iter_mut().enumerate() {
        let chosen = pressed == Some(i);
        // Pressing on one collectible abandons the others
        if pressed.is_some() && !chosen {
            c.cancel();
        }

        let next = update_collectible(c, c.in_reach(&actor), chosen);
        match next {
            CollectState::Collecting { .. } if !c.is_collecting() => {
                events.push(SimEvent::CollectStarted { id: c.id });
            }
            CollectState::Collected => {
                world.score += score;
                world.collected += 1;
                log::info!("Collected #{} (score {})", c.id, world.score);
                events.push(SimEvent::Collected { id: c.id, score });
            }
            _ => {}
        }
        c.state = next;
    }

    world.collectibles.retain(|c| !c.is_collected());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::encounter::EncounterPhase;
    use crate::sim::interact::Collectible;
    use crate::sim::state::Guard;
    use crate::tuning::{AreaLayout, EncounterTuning, GuardPreset, PlayerTuning, Tuning};
    use glam::Vec2;

    fn small_tuning() -> Tuning {
        Tuning {
            player: PlayerTuning {
                size: Vec2::splat(32.0),
                sprite_height: None,
                ..Default::default()
            },
            encounter: EncounterTuning {
                alerted_ticks: 3,
                terminal_ticks: 2,
            },
            ..Default::default()
        }
    }

    fn bounds() -> Aabb {
        Aabb::new(0.0, 0.0, 1280.0, 720.0)
    }

    /// Guard that never moves and keeps looking along `facing`
    fn sentry(id: u32, center: Vec2, facing: f32, tuning: &Tuning) -> Guard {
        let mut g = Guard::centered_at(id, GuardPreset::Adult, center, &tuning.guard);
        g.speed = 0.0;
        g.facing = facing;
        g
    }

    fn world_with(guards: Vec<Guard>, collectibles: Vec<Collectible>, player_center: Vec2) -> World {
        let tuning = small_tuning();
        let spawn = player_center - tuning.player.size / 2.0;
        World::from_parts(bounds(), Vec::new(), Vec::new(), collectibles, guards, spawn, tuning, 7)
    }

    #[test]
    fn test_sentry_catches_player_in_front() {
        let t = small_tuning();
        let guard = sentry(1, Vec2::new(100.0, 100.0), 0.0, &t);
        let mut world = world_with(vec![guard], Vec::new(), Vec2::new(200.0, 100.0));

        let events = tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(events, vec![SimEvent::Caught { guard_id: 1 }]);
        assert_eq!(world.lives(), 2);
        assert!(matches!(world.phase, EncounterPhase::Alerted { .. }));
        assert!(world.guards[0].los_clear);
        assert!(world.guards[0].cone.is_some());
    }

    #[test]
    fn test_sentry_misses_player_off_axis() {
        let t = small_tuning();
        let guard = sentry(1, Vec2::new(100.0, 100.0), 0.0, &t);
        let mut world = world_with(vec![guard], Vec::new(), Vec2::new(100.0, 300.0));

        let events = tick(&mut world, &TickInput::default(), SIM_DT);
        assert!(events.is_empty());
        assert_eq!(world.lives(), 3);
        assert!(world.phase.is_active());
        assert!(!world.guards[0].los_clear);
    }

    #[test]
    fn test_round_reset_after_alert() {
        let t = small_tuning();
        let guard = sentry(1, Vec2::new(100.0, 100.0), 0.0, &t);
        let mut world = world_with(vec![guard], Vec::new(), Vec2::new(200.0, 100.0));
        // Walk away from the spawn so the reset is observable
        world.player.bbox.pos += Vec2::new(0.0, 200.0);

        tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(world.lives(), 3);

        world.player.bbox.pos = Vec2::new(184.0, 84.0);
        let events = tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(events, vec![SimEvent::Caught { guard_id: 1 }]);

        world.player.bbox.pos = Vec2::new(600.0, 600.0);
        let mut all = Vec::new();
        for _ in 0..3 {
            all.extend(tick(&mut world, &TickInput::default(), SIM_DT));
        }
        assert_eq!(all, vec![SimEvent::RoundReset]);
        assert_eq!(world.player.bbox.pos, world.spawn);
        assert!(world.player.vitality.vulnerable);
    }

    #[test]
    fn test_last_life_requests_restart() {
        let t = small_tuning();
        let guard = sentry(1, Vec2::new(100.0, 100.0), 0.0, &t);
        let mut world = world_with(vec![guard], Vec::new(), Vec2::new(200.0, 100.0));
        world.player.vitality.lives = 1;

        let mut all = Vec::new();
        for _ in 0..10 {
            all.extend(tick(&mut world, &TickInput::default(), SIM_DT));
        }
        assert_eq!(all, vec![SimEvent::Caught { guard_id: 1 }, SimEvent::SessionRestart]);
        assert!(world.restart_requested);
        assert!(matches!(world.phase, EncounterPhase::Terminal { .. }));
    }

    #[test]
    fn test_strike_by_blind_guard() {
        let t = small_tuning();
        let mut guard = Guard::centered_at(1, GuardPreset::Adult, Vec2::new(300.0, 300.0), &t.guard);
        guard.sight.range = 0.0;
        guard.vel = Vec2::new(80.0, 0.0);
        let right = guard.bbox.right();
        let mut world = world_with(vec![guard], Vec::new(), Vec2::new(right + 17.0, 300.0));

        let events = tick(&mut world, &TickInput::default(), SIM_DT);
        assert_eq!(events, vec![SimEvent::Struck { guard_id: 1 }]);
        assert_eq!(world.lives(), 2);
    }

    #[test]
    fn test_player_blocked_by_guard() {
        let t = small_tuning();
        let mut guard = sentry(1, Vec2::new(300.0, 300.0), std::f32::consts::PI, &t);
        guard.sight.range = 0.0;
        let left = guard.bbox.left();
        let mut world = world_with(vec![guard], Vec::new(), Vec2::new(left - 17.0, 300.0));

        let input = TickInput {
            intent: IVec2::new(1, 0),
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut world, &input, SIM_DT);
        }
        assert_eq!(world.player.bbox.right(), world.guards[0].bbox.left());
        assert_eq!(world.lives(), 3);
    }

    #[test]
    fn test_hold_to_collect() {
        let gift = Collectible::new(5, Aabb::new(140.0, 100.0, 40.0, 40.0), Vec2::splat(90.0), 150);
        let mut world = world_with(Vec::new(), vec![gift], Vec2::new(116.0, 116.0));

        let press = TickInput {
            interact: true,
            ..Default::default()
        };
        let events = tick(&mut world, &press, SIM_DT);
        assert_eq!(events, vec![SimEvent::CollectStarted { id: 5 }]);

        let mut all = Vec::new();
        for _ in 0..149 {
            all.extend(tick(&mut world, &TickInput::default(), SIM_DT));
        }
        assert_eq!(all, vec![SimEvent::Collected { id: 5, score: 100 }]);
        assert_eq!(world.score, 100);
        assert!(world.collectibles.is_empty());
    }

    #[test]
    fn test_walking_away_cancels_collection() {
        let gift = Collectible::new(5, Aabb::new(140.0, 100.0, 40.0, 40.0), Vec2::splat(90.0), 150);
        let mut world = world_with(Vec::new(), vec![gift], Vec2::new(116.0, 116.0));

        let press = TickInput {
            interact: true,
            ..Default::default()
        };
        tick(&mut world, &press, SIM_DT);
        for _ in 0..20 {
            tick(&mut world, &TickInput::default(), SIM_DT);
        }
        assert_eq!(world.collectibles[0].progress(), 21);

        let away = TickInput {
            intent: IVec2::new(0, 1),
            ..Default::default()
        };
        for _ in 0..60 {
            tick(&mut world, &away, SIM_DT);
        }
        assert_eq!(world.collectibles[0].state, CollectState::Idle);
        assert_eq!(world.collectibles[0].progress(), 0);
    }

    #[test]
    fn test_press_cancels_other_collection() {
        let a = Collectible::new(1, Aabb::new(140.0, 100.0, 40.0, 40.0), Vec2::splat(90.0), 150);
        let b = Collectible::new(2, Aabb::new(50.0, 100.0, 40.0, 40.0), Vec2::splat(90.0), 150);
        let mut world = world_with(Vec::new(), vec![a, b], Vec2::new(120.0, 116.0));
        world.collectibles[0].state = CollectState::Collecting { progress: 30 };
        // Actor center is nearer to b
        world.player.bbox.pos.x -= 8.0;

        let press = TickInput {
            interact: true,
            ..Default::default()
        };
        let events = tick(&mut world, &press, SIM_DT);
        assert_eq!(events, vec![SimEvent::CollectStarted { id: 2 }]);
        assert_eq!(world.collectibles[0].state, CollectState::Idle);
    }

    #[test]
    fn test_tick_pause() {
        let mut world = world_with(Vec::new(), Vec::new(), Vec2::new(400.0, 400.0));
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut world, &pause, SIM_DT);
        assert!(world.paused);
        assert_eq!(world.time_ticks, 0);

        let right = TickInput {
            intent: IVec2::new(1, 0),
            ..Default::default()
        };
        let before = world.player.bbox;
        tick(&mut world, &right, SIM_DT);
        assert_eq!(world.player.bbox, before);

        tick(&mut world, &pause, SIM_DT);
        assert!(!world.paused);
        assert_eq!(world.time_ticks, 1);
    }

    #[test]
    fn test_determinism() {
        let layout = AreaLayout::default();
        let mut a = World::generate(&layout, Tuning::default(), 99999);
        let mut b = World::generate(&layout, Tuning::default(), 99999);

        for i in 0..600 {
            let input = TickInput {
                intent: IVec2::new((i / 40 % 3) - 1, (i / 70 % 3) - 1),
                interact: i % 50 == 0,
                pause: false,
            };
            assert_eq!(tick(&mut a, &input, SIM_DT), tick(&mut b, &input, SIM_DT));
        }
        assert_eq!(a.player.bbox, b.player.bbox);
        assert_eq!(a.score, b.score);
        for (x, y) in a.guards.iter().zip(&b.guards) {
            assert_eq!(x.bbox, y.bbox);
            assert_eq!(x.facing, y.facing);
        }
    }
}
