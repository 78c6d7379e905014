//! Stealth Sim headless runner
//!
//! Generates an area from a seed and drives it with a simple autopilot that
//! walks toward the nearest collectible and holds interact once in reach.
//!
//! Usage: `stealth-sim [seed] [frames] [layout] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use stealth_sim::consts::{MAX_SUBSTEPS, SIM_DT};
    use stealth_sim::sim::{SimEvent, TickInput, World, tick};
    use stealth_sim::{AreaLayout, Tuning};

    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut seed: u64 = args.first().and_then(|s| s.parse().ok()).unwrap_or(12345);
    let frames: u32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(3600);
    let layout = match args.get(2) {
        Some(name) => AreaLayout::by_name(name).unwrap_or_else(|| {
            log::warn!("Unknown layout '{name}', using default");
            AreaLayout::default()
        }),
        None => AreaLayout::default(),
    };
    let tuning = match args.get(3) {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => Tuning::load_or_default(&json),
            Err(e) => {
                log::warn!("Could not read {path}: {e}");
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    log::info!("Stealth Sim starting (seed {seed}, {frames} frames, layout {})", layout.name);

    let mut world = World::generate(&layout, tuning.clone(), seed);
    let mut accumulator = 0.0_f32;
    let mut sessions = 1;

    // Render-rate frames feeding the fixed-step sim
    let frame_dt = 1.0 / 30.0;
    for _ in 0..frames {
        accumulator += frame_dt;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = autopilot(&world);
            for event in tick(&mut world, &input, SIM_DT) {
                log::info!("t={} {:?}", world.time_ticks, event);
                if event == SimEvent::SessionRestart {
                    seed = seed.wrapping_add(1);
                    sessions += 1;
                    world = World::generate(&layout, tuning.clone(), seed);
                }
            }
            accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    log::info!(
        "Done: {} sessions, score {}, collected {}, lives {}, {} collectibles left",
        sessions,
        world.score,
        world.collected,
        world.lives(),
        world.collectibles.len()
    );

    fn autopilot(world: &World) -> TickInput {
        use glam::IVec2;
        use stealth_sim::sim::Interactable;

        let me = world.player.bbox;
        let in_reach = world.collectibles.iter().any(|c| c.in_reach(&me));
        let busy = world.collectibles.iter().any(|c| c.is_collecting());

        let target = world
            .collectibles
            .iter()
            .map(|c| c.interaction_anchor())
            .min_by(|a, b| {
                a.distance_squared(me.center())
                    .total_cmp(&b.distance_squared(me.center()))
            });

        let intent = match target {
            Some(t) if !in_reach => {
                let d = t - me.center();
                let axis = |v: f32| if v.abs() < 4.0 { 0 } else { v.signum() as i32 };
                IVec2::new(axis(d.x), axis(d.y))
            }
            _ => IVec2::ZERO,
        };

        TickInput {
            intent,
            interact: in_reach && !busy,
            pause: false,
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the product on wasm; there is no runner
}
