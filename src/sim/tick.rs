//! Per-step simulation pipeline
//!
//! One `tick` call advances the whole world: command dispatch, then (unless
//! the session is over) kinematics, platform motion, pairwise collision
//! resolution, event-driven particle emission and particle integration, and
//! finally the game-over recompute. The phases run in that fixed order exactly
//! once; nothing inside a step suspends or re-enters.

use glam::{Vec2, Vec3};

use super::collision::{BroadPhase, BruteForce, resolve_pairs};
use super::state::{Body, BodyKind, SimEventKind, SimState};
use crate::Tuning;
use crate::consts::*;
use crate::sim::store::BodyId;

/// A discrete input command, applied at the top of the step it arrives in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Spawn a cube; omitted fields are randomized
    SpawnCube {
        position: Option<Vec2>,
        half_size: Option<f32>,
        color: Option<Vec3>,
    },
    SpawnPlatform {
        position: Vec2,
        half_size: f32,
        color: Vec3,
    },
    SpawnCollectible {
        position: Vec2,
        half_size: f32,
        color: Vec3,
    },
    /// Add a velocity impulse to one body; ignored for static or dead ids
    Nudge { id: BodyId, impulse: Vec2 },
    /// Clear everything and re-seed the canonical layout
    Reset,
    /// Flip the renderer passthrough flag; no simulation effect
    ToggleDebugOverlay,
}

/// Input for a single step.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub commands: Vec<Command>,
}

/// Particles emitted per event kind (collision sparks, pickup glitter, spawn
/// burst).
fn particle_count(kind: SimEventKind) -> usize {
    match kind {
        SimEventKind::Collision => 10,
        SimEventKind::CollectiblePicked => 8,
        SimEventKind::Spawned => 15,
    }
}

/// Advance the session by one step. `dt` is clamped to the tuning ceiling
/// before use; this is the only place wall-clock time enters the simulation.
pub fn tick(state: &mut SimState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, state.tuning.max_dt);

    state.events.clear();
    for command in &input.commands {
        apply_command(state, command);
    }

    // A finished session is frozen; only Reset (dispatched above) re-arms it
    if state.game_over {
        return;
    }

    state.time_ticks += 1;

    // --- Kinematics: gravity, friction, integration, arena bounds ---
    integrate_bodies(state.bodies.slots_mut(), &state.tuning, dt);

    // --- Platform motion and rider transport ---
    advance_platforms(state.bodies.slots_mut(), &state.tuning, dt);

    // --- Pairwise collision resolution ---
    let mut pairs = Vec::new();
    BruteForce.candidate_pairs(state.bodies.slots(), &mut pairs);
    let gained = resolve_pairs(
        state.bodies.slots_mut(),
        &pairs,
        &state.tuning,
        &mut state.rng,
        &mut state.events,
    );
    state.score += gained;

    // --- Particles: consume this step's events, then integrate ---
    let SimState {
        events,
        particles,
        rng,
        ..
    } = state;
    for event in events.iter() {
        particles.emit(event.position, event.color, particle_count(event.kind), rng);
    }
    state.particles.step(dt);

    // --- Game-over recompute ---
    let over = state.active_dynamic_cubes() == 0;
    if over && !state.game_over {
        log::info!(
            "game over after {} ticks (score {})",
            state.time_ticks,
            state.score
        );
    }
    state.game_over = over;
}

fn apply_command(state: &mut SimState, command: &Command) {
    match *command {
        Command::SpawnCube {
            position,
            half_size,
            color,
        } => {
            if let Err(err) = state.spawn_cube(position, half_size, color) {
                log::warn!("spawn cube refused: {err}");
            }
        }
        Command::SpawnPlatform {
            position,
            half_size,
            color,
        } => {
            if let Err(err) = state.spawn_platform(position, half_size, color) {
                log::warn!("spawn platform refused: {err}");
            }
        }
        Command::SpawnCollectible {
            position,
            half_size,
            color,
        } => {
            if let Err(err) = state.spawn_collectible(position, half_size, color) {
                log::warn!("spawn collectible refused: {err}");
            }
        }
        Command::Nudge { id, impulse } => match state.bodies.get_mut(id) {
            Ok(body) if !body.is_static => body.vel += impulse,
            Ok(_) => {}
            Err(err) => log::warn!("nudge ignored: {err}"),
        },
        Command::Reset => state.reset(),
        Command::ToggleDebugOverlay => state.debug_overlay = !state.debug_overlay,
    }
}

/// Gravity, per-frame friction decay, position/rotation integration and arena
/// boundary handling for every dynamic body. Never looks at other bodies.
fn integrate_bodies(bodies: &mut [Body], tuning: &Tuning, dt: f32) {
    for body in bodies.iter_mut() {
        if !body.active || body.is_static {
            continue;
        }
        body.vel.y -= tuning.gravity * dt;
        // Discrete decay, deliberately not time-scaled
        body.vel *= tuning.friction;
        body.pos += body.vel * dt;
        body.rotation += body.rotation_speed * dt;

        clamp_to_arena(body, tuning);
    }
}

/// Clamp a body edge exactly onto the crossed bound and bounce the offending
/// velocity component.
fn clamp_to_arena(body: &mut Body, tuning: &Tuning) {
    let half = body.half_size;

    if body.pos.x - half < ARENA_MIN_X {
        body.pos.x = ARENA_MIN_X + half;
        body.vel.x = -body.vel.x * tuning.bounce_factor;
    } else if body.pos.x + half > ARENA_MAX_X {
        body.pos.x = ARENA_MAX_X - half;
        body.vel.x = -body.vel.x * tuning.bounce_factor;
    }

    if body.pos.y - half < ARENA_MIN_Y {
        body.pos.y = ARENA_MIN_Y + half;
        body.vel.y = -body.vel.y * tuning.bounce_factor;
    } else if body.pos.y + half > ARENA_MAX_Y {
        body.pos.y = ARENA_MAX_Y - half;
        body.vel.y = -body.vel.y * tuning.bounce_factor;
    }
}

/// Move every oscillating platform, then translate whatever is riding it by
/// the same (clamp-aware) horizontal delta. Runs before the resolver so riders
/// don't additionally collide with the platform they stand on this frame.
fn advance_platforms(bodies: &mut [Body], tuning: &Tuning, dt: f32) {
    for index in 0..bodies.len() {
        let (delta_x, platform_pos, platform_half) = {
            let body = &mut bodies[index];
            if !body.active {
                continue;
            }
            let BodyKind::MovingPlatform {
                start,
                end,
                speed,
                ref mut dir,
            } = body.kind
            else {
                continue;
            };

            let old_x = body.pos.x;
            let mut new_x = old_x + *dir * speed * dt;
            if *dir > 0.0 && new_x >= end.x {
                new_x = end.x;
                *dir = -1.0;
            } else if *dir < 0.0 && new_x <= start.x {
                new_x = start.x;
                *dir = 1.0;
            }
            body.pos.x = new_x;
            (new_x - old_x, body.pos, body.half_size)
        };

        if delta_x == 0.0 {
            continue;
        }
        for (rider_index, rider) in bodies.iter_mut().enumerate() {
            if rider_index == index || !rider.active || rider.is_static {
                continue;
            }
            if is_on_platform(rider, platform_pos, platform_half, tuning) {
                rider.pos.x += delta_x;
            }
        }
    }
}

/// Sticking transport predicate: horizontally over the platform and with the
/// body's underside within a small band above the platform top.
fn is_on_platform(body: &Body, platform_pos: Vec2, platform_half: f32, tuning: &Tuning) -> bool {
    let horizontal = (body.pos.x - platform_pos.x).abs();
    let vertical = body.pos.y - platform_pos.y;
    let reach = body.half_size + platform_half;

    horizontal < 0.8 * reach && vertical > 0.0 && vertical < reach + tuning.platform_ride_eps
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn quiet_tuning() -> Tuning {
        Tuning {
            gravity: 0.0,
            friction: 1.0,
            collision_jitter: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_dt_is_clamped_before_integration() {
        let mut state = SimState::empty(1);
        let id = state
            .spawn_cube(Some(Vec2::ZERO), Some(0.5), None)
            .unwrap();

        tick(&mut state, &TickInput::default(), 1.0);

        let body = state.bodies.get(id).unwrap();
        // A full second would have dropped the cube ~5 units; the clamp caps
        // the step at max_dt
        let expected_vy = -state.tuning.gravity * state.tuning.max_dt * state.tuning.friction;
        assert!((body.vel.y - expected_vy).abs() < 1e-4);
        assert!(body.pos.y > -0.1);
    }

    #[test]
    fn test_bounce_speeds_decrease_monotonically() {
        let mut state = SimState::empty(1);
        state.tuning = quiet_tuning();
        let id = state
            .spawn_cube(Some(Vec2::ZERO), Some(0.5), None)
            .unwrap();
        state.bodies.get_mut(id).unwrap().vel = Vec2::new(12.0, 0.0);

        let mut last_speed = 12.0f32;
        let mut bounces = 0;
        let mut last_sign = 1.0f32;
        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), 1.0 / 60.0);
            let body = state.bodies.get(id).unwrap();
            let speed = body.vel.length();
            assert!(speed <= last_speed + 1e-4);
            if body.vel.x.signum() != last_sign {
                bounces += 1;
                last_sign = body.vel.x.signum();
            }
            last_speed = speed;
        }
        assert!(bounces >= 2);
        assert!(last_speed < 12.0 * state.tuning.bounce_factor);
    }

    #[test]
    fn test_overlapping_cubes_separate_under_gravity() {
        let mut state = SimState::empty(3);
        let a = state
            .spawn_cube(Some(Vec2::new(0.0, 0.0)), Some(0.4), None)
            .unwrap();
        let b = state
            .spawn_cube(Some(Vec2::new(0.5, 0.0)), Some(0.4), None)
            .unwrap();

        for _ in 0..240 {
            tick(&mut state, &TickInput::default(), 1.0 / 60.0);
        }

        let pa = state.bodies.get(a).unwrap().pos;
        let pb = state.bodies.get(b).unwrap().pos;
        assert!(pa.is_finite() && pb.is_finite());
        assert!((pa - pb).length() >= 0.8 - 1e-4);
    }

    #[test]
    fn test_moving_platform_clamps_and_flips() {
        let mut state = SimState::empty(1);
        // A cube somewhere far away keeps the session alive
        state
            .spawn_cube(Some(Vec2::new(-8.0, -8.0)), Some(0.5), None)
            .unwrap();
        let id = state
            .spawn_moving_platform(
                Vec2::new(0.0, 2.0),
                Vec2::new(3.0, 2.0),
                3.0,
                1.5,
                MOVING_PLATFORM_COLOR,
            )
            .unwrap();

        // 1.2 simulated seconds: reaches the end (1.0 s) and turns around
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), 0.02);
        }
        let body = state.bodies.get(id).unwrap();
        assert!(body.pos.x < 3.0);
        match body.kind {
            BodyKind::MovingPlatform { dir, .. } => assert_eq!(dir, -1.0),
            _ => unreachable!(),
        }
        assert!(body.pos.x >= 0.0 && body.pos.x <= 3.0);
    }

    #[test]
    fn test_rider_moves_with_platform() {
        let mut state = SimState::empty(1);
        state.tuning = quiet_tuning();
        let platform = state
            .spawn_moving_platform(
                Vec2::new(0.0, 2.0),
                Vec2::new(3.0, 2.0),
                3.0,
                1.5,
                MOVING_PLATFORM_COLOR,
            )
            .unwrap();
        let rider = state
            .spawn_cube(Some(Vec2::new(0.0, 4.0)), Some(0.5), None)
            .unwrap();

        for _ in 0..20 {
            let px = state.bodies.get(platform).unwrap().pos.x;
            let rx = state.bodies.get(rider).unwrap().pos.x;
            tick(&mut state, &TickInput::default(), 1.0 / 60.0);
            let platform_delta = state.bodies.get(platform).unwrap().pos.x - px;
            let rider_delta = state.bodies.get(rider).unwrap().pos.x - rx;
            assert!(platform_delta > 0.0);
            assert!((platform_delta - rider_delta).abs() < 1e-5);

            let gap =
                state.bodies.get(rider).unwrap().pos.y - state.bodies.get(platform).unwrap().pos.y;
            assert!(gap > 0.0 && gap < 0.5 + 1.5 + state.tuning.platform_ride_eps);
        }
    }

    #[test]
    fn test_game_over_when_no_dynamic_cubes() {
        let mut state = SimState::empty(1);
        state
            .spawn_platform(Vec2::new(0.0, -5.0), 10.0, PLATFORM_COLOR)
            .unwrap();
        state
            .spawn_collectible(Vec2::new(0.0, 0.0), 0.15, COLLECTIBLE_COLOR)
            .unwrap();

        tick(&mut state, &TickInput::default(), 1.0 / 60.0);
        assert!(state.game_over);

        // Stable across further steps; the world is frozen
        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default(), 1.0 / 60.0);
        assert!(state.game_over);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_game_over_rearmed_only_by_reset() {
        let mut state = SimState::empty(1);
        tick(&mut state, &TickInput::default(), 1.0 / 60.0);
        assert!(state.game_over);

        // Spawning a cube does not revive a finished session
        let spawn = TickInput {
            commands: vec![Command::SpawnCube {
                position: None,
                half_size: None,
                color: None,
            }],
        };
        tick(&mut state, &spawn, 1.0 / 60.0);
        assert!(state.game_over);

        let reset = TickInput {
            commands: vec![Command::Reset],
        };
        tick(&mut state, &reset, 1.0 / 60.0);
        assert!(!state.game_over);
        assert_eq!(state.active_dynamic_cubes(), INITIAL_CUBES);
    }

    #[test]
    fn test_frozen_world_does_not_integrate() {
        let mut state = SimState::empty(1);
        state
            .spawn_collectible(Vec2::new(0.0, 5.0), 0.15, COLLECTIBLE_COLOR)
            .unwrap();
        tick(&mut state, &TickInput::default(), 1.0 / 60.0);
        assert!(state.game_over);

        let before = state.bodies.slots()[0].pos;
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), 1.0 / 60.0);
        }
        assert_eq!(state.bodies.slots()[0].pos, before);
    }

    #[test]
    fn test_pickup_awards_score_and_emits_event() {
        let mut state = SimState::empty(1);
        state.tuning = quiet_tuning();
        state
            .spawn_cube(Some(Vec2::new(0.0, 0.0)), Some(0.5), None)
            .unwrap();
        state
            .spawn_collectible(Vec2::new(0.3, 0.0), 0.15, COLLECTIBLE_COLOR)
            .unwrap();

        tick(&mut state, &TickInput::default(), 1.0 / 60.0);

        assert_eq!(state.score, state.tuning.collectible_reward);
        assert!(
            state
                .events()
                .iter()
                .any(|e| e.kind == SimEventKind::CollectiblePicked)
        );
        // Pickup glitter reached the particle pool
        assert!(!state.particles.is_empty());
    }

    #[test]
    fn test_spawn_command_bursts_particles() {
        let mut state = SimState::empty(1);
        state
            .spawn_cube(Some(Vec2::new(-5.0, 5.0)), Some(0.5), None)
            .unwrap();

        let input = TickInput {
            commands: vec![Command::SpawnCube {
                position: Some(Vec2::new(5.0, 5.0)),
                half_size: None,
                color: None,
            }],
        };
        tick(&mut state, &input, 1.0 / 60.0);
        assert_eq!(state.particles.len(), 15);
    }

    #[test]
    fn test_nudge_applies_impulse_and_ignores_bad_ids() {
        let mut state = SimState::empty(1);
        state.tuning = quiet_tuning();
        let id = state
            .spawn_cube(Some(Vec2::ZERO), Some(0.5), None)
            .unwrap();

        let input = TickInput {
            commands: vec![Command::Nudge {
                id,
                impulse: Vec2::new(4.0, 0.0),
            }],
        };
        tick(&mut state, &input, 1.0 / 60.0);
        assert!(state.bodies.get(id).unwrap().vel.x > 3.9);

        // Dead id: logged and ignored, no panic, no effect
        state.bodies.deactivate(id).unwrap();
        let input = TickInput {
            commands: vec![Command::Nudge {
                id,
                impulse: Vec2::ONE,
            }],
        };
        tick(&mut state, &input, 1.0 / 60.0);
    }

    #[test]
    fn test_toggle_debug_overlay_has_no_sim_effect() {
        let mut state = SimState::new(5);
        let toggle = TickInput {
            commands: vec![Command::ToggleDebugOverlay],
        };
        let mut twin = state.clone();
        tick(&mut state, &toggle, 1.0 / 60.0);
        tick(&mut twin, &TickInput::default(), 1.0 / 60.0);

        assert!(state.debug_overlay);
        assert!(!twin.debug_overlay);
        for (a, b) in state.bodies.slots().iter().zip(twin.bodies.slots()) {
            assert_eq!(a.pos, b.pos);
        }
    }

    #[test]
    fn test_determinism_same_seed_same_trajectory() {
        let mut a = SimState::new(424242);
        let mut b = SimState::new(424242);
        for _ in 0..120 {
            tick(&mut a, &TickInput::default(), 1.0 / 60.0);
            tick(&mut b, &TickInput::default(), 1.0 / 60.0);
        }
        assert_eq!(a.score, b.score);
        for (x, y) in a.bodies.slots().iter().zip(b.bodies.slots()) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.vel, y.vel);
        }
    }

    proptest! {
        #[test]
        fn prop_single_body_stays_in_arena(
            x in -14.0f32..14.0,
            y in -9.0f32..9.0,
            vx in -20.0f32..20.0,
            vy in -20.0f32..20.0,
            seed in 0u64..1000,
        ) {
            let mut state = SimState::empty(seed);
            let id = state
                .spawn_cube(Some(Vec2::new(x, y)), Some(0.5), None)
                .unwrap();
            state.bodies.get_mut(id).unwrap().vel = Vec2::new(vx, vy);

            for _ in 0..300 {
                tick(&mut state, &TickInput::default(), 1.0 / 60.0);
            }

            let body = state.bodies.get(id).unwrap();
            prop_assert!(body.pos.is_finite() && body.vel.is_finite());
            prop_assert!(body.pos.x >= ARENA_MIN_X + 0.5 - 1e-3);
            prop_assert!(body.pos.x <= ARENA_MAX_X - 0.5 + 1e-3);
            prop_assert!(body.pos.y >= ARENA_MIN_Y + 0.5 - 1e-3);
            prop_assert!(body.pos.y <= ARENA_MAX_Y - 0.5 + 1e-3);
        }
    }
}
