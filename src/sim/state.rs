//! Session state and core simulation types
//!
//! Everything the external collaborators see lives here: the body model, the
//! per-step event stream and the render snapshot, plus `SimState` itself, the
//! single owner of both stores and the RNG stream.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::particles::{Particle, ParticleStore};
use super::store::{BodyId, BodyStore};
use crate::consts::*;
use crate::{SimError, Tuning, preset_color};

/// Closed set of body kinds; the resolver matches on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyKind {
    Cube,
    Platform,
    /// Kinematic platform oscillating between `start` and `end`; treated as
    /// static by the resolver even though its position changes each frame.
    MovingPlatform {
        start: Vec2,
        end: Vec2,
        speed: f32,
        /// +1.0 toward `end`, -1.0 back toward `start`
        dir: f32,
    },
    Collectible,
}

/// A simulated body occupying one store slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Half-extent; doubles as the circle radius in the narrow phase
    pub half_size: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub is_static: bool,
    pub kind: BodyKind,
    pub active: bool,
    pub color: Vec3,
}

impl Body {
    pub fn new(kind: BodyKind, pos: Vec2, half_size: f32, color: Vec3, is_static: bool) -> Self {
        Self {
            id: BodyId::from_index(0),
            pos,
            vel: Vec2::ZERO,
            half_size,
            rotation: 0.0,
            rotation_speed: 0.0,
            is_static,
            kind,
            active: true,
            color,
        }
    }

    /// Mass of a dynamic body, proportional to area.
    #[inline]
    pub fn mass(&self) -> f32 {
        self.half_size * self.half_size
    }
}

/// What happened during a step, for the audio/particle collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEventKind {
    Collision,
    CollectiblePicked,
    Spawned,
}

/// One fire-and-forget notification; the event list is rebuilt every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimEvent {
    pub kind: SimEventKind,
    pub position: Vec2,
    pub color: Vec3,
    pub intensity: f32,
}

/// Read-only view of one frame for the renderer. Inactive body slots are
/// included (so slot indices line up); filter on `Body::active`.
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub bodies: &'a [Body],
    pub particles: &'a [Particle],
    pub score: u64,
    pub game_over: bool,
    pub debug_overlay: bool,
    pub active_bodies: usize,
    pub active_particles: usize,
}

/// Complete session state. One `tick` call owns this exclusively; external
/// components only read the snapshot or consume events between steps.
#[derive(Debug, Clone)]
pub struct SimState {
    /// Session seed for reproducibility
    pub seed: u64,
    /// The only randomness source in the simulation
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub score: u64,
    pub game_over: bool,
    /// Passthrough flag toggled by `Command::ToggleDebugOverlay`; no sim effect
    pub debug_overlay: bool,
    /// Simulation tick counter (frozen ticks excluded)
    pub time_ticks: u64,
    pub bodies: BodyStore,
    pub particles: ParticleStore,
    /// Events raised by the current step, in emission order
    pub events: Vec<SimEvent>,
}

impl SimState {
    /// Session with the canonical initial layout seeded.
    pub fn new(seed: u64) -> Self {
        let mut state = Self::empty(seed);
        state.reset();
        state
    }

    /// Session with an empty arena; used by tests and the save/load path.
    pub fn empty(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning: Tuning::default(),
            score: 0,
            game_over: false,
            debug_overlay: false,
            time_ticks: 0,
            bodies: BodyStore::new(),
            particles: ParticleStore::new(),
            events: Vec::new(),
        }
    }

    /// Clear both stores and re-seed the canonical layout. The only way to
    /// re-arm a finished session.
    pub fn reset(&mut self) {
        self.score = 0;
        self.game_over = false;
        self.bodies.clear();
        self.particles.clear();
        if let Err(err) = self.seed_layout() {
            // Unreachable with a freshly cleared store; refuse to panic anyway
            log::warn!("initial layout truncated: {err}");
        }
        log::debug!(
            "arena reset: {} bodies seeded (seed {})",
            self.bodies.active_count(),
            self.seed
        );
    }

    /// Canonical layout: floor, two side walls, randomly placed cubes, two
    /// collectibles and one moving platform.
    fn seed_layout(&mut self) -> Result<(), SimError> {
        self.spawn_platform(Vec2::new(0.0, FLOOR_POS_Y), FLOOR_HALF_SIZE, PLATFORM_COLOR)?;
        self.spawn_platform(Vec2::new(-WALL_POS_X, 0.0), WALL_HALF_SIZE, WALL_COLOR)?;
        self.spawn_platform(Vec2::new(WALL_POS_X, 0.0), WALL_HALF_SIZE, WALL_COLOR)?;

        for _ in 0..INITIAL_CUBES {
            self.spawn_cube(None, None, None)?;
        }

        self.spawn_collectible(Vec2::new(3.0, 1.0), COLLECTIBLE_HALF_SIZE, COLLECTIBLE_COLOR)?;
        self.spawn_collectible(Vec2::new(-3.0, 1.0), COLLECTIBLE_HALF_SIZE, COLLECTIBLE_COLOR)?;

        self.spawn_moving_platform(
            Vec2::new(0.0, 2.0),
            Vec2::new(3.0, 2.0),
            3.0,
            1.5,
            MOVING_PLATFORM_COLOR,
        )?;
        Ok(())
    }

    /// Spawn a dynamic cube. Omitted parameters are randomized: position inside
    /// the arena interior, half-size within the cube range, color from the
    /// preset palette.
    pub fn spawn_cube(
        &mut self,
        position: Option<Vec2>,
        half_size: Option<f32>,
        color: Option<Vec3>,
    ) -> Result<BodyId, SimError> {
        let pos = position.unwrap_or_else(|| random_spawn_pos(&mut self.rng));
        let half = half_size
            .unwrap_or_else(|| self.rng.random_range(CUBE_HALF_SIZE_MIN..CUBE_HALF_SIZE_MAX))
            .clamp(MIN_HALF_SIZE, MAX_HALF_SIZE);
        let color =
            color.unwrap_or_else(|| preset_color(self.rng.random_range(0..PRESET_COLORS.len())));

        let mut body = Body::new(BodyKind::Cube, pos, half, color, false);
        body.rotation_speed = self.rng.random_range(-CUBE_SPIN_MAX..CUBE_SPIN_MAX);

        let id = self.bodies.spawn(body)?;
        self.events.push(SimEvent {
            kind: SimEventKind::Spawned,
            position: pos,
            color,
            intensity: 1.0,
        });
        Ok(id)
    }

    /// Spawn a static platform slab.
    pub fn spawn_platform(
        &mut self,
        position: Vec2,
        half_size: f32,
        color: Vec3,
    ) -> Result<BodyId, SimError> {
        let half = half_size.clamp(MIN_HALF_SIZE, MAX_HALF_SIZE);
        let body = Body::new(BodyKind::Platform, position, half, color, true);
        self.bodies.spawn(body)
    }

    /// Spawn a collectible coin.
    pub fn spawn_collectible(
        &mut self,
        position: Vec2,
        half_size: f32,
        color: Vec3,
    ) -> Result<BodyId, SimError> {
        let half = half_size.clamp(MIN_HALF_SIZE, MAX_HALF_SIZE);
        let mut body = Body::new(BodyKind::Collectible, position, half, color, false);
        body.rotation_speed = COLLECTIBLE_SPIN;

        let id = self.bodies.spawn(body)?;
        self.events.push(SimEvent {
            kind: SimEventKind::Spawned,
            position,
            color,
            intensity: 1.0,
        });
        Ok(id)
    }

    /// Spawn a kinematic platform oscillating from `start` to `end`.
    pub fn spawn_moving_platform(
        &mut self,
        start: Vec2,
        end: Vec2,
        speed: f32,
        half_size: f32,
        color: Vec3,
    ) -> Result<BodyId, SimError> {
        let half = half_size.clamp(MIN_HALF_SIZE, MAX_HALF_SIZE);
        let kind = BodyKind::MovingPlatform {
            start,
            end,
            speed,
            dir: 1.0,
        };
        let body = Body::new(kind, start, half, color, true);
        self.bodies.spawn(body)
    }

    /// Count of active, non-static cube bodies; zero means game over.
    pub fn active_dynamic_cubes(&self) -> usize {
        self.bodies
            .iter_active()
            .filter(|body| !body.is_static && matches!(body.kind, BodyKind::Cube))
            .count()
    }

    /// Read-only view of the current frame for the renderer.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            bodies: self.bodies.slots(),
            particles: self.particles.particles(),
            score: self.score,
            game_over: self.game_over,
            debug_overlay: self.debug_overlay,
            active_bodies: self.bodies.active_count(),
            active_particles: self.particles.len(),
        }
    }

    /// Events raised by the most recent step, in emission order.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }
}

fn random_spawn_pos(rng: &mut Pcg32) -> Vec2 {
    Vec2::new(rng.random_range(-8.0..8.0), rng.random_range(1.0..8.0))
}
