//! Transient visual-effect particles
//!
//! Capacity-bounded pool fed exclusively by step events (collisions, pickups,
//! spawns). This module never looks at body state; it only receives a
//! position/color/count triple. Particles integrate with their own flat gravity
//! term and die by age or by shrinking under the visibility floor.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;

use crate::consts::MAX_PARTICLES;

/// Spawn-position jitter around the emission point
const EMIT_JITTER: f32 = 0.2;
/// Initial speed range (units/s)
const SPEED_MIN: f32 = 1.0;
const SPEED_MAX: f32 = 3.0;
/// Initial size range (world units)
const SIZE_MIN: f32 = 0.05;
const SIZE_MAX: f32 = 0.12;
/// Lifetime range (seconds)
const LIFETIME_MIN: f32 = 0.25;
const LIFETIME_MAX: f32 = 0.75;
/// Downward acceleration on particles, independent of body gravity
const PARTICLE_GRAVITY: f32 = 2.0;
/// Particles smaller than this are retired early
const MIN_VISIBLE_SIZE: f32 = 0.01;

/// A single short-lived effect particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub color: Vec3,
    pub age: f32,
    pub lifetime: f32,
}

/// Fixed-capacity particle pool with oldest-slot recycling on overflow.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self {
            particles: Vec::with_capacity(MAX_PARTICLES),
        }
    }

    /// Append up to `count` particles bursting out of `position`. At capacity
    /// the oldest (lowest-index) slot is recycled rather than refusing.
    pub fn emit(&mut self, position: Vec2, color: Vec3, count: usize, rng: &mut Pcg32) {
        for _ in 0..count {
            let pos = position
                + Vec2::new(
                    rng.random_range(-EMIT_JITTER..EMIT_JITTER),
                    rng.random_range(-EMIT_JITTER..EMIT_JITTER),
                );
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let speed = rng.random_range(SPEED_MIN..SPEED_MAX);

            let particle = Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                size: rng.random_range(SIZE_MIN..SIZE_MAX),
                color,
                age: 0.0,
                lifetime: rng.random_range(LIFETIME_MIN..LIFETIME_MAX),
            };

            if self.particles.len() >= MAX_PARTICLES {
                self.particles.remove(0);
            }
            self.particles.push(particle);
        }
    }

    /// Integrate all particles and retire the dead ones.
    pub fn step(&mut self, dt: f32) {
        for particle in self.particles.iter_mut() {
            particle.pos += particle.vel * dt;
            particle.vel.y -= PARTICLE_GRAVITY * dt;

            // Shrink by the remaining-life ratio so size hits zero with age
            let before = particle.lifetime - particle.age;
            particle.age += dt;
            let after = particle.lifetime - particle.age;
            if before > 0.0 {
                particle.size *= (after / before).max(0.0);
            }
        }
        self.particles
            .retain(|p| p.age < p.lifetime && p.size >= MIN_VISIBLE_SIZE);
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
