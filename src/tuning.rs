//! Data-driven physics balance
//!
//! Everything here is a gameplay coefficient rather than arena geometry; tests
//! override individual fields (e.g. `collision_jitter = 0.0` for momentum
//! checks) instead of recompiling constants.

use serde::{Deserialize, Serialize};

/// Physics coefficients for one simulation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Downward acceleration applied to dynamic bodies (units/s²)
    pub gravity: f32,
    /// Per-axis, per-frame velocity decay (discrete model, not time-scaled)
    pub friction: f32,
    /// Energy retained across a bounce, 0 < factor < 1 loses energy
    pub bounce_factor: f32,
    /// Uniform per-component velocity noise injected on dynamic-dynamic
    /// collisions; 0.0 disables the perturbation entirely
    pub collision_jitter: f32,
    /// Ceiling applied to incoming `dt` before integration
    pub max_dt: f32,
    /// Score awarded per collectible pickup
    pub collectible_reward: u64,
    /// Vertical tolerance band for the on-platform rider test
    pub platform_ride_eps: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            friction: 0.98,
            bounce_factor: 0.7,
            collision_jitter: 0.01,
            max_dt: 0.05,
            collectible_reward: 10,
            platform_ride_eps: 0.1,
        }
    }
}
